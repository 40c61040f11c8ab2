//! Stored configuration bags keyed by site type and tag.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One versioned property bag for a config site, as returned by the
/// configurations endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ConfigBag {
    /// Site type, e.g. `hdfs-site`.
    #[serde(rename = "type")]
    pub site: String,
    /// Version tag of this bag.
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Property name to raw value. `None` when the server omitted the map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "PropertiesAttributes::is_empty")]
    pub properties_attributes: PropertiesAttributes,
}

impl ConfigBag {
    /// Create an empty bag for a site and tag.
    pub fn new(site: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            tag: tag.into(),
            version: None,
            properties: Some(BTreeMap::new()),
            properties_attributes: PropertiesAttributes::default(),
        }
    }

    /// Add or replace a property value.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Mark a property as final.
    pub fn with_final(mut self, name: impl Into<String>) -> Self {
        self.properties_attributes
            .final_flags
            .insert(name.into(), "true".to_string());
        self
    }

    /// Raw value for a property, if present.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|props| props.get(name))
            .map(String::as_str)
    }

    /// Whether the bag carries a properties map at all.
    pub fn has_properties(&self) -> bool {
        self.properties.is_some()
    }

    /// Whether a property is flagged final in the attributes map.
    pub fn is_final(&self, name: &str) -> bool {
        self.properties_attributes.is_final(name)
    }

    /// Site tag pair identifying this bag.
    pub fn site_tag(&self) -> SiteTag {
        SiteTag::new(self.site.clone(), self.tag.clone())
    }
}

/// Per-property attribute maps attached to a bag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PropertiesAttributes {
    #[serde(rename = "final", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub final_flags: BTreeMap<String, String>,
}

impl PropertiesAttributes {
    /// True when no attributes are present.
    pub fn is_empty(&self) -> bool {
        self.final_flags.is_empty()
    }

    /// The server encodes final flags as the strings `"true"`/`"false"`.
    pub fn is_final(&self, name: &str) -> bool {
        self.final_flags
            .get(name)
            .is_some_and(|flag| flag.eq_ignore_ascii_case("true"))
    }
}

/// Envelope for a multi-bag configurations response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ConfigBagsResponse {
    #[serde(default)]
    pub items: Vec<ConfigBag>,
}

impl ConfigBagsResponse {
    /// Decode a response body.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Site type and tag pair used to request a specific bag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiteTag {
    pub site: String,
    pub tag: String,
}

impl SiteTag {
    pub fn new(site: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            tag: tag.into(),
        }
    }

    /// Render the `(type=..&tag=..)|(..)` filter used by the configurations
    /// endpoint.
    pub fn query(tags: &[SiteTag]) -> String {
        tags.iter()
            .map(|tag| format!("(type={}&tag={})", tag.site, tag.tag))
            .collect::<Vec<_>>()
            .join("|")
    }
}
