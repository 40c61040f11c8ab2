//! Stack-declared property items.

use serde::{Deserialize, Serialize};

/// A property declared by the stack definition for a service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackConfigItem {
    pub service_name: String,
    /// Config file the property belongs to, e.g. `hdfs-site.xml`.
    #[serde(rename = "type")]
    pub site_type: String,
    pub property_name: String,
    #[serde(default)]
    pub property_value: String,
    #[serde(default)]
    pub property_description: Option<String>,
    #[serde(default)]
    pub property_type: Vec<String>,
    /// Explicit filename; takes precedence over `type` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackConfigurationsEntry {
    #[serde(rename = "StackConfigurations")]
    pub configuration: StackConfigItem,
}

/// Envelope for the stack configurations endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StackConfigurationsResponse {
    #[serde(default)]
    pub items: Vec<StackConfigurationsEntry>,
}

impl StackConfigurationsResponse {
    /// Decode a response body.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Unwrap the envelope entries.
    pub fn into_items(self) -> Vec<StackConfigItem> {
        self.items
            .into_iter()
            .map(|entry| entry.configuration)
            .collect()
    }
}
