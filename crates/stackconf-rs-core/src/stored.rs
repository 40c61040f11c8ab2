//! Previously persisted property values.

use crate::model::PropertyKey;
use crate::settings::MergeSettings;
use log::debug;
use serde::{Deserialize, Serialize};
use stackconf_rs_protocol::ConfigBag;

/// A persisted override value for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOverride {
    pub value: String,
    pub group: String,
    #[serde(default)]
    pub is_final: bool,
}

/// One persisted property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredValue {
    pub name: String,
    pub filename: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub value: String,
    pub saved_value: String,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub overrides: Vec<StoredOverride>,
}

impl StoredValue {
    /// A value that matches what was last saved.
    pub fn new(
        name: impl Into<String>,
        filename: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            filename: filename.into(),
            service_name: None,
            display_name: None,
            saved_value: value.clone(),
            value,
            is_final: false,
            overrides: Vec::new(),
        }
    }

    /// Last persisted value, when it differs from the current one.
    pub fn with_saved_value(mut self, saved_value: impl Into<String>) -> Self {
        self.saved_value = saved_value.into();
        self
    }

    pub fn with_service(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn with_override(mut self, group: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push(StoredOverride {
            value: value.into(),
            group: group.into(),
            is_final: false,
        });
        self
    }

    pub fn key(&self) -> PropertyKey {
        PropertyKey::new(self.name.clone(), self.filename.clone())
    }
}

/// Stored values for a merge, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredConfigs {
    values: Vec<StoredValue>,
}

impl StoredConfigs {
    pub fn new(values: Vec<StoredValue>) -> Self {
        Self { values }
    }

    /// Flatten fetched bags. A bag without a `properties` map contributes
    /// nothing.
    pub fn from_bags(bags: &[ConfigBag], settings: &MergeSettings) -> Self {
        let mut values = Vec::new();
        for bag in bags {
            let Some(properties) = &bag.properties else {
                debug!(
                    "stored bag without properties skipped (type={}, tag={})",
                    bag.site, bag.tag
                );
                continue;
            };
            let filename = settings.normalize_filename(&bag.site);
            for (name, value) in properties {
                values.push(
                    StoredValue::new(name.clone(), filename.clone(), value.clone())
                        .with_final(bag.is_final(name)),
                );
            }
        }
        Self { values }
    }

    /// First stored value for a key.
    pub fn get(&self, key: &PropertyKey) -> Option<&StoredValue> {
        self.values
            .iter()
            .find(|value| value.name == key.name && value.filename == key.filename)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredValue> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bags_flatten_into_values() {
        let bags = vec![
            ConfigBag::new("hdfs-site", "version1")
                .with_property("dfs.replication", "2")
                .with_final("dfs.replication"),
            ConfigBag {
                properties: None,
                ..ConfigBag::new("core-site", "version1")
            },
        ];
        let stored = StoredConfigs::from_bags(&bags, &MergeSettings::default());
        assert_eq!(stored.len(), 1);
        let value = stored
            .get(&PropertyKey::new("dfs.replication", "hdfs-site.xml"))
            .expect("stored");
        assert_eq!(value.value, "2");
        assert_eq!(value.saved_value, "2");
        assert!(value.is_final);
    }
}
