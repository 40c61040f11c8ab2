//! Stack-declared ("advanced") property definitions fetched per service.

use crate::catalog::ConfigCatalog;
use crate::error::CoreError;
use crate::model::PropertyKey;
use crate::settings::MergeSettings;
use futures_util::future::try_join_all;
use log::{debug, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use stackconf_rs_protocol::{ConfigSource, StackConfigItem};
use std::collections::HashMap;
use std::sync::Arc;

/// One property as declared by the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedProperty {
    pub name: String,
    pub value: String,
    pub description: Option<String>,
    pub filename: String,
    pub service_name: String,
    pub property_types: Vec<String>,
}

impl AdvancedProperty {
    /// Convert a wire item, normalizing its filename.
    pub fn from_item(item: StackConfigItem, settings: &MergeSettings) -> Self {
        let site = item.filename.as_deref().unwrap_or(&item.site_type);
        let filename = settings.normalize_filename(site);
        Self {
            name: item.property_name,
            value: item.property_value,
            description: item.property_description,
            filename,
            service_name: item.service_name,
            property_types: item.property_type,
        }
    }

    pub fn key(&self) -> PropertyKey {
        PropertyKey::new(self.name.clone(), self.filename.clone())
    }
}

/// Stack properties for a set of services, indexed by key.
#[derive(Debug, Clone, Default)]
pub struct AdvancedConfigs {
    properties: Vec<AdvancedProperty>,
    index: HashMap<PropertyKey, usize>,
}

impl AdvancedConfigs {
    pub fn new(properties: Vec<AdvancedProperty>) -> Self {
        let mut configs = Self::default();
        for property in properties {
            configs.push(property);
        }
        configs
    }

    fn push(&mut self, property: AdvancedProperty) {
        let key = property.key();
        match self.index.get(&key) {
            Some(idx) => self.properties[*idx] = property,
            None => {
                self.index.insert(key, self.properties.len());
                self.properties.push(property);
            }
        }
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&AdvancedProperty> {
        self.index.get(key).map(|idx| &self.properties[*idx])
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AdvancedProperty> {
        self.properties.iter()
    }

    /// Whether the catalog also declares this stack property.
    pub fn is_catalog_declared(&self, key: &PropertyKey, catalog: &ConfigCatalog) -> bool {
        self.contains(key) && catalog.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Fetches and caches stack properties per service.
///
/// The cache lives as long as the loader; sessions own one loader each.
pub struct AdvancedConfigLoader {
    source: Arc<dyn ConfigSource>,
    catalog: Arc<ConfigCatalog>,
    settings: MergeSettings,
    cache: RwLock<HashMap<String, Arc<Vec<AdvancedProperty>>>>,
}

impl AdvancedConfigLoader {
    pub fn new(
        source: Arc<dyn ConfigSource>,
        catalog: Arc<ConfigCatalog>,
        settings: MergeSettings,
    ) -> Self {
        Self {
            source,
            catalog,
            settings,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load stack properties for every service, fetching uncached services
    /// concurrently. Any fetch failure fails the whole load.
    pub async fn load(&self, service_names: &[&str]) -> Result<AdvancedConfigs, CoreError> {
        let missing: Vec<&str> = {
            let cache = self.cache.read();
            service_names
                .iter()
                .copied()
                .filter(|name| !cache.contains_key(*name))
                .collect()
        };

        if !missing.is_empty() {
            info!("fetching stack configs (services={})", missing.join(","));
            let fetched = try_join_all(missing.iter().map(|name| self.fetch(name))).await?;
            let mut cache = self.cache.write();
            for (name, properties) in missing.iter().zip(fetched) {
                cache.insert(name.to_string(), Arc::new(properties));
            }
        }

        let cache = self.cache.read();
        let properties = service_names
            .iter()
            .filter_map(|name| cache.get(*name))
            .flat_map(|entries| entries.iter().cloned())
            .collect::<Vec<_>>();
        let configs = AdvancedConfigs::new(properties);
        let overlap = configs
            .iter()
            .filter(|property| self.catalog.get(&property.key()).is_some())
            .count();
        debug!(
            "stack configs ready (properties={}, catalog_overlap={})",
            configs.len(),
            overlap
        );
        Ok(configs)
    }

    async fn fetch(&self, service_name: &str) -> Result<Vec<AdvancedProperty>, CoreError> {
        let items = self.source.advanced_configs(service_name).await?;
        Ok(items
            .into_iter()
            .map(|item| AdvancedProperty::from_item(item, &self.settings))
            .collect())
    }

    /// Drop one service's cached properties.
    pub fn invalidate(&self, service_name: &str) {
        if self.cache.write().remove(service_name).is_some() {
            debug!("stack configs invalidated (service={service_name})");
        }
    }

    pub fn is_cached(&self, service_name: &str) -> bool {
        self.cache.read().contains_key(service_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(site: &str, filename: Option<&str>) -> StackConfigItem {
        StackConfigItem {
            service_name: "HDFS".to_string(),
            site_type: site.to_string(),
            property_name: "dfs.blocksize".to_string(),
            property_value: "134217728".to_string(),
            property_description: None,
            property_type: Vec::new(),
            filename: filename.map(str::to_string),
        }
    }

    #[test]
    fn filename_prefers_explicit_file() {
        let settings = MergeSettings::default();
        let from_type = AdvancedProperty::from_item(item("hdfs-site", None), &settings);
        assert_eq!(from_type.filename, "hdfs-site.xml");
        let explicit = AdvancedProperty::from_item(item("zookeeper-env", Some("zoo.cfg")), &settings);
        assert_eq!(explicit.filename, "zoo.cfg");
    }

    #[test]
    fn later_duplicate_replaces_earlier() {
        let settings = MergeSettings::default();
        let mut second = AdvancedProperty::from_item(item("hdfs-site", None), &settings);
        second.value = "1".to_string();
        let configs = AdvancedConfigs::new(vec![
            AdvancedProperty::from_item(item("hdfs-site", None), &settings),
            second,
        ]);
        assert_eq!(configs.len(), 1);
        let key = PropertyKey::new("dfs.blocksize", "hdfs-site.xml");
        assert_eq!(configs.get(&key).map(|p| p.value.as_str()), Some("1"));
    }
}
