//! Static property catalog for one stack version.
//!
//! The catalog is built once and shared read-only by every merge; it never
//! changes after `build`.

use crate::error::CoreError;
use crate::model::{DisplayType, PropertyKey};
use crate::settings::MergeSettings;
use crate::template::ConfigMapping;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Catalog metadata for one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub display_type: DisplayType,
    pub service_name: String,
    pub filename: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub is_overridable: bool,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default = "default_true")]
    pub is_reconfigurable: bool,
    #[serde(default = "default_true")]
    pub is_required_by_agent: bool,
    #[serde(default)]
    pub unit: Option<String>,
}

fn default_true() -> bool {
    true
}

impl PropertyDefinition {
    /// Definition with catalog defaults for every optional field.
    pub fn new(
        name: impl Into<String>,
        filename: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            description: None,
            default_value: String::new(),
            display_type: DisplayType::default(),
            service_name: service_name.into(),
            filename: filename.into(),
            category: None,
            is_overridable: true,
            is_required: true,
            is_visible: true,
            is_reconfigurable: true,
            is_required_by_agent: true,
            unit: None,
        }
    }

    pub fn with_display_type(mut self, display_type: DisplayType) -> Self {
        self.display_type = display_type;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_required_by_agent(mut self, required: bool) -> Self {
        self.is_required_by_agent = required;
        self
    }

    pub fn with_reconfigurable(mut self, reconfigurable: bool) -> Self {
        self.is_reconfigurable = reconfigurable;
        self
    }

    pub fn with_overridable(mut self, overridable: bool) -> Self {
        self.is_overridable = overridable;
        self
    }

    pub fn key(&self) -> PropertyKey {
        PropertyKey::new(self.name.clone(), self.filename.clone())
    }
}

/// A UI category grouping one or more config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMetadata {
    pub name: String,
    #[serde(default)]
    pub site_file_names: Vec<String>,
}

/// Display metadata for a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub service_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub categories: Vec<CategoryMetadata>,
}

impl ServiceMetadata {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            display_name: None,
            categories: Vec::new(),
        }
    }

    pub fn with_category(mut self, name: impl Into<String>, site_file_names: &[&str]) -> Self {
        self.categories.push(CategoryMetadata {
            name: name.into(),
            site_file_names: site_file_names.iter().map(|s| s.to_string()).collect(),
        });
        self
    }
}

/// On-disk catalog document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    services: Vec<ServiceMetadata>,
    #[serde(default)]
    properties: Vec<PropertyDefinition>,
    #[serde(default)]
    mappings: Vec<ConfigMapping>,
}

/// Immutable catalog of property definitions, service metadata and
/// template mappings.
#[derive(Debug, Clone, Default)]
pub struct ConfigCatalog {
    services: Vec<ServiceMetadata>,
    definitions: Vec<PropertyDefinition>,
    index: HashMap<PropertyKey, usize>,
    mappings: Vec<ConfigMapping>,
}

impl ConfigCatalog {
    pub fn builder() -> ConfigCatalogBuilder {
        ConfigCatalogBuilder::new(MergeSettings::default())
    }

    /// Builder normalizing filenames with the given settings.
    pub fn builder_with(settings: MergeSettings) -> ConfigCatalogBuilder {
        ConfigCatalogBuilder::new(settings)
    }

    /// Decode a catalog document.
    pub fn from_json_str(raw: &str, settings: &MergeSettings) -> Result<Self, CoreError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        let mut builder = ConfigCatalogBuilder::new(settings.clone());
        for service in document.services {
            builder = builder.service(service);
        }
        for definition in document.properties {
            if definition.name.trim().is_empty() {
                return Err(CoreError::Catalog(format!(
                    "property without a name in {}",
                    definition.filename
                )));
            }
            builder = builder.property(definition);
        }
        for mapping in document.mappings {
            builder = builder.mapping(mapping);
        }
        Ok(builder.build())
    }

    /// Load a catalog document from disk.
    pub fn load_from_path(
        path: impl AsRef<Path>,
        settings: &MergeSettings,
    ) -> Result<Self, CoreError> {
        info!("loading catalog from path: {}", path.as_ref().display());
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw, settings)
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&PropertyDefinition> {
        self.index.get(key).map(|idx| &self.definitions[*idx])
    }

    /// Declared position of a definition.
    pub fn position(&self, key: &PropertyKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// All definitions in declared order.
    pub fn definitions(&self) -> &[PropertyDefinition] {
        &self.definitions
    }

    /// Definitions owned by any of the given services, in declared order.
    pub fn definitions_for<'a>(
        &'a self,
        service_names: &'a [&'a str],
    ) -> impl Iterator<Item = &'a PropertyDefinition> + 'a {
        self.definitions
            .iter()
            .filter(move |def| service_names.contains(&def.service_name.as_str()))
    }

    pub fn service(&self, service_name: &str) -> Option<&ServiceMetadata> {
        self.services
            .iter()
            .find(|service| service.service_name == service_name)
    }

    pub fn services(&self) -> &[ServiceMetadata] {
        &self.services
    }

    /// Category of a service whose file list contains the filename.
    pub fn category_for(&self, service_name: &str, filename: &str) -> Option<&CategoryMetadata> {
        self.service(service_name)?.categories.iter().find(|category| {
            category
                .site_file_names
                .iter()
                .any(|name| name == filename)
        })
    }

    /// First service claiming the filename in one of its categories.
    pub fn service_for_file(&self, filename: &str) -> Option<&str> {
        self.services
            .iter()
            .find(|service| {
                service.categories.iter().any(|category| {
                    category.site_file_names.iter().any(|name| name == filename)
                })
            })
            .map(|service| service.service_name.as_str())
    }

    pub fn mappings(&self) -> &[ConfigMapping] {
        &self.mappings
    }

    /// Whether a mapping derives this property on save.
    pub fn is_mapped(&self, key: &PropertyKey) -> bool {
        self.mappings
            .iter()
            .any(|mapping| mapping.name == key.name && mapping.filename == key.filename)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Builder assembling a catalog.
#[derive(Debug, Clone)]
pub struct ConfigCatalogBuilder {
    settings: MergeSettings,
    catalog: ConfigCatalog,
}

impl ConfigCatalogBuilder {
    fn new(settings: MergeSettings) -> Self {
        Self {
            settings,
            catalog: ConfigCatalog::default(),
        }
    }

    /// Add service metadata; a repeated service replaces the earlier entry.
    pub fn service(mut self, mut service: ServiceMetadata) -> Self {
        for category in &mut service.categories {
            for filename in &mut category.site_file_names {
                *filename = self.settings.normalize_filename(filename);
            }
        }
        let services = &mut self.catalog.services;
        match services
            .iter_mut()
            .find(|existing| existing.service_name == service.service_name)
        {
            Some(existing) => *existing = service,
            None => services.push(service),
        }
        self
    }

    /// Add a definition. A second definition for the same key replaces the
    /// first in place.
    pub fn property(mut self, mut definition: PropertyDefinition) -> Self {
        definition.filename = self.settings.normalize_filename(&definition.filename);
        let key = definition.key();
        match self.catalog.index.get(&key) {
            Some(idx) => {
                debug!("catalog definition replaced (key={key})");
                self.catalog.definitions[*idx] = definition;
            }
            None => {
                self.catalog
                    .index
                    .insert(key, self.catalog.definitions.len());
                self.catalog.definitions.push(definition);
            }
        }
        self
    }

    pub fn mapping(mut self, mut mapping: ConfigMapping) -> Self {
        mapping.filename = self.settings.normalize_filename(&mapping.filename);
        self.catalog.mappings.push(mapping);
        self
    }

    pub fn build(self) -> ConfigCatalog {
        debug!(
            "catalog built (services={}, properties={}, mappings={})",
            self.catalog.services.len(),
            self.catalog.definitions.len(),
            self.catalog.mappings.len()
        );
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_filenames_on_insert() {
        let catalog = ConfigCatalog::builder()
            .property(PropertyDefinition::new("dfs.replication", "hdfs-site", "HDFS"))
            .property(PropertyDefinition::new("tickTime", "zoo.cfg", "ZOOKEEPER"))
            .build();
        assert!(
            catalog
                .get(&PropertyKey::new("dfs.replication", "hdfs-site.xml"))
                .is_some()
        );
        assert!(catalog.get(&PropertyKey::new("tickTime", "zoo.cfg")).is_some());
    }

    #[test]
    fn duplicate_definition_replaces_in_place() {
        let catalog = ConfigCatalog::builder()
            .property(PropertyDefinition::new("a", "hdfs-site.xml", "HDFS"))
            .property(PropertyDefinition::new("b", "hdfs-site.xml", "HDFS"))
            .property(PropertyDefinition::new("a", "hdfs-site.xml", "HDFS").with_default("2"))
            .build();
        assert_eq!(catalog.len(), 2);
        let names: Vec<_> = catalog.definitions().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        let key = PropertyKey::new("a", "hdfs-site.xml");
        assert_eq!(catalog.get(&key).map(|d| d.default_value.as_str()), Some("2"));
    }

    #[test]
    fn decodes_catalog_document() {
        let raw = r#"{
            "services": [
                { "service_name": "HDFS", "categories": [
                    { "name": "NameNode", "site_file_names": ["hdfs-site.xml"] }
                ] }
            ],
            "properties": [
                { "name": "dfs.replication", "service_name": "HDFS", "filename": "hdfs-site",
                  "display_type": "int", "default_value": "3" }
            ]
        }"#;
        let catalog = ConfigCatalog::from_json_str(raw, &MergeSettings::default()).expect("catalog");
        let def = catalog
            .get(&PropertyKey::new("dfs.replication", "hdfs-site.xml"))
            .expect("definition");
        assert_eq!(def.display_type, DisplayType::Int);
        assert!(def.is_required_by_agent);
        assert_eq!(
            catalog.category_for("HDFS", "hdfs-site.xml").map(|c| c.name.as_str()),
            Some("NameNode")
        );
        assert_eq!(catalog.service_for_file("hdfs-site.xml"), Some("HDFS"));
    }

    #[test]
    fn category_file_names_are_normalized() {
        let catalog = ConfigCatalog::builder()
            .service(
                ServiceMetadata::new("HDFS")
                    .with_category("NameNode", &["hdfs-site"])
                    .with_category("ZooKeeper", &["zoo.cfg"]),
            )
            .build();
        assert_eq!(
            catalog.category_for("HDFS", "hdfs-site.xml").map(|c| c.name.as_str()),
            Some("NameNode")
        );
        assert_eq!(catalog.service_for_file("hdfs-site.xml"), Some("HDFS"));
        assert_eq!(
            catalog.category_for("HDFS", "zoo.cfg").map(|c| c.name.as_str()),
            Some("ZooKeeper")
        );
    }

    #[test]
    fn mapped_keys_match_name_and_file() {
        let catalog = ConfigCatalog::builder()
            .mapping(ConfigMapping::new("fs.defaultFS", "hdfs://<templateName[0]>:8020", "core-site"))
            .build();
        assert!(catalog.is_mapped(&PropertyKey::new("fs.defaultFS", "core-site.xml")));
        assert!(!catalog.is_mapped(&PropertyKey::new("fs.defaultFS", "hdfs-site.xml")));
    }

    #[test]
    fn rejects_unnamed_property() {
        let raw = r#"{ "properties": [ { "name": " ", "service_name": "HDFS", "filename": "hdfs-site" } ] }"#;
        let err = ConfigCatalog::from_json_str(raw, &MergeSettings::default()).unwrap_err();
        assert!(matches!(err, CoreError::Catalog(_)));
    }
}
