//! Rebuilding site bags from resolved properties for persistence.

use crate::model::ResolvedProperty;
use crate::settings::file_type;
use crate::template::DerivedProperty;
use crate::values::wire_value;
use chrono::{DateTime, Utc};
use stackconf_rs_protocol::ConfigBag;
use std::collections::BTreeMap;

/// Fresh tag for a save, `version<epoch millis>`.
pub fn new_tag() -> String {
    new_tag_at(Utc::now())
}

pub fn new_tag_at(at: DateTime<Utc>) -> String {
    format!("version{}", at.timestamp_millis())
}

/// Builds the bags written for one save, all under one tag.
#[derive(Debug, Clone)]
pub struct SiteBagBuilder {
    tag: String,
}

impl SiteBagBuilder {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Default-scope bags in site order. Properties the agent does not need
    /// and group-only properties are left out.
    pub fn default_bags(&self, resolved: &[ResolvedProperty]) -> Vec<ConfigBag> {
        let mut bags: BTreeMap<String, ConfigBag> = BTreeMap::new();
        for property in resolved
            .iter()
            .filter(|property| property.group.is_none() && property.is_required_by_agent)
        {
            let value = wire_value(
                property.display_type,
                &property.value,
                property.memory_suffix,
            );
            self.put(&mut bags, property.filename(), property.name(), value, property.is_final);
        }
        bags.into_values().collect()
    }

    /// Bags for one group: its overrides plus its group-only properties.
    pub fn group_bags(&self, resolved: &[ResolvedProperty], group: &str) -> Vec<ConfigBag> {
        let mut bags: BTreeMap<String, ConfigBag> = BTreeMap::new();
        for property in resolved {
            if property.group.as_deref() == Some(group) {
                let value = wire_value(property.display_type, &property.value, false);
                self.put(&mut bags, property.filename(), property.name(), value, property.is_final);
                continue;
            }
            if let Some(entry) = property.override_for(group) {
                let value = wire_value(property.display_type, &entry.value, entry.memory_suffix);
                self.put(&mut bags, property.filename(), property.name(), value, entry.is_final);
            }
        }
        bags.into_values().collect()
    }

    /// Fold derived properties into the bags, replacing same-named values.
    pub fn derived(&self, bags: Vec<ConfigBag>, derived: &[DerivedProperty]) -> Vec<ConfigBag> {
        let mut by_site: BTreeMap<String, ConfigBag> = bags
            .into_iter()
            .map(|bag| (bag.site.clone(), bag))
            .collect();
        for property in derived {
            self.put(
                &mut by_site,
                &property.filename,
                &property.name,
                property.value.clone(),
                false,
            );
        }
        by_site.into_values().collect()
    }

    fn put(
        &self,
        bags: &mut BTreeMap<String, ConfigBag>,
        filename: &str,
        name: &str,
        value: String,
        is_final: bool,
    ) {
        let site = file_type(filename).to_string();
        let bag = bags
            .entry(site.clone())
            .or_insert_with(|| ConfigBag::new(site, self.tag.clone()));
        bag.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), value);
        if is_final {
            bag.properties_attributes
                .final_flags
                .insert(name.to_string(), "true".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn tag_uses_epoch_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).single().expect("time");
        assert_eq!(new_tag_at(at), "version1700000000123");
        assert!(new_tag().starts_with("version"));
    }
}
