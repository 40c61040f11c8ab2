//! Attaching config-group overrides to merged properties.

use crate::error::CoreError;
use crate::groups::{ConfigGroup, ConfigGroups, GroupSelection};
use crate::merger::override_editable;
use crate::model::{OverrideProperty, PropertyKey, PropertyOrigin, ResolvedProperty};
use crate::settings::{MergeSettings, file_type};
use crate::values::{format_value, infer_display_type};
use log::{debug, info, warn};
use stackconf_rs_protocol::{ConfigBag, ConfigSource, SiteTag};
use std::collections::{BTreeSet, HashMap};

/// Fetched override bags keyed by site type and tag.
#[derive(Debug, Clone, Default)]
pub struct GroupTagMap {
    bags: HashMap<SiteTag, ConfigBag>,
}

impl GroupTagMap {
    pub fn new(bags: Vec<ConfigBag>) -> Self {
        Self {
            bags: bags.into_iter().map(|bag| (bag.site_tag(), bag)).collect(),
        }
    }

    pub fn insert(&mut self, bag: ConfigBag) {
        self.bags.insert(bag.site_tag(), bag);
    }

    pub fn get(&self, site: &str, tag: &str) -> Option<&ConfigBag> {
        self.bags.get(&SiteTag::new(site, tag))
    }

    pub fn len(&self) -> usize {
        self.bags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bags.is_empty()
    }
}

/// Fetch every non-default group's bags in one request.
pub async fn fetch_group_tags(
    source: &dyn ConfigSource,
    groups: &ConfigGroups,
) -> Result<GroupTagMap, CoreError> {
    let tags: BTreeSet<SiteTag> = groups
        .non_default()
        .iter()
        .flat_map(ConfigGroup::tags)
        .collect();
    if tags.is_empty() {
        return Ok(GroupTagMap::default());
    }
    let tags: Vec<SiteTag> = tags.into_iter().collect();
    info!(
        "fetching group overrides (service={}, tags={})",
        groups.service_name(),
        tags.len()
    );
    let bags = source.config_bags(&tags).await?;
    Ok(GroupTagMap::new(bags))
}

/// Attaches group overrides for one selection.
pub struct OverrideResolver<'a> {
    settings: &'a MergeSettings,
    selection: &'a GroupSelection,
}

impl<'a> OverrideResolver<'a> {
    pub fn new(settings: &'a MergeSettings, selection: &'a GroupSelection) -> Self {
        Self {
            settings,
            selection,
        }
    }

    /// Attach every non-default group's overrides in place.
    ///
    /// Only `overrides` lists grow; base values are left untouched. Values
    /// absent from the default scope become group-only properties.
    pub fn attach_overrides(
        &self,
        resolved: &mut Vec<ResolvedProperty>,
        group_tags: &GroupTagMap,
        groups: &ConfigGroups,
    ) {
        let mut defaults: HashMap<PropertyKey, usize> = HashMap::new();
        let mut group_only: HashMap<(PropertyKey, String), usize> = HashMap::new();
        for (idx, property) in resolved.iter().enumerate() {
            match &property.group {
                None => {
                    defaults.insert(property.key.clone(), idx);
                }
                Some(group) => {
                    group_only.insert((property.key.clone(), group.clone()), idx);
                }
            }
        }

        let mut attached = 0usize;
        for group in groups.non_default() {
            for (site, tag) in &group.site_tags {
                let Some((bag, properties)) = group_tags
                    .get(site, tag)
                    .and_then(|bag| bag.properties.as_ref().map(|props| (bag, props)))
                else {
                    debug!(
                        "no override bag (group={}, type={}, tag={})",
                        group.name, site, tag
                    );
                    continue;
                };
                let filename = self.settings.normalize_filename(site);
                for (name, raw) in properties {
                    let key = PropertyKey::new(name.clone(), filename.clone());
                    let is_final = bag.is_final(name);
                    if let Some(idx) = defaults.get(&key) {
                        self.push_override(&mut resolved[*idx], group, raw, is_final);
                    } else {
                        let slot = (key.clone(), group.name.clone());
                        let property = self.group_only(key, group, raw, is_final, groups);
                        match group_only.get(&slot).copied() {
                            Some(idx) => resolved[idx] = property,
                            None => {
                                group_only.insert(slot, resolved.len());
                                resolved.push(property);
                            }
                        }
                    }
                    attached += 1;
                }
            }
        }

        for property in resolved.iter_mut() {
            partition_hosts(property);
        }
        debug!(
            "overrides attached (service={}, values={})",
            groups.service_name(),
            attached
        );
    }

    fn push_override(
        &self,
        parent: &mut ResolvedProperty,
        group: &ConfigGroup,
        raw: &str,
        is_final: bool,
    ) {
        let formatted = format_value(parent.display_type, raw);
        let entry = OverrideProperty {
            parent: parent.key.clone(),
            group: group.name.clone(),
            hosts: group.hosts.clone(),
            saved_value: Some(formatted.value.clone()),
            value: formatted.value,
            is_final,
            is_editable: override_editable(self.settings, self.selection, parent, &group.name),
            memory_suffix: formatted.memory_suffix,
        };
        match parent
            .overrides
            .iter_mut()
            .find(|existing| existing.group == entry.group)
        {
            Some(existing) => *existing = entry,
            None => parent.overrides.push(entry),
        }
    }

    fn group_only(
        &self,
        key: PropertyKey,
        group: &ConfigGroup,
        raw: &str,
        is_final: bool,
        groups: &ConfigGroups,
    ) -> ResolvedProperty {
        let category = format!("Custom {}", file_type(&key.filename));
        let mut property =
            ResolvedProperty::new(key, groups.service_name(), PropertyOrigin::GroupOnly);
        property.display_type = infer_display_type(raw);
        property.value = raw.to_string();
        property.saved_value = Some(raw.to_string());
        property.category = category;
        property.group = Some(group.name.clone());
        property.is_user_property = true;
        property.is_required = false;
        property.is_final = is_final;
        property.is_editable = self.settings.allow_edit && self.selection.is_selected(&group.name);
        property
    }
}

/// A host claimed by two overrides of one property stays with the later one.
fn partition_hosts(property: &mut ResolvedProperty) {
    if property.overrides.len() < 2 {
        return;
    }
    let mut owner: HashMap<String, usize> = HashMap::new();
    let mut released: Vec<(usize, String)> = Vec::new();
    for (idx, entry) in property.overrides.iter().enumerate() {
        for host in &entry.hosts {
            if let Some(previous) = owner.insert(host.clone(), idx) {
                warn!(
                    "host claimed by two overrides (key={}, host={}, kept={})",
                    property.key, host, entry.group
                );
                released.push((previous, host.clone()));
            }
        }
    }
    for (idx, host) in released {
        property.overrides[idx].hosts.remove(&host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DisplayType;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn parent() -> ResolvedProperty {
        let mut property = ResolvedProperty::new(
            PropertyKey::new("dfs.replication", "hdfs-site.xml"),
            "HDFS",
            PropertyOrigin::Catalog,
        );
        property.display_type = DisplayType::Int;
        property.value = "2".to_string();
        property.saved_value = Some("2".to_string());
        property
    }

    fn groups(entries: Vec<ConfigGroup>) -> ConfigGroups {
        ConfigGroups::for_service("HDFS", entries, "Default", &BTreeMap::new())
    }

    #[test]
    fn same_group_value_replaces_earlier() {
        let settings = MergeSettings::default();
        let groups = groups(vec![
            ConfigGroup::new("G1", "HDFS")
                .with_site_tag("hdfs-site", "t1")
                .with_site_tag("hdfs-site.xml", "t2"),
        ]);
        let selection = groups.selection("Default").expect("selection");
        let tags = GroupTagMap::new(vec![
            ConfigBag::new("hdfs-site", "t1").with_property("dfs.replication", "4"),
            ConfigBag::new("hdfs-site.xml", "t2").with_property("dfs.replication", "6"),
        ]);
        let mut resolved = vec![parent()];
        OverrideResolver::new(&settings, &selection).attach_overrides(&mut resolved, &tags, &groups);
        assert_eq!(resolved[0].overrides.len(), 1);
        assert_eq!(resolved[0].overrides[0].value, "6");
        assert!(!resolved[0].overrides[0].is_editable);
    }

    #[test]
    fn later_group_keeps_shared_host() {
        let mut property = parent();
        let make = |group: &str, hosts: &[&str]| OverrideProperty {
            parent: property.key.clone(),
            group: group.to_string(),
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            value: "1".to_string(),
            saved_value: None,
            is_final: false,
            is_editable: false,
            memory_suffix: false,
        };
        let first = make("G1", &["h1", "h2"]);
        let second = make("G2", &["h2"]);
        property.overrides = vec![first, second];
        partition_hosts(&mut property);
        assert_eq!(
            property.overrides[0].hosts,
            BTreeSet::from(["h1".to_string()])
        );
        assert_eq!(
            property.overrides[1].hosts,
            BTreeSet::from(["h2".to_string()])
        );
    }
}
