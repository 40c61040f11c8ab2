//! Config groups of one service.

use crate::error::CoreError;
use log::warn;
use serde::{Deserialize, Serialize};
use stackconf_rs_protocol::SiteTag;
use std::collections::{BTreeMap, BTreeSet};

/// A named scope associating hosts with override tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigGroup {
    pub name: String,
    pub service_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub hosts: BTreeSet<String>,
    /// Site type to tag.
    #[serde(default)]
    pub site_tags: BTreeMap<String, String>,
}

impl ConfigGroup {
    /// A non-default group.
    pub fn new(name: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_name: service_name.into(),
            description: None,
            is_default: false,
            hosts: BTreeSet::new(),
            site_tags: BTreeMap::new(),
        }
    }

    pub fn with_hosts(mut self, hosts: &[&str]) -> Self {
        self.hosts.extend(hosts.iter().map(|host| host.to_string()));
        self
    }

    pub fn with_site_tag(mut self, site: impl Into<String>, tag: impl Into<String>) -> Self {
        self.site_tags.insert(site.into(), tag.into());
        self
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Site tags in site order.
    pub fn tags(&self) -> Vec<SiteTag> {
        self.site_tags
            .iter()
            .map(|(site, tag)| SiteTag::new(site.clone(), tag.clone()))
            .collect()
    }
}

/// The group a view is rendered for, plus the groups overrides may name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSelection {
    pub selected: String,
    pub is_default: bool,
    known: BTreeMap<String, BTreeSet<String>>,
}

impl GroupSelection {
    /// Selection of a default group with no other groups known.
    pub fn default_group(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut known = BTreeMap::new();
        known.insert(name.clone(), BTreeSet::new());
        Self {
            selected: name,
            is_default: true,
            known,
        }
    }

    pub fn is_known(&self, group: &str) -> bool {
        self.known.contains_key(group)
    }

    pub fn is_selected(&self, group: &str) -> bool {
        self.selected == group
    }

    /// Hosts of a known group.
    pub fn hosts(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.known.get(group)
    }
}

/// Groups of one service with exactly one default, listed first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigGroups {
    service_name: String,
    groups: Vec<ConfigGroup>,
}

impl ConfigGroups {
    /// Collect a service's groups.
    ///
    /// A default group is synthesized from `default_tags` when none is
    /// present; surplus defaults are demoted. A default group without tags
    /// takes `default_tags`.
    pub fn for_service(
        service_name: &str,
        groups: Vec<ConfigGroup>,
        default_name: &str,
        default_tags: &BTreeMap<String, String>,
    ) -> Self {
        let mut default_group: Option<ConfigGroup> = None;
        let mut others = Vec::new();
        for mut group in groups {
            if group.service_name != service_name {
                continue;
            }
            if group.is_default {
                if default_group.is_none() {
                    default_group = Some(group);
                    continue;
                }
                warn!(
                    "demoting surplus default group (service={}, group={})",
                    service_name, group.name
                );
                group.is_default = false;
            }
            others.push(group);
        }

        let mut default_group = default_group.unwrap_or_else(|| ConfigGroup {
            name: default_name.to_string(),
            service_name: service_name.to_string(),
            description: None,
            is_default: true,
            hosts: BTreeSet::new(),
            site_tags: BTreeMap::new(),
        });
        if default_group.site_tags.is_empty() {
            default_group.site_tags = default_tags.clone();
        }

        let mut all = Vec::with_capacity(others.len() + 1);
        all.push(default_group);
        all.extend(others);
        Self {
            service_name: service_name.to_string(),
            groups: all,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn default_group(&self) -> &ConfigGroup {
        &self.groups[0]
    }

    /// Non-default groups in declared order.
    pub fn non_default(&self) -> &[ConfigGroup] {
        &self.groups[1..]
    }

    pub fn all(&self) -> &[ConfigGroup] {
        &self.groups
    }

    pub fn find(&self, name: &str) -> Option<&ConfigGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// Selection for a named group; unknown names are an error.
    pub fn selection(&self, name: &str) -> Result<GroupSelection, CoreError> {
        let group = self.find(name).ok_or_else(|| CoreError::UnknownGroup {
            service: self.service_name.clone(),
            group: name.to_string(),
        })?;
        let known = self
            .groups
            .iter()
            .map(|group| (group.name.clone(), group.hosts.clone()))
            .collect();
        Ok(GroupSelection {
            selected: group.name.clone(),
            is_default: group.is_default,
            known,
        })
    }

    /// Hosts claimed by more than one non-default group, with the claiming
    /// groups in declared order.
    pub fn overlapping_hosts(&self) -> BTreeMap<String, Vec<String>> {
        let mut claims: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for group in self.non_default() {
            for host in &group.hosts {
                claims
                    .entry(host.clone())
                    .or_default()
                    .push(group.name.clone());
            }
        }
        claims.retain(|_, groups| groups.len() > 1);
        claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn desired() -> BTreeMap<String, String> {
        BTreeMap::from([("hdfs-site".to_string(), "version1".to_string())])
    }

    #[test]
    fn synthesizes_default_group() {
        let groups = ConfigGroups::for_service(
            "HDFS",
            vec![
                ConfigGroup::new("G1", "HDFS"),
                ConfigGroup::new("Y1", "YARN"),
            ],
            "Default",
            &desired(),
        );
        assert_eq!(groups.default_group().name, "Default");
        assert!(groups.default_group().is_default);
        assert_eq!(groups.default_group().site_tags, desired());
        assert_eq!(groups.non_default().len(), 1);
        assert!(groups.find("Y1").is_none());
    }

    #[test]
    fn demotes_surplus_defaults() {
        let groups = ConfigGroups::for_service(
            "HDFS",
            vec![
                ConfigGroup::new("G1", "HDFS"),
                ConfigGroup::new("A", "HDFS").with_default(true),
                ConfigGroup::new("B", "HDFS").with_default(true),
            ],
            "Default",
            &desired(),
        );
        assert_eq!(groups.default_group().name, "A");
        let names: Vec<_> = groups.non_default().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["G1", "B"]);
        assert!(groups.all().iter().filter(|g| g.is_default).count() == 1);
    }

    #[test]
    fn selection_of_unknown_group_fails() {
        let groups = ConfigGroups::for_service("HDFS", Vec::new(), "Default", &desired());
        let err = groups.selection("missing").unwrap_err();
        assert!(matches!(err, CoreError::UnknownGroup { .. }));
        let selection = groups.selection("Default").expect("selection");
        assert!(selection.is_default);
    }

    #[test]
    fn reports_overlapping_hosts() {
        let groups = ConfigGroups::for_service(
            "HDFS",
            vec![
                ConfigGroup::new("G1", "HDFS").with_hosts(&["h1", "h2"]),
                ConfigGroup::new("G2", "HDFS").with_hosts(&["h2", "h3"]),
            ],
            "Default",
            &desired(),
        );
        let overlap = groups.overlapping_hosts();
        assert_eq!(overlap.len(), 1);
        assert_eq!(overlap["h2"], vec!["G1".to_string(), "G2".to_string()]);
    }
}
