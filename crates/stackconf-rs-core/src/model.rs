//! Resolved property model handed to presentation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identity of a property: name plus normalized filename.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyKey {
    pub name: String,
    pub filename: String,
}

impl PropertyKey {
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.filename)
    }
}

/// How a property is displayed and how its value is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum DisplayType {
    #[default]
    String,
    Int,
    Float,
    Checkbox,
    Directory,
    Directories,
    Password,
    MasterHost,
    MasterHosts,
    SlaveHosts,
    Host,
    Custom,
    Advanced,
    MultiLine,
    #[serde(other)]
    Other,
}

/// Where a resolved property came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyOrigin {
    /// Declared by the catalog.
    Catalog,
    /// Declared by the stack but not the catalog.
    Stack,
    /// Stored without any declaration.
    User,
    /// Exists only inside a non-default group's overrides.
    GroupOnly,
}

/// One property of a service after merging catalog, stack and stored state.
///
/// Rebuilt on every group selection and never persisted directly; the save
/// path reads it back into bags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedProperty {
    pub key: PropertyKey,
    pub display_name: String,
    pub description: Option<String>,
    pub default_value: String,
    /// Current, editable value.
    pub value: String,
    /// Last persisted value; `None` for properties never saved.
    pub saved_value: Option<String>,
    pub display_type: DisplayType,
    pub service_name: String,
    pub category: String,
    pub origin: PropertyOrigin,
    /// Owning group for group-only properties.
    pub group: Option<String>,
    pub is_user_property: bool,
    pub is_overridable: bool,
    pub is_required: bool,
    pub is_visible: bool,
    pub is_reconfigurable: bool,
    pub is_editable: bool,
    pub is_final: bool,
    /// `false` surfaces the property without ever persisting it.
    pub is_required_by_agent: bool,
    /// An `m` suffix was stripped from an int value and is re-appended on save.
    pub memory_suffix: bool,
    pub unit: Option<String>,
    pub overrides: Vec<OverrideProperty>,
}

impl ResolvedProperty {
    /// Empty, unsaved property with catalog flag defaults.
    pub fn new(key: PropertyKey, service_name: impl Into<String>, origin: PropertyOrigin) -> Self {
        Self {
            display_name: key.name.clone(),
            key,
            description: None,
            default_value: String::new(),
            value: String::new(),
            saved_value: None,
            display_type: DisplayType::default(),
            service_name: service_name.into(),
            category: String::new(),
            origin,
            group: None,
            is_user_property: false,
            is_overridable: true,
            is_required: true,
            is_visible: true,
            is_reconfigurable: true,
            is_editable: false,
            is_final: false,
            is_required_by_agent: true,
            memory_suffix: false,
            unit: None,
            overrides: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn filename(&self) -> &str {
        &self.key.filename
    }

    /// Value differs from what was last persisted, or from the default when
    /// never persisted.
    pub fn is_dirty(&self) -> bool {
        let baseline = self.saved_value.as_ref().unwrap_or(&self.default_value);
        *baseline != self.value || self.overrides.iter().any(OverrideProperty::is_dirty)
    }

    /// Override for a group, if any.
    pub fn override_for(&self, group: &str) -> Option<&OverrideProperty> {
        self.overrides.iter().find(|entry| entry.group == group)
    }
}

/// A property value scoped to one config group.
///
/// Refers to its parent by key; carries no further overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideProperty {
    pub parent: PropertyKey,
    pub group: String,
    pub hosts: BTreeSet<String>,
    pub value: String,
    pub saved_value: Option<String>,
    pub is_final: bool,
    pub is_editable: bool,
    pub memory_suffix: bool,
}

impl OverrideProperty {
    pub fn is_dirty(&self) -> bool {
        self.saved_value.as_deref() != Some(self.value.as_str())
    }
}
