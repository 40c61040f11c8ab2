//! Reconciliation of catalog, stack and stored properties.
//!
//! `merge` yields exactly one property per `(name, filename)` in scope.
//! Output follows catalog order, then the remaining properties by name and
//! filename, so identical inputs always render identically.

use crate::advanced::{AdvancedConfigs, AdvancedProperty};
use crate::catalog::{ConfigCatalog, PropertyDefinition};
use crate::groups::GroupSelection;
use crate::model::{OverrideProperty, PropertyKey, PropertyOrigin, ResolvedProperty};
use crate::settings::{MergeSettings, file_type};
use crate::stored::{StoredConfigs, StoredValue};
use crate::values::{format_value, infer_display_type};
use log::{debug, warn};
use std::collections::HashSet;

/// Merges property sources for one group selection.
pub struct ConfigMerger<'a> {
    catalog: &'a ConfigCatalog,
    settings: &'a MergeSettings,
    selection: GroupSelection,
}

impl<'a> ConfigMerger<'a> {
    /// Merger rendering the default group.
    pub fn new(catalog: &'a ConfigCatalog, settings: &'a MergeSettings) -> Self {
        Self {
            catalog,
            settings,
            selection: GroupSelection::default_group(settings.default_group_name.clone()),
        }
    }

    pub fn with_selection(mut self, selection: GroupSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn selection(&self) -> &GroupSelection {
        &self.selection
    }

    /// Merge stored values with catalog and stack definitions.
    pub fn merge(
        &self,
        stored: &StoredConfigs,
        advanced: &AdvancedConfigs,
        service_names: &[&str],
    ) -> Vec<ResolvedProperty> {
        let scope = self.scope(service_names);
        let mut seen: HashSet<PropertyKey> = HashSet::new();
        let mut resolved = Vec::new();

        for definition in self.catalog.definitions_for(&scope) {
            let key = definition.key();
            let stack = advanced.get(&key);
            match stored.get(&key) {
                Some(value) => {
                    resolved.push(self.from_definition(definition, stack, Some(value)));
                }
                None if !definition.is_required_by_agent
                    || self.settings.is_host_reference(&definition.name) =>
                {
                    resolved.push(self.from_definition(definition, stack, None));
                }
                None => continue,
            }
            seen.insert(key);
        }

        for value in stored.iter() {
            let key = value.key();
            if seen.contains(&key) {
                continue;
            }
            if self.catalog.get(&key).is_some() {
                // Declared for a service outside the scope.
                continue;
            }
            if self.catalog.is_mapped(&key) {
                debug!("stored property derived by a mapping held out (key={key})");
                continue;
            }
            let stack = advanced.get(&key);
            let Some(service_name) = self.service_for(value, stack, service_names) else {
                warn!("stored property without service dropped (key={key})");
                continue;
            };
            if !scope.contains(&service_name.as_str()) {
                continue;
            }
            seen.insert(key);
            resolved.push(self.from_stored(value, stack, service_name));
        }

        self.sort(&mut resolved);
        debug!(
            "merge complete (services={}, properties={}, selected_group={})",
            scope.join(","),
            resolved.len(),
            self.selection.selected
        );
        resolved
    }

    /// Stored values a catalog mapping derives on save. `merge` leaves them
    /// out of the editable list.
    pub fn mapped(&self, stored: &StoredConfigs) -> Vec<StoredValue> {
        stored
            .iter()
            .filter(|value| {
                let key = value.key();
                self.catalog.get(&key).is_none() && self.catalog.is_mapped(&key)
            })
            .cloned()
            .collect()
    }

    /// Append stack properties that neither the catalog nor the stored set
    /// surfaced, valued at their stack default.
    pub fn add_stack_defaults(
        &self,
        resolved: &mut Vec<ResolvedProperty>,
        advanced: &AdvancedConfigs,
        service_names: &[&str],
    ) {
        let scope = self.scope(service_names);
        let present: HashSet<PropertyKey> = resolved.iter().map(|p| p.key.clone()).collect();
        let mut added = 0usize;
        for stack in advanced.iter() {
            if !scope.contains(&stack.service_name.as_str()) {
                continue;
            }
            let key = stack.key();
            if present.contains(&key) {
                continue;
            }
            let mut property = match self.catalog.get(&key) {
                Some(definition) => self.from_definition(definition, Some(stack), None),
                None => self.stack_default(stack),
            };
            property.origin = PropertyOrigin::Stack;
            resolved.push(property);
            added += 1;
        }
        if added > 0 {
            self.sort(resolved);
            debug!("stack defaults added (count={added})");
        }
    }

    fn scope<'s>(&'s self, service_names: &[&'s str]) -> Vec<&'s str> {
        let mut scope: Vec<&str> = Vec::new();
        for name in service_names.iter().copied() {
            if !scope.contains(&name) {
                scope.push(name);
            }
        }
        for service in self.catalog.services() {
            let name = service.service_name.as_str();
            if self.settings.is_always_included(name) && !scope.contains(&name) {
                scope.push(name);
            }
        }
        scope
    }

    fn service_for(
        &self,
        value: &StoredValue,
        stack: Option<&AdvancedProperty>,
        service_names: &[&str],
    ) -> Option<String> {
        if let Some(service) = &value.service_name {
            return Some(service.clone());
        }
        if let Some(stack) = stack {
            return Some(stack.service_name.clone());
        }
        if let Some(service) = self.catalog.service_for_file(&value.filename) {
            return Some(service.to_string());
        }
        match service_names {
            [only] => Some(only.to_string()),
            _ => None,
        }
    }

    fn from_definition(
        &self,
        definition: &PropertyDefinition,
        stack: Option<&AdvancedProperty>,
        stored: Option<&StoredValue>,
    ) -> ResolvedProperty {
        let mut property = ResolvedProperty::new(
            definition.key(),
            definition.service_name.clone(),
            PropertyOrigin::Catalog,
        );
        let default_value = match (definition.default_value.is_empty(), stack) {
            (true, Some(stack)) => stack.value.clone(),
            _ => definition.default_value.clone(),
        };
        property.description = definition
            .description
            .clone()
            .or_else(|| stack.and_then(|stack| stack.description.clone()));
        property.display_type = definition.display_type;
        property.category = definition.category.clone().unwrap_or_else(|| {
            self.catalog
                .category_for(&definition.service_name, &definition.filename)
                .map(|category| category.name.clone())
                .unwrap_or_else(|| format!("Advanced {}", file_type(&definition.filename)))
        });
        property.is_overridable = definition.is_overridable;
        property.is_required = definition.is_required;
        property.is_visible = definition.is_visible;
        property.is_reconfigurable = definition.is_reconfigurable;
        property.is_required_by_agent = definition.is_required_by_agent;
        property.unit = definition.unit.clone();
        property.display_name = definition
            .display_name
            .clone()
            .unwrap_or_else(|| definition.name.clone());

        match stored {
            Some(stored) => {
                self.apply_stored(&mut property, stored);
                property.default_value = format_value(property.display_type, &default_value).value;
            }
            None => {
                let formatted = format_value(property.display_type, &default_value);
                property.default_value = formatted.value.clone();
                property.value = formatted.value;
                property.memory_suffix = formatted.memory_suffix;
            }
        }
        property.is_editable = self.is_editable(&property);
        property
    }

    fn from_stored(
        &self,
        stored: &StoredValue,
        stack: Option<&AdvancedProperty>,
        service_name: String,
    ) -> ResolvedProperty {
        let key = stored.key();
        let site = file_type(&key.filename).to_string();
        let (origin, prefix) = match stack {
            Some(_) => (PropertyOrigin::Stack, "Advanced"),
            None => (PropertyOrigin::User, "Custom"),
        };
        let category = self
            .settings
            .is_custom_file(&key.filename)
            .then(|| self.catalog.category_for(&service_name, &key.filename))
            .flatten()
            .map(|category| category.name.clone())
            .unwrap_or_else(|| format!("{prefix} {site}"));

        let mut property = ResolvedProperty::new(key, service_name, origin);
        property.display_type = infer_display_type(&stored.value);
        property.category = category;
        property.is_user_property = stack.is_none();
        property.is_required = stack.is_some();
        if let Some(stack) = stack {
            property.description = stack.description.clone();
            property.default_value = stack.value.clone();
        }
        self.apply_stored(&mut property, stored);
        property.is_editable = self.is_editable(&property);
        property
    }

    fn stack_default(&self, stack: &AdvancedProperty) -> ResolvedProperty {
        let key = stack.key();
        let category = format!("Advanced {}", file_type(&key.filename));
        let mut property =
            ResolvedProperty::new(key, stack.service_name.clone(), PropertyOrigin::Stack);
        property.display_type = infer_display_type(&stack.value);
        property.category = category;
        property.description = stack.description.clone();
        property.default_value = stack.value.clone();
        property.value = stack.value.clone();
        property.is_editable = self.is_editable(&property);
        property
    }

    /// Stored state wins over every declared default.
    fn apply_stored(&self, property: &mut ResolvedProperty, stored: &StoredValue) {
        let value = format_value(property.display_type, &stored.value);
        let saved = format_value(property.display_type, &stored.saved_value);
        property.value = value.value;
        property.saved_value = Some(saved.value);
        property.memory_suffix = value.memory_suffix || saved.memory_suffix;
        property.is_final = stored.is_final;
        if let Some(display_name) = &stored.display_name {
            property.display_name = display_name.clone();
        }

        let mut overrides: Vec<OverrideProperty> = Vec::new();
        for entry in &stored.overrides {
            if !self.selection.is_known(&entry.group) {
                warn!(
                    "dropping override for unknown group (key={}, group={})",
                    property.key, entry.group
                );
                continue;
            }
            let formatted = format_value(property.display_type, &entry.value);
            let item = OverrideProperty {
                parent: property.key.clone(),
                group: entry.group.clone(),
                hosts: self.selection.hosts(&entry.group).cloned().unwrap_or_default(),
                value: formatted.value.clone(),
                saved_value: Some(formatted.value),
                is_final: entry.is_final,
                is_editable: self.is_override_editable(property, &entry.group),
                memory_suffix: formatted.memory_suffix,
            };
            match overrides.iter_mut().find(|existing| existing.group == item.group) {
                Some(existing) => *existing = item,
                None => overrides.push(item),
            }
        }
        property.overrides = overrides;
    }

    fn is_editable(&self, property: &ResolvedProperty) -> bool {
        self.settings.allow_edit && property.is_reconfigurable && self.selection.is_default
    }

    fn is_override_editable(&self, property: &ResolvedProperty, group: &str) -> bool {
        override_editable(self.settings, &self.selection, property, group)
    }

    fn sort(&self, resolved: &mut [ResolvedProperty]) {
        resolved.sort_by_cached_key(|property| {
            let position = self.catalog.position(&property.key);
            (
                position.is_none(),
                position.unwrap_or_default(),
                property.key.name.clone(),
                property.key.filename.clone(),
            )
        });
    }
}

/// Editability of an override for a group under the current selection.
pub(crate) fn override_editable(
    settings: &MergeSettings,
    selection: &GroupSelection,
    parent: &ResolvedProperty,
    group: &str,
) -> bool {
    settings.allow_edit
        && parent.is_reconfigurable
        && parent.is_overridable
        && selection.is_selected(group)
}
