//! Group selection sessions for one service screen.
//!
//! Every selection takes a generation ticket before it starts fetching. When
//! it finishes, its result only commits if no later selection (or cancel)
//! has taken a newer ticket in the meantime; otherwise it is discarded and
//! the caller gets `Ok(None)`.

use crate::advanced::AdvancedConfigLoader;
use crate::catalog::ConfigCatalog;
use crate::error::CoreError;
use crate::groups::{ConfigGroup, ConfigGroups};
use crate::merger::ConfigMerger;
use crate::model::{PropertyKey, ResolvedProperty};
use crate::overrides::{OverrideResolver, fetch_group_tags};
use crate::save::SiteBagBuilder;
use crate::settings::MergeSettings;
use crate::stored::{StoredConfigs, StoredValue};
use crate::template::{DerivedProperty, GlobalValue, TemplateResolver};
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use stackconf_rs_protocol::{ConfigBag, ConfigSource};
use std::collections::BTreeMap;
use std::sync::Arc;

/// File holding the global values templates resolve against.
const GLOBAL_FILE: &str = "global.xml";

/// Tag and group metadata for a service, as fetched by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub service_name: String,
    /// Site type to the currently desired tag.
    #[serde(default)]
    pub desired_tags: BTreeMap<String, String>,
    #[serde(default)]
    pub groups: Vec<ConfigGroup>,
}

impl ServiceSnapshot {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            desired_tags: BTreeMap::new(),
            groups: Vec::new(),
        }
    }

    pub fn with_desired_tag(mut self, site: impl Into<String>, tag: impl Into<String>) -> Self {
        self.desired_tags.insert(site.into(), tag.into());
        self
    }

    pub fn with_group(mut self, group: ConfigGroup) -> Self {
        self.groups.push(group);
        self
    }
}

/// A committed rendering of one service for one selected group.
#[derive(Debug, Clone)]
pub struct ServiceConfigView {
    pub service_name: String,
    pub selected_group: String,
    pub generation: u64,
    pub groups: ConfigGroups,
    pub properties: Vec<ResolvedProperty>,
    /// Stored values recomputed from catalog mappings on save.
    pub mapped: Vec<StoredValue>,
}

impl ServiceConfigView {
    pub fn find(&self, key: &PropertyKey) -> Option<&ResolvedProperty> {
        self.properties
            .iter()
            .find(|property| property.group.is_none() && &property.key == key)
    }

    /// Properties grouped by category, categories in first-seen order.
    pub fn by_category(&self) -> Vec<(&str, Vec<&ResolvedProperty>)> {
        let mut categories: Vec<(&str, Vec<&ResolvedProperty>)> = Vec::new();
        for property in &self.properties {
            match categories
                .iter_mut()
                .find(|(name, _)| *name == property.category)
            {
                Some((_, entries)) => entries.push(property),
                None => categories.push((property.category.as_str(), vec![property])),
            }
        }
        categories
    }

    /// Properties whose value or overrides differ from the saved state.
    pub fn dirty(&self) -> Vec<&ResolvedProperty> {
        self.properties
            .iter()
            .filter(|property| property.is_dirty())
            .collect()
    }

    pub fn is_default_selected(&self) -> bool {
        self.groups.default_group().name == self.selected_group
    }

    /// Global values for template resolution.
    pub fn globals(&self) -> Vec<GlobalValue> {
        self.properties
            .iter()
            .filter(|property| property.group.is_none() && property.filename() == GLOBAL_FILE)
            .map(|property| {
                GlobalValue::new(property.name(), property.value.clone())
                    .with_default(property.default_value.clone())
            })
            .collect()
    }

    /// Bags to write for the selected group.
    pub fn save_bags(&self, builder: &SiteBagBuilder) -> Vec<ConfigBag> {
        if self.is_default_selected() {
            builder.default_bags(&self.properties)
        } else {
            builder.group_bags(&self.properties, &self.selected_group)
        }
    }
}

#[derive(Default)]
struct SessionState {
    generation: u64,
    current: Option<Arc<ServiceConfigView>>,
}

/// Drives catalog, stack, stored and override sources into views.
pub struct ConfigSession {
    catalog: Arc<ConfigCatalog>,
    source: Arc<dyn ConfigSource>,
    settings: MergeSettings,
    loader: AdvancedConfigLoader,
    state: Mutex<SessionState>,
}

impl ConfigSession {
    pub fn new(
        catalog: Arc<ConfigCatalog>,
        source: Arc<dyn ConfigSource>,
        settings: MergeSettings,
    ) -> Self {
        let loader = AdvancedConfigLoader::new(source.clone(), catalog.clone(), settings.clone());
        Self {
            catalog,
            source,
            settings,
            loader,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn catalog(&self) -> &ConfigCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &MergeSettings {
        &self.settings
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Last committed view.
    pub fn current(&self) -> Option<Arc<ServiceConfigView>> {
        self.state.lock().current.clone()
    }

    /// Supersede any selection in flight.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        debug!("selection cancelled (generation={})", state.generation);
    }

    /// Forget cached stack configs for a service.
    pub fn invalidate_stack_configs(&self, service_name: &str) {
        self.loader.invalidate(service_name);
    }

    /// Render a service for one group.
    ///
    /// Returns `Ok(None)` when a later selection superseded this one, even if
    /// this one failed.
    pub async fn select_group(
        &self,
        snapshot: ServiceSnapshot,
        group_name: &str,
    ) -> Result<Option<Arc<ServiceConfigView>>, CoreError> {
        let ticket = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.generation
        };
        info!(
            "selecting config group (service={}, group={}, generation={})",
            snapshot.service_name, group_name, ticket
        );

        let result = self.build_view(ticket, snapshot, group_name).await;

        let mut state = self.state.lock();
        if state.generation != ticket {
            debug!(
                "discarding stale selection (generation={}, current={})",
                ticket, state.generation
            );
            return Ok(None);
        }
        let view = Arc::new(result?);
        state.current = Some(view.clone());
        Ok(Some(view))
    }

    /// Resolve catalog mappings against a view's globals.
    pub fn derived_properties(&self, view: &ServiceConfigView) -> Vec<DerivedProperty> {
        let globals = view.globals();
        TemplateResolver::new(&globals).resolve(self.catalog.mappings())
    }

    async fn build_view(
        &self,
        ticket: u64,
        snapshot: ServiceSnapshot,
        group_name: &str,
    ) -> Result<ServiceConfigView, CoreError> {
        let service_name = snapshot.service_name;
        let service = service_name.as_str();
        if self.catalog.service(service).is_none()
            && self.catalog.definitions_for(&[service]).next().is_none()
        {
            return Err(CoreError::UnknownService(service_name));
        }

        let groups = ConfigGroups::for_service(
            service,
            snapshot.groups,
            &self.settings.default_group_name,
            &snapshot.desired_tags,
        );
        let selection = groups.selection(group_name)?;
        let services = [service];

        let advanced = self.loader.load(&services).await?;
        let tags = groups.default_group().tags();
        let bags = if tags.is_empty() {
            Vec::new()
        } else {
            self.source.config_bags(&tags).await?
        };
        let stored = StoredConfigs::from_bags(&bags, &self.settings);

        let merger =
            ConfigMerger::new(&self.catalog, &self.settings).with_selection(selection.clone());
        let mut properties = merger.merge(&stored, &advanced, &services);
        let mapped = merger.mapped(&stored);
        if self.settings.include_stack_defaults {
            merger.add_stack_defaults(&mut properties, &advanced, &services);
        }

        let group_tags = fetch_group_tags(self.source.as_ref(), &groups).await?;
        OverrideResolver::new(&self.settings, &selection).attach_overrides(
            &mut properties,
            &group_tags,
            &groups,
        );

        Ok(ServiceConfigView {
            service_name: service_name.clone(),
            selected_group: selection.selected,
            generation: ticket,
            groups,
            properties,
            mapped,
        })
    }
}
