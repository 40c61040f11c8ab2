//! Configuration merge pipeline.
//!
//! This crate owns the property catalog, stack config loading, the merger
//! and override resolver, template derivation, the save path and the group
//! selection session that ties them together.

pub mod advanced;
pub mod catalog;
pub mod error;
pub mod groups;
pub mod merger;
pub mod model;
pub mod overrides;
pub mod save;
pub mod session;
mod settings;
pub mod stored;
pub mod template;
pub mod values;

pub use advanced::{AdvancedConfigLoader, AdvancedConfigs, AdvancedProperty};
pub use catalog::{
    CategoryMetadata, ConfigCatalog, ConfigCatalogBuilder, PropertyDefinition, ServiceMetadata,
};
pub use error::CoreError;
pub use groups::{ConfigGroup, ConfigGroups, GroupSelection};
pub use merger::ConfigMerger;
/// Resolved property model.
pub use model::{DisplayType, OverrideProperty, PropertyKey, PropertyOrigin, ResolvedProperty};
pub use overrides::{GroupTagMap, OverrideResolver, fetch_group_tags};
pub use save::{SiteBagBuilder, new_tag};
pub use session::{ConfigSession, ServiceConfigView, ServiceSnapshot};
/// Settings compiled from `StackconfConfig`.
pub use settings::{MergeSettings, file_type};
pub use stored::{StoredConfigs, StoredOverride, StoredValue};
pub use template::{ConfigMapping, DerivedProperty, GlobalValue, Segment, TemplateResolver};
