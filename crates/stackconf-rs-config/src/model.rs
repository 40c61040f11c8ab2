//! Settings schema for the stackconf merge pipeline.

use serde::{Deserialize, Serialize};

/// Root settings for the merge pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StackconfConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub groups: GroupsConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl StackconfConfig {
    /// Start building settings programmatically with defaults applied.
    pub fn builder() -> StackconfConfigBuilder {
        StackconfConfigBuilder::new()
    }
}

/// Builder for assembling a `StackconfConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct StackconfConfigBuilder {
    config: StackconfConfig,
}

impl StackconfConfigBuilder {
    /// Create a new builder seeded with default settings.
    pub fn new() -> Self {
        Self {
            config: StackconfConfig::default(),
        }
    }

    /// Replace the config file naming rules.
    pub fn files(mut self, files: FilesConfig) -> Self {
        self.config.files = files;
        self
    }

    /// Replace the merge rules.
    pub fn merge(mut self, merge: MergeConfig) -> Self {
        self.config.merge = merge;
        self
    }

    /// Replace the config group settings.
    pub fn groups(mut self, groups: GroupsConfig) -> Self {
        self.config.groups = groups;
        self
    }

    /// Replace the session settings.
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    /// Finalize and return the built `StackconfConfig`.
    pub fn build(self) -> StackconfConfig {
        self.config
    }
}

/// Config file naming rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Site names that are used as filenames verbatim, without `.xml`.
    #[serde(default = "default_filename_exceptions")]
    pub exceptions: Vec<String>,
    /// Filenames whose properties take the service category for the file
    /// instead of a derived `Advanced`/`Custom` category.
    #[serde(default)]
    pub custom: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            exceptions: default_filename_exceptions(),
            custom: Vec::new(),
        }
    }
}

fn default_filename_exceptions() -> Vec<String> {
    vec!["zoo.cfg".to_string(), "alert_notification".to_string()]
}

/// Rules applied while reconciling catalog, stack and stored properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Glob patterns for host-reference properties that surface before the
    /// first save even without a stored value.
    #[serde(default = "default_host_reference_properties")]
    pub host_reference_properties: Vec<String>,
    /// Append stack-declared properties that have neither a catalog entry
    /// nor a stored value.
    #[serde(default)]
    pub include_stack_defaults: bool,
    /// Services whose catalog properties are in scope for every merge.
    #[serde(default = "default_always_included_services")]
    pub always_included_services: Vec<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            host_reference_properties: default_host_reference_properties(),
            include_stack_defaults: false,
            always_included_services: default_always_included_services(),
        }
    }
}

fn default_host_reference_properties() -> Vec<String> {
    vec!["hive_*_host".to_string(), "oozie_*_host".to_string()]
}

fn default_always_included_services() -> Vec<String> {
    vec!["MISC".to_string()]
}

/// Config group settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupsConfig {
    /// Name given to the synthesized default group.
    #[serde(default = "default_group_name")]
    pub default_group_name: String,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            default_group_name: default_group_name(),
        }
    }
}

fn default_group_name() -> String {
    "Default".to_string()
}

/// Session behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Whether resolved properties may be edited at all.
    #[serde(default = "default_allow_edit")]
    pub allow_edit: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            allow_edit: default_allow_edit(),
        }
    }
}

fn default_allow_edit() -> bool {
    true
}
