//! Layered settings loader.
//!
//! Settings come from a stack of JSON5 files. Discovery produces a
//! [`LayerPlan`] listing every candidate file in precedence order; loading
//! walks the plan, validates each file that exists and folds it into one
//! value. A requirements file seeds the result and locks the keys it sets.

mod discovery;
mod merge;
mod schema;


use crate::{ConfigError, StackconfConfig};
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "stackconf.json5";
const DEFAULT_CONFIG_DIR: &str = ".stackconf";
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

/// Effective settings plus the layers that produced them.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: StackconfConfig,
    /// Layers actually read, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Where a settings layer sits in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigLayerSource {
    /// Locked values that later layers cannot change.
    Requirements,
    System,
    User,
    /// `stackconf.json5` at the project root.
    Project,
    /// `stackconf.json5` in the working directory.
    Cwd,
    /// `.stackconf/stackconf.json5` under the project root.
    Repo,
    /// Explicit override files, applied last.
    Runtime,
}

impl ConfigLayerSource {
    fn label(self) -> &'static str {
        match self {
            Self::Requirements => "requirements",
            Self::System => "system",
            Self::User => "user",
            Self::Project => "project",
            Self::Cwd => "cwd",
            Self::Repo => "repo",
            Self::Runtime => "runtime",
        }
    }
}

/// A layer that was read during load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Locations consulted by [`StackconfConfig::load_layered_with_options`].
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    pub cwd: PathBuf,
    /// Defaults to `/etc/stackconf/stackconf.json5` on Unix.
    pub system_config_path: Option<PathBuf>,
    /// Defaults to `~/.stackconf/stackconf.json5`.
    pub user_config_path: Option<PathBuf>,
    pub requirements_path: Option<PathBuf>,
    /// Must exist; applied in order after every discovered layer.
    pub runtime_paths: Vec<PathBuf>,
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: discovery::system_config_path(),
            user_config_path: discovery::user_config_path(),
            requirements_path: discovery::requirements_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    /// Options that only read the working directory and project layers.
    pub fn local_only(cwd: impl AsRef<Path>) -> Self {
        Self {
            system_config_path: None,
            user_config_path: None,
            requirements_path: None,
            ..Self::new(cwd)
        }
    }

    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

/// One candidate file in a [`LayerPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedLayer {
    source: ConfigLayerSource,
    path: PathBuf,
    /// A required layer that is missing fails the load.
    required: bool,
}

/// Candidate layers in precedence order, requirements excluded.
#[derive(Debug, Clone, Default)]
struct LayerPlan {
    requirements: Option<PathBuf>,
    layers: Vec<PlannedLayer>,
}

impl StackconfConfig {
    /// Read a single settings file without layering.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading settings from {}", path.display());
        let value = read_layer(path)?;
        decode_effective(value, &path.display().to_string())
    }

    /// Parse settings from JSON5 text without layering.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        let value: Value = json5::from_str(contents)?;
        decode_effective(value, "inline")
    }

    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load the full layer stack.
    ///
    /// Precedence, lowest first: requirements, system, user, project, cwd,
    /// repo, runtime. Keys set by requirements keep their required value.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let plan = discovery::plan(&options)?;
        let mut layers = Vec::new();
        let mut merged = Value::Object(Map::new());

        let requirements = match plan.requirements.as_deref() {
            Some(path) if path.exists() => {
                let value = read_validated(ConfigLayerSource::Requirements, path)?;
                merge::merge_json_values(&mut merged, &value);
                layers.push(ConfigLayer {
                    source: ConfigLayerSource::Requirements,
                    path: path.to_path_buf(),
                });
                Some(value)
            }
            _ => None,
        };

        let mut seen = HashSet::new();
        for planned in plan.layers {
            if !planned.required && !planned.path.exists() {
                debug!(
                    "no {} layer at {}",
                    planned.source.label(),
                    planned.path.display()
                );
                continue;
            }
            if !seen.insert(discovery::identity(&planned.path)) {
                debug!(
                    "{} layer {} already loaded",
                    planned.source.label(),
                    planned.path.display()
                );
                continue;
            }
            let value = read_validated(planned.source, &planned.path)?;
            merge::merge_json_with_constraints(&mut merged, &value, requirements.as_ref());
            layers.push(ConfigLayer {
                source: planned.source,
                path: planned.path,
            });
        }

        let config = decode_effective(merged, "effective")?;
        info!("settings loaded from {} layer(s)", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Checks that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.groups.default_group_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "groups.default_group_name must not be empty".to_string(),
            ));
        }
        if self.files.exceptions.iter().any(|entry| entry.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "files.exceptions entries must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_layer(path: &Path) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Ok(json5::from_str(&contents)?)
}

fn read_validated(source: ConfigLayerSource, path: &Path) -> Result<Value, ConfigError> {
    debug!("reading {} layer {}", source.label(), path.display());
    let value = read_layer(path)?;
    let label = format!("{}({})", source.label(), path.display());
    schema::check(&value, schema::Strictness::Layer, &label)?;
    Ok(value)
}

fn decode_effective(value: Value, label: &str) -> Result<StackconfConfig, ConfigError> {
    schema::check(&value, schema::Strictness::Effective, label)?;
    let config: StackconfConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
