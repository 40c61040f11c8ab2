//! Compiled merge settings.

use crate::error::CoreError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use stackconf_rs_config::StackconfConfig;

const XML_SUFFIX: &str = ".xml";

/// Settings consumed by the merger, resolver and session, compiled once from
/// a `StackconfConfig`.
#[derive(Debug, Clone)]
pub struct MergeSettings {
    filename_exceptions: Vec<String>,
    custom_file_names: Vec<String>,
    host_references: GlobSet,
    always_included_services: Vec<String>,
    /// Append stack-declared properties without a stored value.
    pub include_stack_defaults: bool,
    /// Name of the synthesized default config group.
    pub default_group_name: String,
    /// Whether resolved properties may be edited at all.
    pub allow_edit: bool,
}

impl MergeSettings {
    /// Compile settings, building the host-reference glob set.
    pub fn from_config(config: &StackconfConfig) -> Result<Self, CoreError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.merge.host_reference_properties {
            let glob = Glob::new(pattern)
                .map_err(|err| CoreError::Pattern(format!("{pattern}: {err}")))?;
            builder.add(glob);
        }
        let host_references = builder
            .build()
            .map_err(|err| CoreError::Pattern(err.to_string()))?;
        Ok(Self {
            filename_exceptions: config.files.exceptions.clone(),
            custom_file_names: config.files.custom.clone(),
            host_references,
            always_included_services: config.merge.always_included_services.clone(),
            include_stack_defaults: config.merge.include_stack_defaults,
            default_group_name: config.groups.default_group_name.clone(),
            allow_edit: config.session.allow_edit,
        })
    }

    /// Map a site type to its config filename: `.xml` is appended unless the
    /// name already carries it or is a listed exception.
    pub fn normalize_filename(&self, site: &str) -> String {
        if site.ends_with(XML_SUFFIX) || self.filename_exceptions.iter().any(|name| name == site)
        {
            site.to_string()
        } else {
            format!("{site}{XML_SUFFIX}")
        }
    }

    /// Whether properties of this file take the service category.
    pub fn is_custom_file(&self, filename: &str) -> bool {
        self.custom_file_names.iter().any(|name| name == filename)
    }

    /// Whether a catalog-only property must surface before the first save.
    pub fn is_host_reference(&self, name: &str) -> bool {
        self.host_references.is_match(name)
    }

    /// Whether a service's catalog properties are always merged.
    pub fn is_always_included(&self, service_name: &str) -> bool {
        self.always_included_services
            .iter()
            .any(|name| name == service_name)
    }
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self::from_config(&StackconfConfig::default()).unwrap_or_else(|_| Self {
            filename_exceptions: Vec::new(),
            custom_file_names: Vec::new(),
            host_references: GlobSet::empty(),
            always_included_services: Vec::new(),
            include_stack_defaults: false,
            default_group_name: "Default".to_string(),
            allow_edit: true,
        })
    }
}

/// Site type of a filename: the filename without its `.xml` suffix.
pub fn file_type(filename: &str) -> &str {
    filename.strip_suffix(XML_SUFFIX).unwrap_or(filename)
}
