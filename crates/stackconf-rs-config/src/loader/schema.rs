//! Structural checks for settings files.
//!
//! serde would silently ignore misspelled keys, so every layer is checked
//! against a table of known sections and field kinds first.

use crate::ConfigError;
use globset::Glob;
use serde_json::Value;

/// How much checking to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Strictness {
    /// A single layer: keys and types only.
    Layer,
    /// The merged result: also compiles glob patterns.
    Effective,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Bool,
    Text,
    TextList,
    GlobList,
}

const SECTIONS: &[(&str, &[(&str, Kind)])] = &[
    (
        "files",
        &[("exceptions", Kind::TextList), ("custom", Kind::TextList)],
    ),
    (
        "merge",
        &[
            ("host_reference_properties", Kind::GlobList),
            ("include_stack_defaults", Kind::Bool),
            ("always_included_services", Kind::TextList),
        ],
    ),
    ("groups", &[("default_group_name", Kind::Text)]),
    ("session", &[("allow_edit", Kind::Bool)]),
];

/// Check a settings document. `null` anywhere means "reset" and is accepted.
pub(super) fn check(value: &Value, strictness: Strictness, layer: &str) -> Result<(), ConfigError> {
    let Value::Object(root) = value else {
        return Err(invalid(layer, "root", "expected object"));
    };
    for (key, value) in root {
        if value.is_null() {
            continue;
        }
        if key == "$schema" {
            if !value.is_string() {
                return Err(invalid(layer, key, "expected string"));
            }
            continue;
        }
        let Some((_, fields)) = SECTIONS.iter().find(|(name, _)| *name == key.as_str()) else {
            return Err(invalid(layer, key, "unknown key"));
        };
        let Value::Object(section) = value else {
            return Err(invalid(layer, key, "expected object"));
        };
        for (field, value) in section {
            let path = format!("{key}.{field}");
            let Some((_, kind)) = fields.iter().find(|(name, _)| *name == field.as_str()) else {
                return Err(invalid(layer, &path, "unknown key"));
            };
            if !value.is_null() {
                check_field(value, *kind, strictness, layer, &path)?;
            }
        }
    }
    Ok(())
}

fn check_field(
    value: &Value,
    kind: Kind,
    strictness: Strictness,
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match kind {
        Kind::Bool if !value.is_boolean() => Err(invalid(layer, path, "expected bool")),
        Kind::Text if !value.is_string() => Err(invalid(layer, path, "expected string")),
        Kind::Bool | Kind::Text => Ok(()),
        Kind::TextList | Kind::GlobList => {
            let Value::Array(entries) = value else {
                return Err(invalid(layer, path, "expected array"));
            };
            for (idx, entry) in entries.iter().enumerate() {
                let Some(text) = entry.as_str() else {
                    return Err(invalid(layer, &format!("{path}[{idx}]"), "expected string"));
                };
                if matches!(kind, Kind::GlobList) && strictness == Strictness::Effective {
                    Glob::new(text).map_err(|err| {
                        invalid(layer, &format!("{path}[{idx}]"), &format!("invalid glob: {err}"))
                    })?;
                }
            }
            Ok(())
        }
    }
}

fn invalid(layer: &str, path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}
