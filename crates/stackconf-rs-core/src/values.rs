//! Value coercion shared by the default and override paths.

use crate::model::DisplayType;

/// Memory-size suffix carried by some int properties, e.g. `1024m`.
const MEMORY_SUFFIX: char = 'm';

/// A raw value after display coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedValue {
    pub value: String,
    pub memory_suffix: bool,
}

impl FormattedValue {
    fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            memory_suffix: false,
        }
    }
}

/// Coerce a raw stored value for display.
///
/// Ints drop a trailing `m` before parsing and fall back to an empty string
/// when they do not parse; checkboxes normalize to `true`/`false`;
/// `masterHosts` lists lose their brackets and quotes.
pub fn format_value(display_type: DisplayType, raw: &str) -> FormattedValue {
    match display_type {
        DisplayType::Int => format_int(raw),
        DisplayType::Checkbox => FormattedValue::plain(format_checkbox(raw)),
        DisplayType::MasterHosts => FormattedValue::plain(strip_host_list(raw)),
        _ => FormattedValue::plain(raw),
    }
}

fn format_int(raw: &str) -> FormattedValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FormattedValue::plain("");
    }
    let (digits, memory_suffix) = match trimmed.strip_suffix(MEMORY_SUFFIX) {
        Some(digits) => (digits, true),
        None => (trimmed, false),
    };
    match digits.parse::<i64>() {
        Ok(number) => FormattedValue {
            value: number.to_string(),
            memory_suffix,
        },
        Err(_) => FormattedValue::plain(""),
    }
}

fn format_checkbox(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        "true".to_string()
    } else if trimmed.eq_ignore_ascii_case("false") {
        "false".to_string()
    } else {
        raw.to_string()
    }
}

/// `['h1', "h2"]` -> `h1,h2`.
fn strip_host_list(raw: &str) -> String {
    raw.replace("&apos;", "")
        .chars()
        .filter(|ch| !matches!(ch, '[' | ']' | '\'' | '"'))
        .collect::<String>()
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Render a resolved value back into its persisted form.
pub fn wire_value(display_type: DisplayType, value: &str, memory_suffix: bool) -> String {
    match display_type {
        DisplayType::Int if memory_suffix && !value.is_empty() => {
            format!("{value}{MEMORY_SUFFIX}")
        }
        DisplayType::MasterHosts => {
            let hosts = value
                .split(',')
                .map(str::trim)
                .filter(|host| !host.is_empty())
                .map(|host| format!("'{host}'"))
                .collect::<Vec<_>>();
            format!("[{}]", hosts.join(","))
        }
        _ => value.to_string(),
    }
}

/// Display type for a property nothing declares: single-line values edit as
/// `advanced`, anything spanning lines as `multiLine`.
pub fn infer_display_type(raw: &str) -> DisplayType {
    if raw.contains('\n') {
        DisplayType::MultiLine
    } else {
        DisplayType::Advanced
    }
}
