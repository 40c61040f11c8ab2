//! JSON merge helpers for layered settings.
//!
//! Objects merge key by key, everything else is replaced wholesale. A `null`
//! in an overlay clears the key so the model default applies again.

use serde_json::{Map, Value};

/// Merge overlay values into the base, recursively overriding objects.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if value.is_null() {
                    base_map.remove(key);
                    continue;
                }
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

/// Merge overlay values into base, skipping keys locked by requirements.
///
/// A requirement object descends into the matching overlay object; any other
/// requirement value locks the key outright.
pub(super) fn merge_json_with_constraints(
    base: &mut Value,
    overlay: &Value,
    constraints: Option<&Value>,
) {
    let Some(constraints) = constraints else {
        merge_json_values(base, overlay);
        return;
    };
    let Value::Object(constraint_map) = constraints else {
        return;
    };
    let (Value::Object(base_map), Value::Object(overlay_map)) = (&mut *base, overlay) else {
        return;
    };

    for (key, value) in overlay_map {
        match constraint_map.get(key) {
            None => {
                if value.is_null() {
                    base_map.remove(key);
                    continue;
                }
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
            Some(nested @ Value::Object(_)) => {
                let entry = base_map
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                merge_json_with_constraints(entry, value, Some(nested));
            }
            Some(_) => {
                // Locked by requirements.
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn null_overlay_clears_key() {
        let mut base = json!({ "files": { "exceptions": ["zoo.cfg"], "custom": [] } });
        merge_json_values(&mut base, &json!({ "files": { "exceptions": null } }));
        assert_eq!(base, json!({ "files": { "custom": [] } }));
    }

    #[test]
    fn locked_key_survives_overlay() {
        let locked = json!({ "session": { "allow_edit": false } });
        let mut base = locked.clone();
        merge_json_with_constraints(
            &mut base,
            &json!({ "session": { "allow_edit": true }, "groups": { "default_group_name": "All" } }),
            Some(&locked),
        );
        assert_eq!(
            base,
            json!({ "session": { "allow_edit": false }, "groups": { "default_group_name": "All" } })
        );
    }
}
