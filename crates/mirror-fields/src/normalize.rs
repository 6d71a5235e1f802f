//! Post-processing of materialized trees.
//!
//! The flat storage convention cannot distinguish "boolean false" from
//! "field not computed yet", and the engine requires consistent per-field
//! typing across all documents in an index. Every `false` therefore
//! normalizes to null, except under keys the configuration allow-lists as
//! genuinely boolean.

use serde_json::Value;

use mirror_types::MirrorConfig;

/// Recursively normalize a materialized tree in place.
///
/// - `false` leaves become null unless their key is allow-listed. Leaves
///   inside plain lists have no key and always normalize.
/// - A leaf scalar under a key literally named `link` is wrapped as
///   `{"string_value": value}`: sibling `link` fields at the same tree
///   depth must share one schema shape in the engine's index mapping.
pub fn normalize_tree(value: &mut Value, config: &MirrorConfig) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                normalize_entry(Some(key.as_str()), entry, config);
            }
        }
        Value::Array(items) => {
            for entry in items.iter_mut() {
                normalize_entry(None, entry, config);
            }
        }
        _ => {}
    }
}

fn normalize_entry(key: Option<&str>, value: &mut Value, config: &MirrorConfig) {
    match value {
        Value::Bool(false) => {
            let allowed = key.map(|k| config.allows_boolean(k)).unwrap_or(false);
            if !allowed {
                *value = Value::Null;
            }
        }
        Value::Object(_) | Value::Array(_) => normalize_tree(value, config),
        Value::Null => {}
        _ => {
            if key == Some("link") {
                let wrapped = std::mem::take(value);
                *value = serde_json::json!({ "string_value": wrapped });
            }
        }
    }
}
