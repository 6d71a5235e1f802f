//! Flat record storage convention.
//!
//! The authoring framework stores nested/repeated field data flattened into
//! individually keyed entries: subfield `child` of repeater `parent` at
//! index `i` lives under `parent_i_child`, a group subfield under
//! `parent_child`, each optionally prefixed by an enclosing composite's own
//! prefix chain. Records are partial; any declared key may be absent.

use serde_json::{Map, Value};

/// A flat map of raw field values keyed by their prefix-encoded names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord(Map<String, Value>);

impl FlatRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Look up a raw value by its flattened key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for FlatRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FlatRecord {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Compose the flattened key for a subfield.
///
/// An enclosing prefix chain wins over the field's own name, which only
/// seeds the chain at the top level.
pub fn field_prefix(base_prefix: &str, field_name: &str, suffix: &str) -> String {
    if base_prefix.is_empty() {
        format!("{field_name}_{suffix}")
    } else {
        format!("{base_prefix}_{suffix}")
    }
}
