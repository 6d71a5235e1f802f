//! Assembled documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One fully assembled document, identified by entity id and logical index.
///
/// The body is the materialized custom-field tree merged with the
/// assembler-added core attributes. Every write fully replaces the prior
/// body for the same id; documents are never partially patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier within the logical index (entity id, term id, menu slug).
    pub id: String,
    /// Logical index the document belongs to.
    pub logical_index: String,
    /// Document body as sent to the engine.
    pub body: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, logical_index: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            logical_index: logical_index.into(),
            body: Map::new(),
        }
    }

    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = body;
        self
    }

    /// Look up a body field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }
}
