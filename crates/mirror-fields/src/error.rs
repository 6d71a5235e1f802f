//! Error types for field materialization.

use thiserror::Error;

/// Errors that can occur while materializing fields.
///
/// Missing referenced data (attachments, posts, terms) is never an error;
/// these variants cover structurally malformed input and resolver
/// transport failures.
#[derive(Debug, Error)]
pub enum FieldError {
    /// A flexible-content entry names a layout the schema does not declare.
    #[error("Field '{field}' has no layout named '{layout}'")]
    UnknownLayout { field: String, layout: String },

    /// A clone subfield names a target absent from the current layout.
    #[error("Field '{field}' clones unknown target '{target}'")]
    UnknownCloneTarget { field: String, target: String },

    /// A flat repeater value is neither a list nor an entry count.
    #[error("Field '{field}' has a non-numeric repeater count: {value}")]
    InvalidRepeaterCount { field: String, value: String },

    /// A resolver capability failed (not a missing record, an actual
    /// failure reaching the backing store).
    #[error("Resolver error: {0}")]
    Resolver(String),

    /// Fetching inline markup for an SVG asset failed.
    #[error("Markup fetch error: {0}")]
    Fetch(#[from] reqwest::Error),
}

impl FieldError {
    /// Create a resolver error.
    pub fn resolver(message: impl Into<String>) -> Self {
        Self::Resolver(message.into())
    }
}
