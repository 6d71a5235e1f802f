//! Error types for document assembly.

use thiserror::Error;

use mirror_fields::FieldError;

/// Errors that can occur while assembling documents.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// Field materialization failed.
    #[error("Field error: {0}")]
    Field(#[from] FieldError),

    /// The content store failed (transport/backend, not a missing record).
    #[error("Content store error: {0}")]
    Store(String),

    /// The SEO provider failed.
    #[error("SEO provider error: {0}")]
    Seo(String),
}

impl AssembleError {
    /// Create a content store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create an SEO provider error.
    pub fn seo(message: impl Into<String>) -> Self {
        Self::Seo(message.into())
    }
}
