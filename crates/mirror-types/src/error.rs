//! Error types for schema parsing and configuration.

use thiserror::Error;

/// Errors raised while interpreting field schemas or configuration.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A composite field definition is missing its subfield list.
    #[error("Field '{0}' declares a composite kind but no sub_fields")]
    MissingSubFields(String),

    /// A flexible field definition is missing its layout list.
    #[error("Field '{0}' declares flexible content but no layouts")]
    MissingLayouts(String),

    /// A clone field definition names no target.
    #[error("Field '{0}' declares a clone but no target")]
    MissingCloneTarget(String),

    /// A schema definition could not be interpreted.
    #[error("Invalid field definition: {0}")]
    InvalidField(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
