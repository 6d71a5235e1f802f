//! Error types for engine access.

use thiserror::Error;

/// Errors that can occur while talking to the search engine.
#[derive(Debug, Error)]
pub enum ElasticError {
    /// A logical index name outside the known registry was requested.
    #[error("Unknown index: '{0}' is not a registered logical index")]
    UnknownIndex(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-success status.
    #[error("Engine returned {status} for {context}: {body}")]
    EngineStatus {
        status: u16,
        context: String,
        body: String,
    },

    /// The engine answered 2xx but the payload was not the expected shape.
    #[error("Unexpected engine response: {0}")]
    UnexpectedResponse(String),
}

impl ElasticError {
    /// Create an engine status error.
    pub fn engine_status(status: u16, context: impl Into<String>, body: impl Into<String>) -> Self {
        Self::EngineStatus {
            status,
            context: context.into(),
            body: body.into(),
        }
    }

    /// Create an unexpected response error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse(message.into())
    }
}
