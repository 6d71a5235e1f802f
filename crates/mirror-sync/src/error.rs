//! Error types for sync orchestration.

use thiserror::Error;

use mirror_documents::AssembleError;
use mirror_elastic::ElasticError;

/// Errors that can occur while syncing content into the engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Document assembly failed.
    #[error("Assembly error: {0}")]
    Assemble(#[from] AssembleError),

    /// The engine rejected or failed an operation.
    #[error("Engine error: {0}")]
    Elastic(#[from] ElasticError),
}
