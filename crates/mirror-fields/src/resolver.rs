//! Capability traits the materializer depends on.
//!
//! Post/term reference expansion is mutually recursive with document
//! assembly; the cycle is broken by depending on `DocumentResolver` here
//! and implementing it on the assembler side, with the recursion depth
//! threaded through the interface.

use async_trait::async_trait;
use serde_json::{Map, Value};

use mirror_types::AssetData;

use crate::error::FieldError;

/// Resolves attachment ids to asset descriptors.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Look up an attachment. A missing attachment is `Ok(None)`.
    async fn asset(&self, id: i64) -> Result<Option<AssetData>, FieldError>;

    /// Fetch raw markup for an asset url (used for inline SVG content).
    async fn raw_markup(&self, url: &str) -> Result<String, FieldError>;
}

/// Resolves entity/term references to their assembled documents.
///
/// `depth` counts how many reference expansions are already on the stack;
/// implementations materialize the referenced entity's own fields at
/// `depth + 1` so references inside an expanded reference are not
/// re-expanded.
#[async_trait]
pub trait DocumentResolver: Send + Sync {
    /// Assemble the document for a referenced entity. Missing → `Ok(None)`.
    async fn resolve_post(&self, id: i64, depth: u32)
        -> Result<Option<Map<String, Value>>, FieldError>;

    /// Assemble the document for a referenced term. Missing → `Ok(None)`.
    async fn resolve_term(&self, id: i64, depth: u32)
        -> Result<Option<Map<String, Value>>, FieldError>;
}
