//! # mirror-elastic
//!
//! Engine access for content-mirror: the HTTP client, the logical index
//! registry with blue-green alias rotation, and the parameter-map query
//! compiler.
//!
//! Writes always go through a logical index's write alias and reads
//! through its read alias, so physical backing indices can rotate
//! underneath running readers. The query compiler turns flat parameter
//! maps into bool queries, including the scripted sort that returns
//! documents in a caller-supplied id order.

pub mod aliases;
pub mod client;
pub mod error;
pub mod query;

pub use aliases::{AliasManager, IndexDescriptor, IndexNameSource, IndexRegistry, CORE_INDICES};
pub use client::EsClient;
pub use error::ElasticError;
pub use query::{CompiledQuery, QueryCompiler};
