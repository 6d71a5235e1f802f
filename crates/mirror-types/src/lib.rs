//! # mirror-types
//!
//! Shared domain types for the content-mirror system.
//!
//! This crate defines the core data structures used throughout the system:
//! - Field schemas: typed descriptions of authored custom fields
//! - Flat records: the prefix-encoded storage convention for nested data
//! - Documents: fully assembled per-entity bodies sent to the engine
//! - Content models: entities, terms, menu items, assets, SEO blocks
//! - Configuration: environment-driven settings shared by all crates

pub mod config;
pub mod content;
pub mod document;
pub mod error;
pub mod record;
pub mod schema;

pub use config::MirrorConfig;
pub use content::{AssetData, Entity, MenuItem, MetaTag, SeoData, Term};
pub use document::Document;
pub use error::SchemaError;
pub use record::FlatRecord;
pub use schema::{FieldKind, FieldSchema, Layout, LAYOUT_KEY};
