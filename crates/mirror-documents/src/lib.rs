//! # mirror-documents
//!
//! Document assembly: one engine-ready document per content entity.
//!
//! The assembler merges materialized custom fields with core entity
//! attributes, taxonomy term lists, an SEO block, the featured asset, and
//! the entity content parsed into a `blocks` array with per-block field
//! materialization.
//! Core attributes are written last so a custom field can never shadow a
//! core attribute of the same name. Navigation menus additionally embed
//! their items so a menu reads back atomically as one document.

pub mod assembler;
pub mod blocks;
pub mod error;
pub mod store;

pub use assembler::DocumentAssembler;
pub use blocks::{parse_blocks, ContentBlock};
pub use error::AssembleError;
pub use store::{ContentStore, FieldTarget, SeoKind, SeoProvider};
