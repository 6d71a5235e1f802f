//! External collaborator traits.
//!
//! The content store and the SEO provider are opaque data sources; the
//! core never reimplements them. Implementations adapt whatever CMS
//! backend is in play.

use async_trait::async_trait;

use mirror_types::{Entity, FieldSchema, FlatRecord, MenuItem, SeoData, Term};

use crate::error::AssembleError;

/// Whose custom fields a schema/record lookup targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    /// A content entity's fields.
    Entity(i64),
    /// A taxonomy term's fields.
    Term(i64),
    /// The site-wide option records.
    Options,
}

/// Which kind of content an SEO lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeoKind {
    Post,
    Term,
}

/// Read access to the content store.
///
/// Missing records are `Ok(None)` / empty vectors; `Err` means the backend
/// itself failed.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn entity(&self, id: i64) -> Result<Option<Entity>, AssembleError>;

    async fn term(&self, id: i64) -> Result<Option<Term>, AssembleError>;

    async fn entities_of_type(&self, entity_type: &str) -> Result<Vec<Entity>, AssembleError>;

    async fn terms_of_taxonomy(&self, taxonomy: &str) -> Result<Vec<Term>, AssembleError>;

    /// Terms attached to one entity, across all taxonomies.
    async fn entity_terms(&self, entity_id: i64) -> Result<Vec<Term>, AssembleError>;

    /// Registered entity type names, including dynamically added ones.
    async fn entity_types(&self) -> Result<Vec<String>, AssembleError>;

    /// Registered taxonomy names, including dynamically added ones.
    async fn taxonomies(&self) -> Result<Vec<String>, AssembleError>;

    /// All navigation menus (terms of the menu taxonomy).
    async fn menus(&self) -> Result<Vec<Term>, AssembleError>;

    /// Ordered items of one menu.
    async fn menu_items(&self, menu: &Term) -> Result<Vec<MenuItem>, AssembleError>;

    async fn permalink(&self, entity_id: i64) -> Result<String, AssembleError>;

    async fn term_link(&self, term: &Term) -> Result<String, AssembleError>;

    /// Declared field schemas for a target. Empty when none are authored.
    async fn field_schemas(&self, target: &FieldTarget) -> Result<Vec<FieldSchema>, AssembleError>;

    /// Declared field schemas for a registered content block type
    /// (`two_column`, not `acf/two-column`). Empty when unregistered.
    async fn block_field_schemas(&self, block_type: &str)
        -> Result<Vec<FieldSchema>, AssembleError>;

    /// Raw flat field values for a target.
    async fn flat_record(&self, target: &FieldTarget) -> Result<FlatRecord, AssembleError>;
}

/// SEO metadata provider.
#[async_trait]
pub trait SeoProvider: Send + Sync {
    async fn seo(&self, id: i64, kind: SeoKind) -> Result<SeoData, AssembleError>;
}
