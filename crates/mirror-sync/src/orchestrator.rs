//! Full-sweep and incremental sync orchestration.
//!
//! A full sweep brackets every logical index with a rotation: begin all
//! rotations, write every document through the write aliases, then commit
//! so readers flip atomically to the freshly filled backing indices.
//! Individual document failures are counted and logged, not fatal; a
//! rotation failure aborts the sweep and leaves readers on the previous
//! backing indices.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use mirror_documents::{ContentStore, DocumentAssembler};
use mirror_types::{Document, Entity, Term};

use crate::engine::Engine;
use crate::error::SyncError;

/// Entity types that never sync on save: menu items sync through their
/// menu, and the authoring framework's internal records never sync.
const SKIPPED_ENTITY_TYPES: &[&str] = &["nav_menu_item", "revision"];

/// Progress report for a full sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Total documents stored.
    pub stored: u64,
    /// Number of documents that failed to assemble or store.
    pub errors: u64,
    /// Stored-document counts per logical index.
    pub per_index: BTreeMap<String, u64>,
    /// Whether the sweep committed its rotations.
    pub completed: bool,
}

impl SweepReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully stored document.
    pub fn record_stored(&mut self, logical: &str) {
        self.stored += 1;
        *self.per_index.entry(logical.to_string()).or_insert(0) += 1;
    }

    /// Record a failed document.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }
}

/// Drives document assembly and engine writes.
pub struct SyncOrchestrator {
    store: Arc<dyn ContentStore>,
    assembler: Arc<DocumentAssembler>,
    engine: Arc<dyn Engine>,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn ContentStore>,
        assembler: Arc<DocumentAssembler>,
        engine: Arc<dyn Engine>,
    ) -> Self {
        Self {
            store,
            assembler,
            engine,
        }
    }

    /// Rebuild every logical index from the content store.
    pub async fn sync_all(&self) -> Result<SweepReport, SyncError> {
        let indices = self.engine.logical_indices().await?;
        for logical in &indices {
            self.engine.begin_rotation(logical).await?;
        }

        let mut report = SweepReport::new();
        self.sweep_options(&mut report).await;
        self.sweep_menus(&mut report).await;

        let mut entity_types = self.store.entity_types().await.map_err(SyncError::from)?;
        for core in ["page", "post"] {
            if !entity_types.iter().any(|t| t == core) {
                entity_types.push(core.to_string());
            }
        }
        for entity_type in entity_types
            .iter()
            .filter(|t| !SKIPPED_ENTITY_TYPES.contains(&t.as_str()))
        {
            self.sweep_entities(entity_type, &mut report).await?;
        }

        let mut taxonomies = self.store.taxonomies().await.map_err(SyncError::from)?;
        if !taxonomies.iter().any(|t| t == "category") {
            taxonomies.push("category".to_string());
        }
        // Menus are terms of nav_menu but sync as whole-menu documents.
        for taxonomy in taxonomies.iter().filter(|t| *t != "nav_menu") {
            self.sweep_terms(taxonomy, &mut report).await?;
        }

        for logical in &indices {
            self.engine.commit_rotation(logical).await?;
        }
        report.completed = true;

        info!(
            stored = report.stored,
            errors = report.errors,
            indices = indices.len(),
            "Full sweep finished"
        );
        Ok(report)
    }

    /// Look up an entity by id and sync it. Unknown ids are `Ok(None)`.
    pub async fn sync_one(&self, entity_id: i64) -> Result<Option<Document>, SyncError> {
        match self.store.entity(entity_id).await.map_err(SyncError::from)? {
            Some(entity) => Ok(Some(self.sync_entity(&entity).await?)),
            None => Ok(None),
        }
    }

    /// Assemble and store one entity's document.
    pub async fn sync_entity(&self, entity: &Entity) -> Result<Document, SyncError> {
        let document = self.assembler.entity_document(entity).await?;
        self.engine.store(&document).await?;
        Ok(document)
    }

    /// Assemble and store one term's document.
    pub async fn sync_term(&self, term: &Term) -> Result<Document, SyncError> {
        let document = self.assembler.term_document(term).await?;
        self.engine.store(&document).await?;
        Ok(document)
    }

    /// Assemble and store one menu's document, items embedded.
    pub async fn sync_menu(&self, menu: &Term) -> Result<Document, SyncError> {
        let document = self.assembler.menu_document(menu).await?;
        self.engine.store(&document).await?;
        Ok(document)
    }

    /// Assemble and store all option-page documents.
    pub async fn sync_options(&self) -> Result<Vec<Document>, SyncError> {
        let documents = self.assembler.option_documents().await?;
        for document in &documents {
            self.engine.store(document).await?;
        }
        Ok(documents)
    }

    /// Delete every document in a logical index matching a parameter map.
    pub async fn delete_where(
        &self,
        logical: &str,
        params: &Map<String, Value>,
    ) -> Result<(), SyncError> {
        self.engine.delete_where(logical, params).await
    }

    /// Remove an entity's document from its logical index.
    pub async fn delete_entity(&self, entity: &Entity) -> Result<(), SyncError> {
        let params: Map<String, Value> =
            [("ID".to_string(), json!(entity.id))].into_iter().collect();
        self.engine.delete_where(&entity.post_type, &params).await
    }

    /// Save-hook entry point for entities.
    ///
    /// Initial inserts and the authoring framework's internal record types
    /// never sync; menu items sync through their menu instead.
    pub async fn on_entity_saved(
        &self,
        entity: &Entity,
        is_update: bool,
    ) -> Result<Option<Document>, SyncError> {
        if !is_update
            || entity.post_type.starts_with("acf-")
            || SKIPPED_ENTITY_TYPES.contains(&entity.post_type.as_str())
        {
            return Ok(None);
        }
        Ok(Some(self.sync_entity(entity).await?))
    }

    /// Save-hook entry point for terms. Menu terms sync via
    /// [`Self::on_menu_updated`].
    pub async fn on_term_saved(&self, term: &Term) -> Result<Option<Document>, SyncError> {
        if term.taxonomy == "nav_menu" {
            return Ok(None);
        }
        Ok(Some(self.sync_term(term).await?))
    }

    /// Menu-change hook entry point.
    pub async fn on_menu_updated(&self, menu: &Term) -> Result<Document, SyncError> {
        self.sync_menu(menu).await
    }

    async fn sweep_options(&self, report: &mut SweepReport) {
        match self.assembler.option_documents().await {
            Ok(documents) => {
                for document in documents {
                    self.store_counted(&document, report).await;
                }
            }
            Err(error) => {
                warn!(%error, "Failed to assemble option documents");
                report.record_error();
            }
        }
    }

    async fn sweep_menus(&self, report: &mut SweepReport) {
        let menus = match self.store.menus().await {
            Ok(menus) => menus,
            Err(error) => {
                warn!(%error, "Failed to list menus");
                report.record_error();
                return;
            }
        };
        for menu in menus {
            match self.assembler.menu_document(&menu).await {
                Ok(document) => self.store_counted(&document, report).await,
                Err(error) => {
                    warn!(menu = %menu.slug, %error, "Failed to assemble menu document");
                    report.record_error();
                }
            }
        }
    }

    async fn sweep_entities(
        &self,
        entity_type: &str,
        report: &mut SweepReport,
    ) -> Result<(), SyncError> {
        let entities = self
            .store
            .entities_of_type(entity_type)
            .await
            .map_err(SyncError::from)?;
        for entity in entities {
            match self.assembler.entity_document(&entity).await {
                Ok(document) => self.store_counted(&document, report).await,
                Err(error) => {
                    warn!(id = entity.id, entity_type, %error, "Failed to assemble document");
                    report.record_error();
                }
            }
        }
        Ok(())
    }

    async fn sweep_terms(&self, taxonomy: &str, report: &mut SweepReport) -> Result<(), SyncError> {
        let terms = self
            .store
            .terms_of_taxonomy(taxonomy)
            .await
            .map_err(SyncError::from)?;
        for term in terms {
            match self.assembler.term_document(&term).await {
                Ok(document) => self.store_counted(&document, report).await,
                Err(error) => {
                    warn!(term_id = term.term_id, taxonomy, %error, "Failed to assemble term document");
                    report.record_error();
                }
            }
        }
        Ok(())
    }

    async fn store_counted(&self, document: &Document, report: &mut SweepReport) {
        match self.engine.store(document).await {
            Ok(()) => report.record_stored(&document.logical_index),
            Err(error) => {
                warn!(
                    id = %document.id,
                    index = %document.logical_index,
                    %error,
                    "Failed to store document"
                );
                report.record_error();
            }
        }
    }
}
