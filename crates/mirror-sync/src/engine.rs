//! Engine facade used by the orchestrator.
//!
//! The orchestrator only needs a handful of verbs; this trait narrows the
//! full client/alias/query surface down to them and lets tests substitute
//! an in-memory engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use mirror_documents::ContentStore;
use mirror_elastic::{AliasManager, ElasticError, EsClient, IndexNameSource, QueryCompiler};
use mirror_types::Document;

use crate::error::SyncError;

/// Storage engine operations needed by the sync orchestrator.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Store a document behind its logical index's write alias.
    async fn store(&self, document: &Document) -> Result<(), SyncError>;

    /// Fetch one document by id through the read alias.
    async fn find(&self, logical: &str, id: &str) -> Result<Option<Value>, SyncError>;

    /// Search by parameter map through the read alias.
    async fn find_where(
        &self,
        logical: &str,
        params: &Map<String, Value>,
    ) -> Result<Vec<Value>, SyncError>;

    /// Delete every document matching a parameter map.
    async fn delete_where(
        &self,
        logical: &str,
        params: &Map<String, Value>,
    ) -> Result<(), SyncError>;

    async fn begin_rotation(&self, logical: &str) -> Result<(), SyncError>;

    async fn commit_rotation(&self, logical: &str) -> Result<(), SyncError>;

    /// All known logical index names.
    async fn logical_indices(&self) -> Result<Vec<String>, SyncError>;
}

/// Adapts the content store as the registry's source of dynamic index
/// names.
pub struct StoreIndexSource {
    store: Arc<dyn ContentStore>,
}

impl StoreIndexSource {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IndexNameSource for StoreIndexSource {
    async fn entity_types(&self) -> Result<Vec<String>, ElasticError> {
        self.store
            .entity_types()
            .await
            .map_err(|e| ElasticError::unexpected(e.to_string()))
    }

    async fn taxonomies(&self) -> Result<Vec<String>, ElasticError> {
        self.store
            .taxonomies()
            .await
            .map_err(|e| ElasticError::unexpected(e.to_string()))
    }
}

/// The production engine: HTTP client + alias manager + query compiler.
pub struct ElasticEngine {
    client: Arc<EsClient>,
    aliases: Arc<AliasManager>,
    compiler: QueryCompiler,
}

impl ElasticEngine {
    pub fn new(client: Arc<EsClient>, aliases: Arc<AliasManager>, compiler: QueryCompiler) -> Self {
        Self {
            client,
            aliases,
            compiler,
        }
    }
}

#[async_trait]
impl Engine for ElasticEngine {
    async fn store(&self, document: &Document) -> Result<(), SyncError> {
        let write_alias = self.aliases.write_alias(&document.logical_index).await?;
        self.client
            .index_document(&write_alias, &document.id, &document.body)
            .await?;
        Ok(())
    }

    async fn find(&self, logical: &str, id: &str) -> Result<Option<Value>, SyncError> {
        let read_alias = self.aliases.read_alias(logical).await?;
        Ok(self.client.get_document(&read_alias, id).await?)
    }

    async fn find_where(
        &self,
        logical: &str,
        params: &Map<String, Value>,
    ) -> Result<Vec<Value>, SyncError> {
        let read_alias = self.aliases.read_alias(logical).await?;
        let compiled = self.compiler.compile(params);
        Ok(self.client.search(&read_alias, &compiled.body).await?)
    }

    async fn delete_where(
        &self,
        logical: &str,
        params: &Map<String, Value>,
    ) -> Result<(), SyncError> {
        let read_alias = self.aliases.read_alias(logical).await?;
        let compiled = self.compiler.compile(params);
        // The delete endpoint takes only the query clause, not paging or
        // sort controls.
        let body = serde_json::json!({ "query": compiled.body["query"].clone() });
        self.client.delete_by_query(&read_alias, &body).await?;
        Ok(())
    }

    async fn begin_rotation(&self, logical: &str) -> Result<(), SyncError> {
        self.aliases.begin_rotation(logical).await?;
        Ok(())
    }

    async fn commit_rotation(&self, logical: &str) -> Result<(), SyncError> {
        self.aliases.commit_rotation(logical).await?;
        Ok(())
    }

    async fn logical_indices(&self) -> Result<Vec<String>, SyncError> {
        Ok(self.aliases.registry().logical_indices().await?)
    }
}
