//! Logical index registry and blue-green alias rotation.
//!
//! Each logical index (an entity type, taxonomy, or one of the fixed core
//! names) resolves to a physical naming scheme
//! `{site_index_key}{blog_id}_{environment}_{logical}`. That physical name
//! is the read alias; `{read}_write` is the write alias; backing indices
//! are `{read}_{timestamp}`. Rotation fills a fresh backing index behind
//! the write alias and atomically repoints the read alias at commit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, warn};

use mirror_types::MirrorConfig;

use crate::client::EsClient;
use crate::error::ElasticError;

/// Logical indices that always exist, independent of registered content
/// types: the content roots, navigation, option records, and SEO data.
pub const CORE_INDICES: &[&str] = &["page", "post", "category", "nav_menu", "options", "seo"];

/// Source of dynamically registered index names.
#[async_trait]
pub trait IndexNameSource: Send + Sync {
    async fn entity_types(&self) -> Result<Vec<String>, ElasticError>;

    async fn taxonomies(&self) -> Result<Vec<String>, ElasticError>;
}

/// Memoized set of known logical index names.
///
/// The set is computed once per process and held until `invalidate` is
/// called, which callers must do when new entity types are registered.
pub struct IndexRegistry {
    source: Arc<dyn IndexNameSource>,
    cached: RwLock<Option<Vec<String>>>,
}

impl IndexRegistry {
    pub fn new(source: Arc<dyn IndexNameSource>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// The union of the core set with every registered entity type and
    /// taxonomy, deduplicated and sorted.
    pub async fn logical_indices(&self) -> Result<Vec<String>, ElasticError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let mut names: Vec<String> = CORE_INDICES.iter().map(|s| s.to_string()).collect();
        names.extend(self.source.entity_types().await?);
        names.extend(self.source.taxonomies().await?);
        names.sort();
        names.dedup();

        *self.cached.write().await = Some(names.clone());
        Ok(names)
    }

    pub async fn contains(&self, name: &str) -> Result<bool, ElasticError> {
        Ok(self.logical_indices().await?.iter().any(|n| n == name))
    }

    /// Drop the memoized set so the next lookup recomputes it.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    /// Invalidate and recompute in one step.
    pub async fn refresh(&self) -> Result<Vec<String>, ElasticError> {
        self.invalidate().await;
        self.logical_indices().await
    }
}

/// Resolved naming for one logical index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub logical_name: String,
    pub read_alias: String,
    pub write_alias: String,
}

impl IndexDescriptor {
    /// Backing index name for a rotation timestamp.
    pub fn backing_index(&self, timestamp: &str) -> String {
        format!("{}_{}", self.read_alias, timestamp)
    }
}

/// Owns alias state transitions for all logical indices.
pub struct AliasManager {
    client: Arc<EsClient>,
    registry: Arc<IndexRegistry>,
    config: MirrorConfig,
}

impl AliasManager {
    pub fn new(client: Arc<EsClient>, registry: Arc<IndexRegistry>, config: MirrorConfig) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Physical read alias for a logical index. `*` addresses all of this
    /// site's indices; any other unregistered name is a contract violation.
    pub async fn read_alias(&self, logical: &str) -> Result<String, ElasticError> {
        if logical != "*" && !self.registry.contains(logical).await? {
            return Err(ElasticError::UnknownIndex(logical.to_string()));
        }
        Ok(format!(
            "{}{}_{}_{}",
            self.config.site_index_key, self.config.blog_id, self.config.environment, logical
        ))
    }

    pub async fn write_alias(&self, logical: &str) -> Result<String, ElasticError> {
        Ok(format!("{}_write", self.read_alias(logical).await?))
    }

    /// Full naming for a logical index.
    pub async fn describe(&self, logical: &str) -> Result<IndexDescriptor, ElasticError> {
        let read_alias = self.read_alias(logical).await?;
        Ok(IndexDescriptor {
            logical_name: logical.to_string(),
            write_alias: format!("{read_alias}_write"),
            read_alias,
        })
    }

    /// Start a rotation: detach the write alias from its current holders,
    /// delete holders left with zero aliases (debris of an aborted
    /// rotation), create a fresh timestamped backing index, and point the
    /// write alias at it. Returns the new backing index name.
    ///
    /// The read alias is untouched; a failure here leaves readers on the
    /// previous backing index.
    pub async fn begin_rotation(&self, logical: &str) -> Result<String, ElasticError> {
        let descriptor = self.describe(logical).await?;
        let new_index =
            descriptor.backing_index(&Utc::now().format("%Y%m%d%H%M%S").to_string());

        let detached = self.detach_alias(&descriptor.write_alias).await?;
        for index in &detached {
            if self.client.aliases_of_index(index).await?.is_empty() {
                warn!(index, "Deleting orphaned backing index from an aborted rotation");
                self.client.delete_index(index).await?;
            }
        }

        self.client
            .create_index(&new_index, self.config.total_fields_limit)
            .await?;
        self.client
            .put_alias(&new_index, &descriptor.write_alias)
            .await?;

        info!(logical, index = %new_index, "Began index rotation");
        Ok(new_index)
    }

    /// Finish a rotation: atomically repoint the read alias at the backing
    /// index currently behind the write alias, then delete the previous
    /// read-side backing indices.
    ///
    /// The repoint is issued as one multi-action alias update, so readers
    /// observe either the fully old or fully new backing index.
    pub async fn commit_rotation(&self, logical: &str) -> Result<(), ElasticError> {
        let descriptor = self.describe(logical).await?;
        let read_alias = &descriptor.read_alias;
        let write_alias = &descriptor.write_alias;

        let holders = self.client.indices_for_alias(write_alias).await?;
        let new_index = holders.first().ok_or_else(|| {
            ElasticError::unexpected(format!(
                "no backing index bound to '{write_alias}'; begin_rotation must run first"
            ))
        })?;

        // A plain index squatting the read alias name blocks the alias;
        // drop it if one exists.
        self.client.delete_index_if_exists(&read_alias).await?;

        let old_indices = if self.client.alias_exists(&read_alias).await? {
            self.client.indices_for_alias(&read_alias).await?
        } else {
            vec![]
        };

        let mut actions: Vec<serde_json::Value> = old_indices
            .iter()
            .filter(|index| *index != new_index)
            .map(|index| json!({ "remove": { "index": index, "alias": read_alias } }))
            .collect();
        actions.push(json!({ "add": { "index": new_index, "alias": read_alias } }));
        self.client.update_aliases(actions).await?;

        for index in old_indices.iter().filter(|index| *index != new_index) {
            self.client.delete_index(index).await?;
        }

        info!(logical, index = %new_index, "Committed index rotation");
        Ok(())
    }

    /// Begin a rotation for every logical index in the registry.
    pub async fn begin_rotation_all(&self) -> Result<Vec<String>, ElasticError> {
        let mut created = Vec::new();
        for logical in self.registry.logical_indices().await? {
            created.push(self.begin_rotation(&logical).await?);
        }
        Ok(created)
    }

    /// Commit every logical index's pending rotation.
    pub async fn commit_rotation_all(&self) -> Result<(), ElasticError> {
        for logical in self.registry.logical_indices().await? {
            self.commit_rotation(&logical).await?;
        }
        Ok(())
    }

    /// Delete backing indices of a logical index that no alias points at.
    pub async fn prune_stale(&self, logical: &str) -> Result<Vec<String>, ElasticError> {
        let descriptor = self.describe(logical).await?;
        let pattern = descriptor.backing_index("*");

        let mut pruned = Vec::new();
        for (index, aliases) in self.client.alias_table(&pattern).await? {
            if aliases.is_empty() {
                warn!(index, "Pruning stale backing index");
                self.client.delete_index(&index).await?;
                pruned.push(index);
            }
        }
        Ok(pruned)
    }

    /// Detach an alias from every index holding it, returning the former
    /// holders. Also drops a plain index squatting the alias name.
    async fn detach_alias(&self, alias: &str) -> Result<Vec<String>, ElasticError> {
        self.client.delete_index_if_exists(alias).await?;

        if !self.client.alias_exists(alias).await? {
            return Ok(vec![]);
        }
        let holders = self.client.indices_for_alias(alias).await?;
        for index in &holders {
            self.client.delete_alias(index, alias).await?;
        }
        Ok(holders)
    }
}
