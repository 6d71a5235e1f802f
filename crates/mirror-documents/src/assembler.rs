//! Document assembly.
//!
//! Merge order matters and is load-bearing: materialized custom fields go
//! in first, computed attributes and core entity attributes are written
//! over them. A custom field named `url` is therefore always replaced by
//! the computed permalink. Downstream consumers depend on this precedence.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use mirror_fields::{normalize_tree, AssetResolver, DocumentResolver, FieldError, Materializer};
use mirror_types::{Document, Entity, FieldSchema, FlatRecord, MirrorConfig, Term};

use crate::blocks::{self, ContentBlock};
use crate::error::AssembleError;
use crate::store::{ContentStore, FieldTarget, SeoKind, SeoProvider};

/// Builds one engine-ready document per content entity.
pub struct DocumentAssembler {
    config: MirrorConfig,
    store: Arc<dyn ContentStore>,
    assets: Arc<dyn AssetResolver>,
    seo: Arc<dyn SeoProvider>,
}

impl DocumentAssembler {
    pub fn new(
        config: MirrorConfig,
        store: Arc<dyn ContentStore>,
        assets: Arc<dyn AssetResolver>,
        seo: Arc<dyn SeoProvider>,
    ) -> Self {
        Self {
            config,
            store,
            assets,
            seo,
        }
    }

    /// Assemble the document for a page or post entity.
    pub async fn entity_document(&self, entity: &Entity) -> Result<Document, AssembleError> {
        self.entity_document_at(entity, 0).await
    }

    pub(crate) async fn entity_document_at(
        &self,
        entity: &Entity,
        depth: u32,
    ) -> Result<Document, AssembleError> {
        let target = FieldTarget::Entity(entity.id);
        let mut body = self.custom_fields(&target, depth).await?;

        // Core attributes overwrite custom fields of the same name.
        for (key, value) in entity.core_attributes() {
            body.insert(key, value);
        }

        let is_page = entity.post_type == "page";
        body.insert(
            "url".to_string(),
            json!(self.store.permalink(entity.id).await?),
        );
        let template = if is_page {
            entity.template.clone().unwrap_or_default()
        } else {
            entity
                .template
                .clone()
                .unwrap_or_else(|| format!("template-{}-single", entity.post_type))
        };
        body.insert("page_template".to_string(), json!(template));
        body.insert(
            "blocks".to_string(),
            self.content_blocks(&entity.post_content, depth).await?,
        );

        if !is_page {
            let mut terms = Vec::new();
            for term in self.store.entity_terms(entity.id).await? {
                let doc = self.term_document_at(&term, depth).await?;
                terms.push(Value::Object(doc.body));
            }
            body.insert("taxonomies".to_string(), Value::Array(terms));
        }

        let seo = self.seo.seo(entity.id, SeoKind::Post).await?;
        body.insert("seo".to_string(), serde_json::to_value(&seo).unwrap_or(Value::Null));

        if !entity.post_excerpt.is_empty() {
            body.insert("excerpt".to_string(), json!(entity.post_excerpt));
        }
        if let Some(asset_id) = entity.featured_asset {
            if let Some(image) = self.resolve_image(asset_id, depth).await? {
                body.insert(
                    "featured_image".to_string(),
                    json!({ "type": "image", "image": image }),
                );
            }
        }

        debug!(id = entity.id, entity_type = %entity.post_type, "Assembled entity document");
        Ok(Document::new(entity.id.to_string(), entity.post_type.clone()).with_body(body))
    }

    /// Assemble the document for a taxonomy term.
    pub async fn term_document(&self, term: &Term) -> Result<Document, AssembleError> {
        self.term_document_at(term, 0).await
    }

    pub(crate) async fn term_document_at(
        &self,
        term: &Term,
        depth: u32,
    ) -> Result<Document, AssembleError> {
        let target = FieldTarget::Term(term.term_id);
        let mut body = self.custom_fields(&target, depth).await?;

        for (key, value) in term.core_attributes() {
            body.insert(key, value);
        }
        body.insert("url".to_string(), json!(self.store.term_link(term).await?));
        // Terms are assimilated into the post structure for searching:
        // slug doubles as post_name and terms always read as published.
        body.insert("post_name".to_string(), json!(term.slug));
        body.insert("post_status".to_string(), json!("publish"));

        let seo = self.seo.seo(term.term_id, SeoKind::Term).await?;
        body.insert("seo".to_string(), serde_json::to_value(&seo).unwrap_or(Value::Null));

        Ok(Document::new(term.term_id.to_string(), term.taxonomy.clone()).with_body(body))
    }

    /// Assemble a navigation menu as one atomic document with its items
    /// embedded in order.
    pub async fn menu_document(&self, menu: &Term) -> Result<Document, AssembleError> {
        let base = self.term_document_at(menu, 0).await?;
        let mut body = base.body;

        let mut items = Vec::new();
        for item in self.store.menu_items(menu).await? {
            let target = FieldTarget::Entity(item.id);
            let mut item_body = self.custom_fields(&target, 0).await?;
            if let Ok(Value::Object(attrs)) = serde_json::to_value(&item) {
                for (key, value) in attrs {
                    item_body.insert(key, value);
                }
            }
            items.push(Value::Object(item_body));
        }
        body.insert("menu_items".to_string(), Value::Array(items));

        let id = format!("{}_nav", menu.slug);
        Ok(Document::new(id, menu.taxonomy.clone()).with_body(body))
    }

    /// Assemble option-page documents from the site-wide option record.
    ///
    /// Materialized option keys are `{page}_{field}`; they split on the
    /// first segment into one document per option page.
    pub async fn option_documents(&self) -> Result<Vec<Document>, AssembleError> {
        let custom = self.custom_fields(&FieldTarget::Options, 0).await?;

        let mut pages: Map<String, Value> = Map::new();
        for (key, value) in custom {
            let Some((page, rest)) = key.split_once('_') else {
                warn!(key, "Option key without a page segment, skipping");
                continue;
            };
            let entry = pages
                .entry(page.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = entry {
                map.insert(rest.to_string(), value);
            }
        }

        let mut documents = Vec::with_capacity(pages.len());
        for (page, fields) in pages {
            let mut body = match fields {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            body.insert("ID".to_string(), json!(page));
            documents.push(Document::new(page, "options").with_body(body));
        }
        Ok(documents)
    }

    async fn custom_fields(
        &self,
        target: &FieldTarget,
        depth: u32,
    ) -> Result<Map<String, Value>, AssembleError> {
        let schemas = self.store.field_schemas(target).await?;
        if schemas.is_empty() {
            return Ok(Map::new());
        }
        let record = self.store.flat_record(target).await?;
        let materializer = Materializer::new(&self.config, self.assets.as_ref(), self);
        Ok(materializer
            .materialize_record(&schemas, &record, depth)
            .await?)
    }

    /// Parse structured content into its blocks and materialize each
    /// block's authored data.
    async fn content_blocks(&self, content: &str, depth: u32) -> Result<Value, AssembleError> {
        let mut out = Vec::new();
        for mut block in blocks::parse_blocks(content) {
            self.materialize_block(&mut block, depth).await?;
            let mut value = serde_json::to_value(&block).unwrap_or(Value::Null);
            normalize_tree(&mut value, &self.config);
            out.push(value);
        }
        Ok(Value::Array(out))
    }

    /// Resolve a block's field data in place.
    ///
    /// Image blocks get their attachment expanded to a full descriptor,
    /// with the alt text authored in the markup taking precedence. Blocks
    /// backed by registered field schemas get their raw data replaced by
    /// the materialized map; field values may be stored under the plain
    /// field name or under its `field_{type}_{name}` registry key.
    async fn materialize_block(
        &self,
        block: &mut ContentBlock,
        depth: u32,
    ) -> Result<(), AssembleError> {
        if block.name == "core/image" {
            let id = block.attrs.get("id").map(blocks::block_id).unwrap_or(0);
            if id != 0 {
                if let Some(mut image) = self.resolve_image(id, depth).await? {
                    if let (Some(alt), Value::Object(map)) =
                        (blocks::image_alt(&block.html), &mut image)
                    {
                        map.insert("alt".to_string(), json!(alt));
                    }
                    block.attrs.insert("data".to_string(), image);
                }
            }
            return Ok(());
        }

        let Some(block_type) = block
            .attrs
            .get("name")
            .and_then(Value::as_str)
            .and_then(|name| name.strip_prefix("acf/"))
            .map(|name| name.replace('-', "_"))
        else {
            return Ok(());
        };

        let schemas = self.store.block_field_schemas(&block_type).await?;
        let data = match block.attrs.get("data") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        let record: FlatRecord = data.clone().into_iter().collect();
        let materializer = Materializer::new(&self.config, self.assets.as_ref(), self);

        let mut parsed = Map::new();
        for field in &schemas {
            let raw = data
                .get(&field.name)
                .or_else(|| data.get(&format!("field_{block_type}_{}", field.name)))
                .cloned()
                .unwrap_or(Value::Null);
            let value = materializer
                .materialize(field, raw, &record, "", depth)
                .await?;
            parsed.insert(field.name.clone(), value);
        }
        block.attrs.insert("data".to_string(), Value::Object(parsed));

        if let Some(id) = block.attrs.get("id").map(blocks::block_id) {
            block.attrs.insert("id".to_string(), json!(id));
        }
        Ok(())
    }

    async fn resolve_image(
        &self,
        asset_id: i64,
        depth: u32,
    ) -> Result<Option<Value>, AssembleError> {
        let materializer = Materializer::new(&self.config, self.assets.as_ref(), self);
        let field = FieldSchema::image("image");
        let value = materializer
            .materialize(&field, json!(asset_id), &FlatRecord::new(), "", depth)
            .await?;
        Ok(match value {
            Value::Null => None,
            other => Some(other),
        })
    }
}

// Reference expansion re-enters assembly through this capability; the
// depth increment is what keeps cross-referencing entities from recursing
// unbounded.
#[async_trait]
impl DocumentResolver for DocumentAssembler {
    async fn resolve_post(
        &self,
        id: i64,
        depth: u32,
    ) -> Result<Option<Map<String, Value>>, FieldError> {
        let entity = self
            .store
            .entity(id)
            .await
            .map_err(|e| FieldError::resolver(e.to_string()))?;
        match entity {
            Some(entity) => {
                let doc = self
                    .entity_document_at(&entity, depth + 1)
                    .await
                    .map_err(|e| FieldError::resolver(e.to_string()))?;
                Ok(Some(doc.body))
            }
            None => Ok(None),
        }
    }

    async fn resolve_term(
        &self,
        id: i64,
        depth: u32,
    ) -> Result<Option<Map<String, Value>>, FieldError> {
        let term = self
            .store
            .term(id)
            .await
            .map_err(|e| FieldError::resolver(e.to_string()))?;
        match term {
            Some(term) => {
                let doc = self
                    .term_document_at(&term, depth + 1)
                    .await
                    .map_err(|e| FieldError::resolver(e.to_string()))?;
                Ok(Some(doc.body))
            }
            None => Ok(None),
        }
    }
}
