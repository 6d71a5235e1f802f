//! End-to-end sweep over mock collaborators: flat records materialize,
//! documents assemble, and the engine receives fully normalized bodies
//! bracketed by rotations.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};

use mirror_documents::{
    AssembleError, ContentStore, DocumentAssembler, FieldTarget, SeoKind, SeoProvider,
};
use mirror_fields::{AssetResolver, FieldError};
use mirror_sync::{Engine, SyncError, SyncOrchestrator};
use mirror_types::{
    AssetData, Document, Entity, FieldSchema, FlatRecord, MenuItem, MirrorConfig, SeoData, Term,
};

struct FixtureStore;

#[async_trait]
impl ContentStore for FixtureStore {
    async fn entity(&self, id: i64) -> Result<Option<Entity>, AssembleError> {
        Ok((id == 1).then(sample_post))
    }

    async fn term(&self, _id: i64) -> Result<Option<Term>, AssembleError> {
        Ok(None)
    }

    async fn entities_of_type(&self, entity_type: &str) -> Result<Vec<Entity>, AssembleError> {
        Ok(if entity_type == "post" {
            vec![sample_post()]
        } else {
            vec![]
        })
    }

    async fn terms_of_taxonomy(&self, _taxonomy: &str) -> Result<Vec<Term>, AssembleError> {
        Ok(vec![])
    }

    async fn entity_terms(&self, _entity_id: i64) -> Result<Vec<Term>, AssembleError> {
        Ok(vec![])
    }

    async fn entity_types(&self) -> Result<Vec<String>, AssembleError> {
        Ok(vec!["post".to_string()])
    }

    async fn taxonomies(&self) -> Result<Vec<String>, AssembleError> {
        Ok(vec![])
    }

    async fn menus(&self) -> Result<Vec<Term>, AssembleError> {
        Ok(vec![])
    }

    async fn menu_items(&self, _menu: &Term) -> Result<Vec<MenuItem>, AssembleError> {
        Ok(vec![])
    }

    async fn permalink(&self, entity_id: i64) -> Result<String, AssembleError> {
        Ok(format!("https://site.test/?p={entity_id}"))
    }

    async fn term_link(&self, term: &Term) -> Result<String, AssembleError> {
        Ok(format!("https://site.test/{}", term.slug))
    }

    async fn field_schemas(&self, target: &FieldTarget) -> Result<Vec<FieldSchema>, AssembleError> {
        Ok(match target {
            FieldTarget::Entity(1) => vec![
                FieldSchema::repeater(
                    "gallery",
                    vec![FieldSchema::text("caption"), FieldSchema::image("photo")],
                ),
                FieldSchema::link("cta"),
                FieldSchema::text("enable"),
                FieldSchema::text("visible"),
            ],
            _ => vec![],
        })
    }

    async fn block_field_schemas(
        &self,
        _block_type: &str,
    ) -> Result<Vec<FieldSchema>, AssembleError> {
        Ok(vec![])
    }

    async fn flat_record(&self, target: &FieldTarget) -> Result<FlatRecord, AssembleError> {
        Ok(match target {
            FieldTarget::Entity(1) => [
                ("gallery", json!(2)),
                ("gallery_0_caption", json!("First")),
                ("gallery_0_photo", json!(77)),
                ("gallery_1_caption", json!("Second")),
                ("cta", Value::Null),
                ("enable", json!(false)),
                ("visible", json!(false)),
            ]
            .into_iter()
            .collect(),
            _ => FlatRecord::new(),
        })
    }
}

struct FixtureAssets;

#[async_trait]
impl AssetResolver for FixtureAssets {
    async fn asset(&self, id: i64) -> Result<Option<AssetData>, FieldError> {
        Ok(Some(AssetData {
            id,
            url: format!("https://cdn.test/{id}.jpg"),
            width: Some(640),
            height: Some(480),
            filename: format!("{id}.jpg"),
            filesize: 1024,
            alt: String::new(),
            srcset: String::new(),
            sizes: Map::new(),
            mime_type: "image/jpeg".to_string(),
            raw: None,
        }))
    }

    async fn raw_markup(&self, _url: &str) -> Result<String, FieldError> {
        Ok(String::new())
    }
}

struct FixtureSeo;

#[async_trait]
impl SeoProvider for FixtureSeo {
    async fn seo(&self, _id: i64, _kind: SeoKind) -> Result<SeoData, AssembleError> {
        Ok(SeoData::default())
    }
}

#[derive(Default)]
struct RecordingEngine {
    stored: Mutex<Vec<Document>>,
    rotations: Mutex<Vec<String>>,
}

#[async_trait]
impl Engine for RecordingEngine {
    async fn store(&self, document: &Document) -> Result<(), SyncError> {
        self.stored.lock().unwrap().push(document.clone());
        Ok(())
    }

    async fn find(&self, _logical: &str, _id: &str) -> Result<Option<Value>, SyncError> {
        Ok(None)
    }

    async fn find_where(
        &self,
        _logical: &str,
        _params: &Map<String, Value>,
    ) -> Result<Vec<Value>, SyncError> {
        Ok(vec![])
    }

    async fn delete_where(
        &self,
        _logical: &str,
        _params: &Map<String, Value>,
    ) -> Result<(), SyncError> {
        Ok(())
    }

    async fn begin_rotation(&self, logical: &str) -> Result<(), SyncError> {
        self.rotations
            .lock()
            .unwrap()
            .push(format!("begin:{logical}"));
        Ok(())
    }

    async fn commit_rotation(&self, logical: &str) -> Result<(), SyncError> {
        self.rotations
            .lock()
            .unwrap()
            .push(format!("commit:{logical}"));
        Ok(())
    }

    async fn logical_indices(&self) -> Result<Vec<String>, SyncError> {
        Ok(vec!["page".to_string(), "post".to_string()])
    }
}

fn sample_post() -> Entity {
    Entity {
        id: 1,
        post_type: "post".to_string(),
        post_title: "Some content".to_string(),
        post_name: "some-content".to_string(),
        post_status: "publish".to_string(),
        post_content: String::new(),
        post_excerpt: String::new(),
        post_date: Utc::now(),
        post_modified: Utc::now(),
        template: None,
        comments_open: true,
        edit_lock: String::new(),
        featured_asset: None,
    }
}

#[tokio::test]
async fn full_sweep_materializes_and_stores_normalized_documents() {
    let store: Arc<dyn ContentStore> = Arc::new(FixtureStore);
    let engine = Arc::new(RecordingEngine::default());
    let assembler = Arc::new(DocumentAssembler::new(
        MirrorConfig::default(),
        store.clone(),
        Arc::new(FixtureAssets),
        Arc::new(FixtureSeo),
    ));
    let orchestrator = SyncOrchestrator::new(store, assembler, engine.clone());

    let report = orchestrator.sync_all().await.unwrap();
    assert!(report.completed);
    assert_eq!(report.stored, 1);
    assert_eq!(report.errors, 0);

    let rotations = engine.rotations.lock().unwrap().clone();
    assert_eq!(
        rotations,
        vec!["begin:page", "begin:post", "commit:page", "commit:post"]
    );

    let stored = engine.stored.lock().unwrap().clone();
    assert_eq!(stored.len(), 1);
    let doc = &stored[0];
    assert_eq!(doc.id, "1");
    assert_eq!(doc.logical_index, "post");

    // Core attributes and computed url survive the merge.
    assert_eq!(doc.get("post_title"), Some(&json!("Some content")));
    assert_eq!(doc.get("url"), Some(&json!("https://site.test/?p=1")));

    // The flat repeater came back as two ordered entries, with the image
    // subfield resolved to a full descriptor.
    let gallery = doc.get("gallery").unwrap().as_array().unwrap();
    assert_eq!(gallery.len(), 2);
    assert_eq!(gallery[0]["caption"], json!("First"));
    assert_eq!(gallery[0]["photo"]["url"], json!("https://cdn.test/77.jpg"));
    assert_eq!(gallery[1]["caption"], json!("Second"));
    assert!(gallery[1].get("photo").is_none());

    // Empty link fields are objects, never null.
    assert_eq!(doc.get("cta"), Some(&json!({})));

    // `false` survives only under allow-listed keys.
    assert_eq!(doc.get("enable"), Some(&json!(false)));
    assert_eq!(doc.get("visible"), Some(&Value::Null));
}
