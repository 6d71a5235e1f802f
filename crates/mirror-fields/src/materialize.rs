//! Field materialization.
//!
//! `materialize` dispatches on [`FieldKind`] and reconstructs nested values
//! from the flat record, probing composed `prefix_i_child` keys for
//! composite kinds and recursing through the resolver capabilities for
//! references. Two authoring encodings coexist (structured-block data
//! arriving pre-nested, legacy meta arriving flat); both resolve here.

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use mirror_types::record::field_prefix;
use mirror_types::{FieldKind, FieldSchema, FlatRecord, Layout, MirrorConfig, LAYOUT_KEY};

use crate::error::FieldError;
use crate::normalize::normalize_tree;
use crate::resolver::{AssetResolver, DocumentResolver};

/// Materializes raw field values against their schemas.
pub struct Materializer<'a> {
    config: &'a MirrorConfig,
    assets: &'a dyn AssetResolver,
    documents: &'a dyn DocumentResolver,
}

impl<'a> Materializer<'a> {
    pub fn new(
        config: &'a MirrorConfig,
        assets: &'a dyn AssetResolver,
        documents: &'a dyn DocumentResolver,
    ) -> Self {
        Self {
            config,
            assets,
            documents,
        }
    }

    /// Materialize every declared top-level field of a record.
    ///
    /// The result is normalized as a whole, so top-level `false` scalars
    /// and `link`-named leaves are covered even though they sit outside
    /// any container when dispatched individually.
    pub async fn materialize_record(
        &self,
        fields: &[FieldSchema],
        record: &FlatRecord,
        depth: u32,
    ) -> Result<Map<String, Value>, FieldError> {
        let mut out = Map::new();
        for field in fields {
            let raw = record.get(&field.name).cloned().unwrap_or(Value::Null);
            let value = self.materialize(field, raw, record, "", depth).await?;
            out.insert(field.name.clone(), value);
        }
        let mut tree = Value::Object(out);
        normalize_tree(&mut tree, self.config);
        match tree {
            Value::Object(map) => Ok(map),
            // Normalization rewrites values in place, never the outer shape.
            _ => Ok(Map::new()),
        }
    }

    /// Materialize one field occurrence.
    ///
    /// `prefix` is the composed key of this occurrence in the flat record;
    /// empty at the top level, where the field's own name seeds key
    /// composition.
    pub fn materialize<'f>(
        &'f self,
        field: &'f FieldSchema,
        raw: Value,
        record: &'f FlatRecord,
        prefix: &'f str,
        depth: u32,
    ) -> BoxFuture<'f, Result<Value, FieldError>> {
        async move {
            let mut value = match &field.kind {
                FieldKind::Text => raw,
                FieldKind::Link => link_value(raw),
                FieldKind::Image => self.image_value(raw).await?,
                FieldKind::File => self.file_value(raw).await?,
                FieldKind::Repeater { sub_fields } => {
                    if let Value::Array(entries) = raw {
                        self.reresolve_parsed_repeater(entries, sub_fields).await?
                    } else {
                        self.rebuild_repeater(field, raw, sub_fields, record, prefix, depth)
                            .await?
                    }
                }
                FieldKind::Group { sub_fields } => {
                    self.group_value(field, raw, sub_fields, record, prefix, depth)
                        .await?
                }
                FieldKind::PostRef => self.post_ref_value(field, raw, depth).await?,
                FieldKind::TermRef => self.term_ref_value(field, raw, depth).await?,
                FieldKind::Flexible { layouts } => {
                    if self.config.expand_flexible {
                        self.flexible_value(field, raw, layouts, record, prefix, depth)
                            .await?
                    } else {
                        raw
                    }
                }
                // A clone only resolves against a layout context; standalone
                // occurrences pass their raw value through.
                FieldKind::Clone { .. } => raw,
            };

            if value.is_object() || value.is_array() {
                normalize_tree(&mut value, self.config);
            }
            Ok(value)
        }
        .boxed()
    }

    /// Rebuild a repeater from its flat shape: the raw value is the entry
    /// count, each entry's subfields live under `prefix_i_name`.
    async fn rebuild_repeater(
        &self,
        field: &FieldSchema,
        raw: Value,
        sub_fields: &[FieldSchema],
        record: &FlatRecord,
        prefix: &str,
        depth: u32,
    ) -> Result<Value, FieldError> {
        let count = entry_count(field, &raw)?;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let mut entry = Map::new();
            for sub in sub_fields {
                let key = field_prefix(prefix, &field.name, &format!("{i}_{}", sub.name));
                // Absent keys omit the subfield, never the whole entry.
                if let Some(raw_sub) = record.get(&key) {
                    let value = self
                        .materialize(sub, raw_sub.clone(), record, &key, depth)
                        .await?;
                    entry.insert(sub.name.clone(), value);
                }
            }
            entries.push(Value::Object(entry));
        }
        Ok(Value::Array(entries))
    }

    /// Re-scan a pre-parsed repeater value: image subfields are re-resolved
    /// (resolution is not idempotent-safe to skip), all other keys stay
    /// untouched.
    async fn reresolve_parsed_repeater(
        &self,
        entries: Vec<Value>,
        sub_fields: &[FieldSchema],
    ) -> Result<Value, FieldError> {
        let mut out = Vec::with_capacity(entries.len());
        for mut entry in entries {
            if let Value::Object(map) = &mut entry {
                for sub in sub_fields {
                    if sub.kind != FieldKind::Image {
                        continue;
                    }
                    if let Some(raw_image) = map.get(&sub.name).cloned() {
                        map.insert(sub.name.clone(), self.image_value(raw_image).await?);
                    }
                }
            }
            out.push(entry);
        }
        Ok(Value::Array(out))
    }

    /// Resolve a group subfield through the three-way fallback: structured
    /// block data nested in the raw value wins, then the flat record probe,
    /// then the raw group value unmodified.
    async fn group_value(
        &self,
        field: &FieldSchema,
        raw: Value,
        sub_fields: &[FieldSchema],
        record: &FlatRecord,
        prefix: &str,
        depth: u32,
    ) -> Result<Value, FieldError> {
        let mut out = Map::new();
        for sub in sub_fields {
            let key = field_prefix(prefix, &field.name, &sub.name);
            let nested = raw.as_object().and_then(|map| map.get(&sub.name));
            let value = if let Some(nested) = nested {
                self.materialize(sub, nested.clone(), record, &key, depth)
                    .await?
            } else if let Some(flat) = record.get(&key) {
                self.materialize(sub, flat.clone(), record, &key, depth)
                    .await?
            } else {
                raw.clone()
            };
            out.insert(sub.name.clone(), value);
        }
        Ok(Value::Object(out))
    }

    /// Expand flexible content: an ordered list of tagged entries, each
    /// resolved against its layout's subfield schemas.
    async fn flexible_value(
        &self,
        field: &FieldSchema,
        raw: Value,
        layouts: &[Layout],
        record: &FlatRecord,
        prefix: &str,
        depth: u32,
    ) -> Result<Value, FieldError> {
        let Value::Array(entries) = raw else {
            return Ok(raw);
        };

        let mut out = Vec::with_capacity(entries.len());
        for (i, entry) in entries.into_iter().enumerate() {
            let Value::Object(map) = entry else {
                out.push(entry);
                continue;
            };
            let Some(layout_name) = map.get(LAYOUT_KEY).and_then(Value::as_str) else {
                warn!(field = %field.name, index = i, "Flexible entry without layout tag");
                out.push(Value::Object(map));
                continue;
            };
            let layout = layouts
                .iter()
                .find(|l| l.name == layout_name)
                .ok_or_else(|| FieldError::UnknownLayout {
                    field: field.name.clone(),
                    layout: layout_name.to_string(),
                })?;

            let mut resolved = Map::new();
            for (key, value) in map {
                if key == LAYOUT_KEY {
                    resolved.insert(key, value);
                    continue;
                }
                let Some(sub) = layout.sub_fields.iter().find(|s| s.name == key) else {
                    // Data for an undeclared key passes through untouched.
                    resolved.insert(key, value);
                    continue;
                };
                let sub = self.substitute_clone(field, layout, sub)?;
                let sub_prefix =
                    self.flexible_prefix(field, layout, &sub.name, i, record, prefix);
                let materialized = self
                    .materialize(sub, value, record, &sub_prefix, depth)
                    .await?;
                resolved.insert(key, materialized);
            }
            out.push(Value::Object(resolved));
        }
        Ok(Value::Array(out))
    }

    /// Substitute a clone subfield with its target from the same layout.
    fn substitute_clone<'s>(
        &self,
        field: &FieldSchema,
        layout: &'s Layout,
        sub: &'s FieldSchema,
    ) -> Result<&'s FieldSchema, FieldError> {
        let FieldKind::Clone { target } = &sub.kind else {
            return Ok(sub);
        };
        layout
            .sub_fields
            .iter()
            .find(|s| s.name == *target)
            .ok_or_else(|| FieldError::UnknownCloneTarget {
                field: field.name.clone(),
                target: target.clone(),
            })
    }

    /// Compose the flat-record prefix for a flexible entry's subfield,
    /// trying the layout identifier, then the layout name, then the plain
    /// composed key.
    fn flexible_prefix(
        &self,
        field: &FieldSchema,
        layout: &Layout,
        sub_name: &str,
        index: usize,
        record: &FlatRecord,
        prefix: &str,
    ) -> String {
        let mut candidates = Vec::with_capacity(3);
        if !layout.key.is_empty() {
            candidates.push(field_prefix(
                prefix,
                &field.name,
                &format!("{index}_{}_{sub_name}", layout.key),
            ));
        }
        candidates.push(field_prefix(
            prefix,
            &field.name,
            &format!("{index}_{}_{sub_name}", layout.name),
        ));
        candidates.push(field_prefix(
            prefix,
            &field.name,
            &format!("{index}_{sub_name}"),
        ));

        for candidate in &candidates {
            if record.contains(candidate) {
                return candidate.clone();
            }
        }
        candidates.pop().unwrap_or_default()
    }

    /// Resolve an image value to a full asset descriptor, inlining SVG
    /// markup when the media type calls for it.
    async fn image_value(&self, raw: Value) -> Result<Value, FieldError> {
        if let Value::Object(mut map) = raw {
            // Already resolved; only the SVG markup may still be missing.
            let is_svg = map.get("mime_type").and_then(Value::as_str) == Some("image/svg+xml");
            if is_svg && !map.contains_key("raw") {
                if let Some(url) = map.get("url").and_then(Value::as_str).map(str::to_string) {
                    match self.assets.raw_markup(&url).await {
                        Ok(markup) => {
                            map.insert("raw".to_string(), Value::String(markup));
                        }
                        Err(e) => warn!(url, error = %e, "Failed to inline SVG markup"),
                    }
                }
            }
            return Ok(Value::Object(map));
        }

        let Some(id) = scalar_id(&raw) else {
            return Ok(Value::Null);
        };
        match self.assets.asset(id).await? {
            Some(mut asset) => {
                if asset.is_svg() && asset.raw.is_none() {
                    match self.assets.raw_markup(&asset.url).await {
                        Ok(markup) => asset.raw = Some(markup),
                        Err(e) => warn!(url = %asset.url, error = %e, "Failed to inline SVG markup"),
                    }
                }
                Ok(Value::Object(asset.to_object()))
            }
            None => Ok(Value::Null),
        }
    }

    /// Resolve a file value to `{url, ...metadata}`; a missing attachment
    /// yields null, not an error.
    async fn file_value(&self, raw: Value) -> Result<Value, FieldError> {
        if raw.is_object() {
            return Ok(raw);
        }
        let Some(id) = scalar_id(&raw) else {
            return Ok(Value::Null);
        };
        match self.assets.asset(id).await? {
            Some(asset) => Ok(Value::Object(asset.to_object())),
            None => Ok(Value::Null),
        }
    }

    async fn post_ref_value(
        &self,
        field: &FieldSchema,
        raw: Value,
        depth: u32,
    ) -> Result<Value, FieldError> {
        if raw.is_object() {
            return Ok(raw);
        }
        let Some(id) = scalar_id(&raw) else {
            return Ok(Value::Null);
        };
        if depth >= self.config.max_reference_depth {
            debug!(field = %field.name, id, depth, "Reference depth reached, leaving id unexpanded");
            return Ok(raw);
        }
        match self.documents.resolve_post(id, depth).await? {
            Some(doc) => Ok(Value::Object(doc)),
            None => Ok(Value::Null),
        }
    }

    async fn term_ref_value(
        &self,
        field: &FieldSchema,
        raw: Value,
        depth: u32,
    ) -> Result<Value, FieldError> {
        if raw.is_object() {
            return Ok(raw);
        }
        let Some(id) = scalar_id(&raw) else {
            return Ok(Value::Null);
        };
        if depth >= self.config.max_reference_depth {
            debug!(field = %field.name, id, depth, "Reference depth reached, leaving id unexpanded");
            return Ok(raw);
        }
        match self.documents.resolve_term(id, depth).await? {
            Some(doc) => Ok(Value::Object(doc)),
            None => Ok(Value::Null),
        }
    }
}

/// Link fields must keep one stable shape across documents: anything empty
/// becomes an empty object, never null.
fn link_value(raw: Value) -> Value {
    let empty = match &raw {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    };
    if empty {
        Value::Object(Map::new())
    } else {
        raw
    }
}

/// Interpret a flat repeater value as its entry count.
fn entry_count(field: &FieldSchema, raw: &Value) -> Result<usize, FieldError> {
    match raw {
        Value::Null | Value::Bool(false) => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| invalid_count(field, raw)),
        Value::String(s) => s.parse::<usize>().map_err(|_| invalid_count(field, raw)),
        _ => Err(invalid_count(field, raw)),
    }
}

fn invalid_count(field: &FieldSchema, raw: &Value) -> FieldError {
    FieldError::InvalidRepeaterCount {
        field: field.name.clone(),
        value: raw.to_string(),
    }
}

/// Interpret a raw reference value as a numeric id.
fn scalar_id(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mirror_types::AssetData;
    use serde_json::json;
    use std::collections::HashMap;

    struct MockAssets {
        assets: HashMap<i64, AssetData>,
        markup: String,
    }

    impl MockAssets {
        fn empty() -> Self {
            Self {
                assets: HashMap::new(),
                markup: String::new(),
            }
        }

        fn with_asset(id: i64, mime_type: &str) -> Self {
            let asset = AssetData {
                id,
                url: format!("https://cdn.test/{id}"),
                width: Some(640),
                height: Some(480),
                filename: format!("asset-{id}"),
                filesize: 1024,
                alt: "alt text".to_string(),
                srcset: String::new(),
                sizes: Map::new(),
                mime_type: mime_type.to_string(),
                raw: None,
            };
            Self {
                assets: HashMap::from([(id, asset)]),
                markup: "<svg/>".to_string(),
            }
        }
    }

    #[async_trait]
    impl AssetResolver for MockAssets {
        async fn asset(&self, id: i64) -> Result<Option<AssetData>, FieldError> {
            Ok(self.assets.get(&id).cloned())
        }

        async fn raw_markup(&self, _url: &str) -> Result<String, FieldError> {
            Ok(self.markup.clone())
        }
    }

    struct MockDocs {
        posts: HashMap<i64, Map<String, Value>>,
    }

    impl MockDocs {
        fn none() -> Self {
            Self {
                posts: HashMap::new(),
            }
        }

        fn with_post(id: i64, title: &str) -> Self {
            let mut doc = Map::new();
            doc.insert("ID".to_string(), json!(id));
            doc.insert("post_title".to_string(), json!(title));
            Self {
                posts: HashMap::from([(id, doc)]),
            }
        }
    }

    #[async_trait]
    impl DocumentResolver for MockDocs {
        async fn resolve_post(
            &self,
            id: i64,
            _depth: u32,
        ) -> Result<Option<Map<String, Value>>, FieldError> {
            Ok(self.posts.get(&id).cloned())
        }

        async fn resolve_term(
            &self,
            _id: i64,
            _depth: u32,
        ) -> Result<Option<Map<String, Value>>, FieldError> {
            Ok(None)
        }
    }

    fn record(entries: &[(&str, Value)]) -> FlatRecord {
        entries.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    #[tokio::test]
    async fn test_repeater_rebuilds_ordered_entries() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::repeater(
            "list",
            vec![FieldSchema::text("title"), FieldSchema::text("body")],
        );
        let rec = record(&[
            ("list_0_title", json!("First")),
            ("list_0_body", json!("a")),
            ("list_1_title", json!("Second")),
            ("list_1_body", json!("b")),
        ]);

        let value = m.materialize(&field, json!(2), &rec, "", 0).await.unwrap();
        assert_eq!(
            value,
            json!([
                { "title": "First", "body": "a" },
                { "title": "Second", "body": "b" }
            ])
        );
    }

    #[tokio::test]
    async fn test_repeater_missing_subfield_omits_only_that_key() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::repeater(
            "list",
            vec![FieldSchema::text("title"), FieldSchema::text("body")],
        );
        let rec = record(&[
            ("list_0_title", json!("First")),
            ("list_1_body", json!("only body")),
        ]);

        let value = m.materialize(&field, json!(2), &rec, "", 0).await.unwrap();
        assert_eq!(
            value,
            json!([
                { "title": "First" },
                { "body": "only body" }
            ])
        );
    }

    #[tokio::test]
    async fn test_repeater_string_count() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::repeater("list", vec![FieldSchema::text("title")]);
        let rec = record(&[("list_0_title", json!("x"))]);

        let value = m.materialize(&field, json!("1"), &rec, "", 0).await.unwrap();
        assert_eq!(value, json!([{ "title": "x" }]));
    }

    #[tokio::test]
    async fn test_repeater_invalid_count_is_an_error() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::repeater("list", vec![FieldSchema::text("title")]);
        let rec = FlatRecord::new();

        let err = m
            .materialize(&field, json!("not-a-count"), &rec, "", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, FieldError::InvalidRepeaterCount { .. }));
    }

    #[tokio::test]
    async fn test_nested_repeater_uses_prefix_chain() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::repeater(
            "blocks",
            vec![FieldSchema::repeater(
                "items",
                vec![FieldSchema::text("label")],
            )],
        );
        let rec = record(&[
            ("blocks_0_items", json!(2)),
            ("blocks_0_items_0_label", json!("a")),
            ("blocks_0_items_1_label", json!("b")),
        ]);

        let value = m.materialize(&field, json!(1), &rec, "", 0).await.unwrap();
        assert_eq!(
            value,
            json!([{ "items": [{ "label": "a" }, { "label": "b" }] }])
        );
    }

    #[tokio::test]
    async fn test_parsed_repeater_reresolves_images_only() {
        let config = MirrorConfig::default();
        let assets = MockAssets::with_asset(9, "image/png");
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::repeater(
            "gallery",
            vec![FieldSchema::image("photo"), FieldSchema::text("caption")],
        );
        let raw = json!([{ "photo": 9, "caption": "untouched" }]);

        let value = m
            .materialize(&field, raw, &FlatRecord::new(), "", 0)
            .await
            .unwrap();
        let entry = &value[0];
        assert_eq!(entry["caption"], json!("untouched"));
        assert_eq!(entry["photo"]["url"], json!("https://cdn.test/9"));
        assert_eq!(entry["photo"]["mime_type"], json!("image/png"));
    }

    #[tokio::test]
    async fn test_group_prefers_structured_block_value() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::group("meta", vec![FieldSchema::text("label")]);
        // Both encodings present: the structured value must win.
        let rec = record(&[("meta_label", json!("legacy"))]);
        let raw = json!({ "label": "structured" });

        let value = m.materialize(&field, raw, &rec, "", 0).await.unwrap();
        assert_eq!(value, json!({ "label": "structured" }));
    }

    #[tokio::test]
    async fn test_group_falls_back_to_flat_record() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::group("meta", vec![FieldSchema::text("label")]);
        let rec = record(&[("meta_label", json!("legacy"))]);

        let value = m
            .materialize(&field, Value::Null, &rec, "", 0)
            .await
            .unwrap();
        assert_eq!(value, json!({ "label": "legacy" }));
    }

    #[tokio::test]
    async fn test_group_final_fallback_is_raw_value() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::group("meta", vec![FieldSchema::text("label")]);
        let value = m
            .materialize(&field, json!("loose"), &FlatRecord::new(), "", 0)
            .await
            .unwrap();
        assert_eq!(value, json!({ "label": "loose" }));
    }

    #[tokio::test]
    async fn test_link_empty_value_becomes_empty_object() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::link("cta");
        for raw in [Value::Null, json!(""), json!(false), json!([])] {
            let value = m
                .materialize(&field, raw, &FlatRecord::new(), "", 0)
                .await
                .unwrap();
            assert_eq!(value, json!({}));
        }
    }

    #[tokio::test]
    async fn test_link_populated_value_passes_through() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::link("cta");
        let raw = json!({ "url": "https://example.test", "title": "Go" });
        let value = m
            .materialize(&field, raw.clone(), &FlatRecord::new(), "", 0)
            .await
            .unwrap();
        assert_eq!(value, raw);
    }

    fn callout_layouts() -> Vec<Layout> {
        vec![Layout {
            key: "layout_callout".to_string(),
            name: "callout".to_string(),
            sub_fields: vec![FieldSchema::text("title"), FieldSchema::link("cta")],
        }]
    }

    #[tokio::test]
    async fn test_flexible_callout_entry() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::flexible("components", callout_layouts());
        let raw = json!([
            { "title": "Test Title", "cta": null, "acf_fc_layout": "callout" }
        ]);

        let value = m
            .materialize(&field, raw, &FlatRecord::new(), "", 0)
            .await
            .unwrap();
        assert_eq!(value[0]["title"], json!("Test Title"));
        // A null link materializes to an empty object, not null.
        assert_eq!(value[0]["cta"], json!({}));
        // The discriminator is preserved.
        assert_eq!(value[0]["acf_fc_layout"], json!("callout"));
    }

    #[tokio::test]
    async fn test_flexible_unknown_layout_is_an_error() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::flexible("components", callout_layouts());
        let raw = json!([{ "acf_fc_layout": "hero" }]);

        let err = m
            .materialize(&field, raw, &FlatRecord::new(), "", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, FieldError::UnknownLayout { .. }));
    }

    #[tokio::test]
    async fn test_flexible_skip_switch_passes_raw_through() {
        let config = MirrorConfig {
            expand_flexible: false,
            ..Default::default()
        };
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::flexible("components", callout_layouts());
        let raw = json!([
            { "title": "Test Title", "cta": null, "acf_fc_layout": "callout" }
        ]);

        let value = m
            .materialize(&field, raw.clone(), &FlatRecord::new(), "", 0)
            .await
            .unwrap();
        // Unexpanded: the null cta stays null.
        assert_eq!(value, raw);
    }

    #[tokio::test]
    async fn test_flexible_clone_substitution() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let layouts = vec![Layout {
            key: "layout_banner".to_string(),
            name: "banner".to_string(),
            sub_fields: vec![
                FieldSchema::link("cta"),
                FieldSchema::new(
                    "shared_cta",
                    FieldKind::Clone {
                        target: "cta".to_string(),
                    },
                ),
            ],
        }];
        let field = FieldSchema::flexible("components", layouts);
        let raw = json!([
            { "shared_cta": "", "acf_fc_layout": "banner" }
        ]);

        let value = m
            .materialize(&field, raw, &FlatRecord::new(), "", 0)
            .await
            .unwrap();
        // The clone resolves with the target's link semantics.
        assert_eq!(value[0]["shared_cta"], json!({}));
    }

    #[tokio::test]
    async fn test_flexible_subfield_reads_flat_record_via_layout_prefix() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let layouts = vec![Layout {
            key: "layout_list".to_string(),
            name: "list_block".to_string(),
            sub_fields: vec![FieldSchema::repeater(
                "items",
                vec![FieldSchema::text("label")],
            )],
        }];
        let field = FieldSchema::flexible("components", layouts);
        // The repeater's entries live under the layout-identifier prefix.
        let rec = record(&[
            ("components_0_layout_list_items_0_label", json!("one")),
            ("components_0_layout_list_items_1_label", json!("two")),
        ]);
        let raw = json!([{ "items": 2, "acf_fc_layout": "list_block" }]);

        let value = m.materialize(&field, raw, &rec, "", 0).await.unwrap();
        assert_eq!(
            value[0]["items"],
            json!([{ "label": "one" }, { "label": "two" }])
        );
    }

    #[tokio::test]
    async fn test_image_resolves_id_to_descriptor() {
        let config = MirrorConfig::default();
        let assets = MockAssets::with_asset(5, "image/jpeg");
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::image("photo");
        let value = m
            .materialize(&field, json!(5), &FlatRecord::new(), "", 0)
            .await
            .unwrap();
        assert_eq!(value["url"], json!("https://cdn.test/5"));
        assert_eq!(value["width"], json!(640));
        assert!(value.get("raw").is_none());
    }

    #[tokio::test]
    async fn test_image_svg_inlines_markup() {
        let config = MirrorConfig::default();
        let assets = MockAssets::with_asset(6, "image/svg+xml");
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::image("logo");
        let value = m
            .materialize(&field, json!(6), &FlatRecord::new(), "", 0)
            .await
            .unwrap();
        assert_eq!(value["raw"], json!("<svg/>"));
    }

    #[tokio::test]
    async fn test_image_missing_attachment_is_null() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::image("photo");
        let value = m
            .materialize(&field, json!(404), &FlatRecord::new(), "", 0)
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_file_missing_attachment_is_null() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::file("download");
        let value = m
            .materialize(&field, json!(404), &FlatRecord::new(), "", 0)
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_post_ref_expands_to_document() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::with_post(7, "Referenced");
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::post_ref("related");
        let value = m
            .materialize(&field, json!(7), &FlatRecord::new(), "", 0)
            .await
            .unwrap();
        assert_eq!(value["post_title"], json!("Referenced"));
    }

    #[tokio::test]
    async fn test_post_ref_depth_guard_leaves_id() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::with_post(7, "Referenced");
        let m = Materializer::new(&config, &assets, &docs);

        let field = FieldSchema::post_ref("related");
        // Already inside one expanded reference: do not expand again.
        let value = m
            .materialize(&field, json!(7), &FlatRecord::new(), "", 1)
            .await
            .unwrap();
        assert_eq!(value, json!(7));
    }

    #[tokio::test]
    async fn test_materialize_record_normalizes_top_level() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let fields = vec![
            FieldSchema::text("visible"),
            FieldSchema::text("enable"),
            FieldSchema::text("link"),
        ];
        let rec = record(&[
            ("visible", json!(false)),
            ("enable", json!(false)),
            ("link", json!("https://example.test")),
        ]);

        let out = m.materialize_record(&fields, &rec, 0).await.unwrap();
        assert_eq!(out.get("visible"), Some(&Value::Null));
        assert_eq!(out.get("enable"), Some(&json!(false)));
        assert_eq!(
            out.get("link"),
            Some(&json!({ "string_value": "https://example.test" }))
        );
    }

    #[tokio::test]
    async fn test_materialize_record_missing_fields_resolve_to_null() {
        let config = MirrorConfig::default();
        let assets = MockAssets::empty();
        let docs = MockDocs::none();
        let m = Materializer::new(&config, &assets, &docs);

        let fields = vec![FieldSchema::text("headline")];
        let out = m
            .materialize_record(&fields, &FlatRecord::new(), 0)
            .await
            .unwrap();
        assert_eq!(out.get("headline"), Some(&Value::Null));
    }
}
