//! Content-store models.
//!
//! Typed shapes of what the external content store hands back. The store
//! itself is an opaque collaborator; these are only its return values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One content entity (page, post, or custom type).
///
/// Field names serialize in the store's own naming so core attributes land
/// in documents under the keys downstream consumers already query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "ID")]
    pub id: i64,
    pub post_type: String,
    pub post_title: String,
    pub post_name: String,
    pub post_status: String,
    #[serde(default)]
    pub post_content: String,
    #[serde(default)]
    pub post_excerpt: String,
    pub post_date: DateTime<Utc>,
    pub post_modified: DateTime<Utc>,
    /// Template identifier assigned by the authoring side, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Whether the entity currently accepts comments.
    #[serde(default)]
    pub comments_open: bool,
    /// Editor lock token (`{timestamp}:{user}`), empty when unlocked.
    #[serde(default)]
    pub edit_lock: String,
    /// Attachment id of the featured asset, if one is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_asset: Option<i64>,
}

impl Entity {
    /// Core attributes as a JSON object, in the store's key naming.
    pub fn core_attributes(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// One taxonomy term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub term_id: i64,
    pub name: String,
    pub slug: String,
    pub taxonomy: String,
    #[serde(default)]
    pub description: String,
}

impl Term {
    pub fn core_attributes(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// One navigation-menu entry: the underlying entity plus its resolved
/// presentation attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(rename = "ID")]
    pub id: i64,
    pub title: String,
    pub url: String,
    /// Parent menu item id, zero at the top level.
    #[serde(default)]
    pub parent: i64,
    #[serde(default)]
    pub order: i64,
}

/// Resolved asset descriptor returned by the asset resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetData {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub filesize: u64,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub srcset: String,
    /// Size-variant name to url.
    #[serde(default)]
    pub sizes: Map<String, Value>,
    pub mime_type: String,
    /// Inline markup, populated for SVG assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl AssetData {
    /// Whether this asset should carry inline markup.
    pub fn is_svg(&self) -> bool {
        self.mime_type == "image/svg+xml"
    }

    pub fn to_object(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// One meta tag from the SEO provider's head output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaTag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

/// SEO metadata block attached to every assembled document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub meta: Vec<MetaTag>,
    /// schema.org markup as embedded by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}
