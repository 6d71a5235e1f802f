//! Field schema definitions.
//!
//! Schemas are authored externally (the field-authoring framework exports
//! them as JSON with a `type` discriminator) and treated as immutable input.
//! Field kinds are modeled as a closed enum so dispatch in the materializer
//! is exhaustiveness-checked rather than matched on open-ended strings.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Discriminator key carried by every flexible-content entry, naming the
/// layout that entry was authored with.
pub const LAYOUT_KEY: &str = "acf_fc_layout";

/// The kind of a field, with the payload each kind's resolution needs.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Scalar passthrough (text, textarea, number, boolean, select, ...).
    Text,
    /// Attachment reference resolved to a full image descriptor.
    Image,
    /// Attachment reference resolved to `{url, ...metadata}`.
    File,
    /// Link object; empty values normalize to an empty object.
    Link,
    /// Reference to another entity, expanded to its assembled document.
    PostRef,
    /// Reference to a taxonomy term, expanded to its assembled document.
    TermRef,
    /// Ordered list of entries, flattened as `name_{i}_{sub}` keys.
    Repeater { sub_fields: Vec<FieldSchema> },
    /// Single nested object, flattened as `name_{sub}` keys.
    Group { sub_fields: Vec<FieldSchema> },
    /// Tagged union of layouts; each entry names its layout.
    Flexible { layouts: Vec<Layout> },
    /// Alias for another subfield's schema, resolved during flexible
    /// expansion at the current repetition index.
    Clone { target: String },
}

/// One named layout of a flexible-content field.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Layout {
    /// Stable identifier assigned by the authoring framework.
    #[serde(default)]
    pub key: String,
    /// Authored layout name, matched against entry discriminators.
    pub name: String,
    /// Subfield schemas for entries of this layout.
    #[serde(default)]
    pub sub_fields: Vec<FieldSchema>,
}

/// Description of one authored field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawField")]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn image(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Image)
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::File)
    }

    pub fn link(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Link)
    }

    pub fn post_ref(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::PostRef)
    }

    pub fn term_ref(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::TermRef)
    }

    pub fn repeater(name: impl Into<String>, sub_fields: Vec<FieldSchema>) -> Self {
        Self::new(name, FieldKind::Repeater { sub_fields })
    }

    pub fn group(name: impl Into<String>, sub_fields: Vec<FieldSchema>) -> Self {
        Self::new(name, FieldKind::Group { sub_fields })
    }

    pub fn flexible(name: impl Into<String>, layouts: Vec<Layout>) -> Self {
        Self::new(name, FieldKind::Flexible { layouts })
    }
}

/// Wire shape of an authored field definition before validation.
#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    sub_fields: Option<Vec<FieldSchema>>,
    #[serde(default)]
    layouts: Option<Vec<Layout>>,
    #[serde(default)]
    clone: Option<Vec<String>>,
}

impl TryFrom<RawField> for FieldSchema {
    type Error = SchemaError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let kind = match raw.field_type.as_str() {
            "image" => FieldKind::Image,
            "file" => FieldKind::File,
            "link" => FieldKind::Link,
            "post_object" => FieldKind::PostRef,
            "taxonomy" => FieldKind::TermRef,
            "repeater" => FieldKind::Repeater {
                sub_fields: raw
                    .sub_fields
                    .ok_or_else(|| SchemaError::MissingSubFields(raw.name.clone()))?,
            },
            "group" => FieldKind::Group {
                sub_fields: raw
                    .sub_fields
                    .ok_or_else(|| SchemaError::MissingSubFields(raw.name.clone()))?,
            },
            "flexible_content" => FieldKind::Flexible {
                layouts: raw
                    .layouts
                    .ok_or_else(|| SchemaError::MissingLayouts(raw.name.clone()))?,
            },
            "clone" => {
                let targets = raw
                    .clone
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| SchemaError::MissingCloneTarget(raw.name.clone()))?;
                FieldKind::Clone {
                    target: targets[0].clone(),
                }
            }
            // Anything else is a scalar as far as materialization goes.
            _ => FieldKind::Text,
        };

        Ok(FieldSchema {
            name: raw.name,
            kind,
        })
    }
}

// Serialize back to the wire shape so schemas can round-trip through
// registries that persist them as JSON.
impl Serialize for FieldSchema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        match &self.kind {
            FieldKind::Text => map.serialize_entry("type", "text")?,
            FieldKind::Image => map.serialize_entry("type", "image")?,
            FieldKind::File => map.serialize_entry("type", "file")?,
            FieldKind::Link => map.serialize_entry("type", "link")?,
            FieldKind::PostRef => map.serialize_entry("type", "post_object")?,
            FieldKind::TermRef => map.serialize_entry("type", "taxonomy")?,
            FieldKind::Repeater { sub_fields } => {
                map.serialize_entry("type", "repeater")?;
                map.serialize_entry("sub_fields", sub_fields)?;
            }
            FieldKind::Group { sub_fields } => {
                map.serialize_entry("type", "group")?;
                map.serialize_entry("sub_fields", sub_fields)?;
            }
            FieldKind::Flexible { layouts } => {
                map.serialize_entry("type", "flexible_content")?;
                map.serialize_entry("layouts", layouts)?;
            }
            FieldKind::Clone { target } => {
                map.serialize_entry("type", "clone")?;
                map.serialize_entry("clone", &vec![target.clone()])?;
            }
        }
        map.end()
    }
}
