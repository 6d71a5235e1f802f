//! Structured-content block parsing.
//!
//! Entity content arrives as HTML interleaved with block delimiter
//! comments: `<!-- wp:namespace/name {attrs-json} -->inner<!-- /wp:name -->`,
//! or self-closing `<!-- wp:name {attrs-json} /-->`. Each delimited block
//! becomes one tagged object; plain markup between blocks carries no
//! delimiter and is dropped. Field materialization for authored block
//! data happens in the assembler, not here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const OPENER: &str = "<!-- wp:";
const CLOSER_SUFFIX: &str = " -->";

/// One delimited content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Namespaced block name (`core/image`, `acf/two-column`).
    #[serde(rename = "blockName")]
    pub name: String,
    /// Delimiter attributes as authored.
    #[serde(default)]
    pub attrs: Map<String, Value>,
    /// Inner markup between the delimiters, verbatim.
    #[serde(default, rename = "innerHTML")]
    pub html: String,
}

/// Split content into its delimited blocks, in document order.
pub fn parse_blocks(content: &str) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find(OPENER) {
        let after = &rest[start + OPENER.len()..];
        let Some(header_end) = after.find("-->") else {
            break;
        };
        let header = after[..header_end].trim();
        let self_closing = header.ends_with('/');
        let header = header.trim_end_matches('/').trim_end();

        let (name, attrs_src) = match header.find(char::is_whitespace) {
            Some(i) => (&header[..i], header[i..].trim_start()),
            None => (header, ""),
        };
        // Malformed attribute JSON degrades to an attribute-less block
        // rather than losing the whole block.
        let attrs = if attrs_src.starts_with('{') {
            serde_json::from_str(attrs_src).unwrap_or_default()
        } else {
            Map::new()
        };

        let after_header = &after[header_end + 3..];
        if self_closing {
            blocks.push(ContentBlock {
                name: name.to_string(),
                attrs,
                html: String::new(),
            });
            rest = after_header;
            continue;
        }

        let closer = format!("<!-- /wp:{name}{CLOSER_SUFFIX}");
        match after_header.find(&closer) {
            Some(close) => {
                blocks.push(ContentBlock {
                    name: name.to_string(),
                    attrs,
                    html: after_header[..close].to_string(),
                });
                rest = &after_header[close + closer.len()..];
            }
            None => {
                // Unterminated block: everything remaining is its markup.
                blocks.push(ContentBlock {
                    name: name.to_string(),
                    attrs,
                    html: after_header.to_string(),
                });
                rest = "";
            }
        }
    }
    blocks
}

/// Extract the `alt` attribute from image markup, if present.
pub fn image_alt(html: &str) -> Option<String> {
    let start = html.find("alt=\"")? + 5;
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}

/// Coerce a block id to an integer; authored ids sometimes carry a
/// non-numeric prefix the engine's id mapping rejects.
pub fn block_id(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => {
            let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}
