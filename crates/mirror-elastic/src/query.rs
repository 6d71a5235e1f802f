//! Parameter-map to query-DSL compilation.
//!
//! Callers pass a flat map of lookup parameters: scalar values are
//! AND/equality clauses, list values are OR groups over that field.
//! Reserved keys `sort`, `range`, `from`, and `size` are controls, not
//! match clauses. Compilation is pure; index-name validation happens at
//! the alias layer.

use serde_json::{json, Map, Number, Value};

use mirror_types::MirrorConfig;

/// Rank assigned to a document whose id is not in the caller's id list,
/// sorting it after every listed document.
const MISSING_ID_RANK: i64 = 1_000_000;

/// Painless expression ranking documents by the position of their id in
/// the caller-supplied list.
const ID_ORDER_SORT: &str =
    "def i = params.ids.indexOf((int) doc[params.field].value); return i == -1 ? params.missing : i;";

/// A compiled search body, ready to post to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub body: Value,
}

/// Compiles parameter maps into the engine's bool-query DSL.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    max_result_window: u32,
}

impl QueryCompiler {
    pub fn new(config: &MirrorConfig) -> Self {
        Self {
            max_result_window: config.max_result_window,
        }
    }

    pub fn compile(&self, params: &Map<String, Value>) -> CompiledQuery {
        let status_supplied = params.contains_key("post_status");

        let mut working: Map<String, Value> = params
            .iter()
            .filter(|(_, value)| !is_falsy(value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if !status_supplied {
            working.insert("post_status".to_string(), json!("publish"));
        }

        let sort = working.remove("sort");
        let range = working.remove("range");
        let from = working.remove("from").and_then(as_count).unwrap_or(0);
        let size = working
            .remove("size")
            .and_then(as_count)
            .unwrap_or(u64::from(self.max_result_window));

        for (key, value) in working.iter_mut() {
            if is_id_key(key) {
                coerce_ids(value);
            }
        }

        let mut must: Vec<Value> = Vec::new();
        let mut id_groups: Vec<(String, Vec<Value>)> = Vec::new();
        for (key, value) in &working {
            match value {
                Value::Array(items) => {
                    let should: Vec<Value> =
                        items.iter().map(|item| match_clause(key, item)).collect();
                    must.push(json!({
                        "bool": { "should": should, "minimum_should_match": 1 }
                    }));
                    if is_id_key(key) {
                        id_groups.push((key.clone(), items.clone()));
                    }
                }
                scalar => must.push(match_clause(key, scalar)),
            }
        }
        if let Some(range) = range {
            must.push(json!({ "range": range }));
        }

        let mut body = json!({
            "from": from,
            "size": size,
            "query": { "bool": { "must": must } },
        });

        if let Some(sort) = sort {
            body["sort"] = sort;
        } else if let [(field, ids)] = id_groups.as_slice() {
            // Results come back in the caller's exact id order; ids absent
            // from the list rank last.
            body["sort"] = json!([{
                "_script": {
                    "type": "number",
                    "order": "asc",
                    "script": {
                        "lang": "painless",
                        "source": ID_ORDER_SORT,
                        "params": {
                            "field": field,
                            "ids": ids,
                            "missing": MISSING_ID_RANK,
                        }
                    }
                }
            }]);
        }

        CompiledQuery { body }
    }
}

fn is_id_key(key: &str) -> bool {
    key.to_lowercase().contains("id")
}

/// Empty and falsy values never become match clauses.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}

fn as_count(value: Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Coerce id-like values to integers, in place. Lists coerce per element.
fn coerce_ids(value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                coerce_ids(item);
            }
        }
        Value::String(s) => {
            if let Ok(n) = s.parse::<i64>() {
                *value = Value::Number(Number::from(n));
            }
        }
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if n.as_i64().is_none() {
                    *value = Value::Number(Number::from(f as i64));
                }
            }
        }
        _ => {}
    }
}

/// One exact-match clause. String values match on the keyword sub-field;
/// string-keyed map values become a nested-object sub-query with one
/// clause per entry.
fn match_clause(key: &str, value: &Value) -> Value {
    match value {
        Value::Object(entries) => {
            let clauses: Vec<Value> = entries
                .iter()
                .map(|(entry_key, entry_value)| {
                    match_clause(&format!("{key}.{entry_key}"), entry_value)
                })
                .collect();
            json!({
                "nested": {
                    "path": key,
                    "query": { "bool": { "must": clauses } }
                }
            })
        }
        Value::String(_) => json!({ "term": { format!("{key}.keyword"): value } }),
        other => json!({ "term": { key: other } }),
    }
}
