//! Thin HTTP client over the engine's REST API.
//!
//! Every method maps to one engine call. Alias resolution and index-name
//! policy live a layer up in [`crate::aliases`]; this type only knows
//! concrete index/alias names.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, error};

use mirror_types::MirrorConfig;

use crate::error::ElasticError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for one engine cluster.
pub struct EsClient {
    http: Client,
    base_url: String,
}

impl EsClient {
    pub fn new(config: &MirrorConfig) -> Result<Self, ElasticError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ElasticError::Http)?;

        Ok(Self {
            http,
            base_url: config.elasticsearch_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Surface non-success statuses with the response body attached.
    async fn check(context: &str, response: Response) -> Result<Response, ElasticError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), context, "Engine request failed");
        Err(ElasticError::engine_status(status.as_u16(), context, body))
    }

    /// Store a document, fully replacing any prior body for the same id.
    ///
    /// `refresh=true` so the write is immediately visible to reads; the
    /// sync path reads back what it just wrote.
    pub async fn index_document(
        &self,
        index: &str,
        id: &str,
        body: &Map<String, Value>,
    ) -> Result<(), ElasticError> {
        let context = format!("PUT /{index}/_doc/{id}");
        let response = self
            .http
            .put(self.url(&format!("{index}/_doc/{id}")))
            .query(&[("refresh", "true")])
            .json(body)
            .send()
            .await?;
        Self::check(&context, response).await?;
        debug!(index, id, "Indexed document");
        Ok(())
    }

    /// Fetch one document's source. Missing documents are `Ok(None)`.
    pub async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, ElasticError> {
        let context = format!("GET /{index}/_doc/{id}");
        let response = self
            .http
            .get(self.url(&format!("{index}/_doc/{id}")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let payload: Value = Self::check(&context, response).await?.json().await?;
        Ok(payload.get("_source").cloned())
    }

    /// Run a search body and return the hit sources.
    pub async fn search(&self, index: &str, body: &Value) -> Result<Vec<Value>, ElasticError> {
        let context = format!("POST /{index}/_search");
        let response = self
            .http
            .post(self.url(&format!("{index}/_search")))
            .json(body)
            .send()
            .await?;
        let payload: Value = Self::check(&context, response).await?.json().await?;

        let hits = payload
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .ok_or_else(|| ElasticError::unexpected(format!("{context}: no hits array")))?;
        Ok(hits
            .iter()
            .filter_map(|hit| hit.get("_source").cloned())
            .collect())
    }

    /// Fetch every document in an index, up to `size`.
    pub async fn all(&self, index: &str, size: u32) -> Result<Vec<Value>, ElasticError> {
        let body = json!({
            "size": size,
            "query": { "match_all": {} }
        });
        self.search(index, &body).await
    }

    /// Look up the single document whose `url` field matches exactly.
    pub async fn find_by_url(&self, index: &str, url: &str) -> Result<Option<Value>, ElasticError> {
        let body = json!({
            "size": 1,
            "query": { "term": { "url.keyword": url } }
        });
        Ok(self.search(index, &body).await?.into_iter().next())
    }

    /// Delete every document matching a compiled query body.
    pub async fn delete_by_query(&self, index: &str, body: &Value) -> Result<(), ElasticError> {
        let context = format!("POST /{index}/_delete_by_query");
        let response = self
            .http
            .post(self.url(&format!("{index}/_delete_by_query")))
            .json(body)
            .send()
            .await?;
        Self::check(&context, response).await?;
        Ok(())
    }

    /// Create a backing index with a raised mapping field ceiling.
    pub async fn create_index(&self, name: &str, total_fields_limit: u32) -> Result<(), ElasticError> {
        let context = format!("PUT /{name}");
        let body = json!({
            "settings": {
                "mapping": {
                    "total_fields": { "limit": total_fields_limit }
                }
            }
        });
        let response = self.http.put(self.url(name)).json(&body).send().await?;
        Self::check(&context, response).await?;
        debug!(index = name, "Created backing index");
        Ok(())
    }

    pub async fn delete_index(&self, name: &str) -> Result<(), ElasticError> {
        let context = format!("DELETE /{name}");
        let response = self.http.delete(self.url(name)).send().await?;
        Self::check(&context, response).await?;
        debug!(index = name, "Deleted index");
        Ok(())
    }

    /// Delete an index, tolerating it not existing (or the name being an
    /// alias, which the engine refuses with 400).
    pub async fn delete_index_if_exists(&self, name: &str) -> Result<(), ElasticError> {
        let response = self.http.delete(self.url(name)).send().await?;
        let status = response.status();
        if status.is_success()
            || status == StatusCode::NOT_FOUND
            || status == StatusCode::BAD_REQUEST
        {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ElasticError::engine_status(
            status.as_u16(),
            format!("DELETE /{name}"),
            body,
        ))
    }

    pub async fn alias_exists(&self, alias: &str) -> Result<bool, ElasticError> {
        let response = self
            .http
            .head(self.url(&format!("_alias/{alias}")))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// Names of the indices an alias is bound to. Missing alias is empty.
    pub async fn indices_for_alias(&self, alias: &str) -> Result<Vec<String>, ElasticError> {
        let context = format!("GET /_alias/{alias}");
        let response = self
            .http
            .get(self.url(&format!("_alias/{alias}")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(vec![]);
        }
        let payload: Value = Self::check(&context, response).await?.json().await?;
        match payload {
            Value::Object(map) => Ok(map.keys().cloned().collect()),
            _ => Err(ElasticError::unexpected(format!("{context}: not an object"))),
        }
    }

    /// Aliases currently bound to one index.
    pub async fn aliases_of_index(&self, index: &str) -> Result<Vec<String>, ElasticError> {
        let context = format!("GET /{index}/_alias");
        let response = self
            .http
            .get(self.url(&format!("{index}/_alias")))
            .send()
            .await?;
        let payload: Value = Self::check(&context, response).await?.json().await?;
        let aliases = payload
            .pointer(&format!("/{index}/aliases"))
            .and_then(Value::as_object)
            .ok_or_else(|| ElasticError::unexpected(format!("{context}: no aliases object")))?;
        Ok(aliases.keys().cloned().collect())
    }

    /// Alias bindings for every index matching a name pattern, as
    /// `(index, aliases)` pairs. No matches is empty.
    pub async fn alias_table(&self, pattern: &str) -> Result<Vec<(String, Vec<String>)>, ElasticError> {
        let context = format!("GET /{pattern}/_alias");
        let response = self
            .http
            .get(self.url(&format!("{pattern}/_alias")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(vec![]);
        }
        let payload: Value = Self::check(&context, response).await?.json().await?;
        let table = payload
            .as_object()
            .ok_or_else(|| ElasticError::unexpected(format!("{context}: not an object")))?;
        Ok(table
            .iter()
            .map(|(index, entry)| {
                let aliases = entry
                    .pointer("/aliases")
                    .and_then(Value::as_object)
                    .map(|map| map.keys().cloned().collect())
                    .unwrap_or_default();
                (index.clone(), aliases)
            })
            .collect())
    }

    pub async fn put_alias(&self, index: &str, alias: &str) -> Result<(), ElasticError> {
        let context = format!("PUT /{index}/_alias/{alias}");
        let response = self
            .http
            .put(self.url(&format!("{index}/_alias/{alias}")))
            .send()
            .await?;
        Self::check(&context, response).await?;
        Ok(())
    }

    pub async fn delete_alias(&self, index: &str, alias: &str) -> Result<(), ElasticError> {
        let context = format!("DELETE /{index}/_alias/{alias}");
        let response = self
            .http
            .delete(self.url(&format!("{index}/_alias/{alias}")))
            .send()
            .await?;
        Self::check(&context, response).await?;
        Ok(())
    }

    /// Apply a batch of alias add/remove actions as one atomic update.
    pub async fn update_aliases(&self, actions: Vec<Value>) -> Result<(), ElasticError> {
        let context = "POST /_aliases".to_string();
        let body = json!({ "actions": actions });
        let response = self
            .http
            .post(self.url("_aliases"))
            .json(&body)
            .send()
            .await?;
        Self::check(&context, response).await?;
        Ok(())
    }
}
