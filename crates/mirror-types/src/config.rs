//! Configuration shared by all content-mirror crates.
//!
//! Layered: defaults -> environment variables. The deployment environment
//! supplies `ELASTICSEARCH_URL`, `SITE_INDEX_KEY`, and `ENVIRONMENT`; the
//! rest has working defaults.

use config::{Config, Environment};
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Settings for index naming, query limits, and materialization behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Base URL of the search engine.
    #[serde(default = "default_elasticsearch_url")]
    pub elasticsearch_url: String,

    /// Site-wide prefix for physical index names.
    #[serde(default = "default_site_index_key")]
    pub site_index_key: String,

    /// Deployment environment segment of index names.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Blog/site id segment of index names (multisite installs).
    #[serde(default = "default_blog_id")]
    pub blog_id: u32,

    /// Mapping ceiling applied to new backing indices. Schema-driven
    /// documents can have very wide shapes.
    #[serde(default = "default_total_fields_limit")]
    pub total_fields_limit: u32,

    /// Practical maximum result window, used as the default query size.
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u32,

    /// Field names allowed to keep literal `false` values. Everything else
    /// normalizes `false` to null because the flat storage convention
    /// cannot distinguish "false" from "not computed yet".
    #[serde(default = "default_boolean_allowlist")]
    pub boolean_allowlist: Vec<String>,

    /// When false, flexible content passes through unexpanded.
    #[serde(default = "default_true")]
    pub expand_flexible: bool,

    /// How many levels of post/term references to expand. References found
    /// inside an already-expanded reference are not re-expanded.
    #[serde(default = "default_max_reference_depth")]
    pub max_reference_depth: u32,
}

fn default_elasticsearch_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_site_index_key() -> String {
    "site".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_blog_id() -> u32 {
    1
}

fn default_total_fields_limit() -> u32 {
    10000
}

fn default_max_result_window() -> u32 {
    10000
}

fn default_boolean_allowlist() -> Vec<String> {
    vec!["enable".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_max_reference_depth() -> u32 {
    1
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            elasticsearch_url: default_elasticsearch_url(),
            site_index_key: default_site_index_key(),
            environment: default_environment(),
            blog_id: default_blog_id(),
            total_fields_limit: default_total_fields_limit(),
            max_result_window: default_max_result_window(),
            boolean_allowlist: default_boolean_allowlist(),
            expand_flexible: default_true(),
            max_reference_depth: default_max_reference_depth(),
        }
    }
}

impl MirrorConfig {
    /// Load configuration from environment variables over defaults.
    pub fn from_env() -> Result<Self, SchemaError> {
        let cfg = Config::builder()
            .add_source(Environment::default())
            .build()
            .map_err(|e| SchemaError::Config(e.to_string()))?;

        let mut loaded: MirrorConfig = cfg
            .try_deserialize()
            .map_err(|e| SchemaError::Config(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.elasticsearch_url.is_empty() {
            return Err(SchemaError::Config(
                "elasticsearch_url must not be empty".to_string(),
            ));
        }
        if self.site_index_key.is_empty() {
            return Err(SchemaError::Config(
                "site_index_key must not be empty".to_string(),
            ));
        }
        if self.max_result_window == 0 {
            return Err(SchemaError::Config(
                "max_result_window must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a field name may keep literal boolean `false` values.
    pub fn allows_boolean(&self, key: &str) -> bool {
        self.boolean_allowlist.iter().any(|k| k == key)
    }
}
