//! Inline SVG fetching.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use mirror_types::AssetData;

use crate::error::FieldError;
use crate::resolver::AssetResolver;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch the markup of a remote SVG.
///
/// Gzip-encoded transfers are decoded transparently by the client based on
/// the `Content-Encoding` response header.
pub async fn fetch_inline_svg(client: &Client, url: &str) -> Result<String, FieldError> {
    let response = client.get(url).send().await?.error_for_status()?;
    let markup = response.text().await?;
    debug!(url, bytes = markup.len(), "Fetched inline SVG");
    Ok(markup)
}

/// Decorates an [`AssetResolver`] that only knows attachment metadata
/// with markup fetching over HTTP, so its SVG assets can still inline.
pub struct HttpMarkupResolver<A> {
    inner: A,
    client: Client,
}

impl<A> HttpMarkupResolver<A> {
    pub fn new(inner: A) -> Result<Self, FieldError> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { inner, client })
    }
}

#[async_trait]
impl<A: AssetResolver> AssetResolver for HttpMarkupResolver<A> {
    async fn asset(&self, id: i64) -> Result<Option<AssetData>, FieldError> {
        self.inner.asset(id).await
    }

    async fn raw_markup(&self, url: &str) -> Result<String, FieldError> {
        fetch_inline_svg(&self.client, url).await
    }
}
