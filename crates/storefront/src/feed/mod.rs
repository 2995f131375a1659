//! Blog feed client and product catalog.
//!
//! The feed is fetched with a plain HTTP GET (`alt=json`). Script-wrapped
//! responses (`alt=json-in-script`) are accepted too; the callback wrapper is
//! stripped before parsing.

mod catalog;
mod document;
mod parser;

use std::time::Duration;

use bytehub_core::Product;
use thiserror::Error;
use tracing::instrument;

pub use catalog::{Catalog, CatalogSnapshot};
pub use document::{Category, Feed, FeedDocument, FeedEntry, Link, TextNode};
pub use parser::{
    PLACEHOLDER_IMAGE, SHORT_DESC_LEN, UNCATEGORIZED, UNTITLED, extract_colors, extract_image,
    extract_images, extract_old_price, extract_price, parse_entry, parse_feed, short_description,
    strip_tags,
};

/// Errors from fetching or decoding the feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned status {0}")]
    Status(u16),

    #[error("feed body is not a JSON document")]
    NotJson,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Decode a feed response body.
///
/// # Errors
///
/// Returns an error if no JSON object can be found or it fails to parse.
pub fn parse_feed_body(body: &str) -> Result<FeedDocument, FeedError> {
    let body = body.trim();
    let start = body.find('{').ok_or(FeedError::NotJson)?;
    let end = body.rfind('}').ok_or(FeedError::NotJson)?;
    let json = body.get(start..=end).ok_or(FeedError::NotJson)?;
    Ok(serde_json::from_str(json)?)
}

/// HTTP client for the blog feed.
#[derive(Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    url: String,
}

impl FeedClient {
    /// Create a client for `url` using a shared HTTP client.
    #[must_use]
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Build a standalone client with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(http, url))
    }

    /// Feed URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the feed.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status or an
    /// undecodable body. Individual malformed entries are not errors.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<Vec<Product>, FeedError> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let doc = parse_feed_body(&body)?;
        let products = parse_feed(&doc);
        tracing::info!(count = products.len(), "Fetched feed");
        Ok(products)
    }
}

impl std::fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient").field("url", &self.url).finish()
    }
}
