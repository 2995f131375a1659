//! Feed inspection commands.

use std::path::Path;

use bytehub_core::Product;
use bytehub_storefront::config::FeedConfig;
use bytehub_storefront::feed::{FeedClient, parse_feed, parse_feed_body};
use tracing::info;

/// Parse a feed document saved on disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a feed document.
pub async fn parse(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let body = tokio::fs::read_to_string(file).await?;
    let doc = parse_feed_body(&body)?;
    let products = parse_feed(&doc);
    info!(path = %file.display(), count = products.len(), "Parsed feed");
    print_products(&products)
}

/// Fetch the feed over HTTP.
///
/// # Errors
///
/// Returns an error if the request fails or the response is not a feed.
pub async fn fetch(url: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = FeedConfig::from_env()?;
    let client = FeedClient::with_timeout(url.unwrap_or(config.feed_url), config.http_timeout)?;
    let products = client.fetch().await?;
    print_products(&products)
}

#[allow(clippy::print_stdout)]
fn print_products(products: &[Product]) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", serde_yaml::to_string(products)?);
    Ok(())
}
