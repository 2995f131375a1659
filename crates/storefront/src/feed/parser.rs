//! Turn feed entries into products.
//!
//! Blog posts carry their product data inline in the post HTML: the first
//! image is the product photo, the first `$<number>` is the price and a struck
//! through `~$<number>~` or `<del>$<number></del>` is the old price.

use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use bytehub_core::{Product, ProductId};
use rand::Rng;
use regex::Regex;
use rust_decimal::Decimal;

use super::document::{FeedDocument, FeedEntry};

/// Image shown when a post has no `<img>`.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x220";

/// Category for posts without labels.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Title for posts without one.
pub const UNTITLED: &str = "Untitled";

/// Maximum length of the short description, in characters.
pub const SHORT_DESC_LEN: usize = 150;

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src\s*=\s*['"]([^'"]+)['"]"#).expect("Invalid regex")
});

static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([0-9]+(?:\.[0-9]+)?)").expect("Invalid regex"));

static OLD_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)~\s*\$?\s*([0-9]+(?:\.[0-9]+)?)\s*~|<del>\s*\$?\s*([0-9]+(?:\.[0-9]+)?)\s*</del>")
        .expect("Invalid regex")
});

static COLORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)colou?rs?\s*:\s*([^<\n]+)").expect("Invalid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Parse every entry of a feed document, preserving order.
#[must_use]
pub fn parse_feed(doc: &FeedDocument) -> Vec<Product> {
    doc.feed.entry.iter().map(parse_entry).collect()
}

/// Parse a single entry. Never fails: missing pieces fall back to defaults.
#[must_use]
pub fn parse_entry(entry: &FeedEntry) -> Product {
    let html = entry.body_html();

    let title = match entry.title_text() {
        "" => UNTITLED.to_string(),
        title => decode_entities(title),
    };

    let images = extract_images(html);
    let img = images
        .first()
        .cloned()
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    Product {
        id: entry
            .id_text()
            .map_or_else(synthetic_id, ProductId::new),
        title,
        img,
        price: extract_price(html).unwrap_or(Decimal::ZERO),
        old_price: extract_old_price(html),
        category: entry
            .first_category()
            .unwrap_or(UNCATEGORIZED)
            .to_string(),
        short_desc: short_description(html),
        colors: extract_colors(html),
        images: (images.len() > 1).then_some(images),
        permalink: entry.permalink().map(str::to_string),
    }
}

/// First image URL in the post, if any.
#[must_use]
pub fn extract_image(html: &str) -> Option<String> {
    IMG_SRC
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// All image URLs in the post, deduplicated, in document order.
#[must_use]
pub fn extract_images(html: &str) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    for src in IMG_SRC
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
    {
        if !images.iter().any(|seen| seen == src) {
            images.push(src.to_string());
        }
    }
    images
}

/// First `$<number>` in the post.
#[must_use]
pub fn extract_price(html: &str) -> Option<Decimal> {
    PRICE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// First struck-through price in the post. Zero counts as no old price.
#[must_use]
pub fn extract_old_price(html: &str) -> Option<Decimal> {
    OLD_PRICE
        .captures(html)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .and_then(|m| m.as_str().parse::<Decimal>().ok())
        .filter(|price| !price.is_zero())
}

/// Colour options from a `Colors: Red, Blue` line.
#[must_use]
pub fn extract_colors(html: &str) -> Option<Vec<String>> {
    let line = COLORS.captures(html)?.get(1)?.as_str();
    let colors: Vec<String> = line
        .split([',', '/', '|'])
        .map(|c| decode_entities(c.trim()))
        .filter(|c| !c.is_empty())
        .collect();
    (!colors.is_empty()).then_some(colors)
}

/// Plain-text description: tags removed, whitespace collapsed, cut to
/// [`SHORT_DESC_LEN`] characters.
#[must_use]
pub fn short_description(html: &str) -> String {
    let text = strip_tags(html);
    text.chars().take(SHORT_DESC_LEN).collect::<String>().trim_end().to_string()
}

/// Remove HTML tags and collapse whitespace.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let without_tags = TAG.replace_all(html, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// `<unix-millis>-<random hex>` for entries that have no id.
fn synthetic_id() -> ProductId {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    let suffix: u32 = rand::rng().random();
    ProductId::new(format!("{millis}-{suffix:08x}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(json: &str) -> FeedEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_shirt_example() {
        let e = entry(
            r#"{
                "id":{"$t":"post-1"},
                "title":{"$t":"Shirt"},
                "content":{"$t":"<img src='a.jpg'>Price: $20 ~$30~"},
                "category":[{"term":"Clothing"}]
            }"#,
        );
        let p = parse_entry(&e);
        assert_eq!(p.id.as_str(), "post-1");
        assert_eq!(p.title, "Shirt");
        assert_eq!(p.img, "a.jpg");
        assert_eq!(p.price, Decimal::from(20));
        assert_eq!(p.old_price, Some(Decimal::from(30)));
        assert_eq!(p.category, "Clothing");
        assert_eq!(p.short_desc, "Price: $20 ~$30~");
        assert_eq!(p.images, None);
    }

    #[test]
    fn test_entry_without_image_or_price() {
        let e = entry(r#"{"title":{"$t":"Plain"},"content":{"$t":"<p>Just words</p>"}}"#);
        let p = parse_entry(&e);
        assert_eq!(p.img, PLACEHOLDER_IMAGE);
        assert_eq!(p.price, Decimal::ZERO);
        assert_eq!(p.old_price, None);
        assert_eq!(p.category, UNCATEGORIZED);
        assert_eq!(p.short_desc, "Just words");
        assert!(!p.is_purchasable());
    }

    #[test]
    fn test_empty_entry_gets_defaults_and_synthetic_id() {
        let p = parse_entry(&FeedEntry::default());
        assert_eq!(p.title, UNTITLED);
        assert_eq!(p.short_desc, "");
        assert!(!p.id.is_blank());
        let (millis, hex) = p.id.as_str().split_once('-').unwrap();
        assert!(millis.parse::<u128>().is_ok());
        assert_eq!(hex.len(), 8);
    }

    #[test]
    fn test_old_price_del_tag_and_zero() {
        assert_eq!(
            extract_old_price("now $5 <del>$9.50</del>"),
            Some(Decimal::new(950, 2))
        );
        assert_eq!(extract_old_price("<DEL>12</DEL>"), Some(Decimal::from(12)));
        assert_eq!(extract_old_price("~$0~"), None);
        assert_eq!(extract_old_price("no discount"), None);
    }

    #[test]
    fn test_price_takes_first_match() {
        assert_eq!(extract_price("$12.50 or $99"), Some(Decimal::new(1250, 2)));
        assert_eq!(extract_price("free"), None);
    }

    #[test]
    fn test_image_double_quotes_and_gallery() {
        let html = r#"<IMG class="x" src="one.jpg"><img src='two.jpg'><img src="one.jpg">"#;
        assert_eq!(extract_image(html).as_deref(), Some("one.jpg"));
        assert_eq!(extract_images(html), vec!["one.jpg", "two.jpg"]);

        let e = FeedEntry {
            content: Some(super::super::document::TextNode {
                text: html.to_string(),
            }),
            ..FeedEntry::default()
        };
        assert_eq!(parse_entry(&e).images.unwrap().len(), 2);
    }

    #[test]
    fn test_short_description_truncates_by_chars() {
        let long = "é".repeat(200);
        let desc = short_description(&format!("<p>{long}</p>"));
        assert_eq!(desc.chars().count(), SHORT_DESC_LEN);
    }

    #[test]
    fn test_strip_tags_decodes_entities() {
        assert_eq!(
            strip_tags("<p>Tom &amp; Jerry</p>\n<br/>  mugs"),
            "Tom & Jerry mugs"
        );
    }

    #[test]
    fn test_extract_colors() {
        assert_eq!(
            extract_colors("<p>Colors: Red, Blue / Green</p>"),
            Some(vec!["Red".to_string(), "Blue".to_string(), "Green".to_string()])
        );
        assert_eq!(extract_colors("<p>Colour:   </p>"), None);
        assert_eq!(extract_colors("no options"), None);
    }

    #[test]
    fn test_parse_feed_preserves_order() {
        let doc: FeedDocument = serde_json::from_str(
            r#"{"feed":{"entry":[
                {"id":{"$t":"b"},"title":{"$t":"B"}},
                {"id":{"$t":"a"},"title":{"$t":"A"}}
            ]}}"#,
        )
        .unwrap();
        let ids: Vec<_> = parse_feed(&doc).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![ProductId::new("b"), ProductId::new("a")]);
    }
}
