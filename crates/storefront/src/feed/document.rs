//! Serde model of the blog feed document.
//!
//! ```text
//! { "feed": { "entry": [ {
//!     "id":       { "$t": "tag:blogger.com,1999:blog-1.post-2" },
//!     "title":    { "$t": "Shirt" },
//!     "content":  { "$t": "<img src='a.jpg'>Price: $20" },
//!     "category": [ { "term": "Clothing" } ],
//!     "link":     [ { "rel": "alternate", "href": "https://..." } ]
//! } ] } }
//! ```
//!
//! Every field is optional. An entry that does not match this shape at all is
//! replaced by an empty entry instead of failing the whole document.

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level feed document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedDocument {
    #[serde(default)]
    pub feed: Feed,
}

/// The `feed` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Feed {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub entry: Vec<FeedEntry>,
}

/// One blog post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedEntry {
    #[serde(default)]
    pub id: Option<TextNode>,
    #[serde(default)]
    pub title: Option<TextNode>,
    #[serde(default)]
    pub content: Option<TextNode>,
    /// Present instead of `content` on summary-only feeds.
    #[serde(default)]
    pub summary: Option<TextNode>,
    #[serde(default)]
    pub category: Vec<Category>,
    #[serde(default)]
    pub link: Vec<Link>,
}

/// A `{ "$t": "..." }` text node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextNode {
    #[serde(rename = "$t", default)]
    pub text: String,
}

/// A label on the post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub term: String,
}

/// A related link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub rel: String,
    #[serde(default)]
    pub href: String,
}

impl FeedEntry {
    /// Non-empty entry id, if any.
    #[must_use]
    pub fn id_text(&self) -> Option<&str> {
        self.id
            .as_ref()
            .map(|node| node.text.trim())
            .filter(|text| !text.is_empty())
    }

    /// Post title (may be empty).
    #[must_use]
    pub fn title_text(&self) -> &str {
        self.title.as_ref().map_or("", |node| node.text.trim())
    }

    /// Post HTML: `content`, falling back to `summary`, then empty.
    #[must_use]
    pub fn body_html(&self) -> &str {
        self.content
            .as_ref()
            .or(self.summary.as_ref())
            .map_or("", |node| node.text.as_str())
    }

    /// First non-empty label.
    #[must_use]
    pub fn first_category(&self) -> Option<&str> {
        self.category
            .iter()
            .map(|c| c.term.trim())
            .find(|term| !term.is_empty())
    }

    /// The post's `rel="alternate"` link.
    #[must_use]
    pub fn permalink(&self) -> Option<&str> {
        self.link
            .iter()
            .find(|link| link.rel == "alternate" && !link.href.is_empty())
            .map(|link| link.href.as_str())
    }
}

fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<FeedEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(index, error = %e, "Malformed feed entry, using defaults");
                FeedEntry::default()
            })
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entry_array() {
        let doc: FeedDocument = serde_json::from_str(r#"{"feed":{}}"#).unwrap();
        assert!(doc.feed.entry.is_empty());

        let doc: FeedDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.feed.entry.is_empty());
    }

    #[test]
    fn test_malformed_entry_does_not_fail_document() {
        let json = r#"{"feed":{"entry":[
            {"title":{"$t":"Good"}},
            {"title":42},
            "nonsense"
        ]}}"#;
        let doc: FeedDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.feed.entry.len(), 3);
        assert_eq!(doc.feed.entry[0].title_text(), "Good");
        assert_eq!(doc.feed.entry[1].title_text(), "");
    }

    #[test]
    fn test_accessors() {
        let json = r#"{
            "id":{"$t":"  "},
            "summary":{"$t":"<p>short</p>"},
            "category":[{"term":""},{"term":"Shoes"}],
            "link":[{"rel":"replies","href":"x"},{"rel":"alternate","href":"https://blog/p.html"}]
        }"#;
        let entry: FeedEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id_text(), None);
        assert_eq!(entry.body_html(), "<p>short</p>");
        assert_eq!(entry.first_category(), Some("Shoes"));
        assert_eq!(entry.permalink(), Some("https://blog/p.html"));
    }
}
