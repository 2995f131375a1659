//! Newtype IDs for type-safe entity references.
//!
//! Product ids come from the blog feed (or are synthesized when an entry has
//! none), so they are opaque strings. Order numbers are generated at checkout.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a product as published in the feed.
///
/// Two products are the same product if and only if their ids are equal;
/// nothing else about a product carries identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the id is blank.
    ///
    /// Blank ids can show up in hand-edited stored carts; such products are
    /// never added to a cart or wishlist.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Order confirmation number shown to the customer after checkout.
///
/// Always rendered as 11 digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(u64);

impl OrderNumber {
    /// Largest value that still fits in 11 decimal digits.
    pub const MAX: u64 = 99_999_999_999;

    /// Create an order number, wrapping values that exceed 11 digits.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value % (Self::MAX + 1))
    }

    /// Get the numeric value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:011}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_display() {
        let id = ProductId::new("tag:blogger.com,1999:blog-1.post-2");
        assert_eq!(id.to_string(), "tag:blogger.com,1999:blog-1.post-2");
    }

    #[test]
    fn test_product_id_blank() {
        assert!(ProductId::new("").is_blank());
        assert!(ProductId::new("   ").is_blank());
        assert!(!ProductId::new("shirt").is_blank());
    }

    #[test]
    fn test_product_id_is_transparent_in_json() {
        let json = serde_json::to_string(&ProductId::new("p-1")).unwrap_or_default();
        assert_eq!(json, "\"p-1\"");
    }

    #[test]
    fn test_order_number_is_eleven_digits() {
        assert_eq!(OrderNumber::new(42).to_string(), "00000000042");
        assert_eq!(OrderNumber::new(OrderNumber::MAX).to_string(), "99999999999");
        assert_eq!(OrderNumber::new(OrderNumber::MAX + 5).as_u64(), 4);
    }
}
