//! Core types for ByteHub.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod contact;
pub mod id;
pub mod page;
pub mod price;
pub mod product;

pub use contact::{ContactEmail, ContactEmailError};
pub use id::{OrderNumber, ProductId};
pub use page::{PageKind, PageMarkers};
pub use price::{CurrencyCode, ExchangeRates, format_price, symbol_for};
pub use product::{CartLine, Product, WishlistEntry, cart_count, cart_subtotal};
