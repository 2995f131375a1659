//! Storefront services.
//!
//! - `cart` - cart and wishlist over visitor storage
//! - `currency` - exchange rates and price formatting
//! - `checkout` - form validation and order confirmation
//! - `preferences` - theme, text direction and the last opened product

pub mod cart;
pub mod checkout;
pub mod currency;
pub mod preferences;

pub use cart::CartService;
pub use checkout::{CheckoutError, CheckoutForm, OrderConfirmation, place_order};
pub use currency::{CurrencyConverter, CurrencyError, select_currency, selected_currency};
