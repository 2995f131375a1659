//! ByteHub Core - Shared domain types.
//!
//! This crate provides the types shared by the ByteHub components:
//! - `storefront` - Server-rendered shop (feed, cart, wishlist, checkout)
//! - `cli` - Feed inspection and store maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Cart arithmetic, price formatting and
//! page classification live here so every component computes them the same way.
//!
//! # Modules
//!
//! - [`types`] - Products, cart lines, currencies, contact emails, page kinds

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
