//! View models for the Askama templates.
//!
//! Templates never format money themselves: every price arrives here as a
//! `Decimal` in the base currency and leaves as a display string in the
//! visitor's currency.

use bytehub_core::{
    CartLine, CurrencyCode, ExchangeRates, Product, WishlistEntry, cart_count, cart_subtotal,
    format_price,
};
use rust_decimal::Decimal;

use crate::middleware::Visitor;
use crate::services::{OrderConfirmation, preferences, selected_currency};
use crate::state::AppState;

/// Rates snapshot plus the visitor's currency, for formatting a whole page.
#[derive(Debug, Clone)]
pub struct Pricing {
    rates: ExchangeRates,
    selected: CurrencyCode,
}

impl Pricing {
    #[must_use]
    pub const fn new(rates: ExchangeRates, selected: CurrencyCode) -> Self {
        Self { rates, selected }
    }

    /// Pricing for the current visitor.
    pub async fn for_visitor(state: &AppState, visitor: &Visitor) -> Self {
        Self::new(
            state.currency().rates(),
            selected_currency(&visitor.store).await,
        )
    }

    #[must_use]
    pub fn format(&self, price: Decimal) -> String {
        format_price(price, self.selected.code(), &self.rates)
    }

    #[must_use]
    pub const fn selected(&self) -> CurrencyCode {
        self.selected
    }
}

/// One entry of the header currency menu.
#[derive(Debug, Clone)]
pub struct CurrencyOption {
    pub code: &'static str,
    pub symbol: &'static str,
    pub selected: bool,
}

/// Currency menu with `selected` marked.
#[must_use]
pub fn currency_options(selected: CurrencyCode) -> Vec<CurrencyOption> {
    CurrencyCode::ALL
        .into_iter()
        .map(|c| CurrencyOption {
            code: c.code(),
            symbol: c.symbol(),
            selected: c == selected,
        })
        .collect()
}

/// Shared page header and body attributes.
#[derive(Debug, Clone)]
pub struct Chrome {
    pub page: &'static str,
    pub cart_count: u32,
    pub wishlist_count: usize,
    pub currencies: Vec<CurrencyOption>,
    pub theme: &'static str,
    pub direction: &'static str,
    pub query: String,
}

impl Chrome {
    /// Header state for `visitor` on a page of kind `page`.
    pub async fn load(visitor: &Visitor, pricing: &Pricing, page: &'static str) -> Self {
        let cart = visitor.cart();
        Self {
            page,
            cart_count: cart_count(&cart.read_cart().await),
            wishlist_count: cart.read_wishlist().await.len(),
            currencies: currency_options(pricing.selected()),
            theme: preferences::theme(&visitor.store).await.as_str(),
            direction: preferences::direction(&visitor.store).await.as_str(),
            query: String::new(),
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }
}

/// A product card, quick view or product page.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    /// Id escaped for use in a URL path segment.
    pub path_id: String,
    pub title: String,
    pub img: String,
    pub price: String,
    pub old_price: Option<String>,
    pub category: String,
    pub short_desc: String,
    pub colors: Vec<String>,
    pub images: Vec<String>,
    pub permalink: Option<String>,
    pub purchasable: bool,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, pricing: &Pricing) -> Self {
        Self {
            id: product.id.to_string(),
            path_id: urlencoding::encode(product.id.as_str()).into_owned(),
            title: product.title.clone(),
            img: product.img.clone(),
            price: pricing.format(product.price),
            old_price: product.old_price.map(|p| pricing.format(p)),
            category: product.category.clone(),
            short_desc: product.short_desc.clone(),
            colors: product.color_options(),
            images: product.gallery(),
            permalink: product.permalink.clone(),
            purchasable: product.is_purchasable(),
        }
    }

    /// Views for a list of products.
    #[must_use]
    pub fn list(products: &[Product], pricing: &Pricing) -> Vec<Self> {
        products.iter().map(|p| Self::new(p, pricing)).collect()
    }
}

/// One row of the cart dropdown, cart page or order summary.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub path_id: String,
    pub title: String,
    pub img: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub color: Option<String>,
}

impl CartLineView {
    #[must_use]
    pub fn new(line: &CartLine, pricing: &Pricing) -> Self {
        Self {
            id: line.id().to_string(),
            path_id: urlencoding::encode(line.id().as_str()).into_owned(),
            title: line.product.title.clone(),
            img: line.product.img.clone(),
            quantity: line.quantity,
            price: pricing.format(line.product.price),
            line_total: pricing.format(line.line_total()),
            color: line.selected_color.clone(),
        }
    }
}

/// Cart contents with totals.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub count: u32,
    pub subtotal: String,
}

impl CartView {
    #[must_use]
    pub fn new(lines: &[CartLine], pricing: &Pricing) -> Self {
        Self {
            lines: lines.iter().map(|l| CartLineView::new(l, pricing)).collect(),
            count: cart_count(lines),
            subtotal: pricing.format(cart_subtotal(lines)),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Wishlist entries as product views.
#[must_use]
pub fn wishlist_views(entries: &[WishlistEntry], pricing: &Pricing) -> Vec<ProductView> {
    entries
        .iter()
        .map(|entry| ProductView::new(&entry.product, pricing))
        .collect()
}

/// Contact and share links shown in the quick view.
#[derive(Debug, Clone)]
pub struct ShareLinks {
    pub whatsapp: Option<String>,
    pub facebook: String,
    pub twitter: String,
    pub pinterest: String,
}

impl ShareLinks {
    /// Links for `product`, sharing its blog post when known and the
    /// storefront product URL otherwise.
    #[must_use]
    pub fn new(product: &ProductView, base_url: &str, whatsapp_number: Option<&str>) -> Self {
        let page_url = product.permalink.clone().unwrap_or_else(|| {
            format!("{}/products/{}", base_url.trim_end_matches('/'), product.path_id)
        });
        let url = urlencoding::encode(&page_url);
        let title = urlencoding::encode(&product.title);

        let whatsapp = whatsapp_number.map(|number| {
            let digits: String = number.chars().filter(char::is_ascii_digit).collect();
            let message = format!(
                "Hello, I'm interested in {} ({}) {page_url}",
                product.title, product.price
            );
            format!("https://wa.me/{digits}?text={}", urlencoding::encode(&message))
        });

        Self {
            whatsapp,
            facebook: format!("https://www.facebook.com/sharer/sharer.php?u={url}"),
            twitter: format!("https://twitter.com/intent/tweet?url={url}&text={title}"),
            pinterest: format!(
                "https://pinterest.com/pin/create/button/?url={url}&media={}&description={title}",
                urlencoding::encode(&product.img)
            ),
        }
    }
}

/// Order confirmation for the template.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub order_number: String,
    pub date: String,
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postcode: String,
    pub payment: String,
}

impl OrderView {
    #[must_use]
    pub fn new(order: &OrderConfirmation, pricing: &Pricing) -> Self {
        let customer = &order.customer;
        Self {
            order_number: order.order_number.to_string(),
            date: order.placed_at.format("%B %-d, %Y").to_string(),
            lines: order
                .lines
                .iter()
                .map(|l| CartLineView::new(l, pricing))
                .collect(),
            total: pricing.format(order.subtotal),
            name: customer.name.clone(),
            email: customer.email.as_str().to_string(),
            phone: customer.phone.clone(),
            address: customer.address.clone(),
            city: customer.city.clone(),
            postcode: customer.postcode.clone(),
            payment: customer.payment.clone(),
        }
    }
}
