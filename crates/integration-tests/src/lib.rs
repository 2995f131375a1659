//! Integration test harness for the ByteHub storefront.
//!
//! Tests drive the real router in-process with `tower::ServiceExt::oneshot`,
//! backed by an in-memory `SQLite` pool for sessions and an in-memory visitor
//! store. Outbound HTTP (feed, exchange rates) goes to a local axum server
//! started by [`MockUpstream`].
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bytehub-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_pages` - Page classification and rendering
//! - `storefront_cart` - Cart, wishlist, currency and checkout over HTTP
//! - `upstream_sources` - Feed and exchange-rate fetching with fallbacks

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use bytehub_core::{Product, ProductId};
use bytehub_storefront::config::{FeedConfig, StorageConfig, StorefrontConfig};
use bytehub_storefront::feed::Catalog;
use bytehub_storefront::middleware::{create_session_layer, create_session_store};
use bytehub_storefront::services::CurrencyConverter;
use bytehub_storefront::state::AppState;
use bytehub_storefront::storage::Storage;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tower::ServiceExt;

/// Base URL used for share links in tests.
pub const BASE_URL: &str = "http://shop.test";

/// A catalog product with sensible defaults.
#[must_use]
pub fn product(id: &str, title: &str, price: Decimal) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        img: format!("https://img.test/{id}.jpg"),
        price,
        old_price: None,
        category: "Test".to_string(),
        short_desc: format!("{title} description"),
        colors: None,
        images: None,
        permalink: Some(format!("{BASE_URL}/2024/05/{id}.html")),
    }
}

/// The products most tests run against.
#[must_use]
pub fn sample_catalog() -> Vec<Product> {
    let mut shirt = product("shirt", "Blue Shirt", Decimal::new(1999, 2));
    shirt.colors = Some(vec!["Blue".to_string(), "Red".to_string()]);
    vec![
        shirt,
        product("mug", "Coffee Mug", Decimal::from(10)),
        product("sample", "Free Sample", Decimal::ZERO),
    ]
}

/// Storefront configuration that never touches the environment.
#[must_use]
pub fn test_config(rates_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: BASE_URL.to_string(),
        storage: StorageConfig::Local { path: None },
        feed: FeedConfig {
            rates_url: rates_url.to_string(),
            http_timeout: Duration::from_secs(2),
            ..FeedConfig::default()
        },
        whatsapp_number: Some("+213 555 1234".to_string()),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// An HTTP client for tests that talk to [`MockUpstream`].
#[must_use]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

/// Response captured from the router.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Value of a header, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// One visitor's view of the storefront router.
///
/// Keeps the session cookie between requests like a browser would. Clone
/// the app with [`TestApp::new_visitor`] to act as a second visitor against
/// the same state.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    /// Build the app over `products`, with exchange rates that are never
    /// fetched.
    pub async fn new(products: Vec<Product>) -> Self {
        Self::with_storage(products, Storage::in_memory()).await
    }

    /// Build the app over `products` with a specific visitor store.
    pub async fn with_storage(products: Vec<Product>, storage: Storage) -> Self {
        let config = test_config("http://127.0.0.1:9/rates");
        let pool = bytehub_storefront::db::create_pool(&config.database_url)
            .await
            .unwrap();
        let session_store = create_session_store(&pool).await.unwrap();
        let session_layer = create_session_layer(session_store, &config);

        let currency =
            CurrencyConverter::new(http_client(), config.feed.rates_url.clone(), storage.clone());
        let state = AppState::from_parts(
            config,
            pool,
            storage,
            Catalog::from_products(products),
            currency,
        );
        let router = bytehub_storefront::app(state.clone(), session_layer);

        Self {
            state,
            router,
            cookie: None,
        }
    }

    /// A fresh visitor (no cookie) against the same state.
    #[must_use]
    pub fn new_visitor(&self) -> Self {
        Self {
            state: self.state.clone(),
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// `GET path`.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::get(path);
        self.send(request, Body::empty()).await
    }

    /// `POST path` with a url-encoded form body, as HTMX sends it.
    pub async fn htmx_post(&mut self, path: &str, form: &str) -> TestResponse {
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("HX-Request", "true");
        self.send(request, Body::from(form.to_string())).await
    }

    /// `POST path` with a url-encoded form body from a plain browser form.
    pub async fn post(&mut self, path: &str, form: &str, referer: Option<&str>) -> TestResponse {
        let mut request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }
        self.send(request, Body::from(form.to_string())).await
    }

    async fn send(&mut self, mut request: axum::http::request::Builder, body: Body) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response: Response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            && let Some(pair) = set_cookie.split(';').next()
        {
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// A local stand-in for the blog feed and the exchange-rate API.
///
/// Serves `/feed` and `/rates` until dropped. Either can be switched to
/// answer `503` to exercise fallbacks.
pub struct MockUpstream {
    addr: SocketAddr,
    control: Arc<UpstreamControl>,
    server: tokio::task::JoinHandle<()>,
}

struct UpstreamControl {
    feed_body: String,
    rates_body: String,
    down: AtomicBool,
    feed_hits: AtomicUsize,
}

impl MockUpstream {
    /// Start serving `feed_body` and `rates_body`.
    pub async fn start(feed_body: impl Into<String>, rates_body: impl Into<String>) -> Self {
        let control = Arc::new(UpstreamControl {
            feed_body: feed_body.into(),
            rates_body: rates_body.into(),
            down: AtomicBool::new(false),
            feed_hits: AtomicUsize::new(0),
        });
        let router = Router::new()
            .route("/feed", get(serve_feed))
            .route("/rates", get(serve_rates))
            .with_state(control.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            addr,
            control,
            server,
        }
    }

    #[must_use]
    pub fn feed_url(&self) -> String {
        format!("http://{}/feed", self.addr)
    }

    #[must_use]
    pub fn rates_url(&self) -> String {
        format!("http://{}/rates", self.addr)
    }

    /// Requests received on `/feed` so far.
    #[must_use]
    pub fn feed_hits(&self) -> usize {
        self.control.feed_hits.load(Ordering::SeqCst)
    }

    /// Make every endpoint answer `503 Service Unavailable`.
    pub fn go_down(&self) {
        self.control.down.store(true, Ordering::SeqCst);
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn serve_feed(State(control): State<Arc<UpstreamControl>>) -> Response {
    control.feed_hits.fetch_add(1, Ordering::SeqCst);
    if control.down.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    control.feed_body.clone().into_response()
}

async fn serve_rates(State(control): State<Arc<UpstreamControl>>) -> Response {
    if control.down.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    (
        [(header::CONTENT_TYPE, "application/json")],
        control.rates_body.clone(),
    )
        .into_response()
}

/// Build a feed document with one entry per `(id, title, html)`.
#[must_use]
pub fn feed_json(entries: &[(&str, &str, &str)]) -> String {
    let entries: Vec<serde_json::Value> = entries
        .iter()
        .map(|(id, title, html)| {
            serde_json::json!({
                "id": {"$t": id},
                "title": {"$t": title},
                "content": {"$t": html},
                "category": [{"term": "Shirts"}],
                "link": [{"rel": "alternate", "href": format!("{BASE_URL}/2024/05/{id}.html")}]
            })
        })
        .collect();
    serde_json::json!({"feed": {"entry": entries}}).to_string()
}
