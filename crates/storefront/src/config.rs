//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Required with `STOREFRONT_STORAGE=encrypted`
//! - `STOREFRONT_STORAGE_PASSPHRASE` - Passphrase the store key is derived from
//!   (high entropy, never a placeholder)
//! - `STOREFRONT_STORAGE_SALT` - Per-installation salt (min 8 bytes)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DATABASE_URL` - `SQLite` URL for sessions and the encrypted store
//!   (default: `sqlite://bytehub.db?mode=rwc`)
//! - `STOREFRONT_STORAGE` - `local` or `encrypted` (default: local)
//! - `STOREFRONT_LOCAL_STORE_PATH` - JSON file mirroring the local store
//! - `STOREFRONT_FEED_URL` - Blog product feed (JSON)
//! - `STOREFRONT_RATES_URL` - Exchange rate endpoint
//! - `STOREFRONT_CATALOG_TTL_SECS` - How long a fetched feed is served (default: 300)
//! - `STOREFRONT_HTTP_TIMEOUT_SECS` - Outbound request timeout (default: 10)
//! - `STOREFRONT_WHATSAPP_NUMBER` - Number used by the quick view WhatsApp button
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Default product feed: every post labelled `product`.
pub const DEFAULT_FEED_URL: &str =
    "https://bytehubstoren.blogspot.com/feeds/posts/default/-/product?alt=json&max-results=100";

/// Default exchange rate endpoint (base USD).
pub const DEFAULT_RATES_URL: &str = "https://api.frankfurter.app/latest?from=USD&to=EUR,DZD";

const MIN_PASSPHRASE_LENGTH: usize = 24;
const MIN_SALT_LENGTH: usize = 8;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Values that show up when someone copies `.env.example` without editing it.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "bytehub-secret",
    "password",
    "xxx",
    "todo",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which storage strategy backs carts, wishlists and preferences.
///
/// Chosen once at startup; the two are never mixed in one deployment.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Plain JSON values in process memory, optionally mirrored to a file.
    Local { path: Option<PathBuf> },
    /// AES-GCM encrypted values in `SQLite`.
    Encrypted {
        passphrase: SecretString,
        salt: String,
    },
}

impl StorageConfig {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Encrypted { .. } => "encrypted",
        }
    }
}

/// Outbound feed and exchange-rate settings.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub feed_url: String,
    pub rates_url: String,
    pub catalog_ttl: Duration,
    pub http_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            rates_url: DEFAULT_RATES_URL.to_string(),
            catalog_ttl: Duration::from_secs(300),
            http_timeout: Duration::from_secs(10),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `SQLite` URL for sessions and the encrypted store
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Storage strategy
    pub storage: StorageConfig,
    /// Feed and rates endpoints
    pub feed: FeedConfig,
    /// WhatsApp number for the quick view contact button
    pub whatsapp_number: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the storage passphrase fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        Ok(Self {
            database_url: database_url_from_env(),
            host,
            port,
            base_url,
            storage: StorageConfig::from_env()?,
            feed: FeedConfig::from_env()?,
            whatsapp_number: get_optional_env("STOREFRONT_WHATSAPP_NUMBER"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should be marked `Secure`.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Default `SQLite` database file.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://bytehub.db?mode=rwc";

/// `STOREFRONT_DATABASE_URL`, or [`DEFAULT_DATABASE_URL`].
#[must_use]
pub fn database_url_from_env() -> SecretString {
    SecretString::from(get_env_or_default(
        "STOREFRONT_DATABASE_URL",
        DEFAULT_DATABASE_URL,
    ))
}

impl StorageConfig {
    /// Load the storage strategy from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unknown strategy, or missing or weak
    /// encryption secrets.
    pub fn from_env() -> Result<Self, ConfigError> {
        let kind = get_env_or_default("STOREFRONT_STORAGE", "local");
        match kind.to_lowercase().as_str() {
            "local" => Ok(Self::Local {
                path: get_optional_env("STOREFRONT_LOCAL_STORE_PATH").map(PathBuf::from),
            }),
            "encrypted" => {
                let passphrase = get_required_env("STOREFRONT_STORAGE_PASSPHRASE")?;
                validate_passphrase(&passphrase, "STOREFRONT_STORAGE_PASSPHRASE")?;
                let salt = get_required_env("STOREFRONT_STORAGE_SALT")?;
                validate_salt(&salt, "STOREFRONT_STORAGE_SALT")?;
                Ok(Self::Encrypted {
                    passphrase: SecretString::from(passphrase),
                    salt,
                })
            }
            other => Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_STORAGE".to_string(),
                format!("expected 'local' or 'encrypted', got '{other}'"),
            )),
        }
    }
}

impl FeedConfig {
    /// Load feed settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a numeric setting does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            feed_url: get_optional_env("STOREFRONT_FEED_URL").unwrap_or(defaults.feed_url),
            rates_url: get_optional_env("STOREFRONT_RATES_URL").unwrap_or(defaults.rates_url),
            catalog_ttl: Duration::from_secs(parse_env("STOREFRONT_CATALOG_TTL_SECS", "300")?),
            http_timeout: Duration::from_secs(parse_env("STOREFRONT_HTTP_TIMEOUT_SECS", "10")?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Read and parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// The storage passphrase must be long, not a placeholder, and random-looking.
fn validate_passphrase(passphrase: &str, var_name: &str) -> Result<(), ConfigError> {
    if passphrase.chars().count() < MIN_PASSPHRASE_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_PASSPHRASE_LENGTH} characters"),
        ));
    }

    let lower = passphrase.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(passphrase);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

fn validate_salt(salt: &str, var_name: &str) -> Result<(), ConfigError> {
    if salt.len() < MIN_SALT_LENGTH {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must be at least {MIN_SALT_LENGTH} bytes"),
        ));
    }
    Ok(())
}

/// Redacted view of a secret for logs.
#[must_use]
pub fn redact(secret: &SecretString) -> String {
    let len = secret.expose_secret().chars().count();
    format!("[REDACTED; {len} chars]")
}
