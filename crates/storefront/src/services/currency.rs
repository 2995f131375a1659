//! Exchange rates and price display.
//!
//! The rates table is shared by all visitors and persisted under the
//! unscoped `currencyRates` key, so a restart without network access still
//! shows the last fetched rates. Each visitor's selected currency is stored in
//! their own scope.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use bytehub_core::{CurrencyCode, ExchangeRates, format_price};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::storage::{ScopedStorage, Storage, StorageError, keys};

/// Errors from the rate service or a currency selection.
#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate service returned status {0}")]
    Status(u16),

    #[error("rate service returned no usable rates")]
    NoRates,

    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: BTreeMap<String, serde_json::Number>,
}

fn to_decimal(number: &serde_json::Number) -> Option<Decimal> {
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .filter(|rate| rate.is_sign_positive() && !rate.is_zero())
}

/// Holds the live rates table and converts prices for display.
#[derive(Clone)]
pub struct CurrencyConverter {
    http: reqwest::Client,
    rates_url: String,
    storage: Storage,
    rates: Arc<RwLock<ExchangeRates>>,
}

impl CurrencyConverter {
    /// A converter starting from the default table.
    #[must_use]
    pub fn new(http: reqwest::Client, rates_url: impl Into<String>, storage: Storage) -> Self {
        Self {
            http,
            rates_url: rates_url.into(),
            storage,
            rates: Arc::new(RwLock::new(ExchangeRates::default())),
        }
    }

    /// Current rates table.
    #[must_use]
    pub fn rates(&self) -> ExchangeRates {
        match self.rates.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, rates: ExchangeRates) {
        match self.rates.write() {
            Ok(mut guard) => *guard = rates,
            Err(poisoned) => *poisoned.into_inner() = rates,
        }
    }

    /// Restore the default table.
    pub fn reset(&self) {
        self.replace(ExchangeRates::default());
    }

    /// Load the persisted table, if there is one. Returns whether it was found.
    pub async fn load_persisted(&self) -> bool {
        match self.storage.get::<ExchangeRates>(keys::CURRENCY_RATES).await {
            Some(rates) if !rates.is_empty() => {
                self.replace(rates);
                true
            }
            _ => false,
        }
    }

    /// Fetch fresh rates. On failure falls back to the persisted table, then
    /// to the defaults. Never fails; returns the table now in use.
    #[instrument(skip(self), fields(url = %self.rates_url))]
    pub async fn refresh_rates(&self) -> ExchangeRates {
        match self.fetch().await {
            Ok(rates) => {
                tracing::info!(currencies = rates.len(), "Exchange rates refreshed");
                self.storage.set(keys::CURRENCY_RATES, &rates).await;
                self.replace(rates);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Exchange rate fetch failed");
                if !self.load_persisted().await {
                    self.reset();
                }
            }
        }
        self.rates()
    }

    async fn fetch(&self) -> Result<ExchangeRates, CurrencyError> {
        let response = self.http.get(&self.rates_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CurrencyError::Status(status.as_u16()));
        }
        let body: RatesResponse = response.json().await?;
        let fetched: BTreeMap<String, Decimal> = body
            .rates
            .iter()
            .filter_map(|(code, number)| to_decimal(number).map(|rate| (code.clone(), rate)))
            .collect();
        if fetched.is_empty() {
            return Err(CurrencyError::NoRates);
        }
        Ok(ExchangeRates::from_fetched(fetched))
    }

    /// `symbol + (price * rate)` with two decimals.
    #[must_use]
    pub fn format(&self, price: Decimal, selected: &str) -> String {
        match self.rates.read() {
            Ok(guard) => format_price(price, selected, &guard),
            Err(poisoned) => format_price(price, selected, &poisoned.into_inner()),
        }
    }
}

impl std::fmt::Debug for CurrencyConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyConverter")
            .field("rates_url", &self.rates_url)
            .field("rates", &self.rates())
            .finish_non_exhaustive()
    }
}

/// The visitor's selected currency code; `USD` when unset or unknown.
pub async fn selected_currency(store: &ScopedStorage) -> CurrencyCode {
    store
        .get::<String>(keys::CURRENCY)
        .await
        .and_then(|code| CurrencyCode::from_code(&code))
        .unwrap_or_default()
}

/// Persist the visitor's currency selection.
///
/// # Errors
///
/// Returns an error for codes outside the currency menu, or when the
/// selection cannot be stored.
pub async fn select_currency(store: &ScopedStorage, code: &str) -> Result<CurrencyCode, CurrencyError> {
    let currency =
        CurrencyCode::from_code(code).ok_or_else(|| CurrencyError::UnknownCurrency(code.to_string()))?;
    store
        .storage()
        .try_set(&store.qualify(keys::CURRENCY), currency.code())
        .await?;
    Ok(currency)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn converter(url: &str) -> CurrencyConverter {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(200))
            .build()
            .unwrap();
        CurrencyConverter::new(http, url, Storage::in_memory())
    }

    #[test]
    fn test_format_defaults() {
        let c = converter("http://127.0.0.1:9/rates");
        assert_eq!(c.format(Decimal::ZERO, "USD"), "$0.00");
        assert_eq!(c.format(Decimal::from(10), "DZD"), "دج1350.00");
        assert_eq!(c.format(Decimal::from(10), "???"), "$10.00");
    }

    #[tokio::test]
    async fn test_refresh_failure_uses_persisted_table() {
        let c = converter("http://127.0.0.1:9/rates");
        let mut fetched = BTreeMap::new();
        fetched.insert("EUR".to_string(), Decimal::new(80, 2));
        let persisted = ExchangeRates::from_fetched(fetched);
        c.storage.set(keys::CURRENCY_RATES, &persisted).await;

        let rates = c.refresh_rates().await;
        assert_eq!(rates, persisted);
        assert_eq!(c.format(Decimal::from(10), "EUR"), "€8.00");
    }

    #[tokio::test]
    async fn test_refresh_failure_without_persisted_uses_defaults() {
        let c = converter("http://127.0.0.1:9/rates");
        c.replace(ExchangeRates::from_fetched(BTreeMap::new()));
        assert_eq!(c.refresh_rates().await, ExchangeRates::default());
    }

    #[test]
    fn test_to_decimal() {
        let n: serde_json::Number = serde_json::from_str("0.92").unwrap();
        assert_eq!(to_decimal(&n), Some(Decimal::new(92, 2)));
        let n: serde_json::Number = serde_json::from_str("1.5e2").unwrap();
        assert_eq!(to_decimal(&n), Some(Decimal::from(150)));
        let n: serde_json::Number = serde_json::from_str("0").unwrap();
        assert_eq!(to_decimal(&n), None);
    }

    #[tokio::test]
    async fn test_select_currency() {
        let store = Storage::in_memory().scoped("v");
        assert_eq!(selected_currency(&store).await, CurrencyCode::USD);

        assert_eq!(select_currency(&store, "eur").await.unwrap(), CurrencyCode::EUR);
        assert_eq!(selected_currency(&store).await, CurrencyCode::EUR);

        assert!(matches!(
            select_currency(&store, "GBP").await,
            Err(CurrencyError::UnknownCurrency(_))
        ));
        assert_eq!(selected_currency(&store).await, CurrencyCode::EUR);
    }
}
