//! Currencies, exchange rates and display formatting.
//!
//! Prices are stored in the base currency (USD) and converted only for display:
//! `symbol + (price * rate).toFixed(2)`.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currencies the storefront offers in its currency switcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    DZD,
}

impl CurrencyCode {
    /// All selectable currencies, in menu order.
    pub const ALL: [Self; 3] = [Self::USD, Self::EUR, Self::DZD];

    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
            Self::DZD => "دج",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::DZD => "DZD",
        }
    }

    /// Look up a currency by code (case-insensitive).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code.trim()))
    }
}

/// Symbol for an arbitrary code; unknown codes display as `$`.
#[must_use]
pub fn symbol_for(code: &str) -> &'static str {
    CurrencyCode::from_code(code).map_or("$", |c| c.symbol())
}

/// Conversion factors from the base currency, keyed by currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRates(BTreeMap<String, Decimal>);

impl Default for ExchangeRates {
    /// `{USD: 1, EUR: 0.92, DZD: 135}`.
    fn default() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert("USD".to_string(), Decimal::ONE);
        rates.insert("EUR".to_string(), Decimal::new(92, 2));
        rates.insert("DZD".to_string(), Decimal::from(135));
        Self(rates)
    }
}

impl ExchangeRates {
    /// Build a table from fetched rates. The base currency is always present
    /// with factor 1; a fetched `USD` entry does not override it.
    #[must_use]
    pub fn from_fetched(fetched: BTreeMap<String, Decimal>) -> Self {
        let mut rates: BTreeMap<String, Decimal> = fetched
            .into_iter()
            .map(|(code, rate)| (code.to_uppercase(), rate))
            .collect();
        rates.insert(CurrencyCode::USD.code().to_string(), Decimal::ONE);
        Self(rates)
    }

    /// Factor for a currency code; unknown codes convert at 1.
    #[must_use]
    pub fn factor(&self, code: &str) -> Decimal {
        self.0
            .get(&code.trim().to_uppercase())
            .copied()
            .unwrap_or(Decimal::ONE)
    }

    /// Number of currencies in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(code, factor)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(code, rate)| (code.as_str(), *rate))
    }
}

/// Format a base-currency price in the selected currency.
///
/// Rounds half away from zero to two places and always prints two decimals.
///
/// # Examples
///
/// ```
/// use bytehub_core::{ExchangeRates, format_price};
/// use rust_decimal::Decimal;
///
/// let rates = ExchangeRates::default();
/// assert_eq!(format_price(Decimal::from(10), "DZD", &rates), "دج1350.00");
/// assert_eq!(format_price(Decimal::ZERO, "EUR", &rates), "€0.00");
/// assert_eq!(format_price(Decimal::from(3), "XYZ", &rates), "$3.00");
/// ```
#[must_use]
pub fn format_price(price: Decimal, selected: &str, rates: &ExchangeRates) -> String {
    let mut converted = (price * rates.factor(selected))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    converted.rescale(2);
    format!("{}{converted}", symbol_for(selected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_symbols() {
        assert_eq!(CurrencyCode::USD.symbol(), "$");
        assert_eq!(CurrencyCode::EUR.symbol(), "€");
        assert_eq!(CurrencyCode::DZD.symbol(), "دج");
        assert_eq!(symbol_for("GBP"), "$");
    }

    #[test]
    fn test_from_code_is_case_insensitive() {
        assert_eq!(CurrencyCode::from_code("eur"), Some(CurrencyCode::EUR));
        assert_eq!(CurrencyCode::from_code(" DZD "), Some(CurrencyCode::DZD));
        assert_eq!(CurrencyCode::from_code("GBP"), None);
    }

    #[test]
    fn test_format_zero_in_every_currency() {
        let rates = ExchangeRates::default();
        for currency in CurrencyCode::ALL {
            assert_eq!(
                format_price(Decimal::ZERO, currency.code(), &rates),
                format!("{}0.00", currency.symbol())
            );
        }
    }

    #[test]
    fn test_format_usd_to_dzd() {
        let rates = ExchangeRates::default();
        assert_eq!(format_price(Decimal::from(10), "DZD", &rates), "دج1350.00");
    }

    #[test]
    fn test_format_rounds_to_two_places() {
        let rates = ExchangeRates::default();
        // 19.99 * 0.92 = 18.3908
        assert_eq!(format_price(Decimal::new(1999, 2), "EUR", &rates), "€18.39");
        // 0.005 rounds away from zero
        assert_eq!(format_price(Decimal::new(5, 3), "USD", &rates), "$0.01");
    }

    #[test]
    fn test_unknown_currency_uses_factor_one() {
        let rates = ExchangeRates::default();
        assert_eq!(format_price(Decimal::new(125, 1), "JPY", &rates), "$12.50");
    }

    #[test]
    fn test_from_fetched_pins_base_currency() {
        let mut fetched = BTreeMap::new();
        fetched.insert("eur".to_string(), Decimal::new(85, 2));
        fetched.insert("USD".to_string(), Decimal::from(7));
        let rates = ExchangeRates::from_fetched(fetched);
        assert_eq!(rates.factor("USD"), Decimal::ONE);
        assert_eq!(rates.factor("EUR"), Decimal::new(85, 2));
        assert_eq!(rates.len(), 2);
    }
}
