//! # Currency Module
//!
//! Exchange rates, price conversion and display formatting for multi-region
//! checkout.
//!
//! ## Conversion Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every catalog price is in USD. Every rate is "units per 1 USD".        │
//! │                                                                         │
//! │   USD price ──► × rates[target] ──► target price ──► format_price()     │
//! │                                                                         │
//! │   same currency     → price unchanged (no lookup)                       │
//! │   target not in map → rate 1.0 (price passes through unchanged)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Display Rules
//! | Currency | Example        | Rule                                          |
//! |----------|----------------|-----------------------------------------------|
//! | JPY      | `¥1235`        | rounded to an integer, no grouping            |
//! | INR      | `₹12,34,567`   | lakh/crore grouping, decimals only if needed  |
//! | others   | `$1,234.50`    | thousands grouping, always 2 decimals         |
//!
//! A missing or non-numeric price renders as `{symbol}0`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::BASE_CURRENCY;

// =============================================================================
// Currency Tables
// =============================================================================

/// Static display data for a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
}

/// Every currency the storefront knows how to display.
pub const CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo { code: "USD", symbol: "$", name: "US Dollar" },
    CurrencyInfo { code: "AUD", symbol: "A$", name: "Australian Dollar" },
    CurrencyInfo { code: "GBP", symbol: "£", name: "British Pound" },
    CurrencyInfo { code: "CAD", symbol: "C$", name: "Canadian Dollar" },
    CurrencyInfo { code: "INR", symbol: "₹", name: "Indian Rupee" },
    CurrencyInfo { code: "EUR", symbol: "€", name: "Euro" },
    CurrencyInfo { code: "JPY", symbol: "¥", name: "Japanese Yen" },
];

/// Currencies offered at checkout unless configured otherwise.
pub const DEFAULT_ENABLED_CURRENCIES: &[&str] = &["AUD", "GBP", "CAD", "INR", "USD"];

/// Rates used until the first successful refresh.
pub const FALLBACK_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("AUD", 1.52),
    ("GBP", 0.79),
    ("CAD", 1.36),
    ("INR", 83.12),
];

/// Looks up display data for a currency code.
pub fn currency_info(code: &str) -> Option<&'static CurrencyInfo> {
    CURRENCIES.iter().find(|info| info.code == code)
}

/// Display symbol for a currency, or the code itself when unknown.
pub fn symbol_for(code: &str) -> &str {
    currency_info(code).map_or(code, |info| info.symbol)
}

/// Maps an ISO 3166-1 alpha-2 country code to the currency shown there.
///
/// Anything outside the storefront's regions is shown in USD.
pub fn currency_for_country(country: &str) -> &'static str {
    match country.trim().to_ascii_uppercase().as_str() {
        "AU" => "AUD",
        "GB" | "UK" => "GBP",
        "CA" => "CAD",
        "IN" => "INR",
        _ => BASE_CURRENCY,
    }
}

// =============================================================================
// Exchange Rates
// =============================================================================

/// Exchange rates relative to USD (`rate × USD price = target price`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExchangeRates(HashMap<String, f64>);

impl ExchangeRates {
    /// An empty table (every lookup falls back to 1.0).
    pub fn new() -> Self {
        ExchangeRates(HashMap::new())
    }

    /// The hard-coded table used before any refresh succeeds.
    pub fn fallback() -> Self {
        ExchangeRates(
            FALLBACK_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
        )
    }

    /// Builds a table from raw pairs. USD is always pinned to 1.0.
    pub fn from_map(rates: HashMap<String, f64>) -> Self {
        let mut table = ExchangeRates(rates);
        table.0.insert(BASE_CURRENCY.to_string(), 1.0);
        table
    }

    /// Rate for `code`, or `1.0` when the table has no entry.
    ///
    /// The identity fallback means an unknown currency is displayed at the
    /// USD amount rather than failing the conversion.
    pub fn rate(&self, code: &str) -> f64 {
        self.0.get(code).copied().unwrap_or(1.0)
    }

    /// Rate for `code` if present.
    pub fn get(&self, code: &str) -> Option<f64> {
        self.0.get(code).copied()
    }

    /// Sets a single rate.
    pub fn insert(&mut self, code: impl Into<String>, rate: f64) {
        self.0.insert(code.into(), rate);
    }

    /// Overlays `other` onto this table and returns how many rates were taken.
    ///
    /// Non-positive or non-finite rates are skipped, and USD stays at 1.0.
    pub fn merge(&mut self, other: &ExchangeRates) -> usize {
        let mut merged = 0;
        for (code, rate) in &other.0 {
            if code == BASE_CURRENCY || !rate.is_finite() || *rate <= 0.0 {
                continue;
            }
            self.0.insert(code.clone(), *rate);
            merged += 1;
        }
        merged
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(code, rate)| (code.as_str(), *rate))
    }
}

impl FromIterator<(String, f64)> for ExchangeRates {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        ExchangeRates(iter.into_iter().collect())
    }
}

// =============================================================================
// Conversion
// =============================================================================

/// Converts a USD-based price into `to`.
///
/// Same-currency conversions return `price` untouched without consulting
/// `rates`. Otherwise the price is multiplied by `rates[to]`, which falls
/// back to `1.0` when `to` is missing from the table.
///
/// ## Example
/// ```rust
/// use karat_core::currency::{convert, ExchangeRates};
///
/// let mut rates = ExchangeRates::new();
/// rates.insert("AUD", 1.5);
///
/// assert_eq!(convert(100.0, "USD", "AUD", &rates), 150.0);
/// assert_eq!(convert(100.0, "USD", "USD", &rates), 100.0);
/// assert_eq!(convert(100.0, "USD", "CHF", &rates), 100.0); // no rate
/// ```
pub fn convert(price: f64, from: &str, to: &str, rates: &ExchangeRates) -> f64 {
    if from == to {
        return price;
    }
    price * rates.rate(to)
}

// =============================================================================
// Formatting
// =============================================================================

/// Formats a price for display, prefixing `symbol` with no space.
///
/// `None`, NaN and infinities render as `{symbol}0`.
///
/// ## Example
/// ```rust
/// use karat_core::currency::format_price;
///
/// assert_eq!(format_price(None, "USD", "$"), "$0");
/// assert_eq!(format_price(Some(1234.5), "USD", "$"), "$1,234.50");
/// assert_eq!(format_price(Some(1234.5), "JPY", "¥"), "¥1235");
/// assert_eq!(format_price(Some(1234567.0), "INR", "₹"), "₹12,34,567");
/// ```
pub fn format_price(price: Option<f64>, currency: &str, symbol: &str) -> String {
    let value = match price {
        Some(value) if value.is_finite() => value,
        _ => return format!("{symbol}0"),
    };

    let body = match currency {
        "JPY" => format!("{:.0}", value.abs().round()),
        "INR" => {
            let cents = round_to_cents(value.abs());
            let fixed = if cents.fract() == 0.0 {
                format!("{cents:.0}")
            } else {
                format!("{cents:.2}")
            };
            group_digits(&fixed, group_indian)
        }
        _ => group_digits(&format!("{:.2}", round_to_cents(value.abs())), group_thousands),
    };

    let sign = if value < 0.0 && body.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };

    format!("{symbol}{sign}{body}")
}

/// Rounds to two decimals, halves away from zero (`0.125` → `0.13`), the
/// same tie rule as the JPY path.
fn round_to_cents(value: f64) -> f64 {
    let scaled = (value * 100.0).round() / 100.0;
    if scaled.is_finite() {
        scaled
    } else {
        value
    }
}

/// Applies `grouper` to the integer part of a plain decimal string.
fn group_digits(fixed: &str, grouper: fn(&str) -> String) -> String {
    match fixed.split_once('.') {
        Some((whole, fraction)) => format!("{}.{}", grouper(whole), fraction),
        None => grouper(fixed),
    }
}

/// `1234567` → `1,234,567`
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234567` → `12,34,567` (last three digits, then pairs).
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::with_capacity(digits.len() + digits.len() / 2);
    for (i, ch) in head.chars().enumerate() {
        if i > 0 && (head.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push(',');
    out.push_str(tail);
    out
}

// =============================================================================
// Currency Context
// =============================================================================

/// The shopper's currency selection plus the rate table it is priced with.
///
/// Passed explicitly to everything that displays a price, so pricing stays
/// a pure function of its inputs.
///
/// ## Lifecycle
/// ```text
/// default() ──► USD + fallback rates
///     │
///     ├── detect("IN")      ──► INR (if enabled)
///     ├── select("GBP")     ──► GBP (error if not enabled)
///     └── apply_rates(..)   ──► fresh rates merged over the old ones
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyContext {
    current_currency: String,
    rates: ExchangeRates,
    enabled: Vec<String>,
}

impl Default for CurrencyContext {
    fn default() -> Self {
        CurrencyContext::new(
            DEFAULT_ENABLED_CURRENCIES.iter().map(|c| c.to_string()).collect(),
            ExchangeRates::fallback(),
        )
    }
}

impl CurrencyContext {
    /// Creates a context showing USD with the given whitelist and rates.
    pub fn new(enabled: Vec<String>, rates: ExchangeRates) -> Self {
        CurrencyContext {
            current_currency: BASE_CURRENCY.to_string(),
            rates,
            enabled,
        }
    }

    /// The currency prices are currently shown in.
    pub fn current(&self) -> &str {
        &self.current_currency
    }

    /// Symbol of the current currency.
    pub fn symbol(&self) -> &str {
        symbol_for(&self.current_currency)
    }

    pub fn rates(&self) -> &ExchangeRates {
        &self.rates
    }

    pub fn enabled(&self) -> &[String] {
        &self.enabled
    }

    /// Checks if shoppers may select `code`. The base currency always is.
    pub fn is_enabled(&self, code: &str) -> bool {
        code == BASE_CURRENCY || self.enabled.iter().any(|c| c == code)
    }

    /// Display data for every enabled currency, for the currency picker.
    pub fn available(&self) -> Vec<&'static CurrencyInfo> {
        self.enabled.iter().filter_map(|code| currency_info(code)).collect()
    }

    /// Switches to a shopper-selected currency.
    pub fn select(&mut self, code: &str) -> CoreResult<()> {
        let code = code.trim().to_ascii_uppercase();
        if !self.is_enabled(&code) {
            return Err(CoreError::UnsupportedCurrency(code));
        }
        self.current_currency = code;
        Ok(())
    }

    /// Picks the currency for a shopper's country, if that currency is
    /// enabled. Returns the resulting current currency.
    pub fn detect(&mut self, country: &str) -> &str {
        let detected = currency_for_country(country);
        if self.is_enabled(detected) {
            self.current_currency = detected.to_string();
        }
        &self.current_currency
    }

    /// Merges freshly fetched rates. Returns the number of rates taken.
    pub fn apply_rates(&mut self, rates: &ExchangeRates) -> usize {
        self.rates.merge(rates)
    }

    /// Rate applied to base prices for the current currency.
    pub fn rate(&self) -> f64 {
        if self.current_currency == BASE_CURRENCY {
            1.0
        } else {
            self.rates.rate(&self.current_currency)
        }
    }

    /// Converts a base-currency price into the current currency.
    pub fn convert_from_base(&self, price: f64) -> f64 {
        convert(price, BASE_CURRENCY, &self.current_currency, &self.rates)
    }

    /// Converts and formats a base-currency price for display.
    pub fn display(&self, price: Option<f64>) -> String {
        format_price(
            price.map(|p| self.convert_from_base(p)),
            &self.current_currency,
            self.symbol(),
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_convert_same_currency_is_identity() {
        let rates = ExchangeRates::fallback();
        for price in [0.0, 1.0, 1234.56, -50.0, 1e12] {
            assert_eq!(convert(price, "USD", "USD", &rates), price);
            assert_eq!(convert(price, "INR", "INR", &rates), price);
        }
    }

    #[test]
    fn test_convert_multiplies_by_target_rate() {
        let rates: ExchangeRates = [("AUD".to_string(), 1.5)].into_iter().collect();
        assert_eq!(convert(100.0, "USD", "AUD", &rates), 150.0);
    }

    #[test]
    fn test_convert_missing_rate_is_identity() {
        let rates = ExchangeRates::new();
        assert_eq!(convert(100.0, "USD", "GBP", &rates), 100.0);
        assert_eq!(rates.rate("GBP"), 1.0);
    }

    #[test]
    fn test_format_guards_missing_values() {
        assert_eq!(format_price(None, "USD", "$"), "$0");
        assert_eq!(format_price(Some(f64::NAN), "GBP", "£"), "£0");
        assert_eq!(format_price(Some(f64::INFINITY), "INR", "₹"), "₹0");
    }

    #[test]
    fn test_format_jpy_rounds_to_integer() {
        assert_eq!(format_price(Some(1234.5), "JPY", "¥"), "¥1235");
        assert_eq!(format_price(Some(1234.4), "JPY", "¥"), "¥1234");
        assert_eq!(format_price(Some(0.2), "JPY", "¥"), "¥0");
        assert_eq!(format_price(Some(2.5), "JPY", "¥"), "¥3");
        assert_eq!(format_price(Some(1e20), "JPY", "¥"), "¥100000000000000000000");
    }

    #[test]
    fn test_format_inr_grouping() {
        assert_eq!(format_price(Some(1234567.0), "INR", "₹"), "₹12,34,567");
        assert_eq!(format_price(Some(123456.0), "INR", "₹"), "₹1,23,456");
        assert_eq!(format_price(Some(999.0), "INR", "₹"), "₹999");
        assert_eq!(format_price(Some(12345.5), "INR", "₹"), "₹12,345.50");
        assert_eq!(format_price(Some(100000000.25), "INR", "₹"), "₹10,00,00,000.25");
        assert_eq!(format_price(Some(12345.125), "INR", "₹"), "₹12,345.13");
        assert_eq!(format_price(Some(999.999), "INR", "₹"), "₹1,000");
    }

    #[test]
    fn test_format_default_two_decimals() {
        assert_eq!(format_price(Some(1234.5), "USD", "$"), "$1,234.50");
        assert_eq!(format_price(Some(0.0), "USD", "$"), "$0.00");
        assert_eq!(format_price(Some(999.999), "AUD", "A$"), "A$1,000.00");
        assert_eq!(format_price(Some(1234567.891), "GBP", "£"), "£1,234,567.89");
        assert_eq!(format_price(Some(12.0), "CAD", "C$"), "C$12.00");
    }

    #[test]
    fn test_format_ties_round_away_from_zero() {
        assert_eq!(format_price(Some(0.125), "USD", "$"), "$0.13");
        assert_eq!(format_price(Some(10.125), "USD", "$"), "$10.13");
        assert_eq!(format_price(Some(-10.125), "GBP", "£"), "£-10.13");
    }

    #[test]
    fn test_format_negative_amounts() {
        assert_eq!(format_price(Some(-1234.5), "USD", "$"), "$-1,234.50");
        assert_eq!(format_price(Some(-0.001), "USD", "$"), "$0.00");
    }

    #[test]
    fn test_rates_pin_usd_and_merge() {
        let mut raw = HashMap::new();
        raw.insert("USD".to_string(), 2.0);
        raw.insert("GBP".to_string(), 0.8);
        let rates = ExchangeRates::from_map(raw);
        assert_eq!(rates.rate("USD"), 1.0);

        let mut table = ExchangeRates::fallback();
        let mut fresh = ExchangeRates::new();
        fresh.insert("GBP", 0.81);
        fresh.insert("USD", 3.0);
        fresh.insert("CAD", -1.0);
        fresh.insert("INR", f64::NAN);

        assert_eq!(table.merge(&fresh), 1);
        assert_eq!(table.rate("GBP"), 0.81);
        assert_eq!(table.rate("USD"), 1.0);
        assert_eq!(table.rate("CAD"), 1.36);
    }

    #[test]
    fn test_currency_for_country() {
        assert_eq!(currency_for_country("au"), "AUD");
        assert_eq!(currency_for_country("GB"), "GBP");
        assert_eq!(currency_for_country("UK"), "GBP");
        assert_eq!(currency_for_country("CA"), "CAD");
        assert_eq!(currency_for_country(" IN "), "INR");
        assert_eq!(currency_for_country("DE"), "USD");
        assert_eq!(currency_for_country(""), "USD");
    }

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(symbol_for("GBP"), "£");
        assert_eq!(symbol_for("INR"), "₹");
        assert_eq!(symbol_for("CHF"), "CHF");
    }

    #[test]
    fn test_context_defaults_to_usd() {
        let ctx = CurrencyContext::default();
        assert_eq!(ctx.current(), "USD");
        assert_eq!(ctx.symbol(), "$");
        assert_eq!(ctx.rate(), 1.0);
        assert_eq!(ctx.display(Some(1234.5)), "$1,234.50");
        assert_eq!(ctx.available().len(), 5);
    }

    #[test]
    fn test_context_select() {
        let mut ctx = CurrencyContext::default();
        ctx.select("gbp").unwrap();
        assert_eq!(ctx.current(), "GBP");
        assert!(approx_eq(ctx.convert_from_base(100.0), 79.0));
        assert_eq!(ctx.display(Some(100.0)), "£79.00");

        let err = ctx.select("JPY").unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedCurrency(code) if code == "JPY"));
        assert_eq!(ctx.current(), "GBP");
    }

    #[test]
    fn test_context_detect_only_switches_to_enabled() {
        let mut ctx = CurrencyContext::new(vec!["USD".into(), "INR".into()], ExchangeRates::fallback());
        assert_eq!(ctx.detect("AU"), "USD");
        assert_eq!(ctx.detect("IN"), "INR");
        assert_eq!(ctx.display(Some(1000.0)), "₹83,120");
    }

    #[test]
    fn test_context_display_missing_price() {
        let mut ctx = CurrencyContext::default();
        ctx.select("INR").unwrap();
        assert_eq!(ctx.display(None), "₹0");
    }
}
