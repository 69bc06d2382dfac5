//! # Store Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KARAT_DEFAULT_CURRENCY=GBP                                         │
//! │     KARAT_CATALOG_PATH=/srv/karat/catalog.toml                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/karat/karat.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.karat.store/karat.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     USD, AUD/GBP/CAD/INR/USD enabled, hard-coded fallback rates        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! name = "Karat Fine Jewelry"
//! country = "US"
//!
//! [currency]
//! default = "USD"
//! enabled = ["AUD", "GBP", "CAD", "INR", "USD"]
//!
//! [currency.fallback_rates]
//! AUD = 1.52
//! GBP = 0.79
//!
//! [rates]
//! source = "/srv/karat/rates.json"
//! max_retries = 3
//! initial_backoff_ms = 500
//! max_backoff_secs = 30
//!
//! [catalog]
//! path = "/srv/karat/catalog.toml"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use karat_core::currency::{DEFAULT_ENABLED_CURRENCIES, FALLBACK_RATES};
use karat_core::validation::{validate_currency_code, validate_exchange_rate};
use karat_core::{CurrencyContext, ExchangeRates, BASE_CURRENCY};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Store Settings
// =============================================================================

fn default_store_name() -> String {
    "Karat Fine Jewelry".to_string()
}

fn default_country() -> String {
    "US".to_string()
}

/// Identity of the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Home country (ISO 3166-1 alpha-2).
    #[serde(default = "default_country")]
    pub country: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            country: default_country(),
        }
    }
}

// =============================================================================
// Currency Settings
// =============================================================================

fn default_currency() -> String {
    BASE_CURRENCY.to_string()
}

fn default_enabled() -> Vec<String> {
    DEFAULT_ENABLED_CURRENCIES.iter().map(|c| c.to_string()).collect()
}

fn default_fallback_rates() -> HashMap<String, f64> {
    FALLBACK_RATES
        .iter()
        .map(|(code, rate)| (code.to_string(), *rate))
        .collect()
}

/// Which currencies shoppers can pick and the rates used before refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// Currency shown before detection or selection.
    #[serde(default = "default_currency")]
    pub default: String,

    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,

    #[serde(default = "default_fallback_rates")]
    pub fallback_rates: HashMap<String, f64>,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            default: default_currency(),
            enabled: default_enabled(),
            fallback_rates: default_fallback_rates(),
        }
    }
}

// =============================================================================
// Rate Refresh Settings
// =============================================================================

fn default_refresh_interval() -> u64 {
    3600
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    500
}

fn default_max_backoff() -> u64 {
    30
}

/// Exchange-rate refresh behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSettings {
    /// JSON rate file. Without one the fallback table is used as-is.
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Seconds between scheduled refreshes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Retries after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

impl Default for RateSettings {
    fn default() -> Self {
        RateSettings {
            source: None,
            refresh_interval_secs: default_refresh_interval(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

impl RateSettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

// =============================================================================
// Catalog Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Catalog TOML with metals, stones and products.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Store Config
// =============================================================================

/// Complete storefront configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub currency: CurrencySettings,

    #[serde(default)]
    pub rates: RateSettings,

    #[serde(default)]
    pub catalog: CatalogSettings,
}

impl StoreConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (karat.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    fn load_with(
        config_path: Option<PathBuf>,
        var: impl Fn(&str) -> Option<String>,
    ) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(var);
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document without touching the environment.
    pub fn from_toml_str(contents: &str) -> StoreResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| StoreError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Store config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        let country = &self.store.country;
        if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(StoreError::InvalidConfig(format!(
                "store country must be a two letter ISO 3166 code, got '{country}'"
            )));
        }

        if self.currency.enabled.is_empty() {
            return Err(StoreError::InvalidConfig(
                "at least one currency must be enabled".into(),
            ));
        }

        for code in &self.currency.enabled {
            validate_currency_code(code)
                .map_err(|e| StoreError::InvalidConfig(format!("enabled currency: {e}")))?;
        }

        validate_currency_code(&self.currency.default)
            .map_err(|e| StoreError::InvalidConfig(format!("default currency: {e}")))?;

        if self.currency.default != BASE_CURRENCY
            && !self.currency.enabled.contains(&self.currency.default)
        {
            return Err(StoreError::InvalidConfig(format!(
                "default currency {} is not enabled",
                self.currency.default
            )));
        }

        for (code, rate) in &self.currency.fallback_rates {
            validate_exchange_rate(code, *rate)
                .map_err(|e| StoreError::InvalidConfig(format!("fallback rates: {e}")))?;
        }

        if self.rates.initial_backoff_ms == 0 {
            return Err(StoreError::InvalidConfig(
                "initial_backoff_ms must be greater than 0".into(),
            ));
        }

        if self.rates.refresh_interval_secs == 0 {
            return Err(StoreError::InvalidConfig(
                "refresh_interval_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(name) = var("KARAT_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(country) = var("KARAT_COUNTRY") {
            debug!(country = %country, "Overriding store country from environment");
            self.store.country = country.to_ascii_uppercase();
        }

        if let Some(code) = var("KARAT_DEFAULT_CURRENCY") {
            debug!(currency = %code, "Overriding default currency from environment");
            self.currency.default = code.trim().to_ascii_uppercase();
        }

        if let Some(path) = var("KARAT_CATALOG_PATH") {
            debug!(path = %path, "Overriding catalog path from environment");
            self.catalog.path = Some(PathBuf::from(path));
        }

        if let Some(path) = var("KARAT_RATES_PATH") {
            debug!(path = %path, "Overriding rate source from environment");
            self.rates.source = Some(PathBuf::from(path));
        }

        if let Some(retries) = var("KARAT_RATE_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(n) => self.rates.max_retries = n,
                Err(_) => warn!(value = %retries, "Ignoring invalid KARAT_RATE_MAX_RETRIES"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "karat", "store")
            .map(|dirs| dirs.config_dir().join("karat.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Builds the starting currency context: fallback rates, the enabled
    /// whitelist, and the configured default currency selected.
    ///
    /// With the default left at the base currency, the store country picks
    /// the currency instead (e.g. `country = "IN"` starts in INR when INR is
    /// enabled).
    pub fn currency_context(&self) -> StoreResult<CurrencyContext> {
        let rates = ExchangeRates::from_map(self.currency.fallback_rates.clone());
        let mut ctx = CurrencyContext::new(self.currency.enabled.clone(), rates);
        ctx.select(&self.currency.default)?;

        if self.currency.default == BASE_CURRENCY {
            let detected = ctx.detect(&self.store.country);
            debug!(country = %self.store.country, currency = %detected, "Currency from store country");
        }

        Ok(ctx)
    }
}
