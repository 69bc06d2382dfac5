//! # Store Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Store Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Catalog      │  │     Exchange Rates      │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  CatalogLoad    │  │  RateFetchFailed        │ │
//! │  │  ConfigLoad     │  │  InvalidCatalog │  │  RateSourceUnavailable  │ │
//! │  │  ConfigSave     │  │                 │  │  InvalidRates           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Domain errors (cart, orders, lookups) pass through as Core(..)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use karat_core::CoreError;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Catalog Errors
    // =========================================================================
    #[error("Failed to load catalog: {0}")]
    CatalogLoadFailed(String),

    /// Catalog parsed but references or data are inconsistent.
    #[error("Invalid catalog entry {entry}: {reason}")]
    InvalidCatalog { entry: String, reason: String },

    // =========================================================================
    // Exchange Rate Errors
    // =========================================================================
    /// The source was reachable but returned something unusable.
    #[error("Invalid exchange rates: {0}")]
    InvalidRates(String),

    /// The source could not be read at all (transient).
    #[error("Exchange rate source unavailable: {0}")]
    RateSourceUnavailable(String),

    #[error("Exchange rate refresh failed after {attempts} attempts: {last_error}")]
    RateFetchFailed { attempts: u32, last_error: String },

    // =========================================================================
    // Domain Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<karat_core::ValidationError> for StoreError {
    fn from(err: karat_core::ValidationError) -> Self {
        StoreError::Core(CoreError::Validation(err))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        StoreError::ConfigSaveFailed(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::InvalidRates(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl StoreError {
    /// Returns true if a rate refresh hitting this error should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::RateSourceUnavailable(_))
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidConfig(_)
                | StoreError::ConfigLoadFailed(_)
                | StoreError::ConfigSaveFailed(_)
        )
    }
}
