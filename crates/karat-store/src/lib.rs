//! # karat-store: Storefront State for Karat
//!
//! Everything between the pure calculator in `karat-core` and the outside
//! world: configuration files, the catalog, the shopper's cart, checkout and
//! exchange-rate refresh.
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         karat-store                                     │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌───────────────────────────┐   │
//! │  │ StoreConfig  │   │   Catalog    │   │        Storefront         │   │
//! │  │ toml + env   │──►│ metals       │──►│  cart      (CartState)    │   │
//! │  │ karat.toml   │   │ stones       │   │  currency  (CurrencyState)│   │
//! │  └──────────────┘   │ products     │   │  orders    (checkout)     │   │
//! │                     └──────────────┘   └─────────────▲─────────────┘   │
//! │                                                      │ apply_rates      │
//! │                                        ┌─────────────┴─────────────┐   │
//! │                                        │ RateRefresher (tokio)     │   │
//! │                                        │ FileRateProvider / Static │   │
//! │                                        └───────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use karat_store::{Catalog, FileRateProvider, RateRefresher, StoreConfig, Storefront};
//!
//! let config = StoreConfig::load_or_default(None);
//! let catalog = Catalog::load(&catalog_path)?;
//! let store = Storefront::new(config.clone(), catalog)?;
//!
//! if let Some(source) = &config.rates.source {
//!     RateRefresher::new(config.rates.clone())
//!         .spawn_periodic(Arc::new(FileRateProvider::new(source)), store.currency().clone());
//! }
//!
//! store.detect_currency("AU");
//! let totals = store.cart_totals()?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod rates;
pub mod state;
pub mod storefront;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::{Catalog, QuoteRequest};
pub use checkout::place_order;
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use rates::{FileRateProvider, RateProvider, RateRefresher, RefreshOutcome, StaticRateProvider};
pub use state::{Cart, CartLine, CartState, CartTotals, CurrencyState, LineSelection};
pub use storefront::Storefront;
