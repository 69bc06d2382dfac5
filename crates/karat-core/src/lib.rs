//! # karat-core: Pure Pricing Logic for Karat
//!
//! This crate is the **heart** of the Karat storefront. It prices jewelry by
//! metal purity, stone and quantity, and converts/format prices for every
//! region the store sells into. Everything here is a pure function.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Karat Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Storefront (product page, cart, checkout)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                karat-store (config, cart, orders, rates)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ karat-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │ currency  │  │ validation│  │   │
//! │  │   │  Metal    │  │ Purity    │  │  convert  │  │   rules   │  │   │
//! │  │   │  Order    │  │ LineItem  │  │  format   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Metal, StoneType, Product, Order, etc.)
//! - [`pricing`] - Cumulative purity multiplier and line item composition
//! - [`currency`] - Exchange rates, conversion, display formatting, context
//! - [`error`] - Domain error types
//! - [`validation`] - Catalog and input validation
//!
//! ## Pricing Never Fails
//!
//! Missing karats, missing rates and missing prices resolve to identity
//! values (multiplier `1.0`, rate `1.0`, price `0`). Checkout must never be
//! blocked by a gap in pricing data.
//!
//! ## Example Usage
//!
//! ```rust
//! use karat_core::pricing::{cumulative_multiplier, line_item_price};
//! use karat_core::types::PurityLevel;
//!
//! let gold = vec![
//!     PurityLevel::new(10, 1.0),
//!     PurityLevel::new(14, 1.15),
//!     PurityLevel::new(18, 1.20),
//! ];
//!
//! let multiplier = cumulative_multiplier(&gold, 14);
//! assert!((multiplier - 1.15).abs() < 1e-9);
//!
//! // (1000 × 1.15 + 200) × 2
//! let total = line_item_price(1000.0, multiplier, 200.0, 2);
//! assert!((total - 2700.0).abs() < 1e-9);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod currency;
pub mod error;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use currency::{convert, format_price, CurrencyContext, ExchangeRates};
pub use error::{CoreError, CoreResult, ValidationError};
pub use pricing::{cumulative_multiplier, line_item_price, PriceBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency every catalog price and exchange rate is expressed in.
pub const BASE_CURRENCY: &str = "USD";

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in the cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Maximum length of free-text notes on a line item.
pub const MAX_NOTES_LENGTH: usize = 500;
