//! # Error Types
//!
//! Domain errors for the storefront layers built on top of the calculator.
//!
//! ## Where Errors Can (and Cannot) Happen
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  pricing / currency                 catalog / cart / orders             │
//! │  ──────────────────                 ───────────────────────             │
//! │  NEVER return errors                CoreError                           │
//! │  • unknown karat  → 1.0             • ProductNotFound                   │
//! │  • missing rate   → 1.0             • QuantityTooLarge                  │
//! │  • missing price  → 0               • InvalidOrderStatus                │
//! │                                     • Validation(ValidationError)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised by catalog lookups, cart mutations and order transitions.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product ID does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Metal ID does not exist in the catalog.
    #[error("Metal not found: {0}")]
    MetalNotFound(String),

    /// Stone type ID does not exist in the catalog.
    #[error("Stone type not found: {0}")]
    StoneNotFound(String),

    /// The stone exists but the product cannot be set with it.
    #[error("Stone {stone_id} is not offered for product {product_id}")]
    StoneNotOffered {
        product_id: String,
        stone_id: String,
    },

    /// Currency code is not enabled for this storefront.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Cart line does not exist.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u32, max: u32 },

    /// Checkout attempted with nothing in the cart.
    #[error("Cannot place an order from an empty cart")]
    EmptyCart,

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order is not in a state that allows the requested transition.
    #[error("Order {order_id} is {current_status}, cannot {action}")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
        action: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input and catalog validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive (and finite, for decimals).
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, lowercase currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same karat listed twice on a metal).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
