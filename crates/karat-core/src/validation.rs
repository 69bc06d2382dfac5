//! # Validation Module
//!
//! Catalog and shopper input validation.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Catalog load (karat-store)                                             │
//! │  ├── validate_metal / validate_stone / validate_product                 │
//! │  └── Reject bad tier tables BEFORE they reach the calculator            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Cart / checkout (karat-store)                                          │
//! │  ├── validate_quantity, validate_ring_size, validate_notes              │
//! │  └── validate_currency_code, validate_exchange_rate                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Calculator (pricing.rs)                                                │
//! │  └── Never validates, never fails: gaps fall back to identity values    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use karat_core::validation::{validate_currency_code, validate_quantity};
//!
//! validate_quantity(2).unwrap();
//! validate_currency_code("INR").unwrap();
//! assert!(validate_currency_code("inr").is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{Metal, Product, ShippingDetails, StoneType};
use crate::{MAX_ITEM_QUANTITY, MAX_NOTES_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LENGTH: usize = 200;
const MAX_RING_SIZE_LENGTH: usize = 10;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates an ISO 4217 currency code: exactly three uppercase letters.
pub fn validate_currency_code(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "currency".to_string(),
        });
    }

    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a three letter uppercase ISO 4217 code".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional ring size (e.g. "7", "7.5", "N").
pub fn validate_ring_size(ring_size: Option<&str>) -> ValidationResult<()> {
    let Some(size) = ring_size else {
        return Ok(());
    };
    let size = size.trim();

    if size.is_empty() {
        return Err(ValidationError::Required {
            field: "ringSize".to_string(),
        });
    }

    if size.len() > MAX_RING_SIZE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "ringSize".to_string(),
            max: MAX_RING_SIZE_LENGTH,
        });
    }

    Ok(())
}

/// Validates optional free-text notes on a line item.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    match notes {
        Some(text) if text.chars().count() > MAX_NOTES_LENGTH => Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
        }),
        _ => Ok(()),
    }
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use karat_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::from(MAX_ITEM_QUANTITY),
        });
    }

    Ok(())
}

/// Validates a catalog price: finite and non-negative. Zero is allowed.
pub fn validate_price(field: &str, price: f64) -> ValidationResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an exchange rate: finite and strictly positive.
pub fn validate_exchange_rate(code: &str, rate: f64) -> ValidationResult<()> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: format!("rate for {code}"),
        });
    }

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a metal's purity table.
///
/// ## Rules
/// - Name is required
/// - At least one purity level
/// - Karats are positive and unique
/// - Multipliers are positive and finite
pub fn validate_metal(metal: &Metal) -> ValidationResult<()> {
    validate_name("metal name", &metal.name)?;

    if metal.purity_levels.is_empty() {
        return Err(ValidationError::Required {
            field: format!("purityLevels of {}", metal.name),
        });
    }

    let mut seen = HashSet::new();
    for level in &metal.purity_levels {
        if level.karat == 0 {
            return Err(ValidationError::MustBePositive {
                field: "karat".to_string(),
            });
        }

        if !seen.insert(level.karat) {
            return Err(ValidationError::Duplicate {
                field: "karat".to_string(),
                value: level.karat.to_string(),
            });
        }

        if !level.price_multiplier.is_finite() || level.price_multiplier <= 0.0 {
            return Err(ValidationError::MustBePositive {
                field: format!("priceMultiplier of {}K", level.karat),
            });
        }
    }

    Ok(())
}

/// Validates a stone type.
pub fn validate_stone(stone: &StoneType) -> ValidationResult<()> {
    validate_name("stone name", &stone.name)?;
    validate_price("stone price", stone.price)
}

/// Validates a product. A missing base price is allowed.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_name("product name", &product.name)?;

    if product.metal_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "metalId".to_string(),
        });
    }

    if let Some(price) = product.base_price {
        validate_price("basePrice", price)?;
    }

    Ok(())
}

// =============================================================================
// Checkout Validators
// =============================================================================

/// Validates shipping details collected at checkout.
pub fn validate_shipping(shipping: &ShippingDetails) -> ValidationResult<()> {
    validate_name("fullName", &shipping.full_name)?;
    validate_name("addressLine1", &shipping.address_line1)?;
    validate_name("city", &shipping.city)?;

    let email = shipping.email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    if shipping.postal_code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "postalCode".to_string(),
        });
    }

    let country = shipping.country.trim();
    if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidFormat {
            field: "country".to_string(),
            reason: "must be a two letter ISO 3166 code".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
