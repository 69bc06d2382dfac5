//! # Pricing Module
//!
//! The tiered metal price calculator.
//!
//! ## How Purity Tiers Compound
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Gold purity table (active tiers only, sorted by karat)                 │
//! │                                                                         │
//! │   index   karat   stored multiplier   cumulative multiplier             │
//! │   ─────   ─────   ─────────────────   ─────────────────────             │
//! │     0      10K         1.00 (ignored)   1.00                            │
//! │     1      14K         1.15             1.00 × 1.15        = 1.15       │
//! │     2      18K         1.20             1.00 × 1.15 × 1.20 = 1.38       │
//! │                                                                         │
//! │  Each stored multiplier is RELATIVE to the tier below it.               │
//! │  The lowest active tier is always the pricing base (1.0).               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Item Composition
//! ```text
//! unit  = base_price × cumulative_multiplier + stone_price
//! total = unit × quantity
//! ```
//!
//! Nothing is rounded here. Rounding happens only when a price is formatted
//! for display (see [`crate::currency::format_price`]).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Metal, PurityLevel, StoneType};

/// Multiplier returned whenever a tier cannot be resolved.
pub const IDENTITY_MULTIPLIER: f64 = 1.0;

// =============================================================================
// Cumulative Purity Multiplier
// =============================================================================

/// Computes the cumulative price multiplier for `target_karat`.
///
/// Inactive tiers are dropped and the rest are sorted by karat. The first
/// tier is the base (`1.0`); every following tier multiplies the running
/// value by its own `price_multiplier`, up to and including the target.
///
/// Returns [`IDENTITY_MULTIPLIER`] when the table is empty, every tier is
/// inactive, or `target_karat` is not present.
///
/// If the same karat appears more than once, the first match in sorted order
/// is used. The sort is stable, so that is the first one in input order.
///
/// ## Example
/// ```rust
/// use karat_core::pricing::cumulative_multiplier;
/// use karat_core::types::PurityLevel;
///
/// let tiers = vec![
///     PurityLevel::new(18, 1.20),
///     PurityLevel::new(10, 1.0),
///     PurityLevel::new(14, 1.15),
/// ];
///
/// assert_eq!(cumulative_multiplier(&tiers, 10), 1.0);
/// assert!((cumulative_multiplier(&tiers, 18) - 1.38).abs() < 1e-9);
/// assert_eq!(cumulative_multiplier(&tiers, 24), 1.0); // not offered
/// ```
pub fn cumulative_multiplier(levels: &[PurityLevel], target_karat: u32) -> f64 {
    let mut ladder: Vec<&PurityLevel> = levels.iter().filter(|level| level.active).collect();
    ladder.sort_by_key(|level| level.karat);

    let Some(index) = ladder.iter().position(|level| level.karat == target_karat) else {
        return IDENTITY_MULTIPLIER;
    };

    // Index 0 is the base tier; its stored multiplier never participates.
    ladder[1..=index]
        .iter()
        .fold(IDENTITY_MULTIPLIER, |acc, level| acc * level.price_multiplier)
}

// =============================================================================
// Line Item Price
// =============================================================================

/// Composes the price of a line item.
///
/// `(base_price × cumulative_multiplier + stone_price) × quantity`
///
/// The stone surcharge is flat per unit and is not scaled by the metal
/// multiplier. Callers are responsible for defaulting a missing base price
/// to `0` before calling.
///
/// ## Example
/// ```rust
/// use karat_core::pricing::line_item_price;
///
/// let total = line_item_price(1000.0, 1.15, 200.0, 2);
/// assert!((total - 2700.0).abs() < 1e-9);
/// ```
#[inline]
pub fn line_item_price(
    base_price: f64,
    cumulative_multiplier: f64,
    stone_price: f64,
    quantity: u32,
) -> f64 {
    unit_price(base_price, cumulative_multiplier, stone_price) * f64::from(quantity)
}

#[inline]
fn unit_price(base_price: f64, cumulative_multiplier: f64, stone_price: f64) -> f64 {
    base_price * cumulative_multiplier + stone_price
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// Every intermediate of a line item price, for display and order snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    /// Product price at the base tier.
    pub base_price: f64,
    /// Cumulative purity multiplier for the chosen karat.
    pub multiplier: f64,
    /// Flat stone surcharge per unit (0 without a stone).
    pub stone_price: f64,
    /// `base_price × multiplier + stone_price`.
    pub unit_price: f64,
    pub quantity: u32,
    /// `unit_price × quantity`.
    pub total: f64,
}

impl PriceBreakdown {
    /// Builds a breakdown from already-resolved inputs.
    pub fn compute(base_price: f64, multiplier: f64, stone_price: f64, quantity: u32) -> Self {
        PriceBreakdown {
            base_price,
            multiplier,
            stone_price,
            unit_price: unit_price(base_price, multiplier, stone_price),
            quantity,
            total: line_item_price(base_price, multiplier, stone_price, quantity),
        }
    }

    /// Prices `quantity` units of an item cast in `metal` at `karat`.
    ///
    /// A missing base price is treated as `0` and a missing stone adds
    /// nothing, so this never fails.
    pub fn for_item(
        base_price: Option<f64>,
        metal: &Metal,
        karat: u32,
        stone: Option<&StoneType>,
        quantity: u32,
    ) -> Self {
        PriceBreakdown::compute(
            base_price.unwrap_or(0.0),
            metal.cumulative_multiplier(karat),
            stone.map_or(0.0, |s| s.price),
            quantity,
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
