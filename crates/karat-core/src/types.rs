//! # Domain Types
//!
//! Catalog records and order snapshots shared by every storefront layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Metal       │   │    Product      │   │   StoneType     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name           │◄──│  metal_id       │──►│  name           │       │
//! │  │  purity_levels  │   │  base_price?    │   │  price (flat)   │       │
//! │  └────────┬────────┘   │  stone_ids      │   └─────────────────┘       │
//! │           │            └─────────────────┘                              │
//! │  ┌────────▼────────┐                                                    │
//! │  │  PurityLevel    │   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  karat          │   │     Order       │──►│   OrderItem     │       │
//! │  │  priceMultiplier│   │  status         │   │  unit_price     │       │
//! │  │  active         │   │  subtotal       │   │  total_price    │       │
//! │  └─────────────────┘   └─────────────────┘   │  (frozen)       │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog types deserialize from the storefront's camelCase documents.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::pricing::cumulative_multiplier;

fn default_true() -> bool {
    true
}

// =============================================================================
// Purity Level
// =============================================================================

/// One purity tier of a metal (e.g. 14K gold).
///
/// `price_multiplier` is relative to the next lower active tier, not to the
/// base. The lowest active tier's multiplier is ignored entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurityLevel {
    /// Karat (or fineness) of this tier. Unique within a metal.
    pub karat: u32,

    /// Multiplier applied on top of the previous tier's cumulative value.
    pub price_multiplier: f64,

    /// Inactive tiers are skipped when building the tier ladder.
    #[serde(default = "default_true")]
    pub active: bool,
}

impl PurityLevel {
    /// Creates an active purity level.
    pub fn new(karat: u32, price_multiplier: f64) -> Self {
        PurityLevel {
            karat,
            price_multiplier,
            active: true,
        }
    }

    /// Creates an inactive purity level.
    pub fn inactive(karat: u32, price_multiplier: f64) -> Self {
        PurityLevel {
            active: false,
            ..PurityLevel::new(karat, price_multiplier)
        }
    }
}

// =============================================================================
// Metal
// =============================================================================

/// A named material with a ladder of purity tiers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Metal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub purity_levels: Vec<PurityLevel>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Metal {
    /// Cumulative multiplier for `karat`, `1.0` if the karat is not offered.
    #[inline]
    pub fn cumulative_multiplier(&self, karat: u32) -> f64 {
        cumulative_multiplier(&self.purity_levels, karat)
    }

    /// Active karats in ascending order.
    pub fn active_karats(&self) -> Vec<u32> {
        let mut karats: Vec<u32> = self
            .purity_levels
            .iter()
            .filter(|level| level.active)
            .map(|level| level.karat)
            .collect();
        karats.sort_unstable();
        karats
    }

    /// The pricing base: the lowest-karat active level.
    pub fn base_level(&self) -> Option<&PurityLevel> {
        self.purity_levels
            .iter()
            .filter(|level| level.active)
            .min_by_key(|level| level.karat)
    }

    /// Checks if an active tier exists for `karat`.
    pub fn offers_karat(&self, karat: u32) -> bool {
        self.purity_levels
            .iter()
            .any(|level| level.active && level.karat == karat)
    }
}

// =============================================================================
// Stone Type
// =============================================================================

/// A gemstone with a flat per-unit surcharge.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoneType {
    pub id: String,
    pub name: String,
    /// Added once per unit, never scaled by the metal multiplier.
    pub price: f64,
}

// =============================================================================
// Product
// =============================================================================

/// A piece of jewelry listed in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Price at the base purity tier, in the base currency.
    /// May be absent in catalog data; callers treat that as 0.
    #[serde(default)]
    pub base_price: Option<f64>,

    /// Metal this product is cast in.
    pub metal_id: String,

    /// Stones the product can be set with. Empty means no stone option.
    #[serde(default)]
    pub stone_ids: Vec<String>,

    #[serde(default = "default_true")]
    pub active: bool,
}

impl Product {
    /// Base price with the missing-price default applied.
    #[inline]
    pub fn base_price_or_zero(&self) -> f64 {
        self.base_price.unwrap_or(0.0)
    }

    /// Checks if the product can be set with the given stone.
    pub fn offers_stone(&self, stone_id: &str) -> bool {
        self.stone_ids.iter().any(|id| id == stone_id)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of a placed order.
///
/// ```text
/// Pending ──► Paid ──► Shipped ──► Delivered
///    │          │
///    └──────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Paid => write!(f, "paid"),
            OrderStatus::Shipped => write!(f, "shipped"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line of a placed order.
/// Uses snapshot pattern to freeze catalog data and prices at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    /// Product name at time of order (frozen).
    pub product_name: String,
    /// Metal name at time of order (frozen).
    pub metal_name: String,
    pub karat: u32,
    /// Stone name at time of order (frozen).
    pub stone_name: Option<String>,
    pub quantity: u32,
    pub ring_size: Option<String>,
    pub notes: Option<String>,
    /// Per-unit price in the base currency (frozen).
    pub unit_price: f64,
    /// `unit_price × quantity` in the base currency (frozen).
    pub total_price: f64,
}

// =============================================================================
// Shipping Details
// =============================================================================

/// Where an order is delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub full_name: String,
    pub email: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
}

// =============================================================================
// Order
// =============================================================================

/// A placed order with prices frozen at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub items: Vec<OrderItem>,
    /// Sum of item totals in the base currency.
    pub subtotal: f64,
    /// Currency the customer checked out in.
    pub currency: String,
    /// Rate applied to convert `subtotal` into `currency`.
    pub exchange_rate: f64,
    /// `subtotal` converted into `currency`, unrounded.
    pub display_total: f64,
    pub status: OrderStatus,
    pub payment_reference: Option<String>,
    pub shipping: ShippingDetails,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Total units across all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Records a successful payment. Only pending orders can be paid.
    pub fn mark_paid(&mut self, reference: impl Into<String>, at: DateTime<Utc>) -> CoreResult<()> {
        self.transition(&[OrderStatus::Pending], OrderStatus::Paid, "mark as paid", at)?;
        self.payment_reference = Some(reference.into());
        self.paid_at = Some(at);
        Ok(())
    }

    /// Paid orders can be shipped.
    pub fn mark_shipped(&mut self, at: DateTime<Utc>) -> CoreResult<()> {
        self.transition(&[OrderStatus::Paid], OrderStatus::Shipped, "ship", at)
    }

    /// Shipped orders can be delivered.
    pub fn mark_delivered(&mut self, at: DateTime<Utc>) -> CoreResult<()> {
        self.transition(&[OrderStatus::Shipped], OrderStatus::Delivered, "deliver", at)
    }

    /// Cancels an order that has not left the store yet.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> CoreResult<()> {
        self.transition(
            &[OrderStatus::Pending, OrderStatus::Paid],
            OrderStatus::Cancelled,
            "cancel",
            at,
        )
    }

    fn transition(
        &mut self,
        allowed_from: &[OrderStatus],
        to: OrderStatus,
        action: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        if !allowed_from.contains(&self.status) {
            return Err(CoreError::InvalidOrderStatus {
                order_id: self.id.clone(),
                current_status: self.status.to_string(),
                action: action.to_string(),
            });
        }
        self.status = to;
        self.updated_at = at;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
