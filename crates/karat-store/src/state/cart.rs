//! # Cart State
//!
//! The shopper's cart. Lines hold references and choices only; prices are
//! derived from the catalog every time they are read, and frozen only when
//! an order is placed.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Storefront Action        Cart Method             Cart State Change     │
//! │  ─────────────────        ───────────             ─────────────────     │
//! │                                                                         │
//! │  Add to bag ─────────────► add_line() ──────────► lines.push(line)     │
//! │                              (same config?) ────► line.quantity += n   │
//! │                                                                         │
//! │  Change quantity ────────► update_quantity() ───► line.quantity = n    │
//! │                                                                         │
//! │  Remove ─────────────────► remove_line() ───────► lines.remove(i)      │
//! │                                                                         │
//! │  View bag ───────────────► totals(catalog, ctx) ► (read only)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use karat_core::validation::{validate_notes, validate_quantity, validate_ring_size};
use karat_core::{
    CoreError, CoreResult, CurrencyContext, PriceBreakdown, MAX_CART_ITEMS, MAX_ITEM_QUANTITY,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::{Catalog, QuoteRequest};

/// What the shopper submits when adding to the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSelection {
    pub product_id: String,
    pub karat: u32,
    #[serde(default)]
    pub stone_id: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub ring_size: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A configured product in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Line ID (UUID)
    pub id: String,
    pub product_id: String,
    pub metal_id: String,
    pub karat: u32,
    pub stone_id: Option<String>,
    pub quantity: u32,
    pub ring_size: Option<String>,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn quote_request(&self) -> QuoteRequest {
        QuoteRequest {
            product_id: self.product_id.clone(),
            karat: self.karat,
            stone_id: self.stone_id.clone(),
            quantity: self.quantity,
        }
    }

    /// Lines merge when everything that affects the piece is identical.
    fn same_configuration(&self, selection: &LineSelection) -> bool {
        self.product_id == selection.product_id
            && self.karat == selection.karat
            && self.stone_id == selection.stone_id
            && self.ring_size == selection.ring_size
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by configuration (adding the same one increases quantity)
/// - Quantity is always in 1..=999 (setting 0 removes the line)
/// - At most 100 lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a configured product, or tops up an identical line.
    ///
    /// Returns the ID of the line that now holds the selection.
    pub fn add_line(&mut self, catalog: &Catalog, selection: LineSelection) -> CoreResult<String> {
        validate_quantity(selection.quantity)?;
        validate_ring_size(selection.ring_size.as_deref())?;
        validate_notes(selection.notes.as_deref())?;

        let product = catalog.product(&selection.product_id)?;
        catalog.metal(&product.metal_id)?;
        catalog.stone_for(product, selection.stone_id.as_deref())?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.same_configuration(&selection)) {
            let requested = line.quantity + selection.quantity;
            if requested > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = requested;
            if selection.notes.is_some() {
                line.notes = selection.notes;
            }
            debug!(line = %line.id, quantity = line.quantity, "Cart line topped up");
            return Ok(line.id.clone());
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        let line = CartLine {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            metal_id: product.metal_id.clone(),
            karat: selection.karat,
            stone_id: selection.stone_id,
            quantity: selection.quantity,
            ring_size: selection.ring_size,
            notes: selection.notes,
            added_at: Utc::now(),
        };
        debug!(line = %line.id, product = %line.product_id, karat = line.karat, "Cart line added");

        let id = line.id.clone();
        self.lines.push(line);
        Ok(id)
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(&mut self, line_id: &str, quantity: u32) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_line(line_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.id != line_id);

        if self.lines.len() == initial_len {
            Err(CoreError::LineNotFound(line_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    // =========================================================================
    // Pricing (derived, never stored)
    // =========================================================================

    /// Current price of a line in the base currency.
    pub fn price_line(&self, catalog: &Catalog, line: &CartLine) -> CoreResult<PriceBreakdown> {
        catalog.quote(&line.quote_request())
    }

    /// Sum of all line totals in the base currency.
    pub fn subtotal(&self, catalog: &Catalog) -> CoreResult<f64> {
        self.lines
            .iter()
            .map(|line| self.price_line(catalog, line).map(|p| p.total))
            .sum()
    }

    /// Totals converted and formatted for the shopper's currency.
    pub fn totals(&self, catalog: &Catalog, ctx: &CurrencyContext) -> CoreResult<CartTotals> {
        let subtotal = self.subtotal(catalog)?;
        Ok(CartTotals {
            item_count: self.line_count(),
            total_quantity: self.total_quantity(),
            subtotal,
            currency: ctx.current().to_string(),
            display_subtotal: ctx.convert_from_base(subtotal),
            formatted_subtotal: ctx.display(Some(subtotal)),
        })
    }
}

/// Cart totals summary for the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Distinct lines.
    pub item_count: usize,
    pub total_quantity: u32,
    /// Base currency, unrounded.
    pub subtotal: f64,
    pub currency: String,
    /// `subtotal` in `currency`, unrounded.
    pub display_subtotal: f64,
    pub formatted_subtotal: String,
}

/// Thread-safe cart handle.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../data/catalog.toml");

    fn catalog() -> Catalog {
        Catalog::from_toml_str(SAMPLE).unwrap()
    }

    fn selection(product: &str, karat: u32, stone: Option<&str>, quantity: u32) -> LineSelection {
        LineSelection {
            product_id: product.to_string(),
            karat,
            stone_id: stone.map(str::to_string),
            quantity,
            ring_size: None,
            notes: None,
        }
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_cart_add_line() {
        let catalog = catalog();
        let mut cart = Cart::new();

        cart.add_line(&catalog, selection("solitaire-ring", 14, Some("sapphire"), 2))
            .unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert!(approx_eq(cart.subtotal(&catalog).unwrap(), 2700.0));
    }

    #[test]
    fn test_cart_same_configuration_merges() {
        let catalog = catalog();
        let mut cart = Cart::new();

        let first = cart.add_line(&catalog, selection("rope-chain", 18, None, 1)).unwrap();
        let second = cart.add_line(&catalog, selection("rope-chain", 18, None, 2)).unwrap();
        assert_eq!(first, second);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 3);

        // Different karat is a different piece.
        cart.add_line(&catalog, selection("rope-chain", 14, None, 1)).unwrap();
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_cart_ring_size_separates_lines() {
        let catalog = catalog();
        let mut cart = Cart::new();

        let mut size_6 = selection("solitaire-ring", 18, Some("diamond"), 1);
        size_6.ring_size = Some("6".to_string());
        let mut size_7 = size_6.clone();
        size_7.ring_size = Some("7".to_string());

        cart.add_line(&catalog, size_6).unwrap();
        cart.add_line(&catalog, size_7).unwrap();
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_cart_quantity_limits() {
        let catalog = catalog();
        let mut cart = Cart::new();

        let id = cart.add_line(&catalog, selection("rope-chain", 10, None, 998)).unwrap();
        let err = cart
            .add_line(&catalog, selection("rope-chain", 10, None, 2))
            .unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { requested: 1000, .. }));

        assert!(cart.update_quantity(&id, 1000).is_err());
        assert!(cart.add_line(&catalog, selection("rope-chain", 10, None, 0)).is_err());
    }

    #[test]
    fn test_cart_rejects_unknown_references() {
        let catalog = catalog();
        let mut cart = Cart::new();

        assert!(matches!(
            cart.add_line(&catalog, selection("tiara", 18, None, 1)),
            Err(CoreError::ProductNotFound(_))
        ));
        assert!(matches!(
            cart.add_line(&catalog, selection("eternity-band", 950, Some("ruby"), 1)),
            Err(CoreError::StoneNotOffered { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_update_and_remove() {
        let catalog = catalog();
        let mut cart = Cart::new();

        let id = cart.add_line(&catalog, selection("eternity-band", 950, None, 1)).unwrap();
        cart.update_quantity(&id, 4).unwrap();
        assert_eq!(cart.total_quantity(), 4);

        cart.update_quantity(&id, 0).unwrap();
        assert!(cart.is_empty());
        assert!(matches!(cart.remove_line(&id), Err(CoreError::LineNotFound(_))));
    }

    #[test]
    fn test_cart_totals_in_selected_currency() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add_line(&catalog, selection("rope-chain", 10, None, 1)).unwrap();

        let mut ctx = CurrencyContext::default();
        ctx.select("AUD").unwrap();

        let totals = cart.totals(&catalog, &ctx).unwrap();
        assert_eq!(totals.subtotal, 640.0);
        assert_eq!(totals.currency, "AUD");
        assert!(approx_eq(totals.display_subtotal, 640.0 * 1.52));
        assert_eq!(totals.formatted_subtotal, "A$972.80");
    }

    #[test]
    fn test_cart_state_shared_access() {
        let catalog = catalog();
        let state = CartState::new();
        let handle = state.clone();

        handle
            .with_cart_mut(|cart| cart.add_line(&catalog, selection("rope-chain", 14, None, 1)))
            .unwrap();
        assert_eq!(state.with_cart(|cart| cart.line_count()), 1);

        state.with_cart_mut(|cart| cart.clear());
        assert!(handle.with_cart(|cart| cart.is_empty()));
    }
}
