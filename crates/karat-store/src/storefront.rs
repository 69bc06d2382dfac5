//! # Storefront
//!
//! One handle bundling everything a shopper session touches.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Storefront                                   │
//! │                                                                         │
//! │  config   : StoreConfig               (read only)                       │
//! │  catalog  : RwLock<Arc<Catalog>>      (swapped whole on reload)         │
//! │  cart     : CartState                 (Arc<Mutex<Cart>>)                │
//! │  currency : CurrencyState             (Arc<RwLock<CurrencyContext>>)    │
//! │  orders   : Mutex<HashMap<id, Order>>                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Utc;
use karat_core::validation::validate_uuid;
use karat_core::{CoreError, CoreResult, Order, PriceBreakdown, ShippingDetails};
use tracing::info;

use crate::catalog::{Catalog, QuoteRequest};
use crate::checkout::place_order;
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::state::{CartState, CartTotals, CurrencyState, LineSelection};

pub struct Storefront {
    config: StoreConfig,
    catalog: RwLock<Arc<Catalog>>,
    cart: CartState,
    currency: CurrencyState,
    orders: Mutex<HashMap<String, Order>>,
}

impl Storefront {
    /// Builds a storefront with the configured currency whitelist, fallback
    /// rates and default currency.
    pub fn new(config: StoreConfig, catalog: Catalog) -> StoreResult<Self> {
        let currency = CurrencyState::new(config.currency_context()?);

        info!(
            store = %config.store.name,
            currency = %currency.current(),
            products = catalog.products.len(),
            "Storefront ready"
        );

        Ok(Storefront {
            config,
            catalog: RwLock::new(Arc::new(catalog)),
            cart: CartState::new(),
            currency,
            orders: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn cart(&self) -> &CartState {
        &self.cart
    }

    /// Shared handle, e.g. for a [`RateRefresher`](crate::rates::RateRefresher).
    pub fn currency(&self) -> &CurrencyState {
        &self.currency
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swaps in a new catalog. Cart prices follow immediately; placed orders
    /// keep what they were sold for.
    pub fn replace_catalog(&self, catalog: Catalog) {
        let products = catalog.products.len();
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        info!(products, "Catalog replaced");
    }

    // =========================================================================
    // Pricing & Currency
    // =========================================================================

    pub fn quote(&self, request: &QuoteRequest) -> CoreResult<PriceBreakdown> {
        self.catalog().quote(request)
    }

    /// Quote total formatted in the shopper's currency.
    pub fn display_quote(&self, request: &QuoteRequest) -> CoreResult<String> {
        let quote = self.quote(request)?;
        Ok(self.currency.display(Some(quote.total)))
    }

    pub fn select_currency(&self, code: &str) -> CoreResult<()> {
        self.currency.select(code)
    }

    pub fn detect_currency(&self, country: &str) -> String {
        self.currency.detect(country)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    pub fn add_to_cart(&self, selection: LineSelection) -> CoreResult<String> {
        let catalog = self.catalog();
        self.cart.with_cart_mut(|cart| cart.add_line(&catalog, selection))
    }

    pub fn update_cart_quantity(&self, line_id: &str, quantity: u32) -> CoreResult<()> {
        self.cart.with_cart_mut(|cart| cart.update_quantity(line_id, quantity))
    }

    pub fn remove_from_cart(&self, line_id: &str) -> CoreResult<()> {
        self.cart.with_cart_mut(|cart| cart.remove_line(line_id))
    }

    pub fn cart_totals(&self) -> CoreResult<CartTotals> {
        let catalog = self.catalog();
        let ctx = self.currency.snapshot();
        self.cart.with_cart(|cart| cart.totals(&catalog, &ctx))
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Places an order for the current cart and empties it.
    pub fn checkout(&self, shipping: ShippingDetails) -> StoreResult<Order> {
        let catalog = self.catalog();
        let ctx = self.currency.snapshot();

        let order = self.cart.with_cart_mut(|cart| {
            let order = place_order(cart, &catalog, &ctx, shipping)?;
            cart.clear();
            StoreResult::Ok(order)
        })?;

        self.orders_mut(|orders| orders.insert(order.id.clone(), order.clone()));
        Ok(order)
    }

    pub fn order(&self, order_id: &str) -> CoreResult<Order> {
        validate_uuid(order_id)?;
        self.orders_mut(|orders| orders.get(order_id).cloned())
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))
    }

    pub fn confirm_payment(&self, order_id: &str, reference: &str) -> CoreResult<Order> {
        self.update_order(order_id, |order| order.mark_paid(reference, Utc::now()))
    }

    pub fn ship(&self, order_id: &str) -> CoreResult<Order> {
        self.update_order(order_id, |order| order.mark_shipped(Utc::now()))
    }

    pub fn deliver(&self, order_id: &str) -> CoreResult<Order> {
        self.update_order(order_id, |order| order.mark_delivered(Utc::now()))
    }

    pub fn cancel(&self, order_id: &str) -> CoreResult<Order> {
        self.update_order(order_id, |order| order.cancel(Utc::now()))
    }

    fn update_order<F>(&self, order_id: &str, f: F) -> CoreResult<Order>
    where
        F: FnOnce(&mut Order) -> CoreResult<()>,
    {
        validate_uuid(order_id)?;
        let order = self.orders_mut(|orders| {
            let order = orders
                .get_mut(order_id)
                .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
            f(order)?;
            CoreResult::Ok(order.clone())
        })?;

        info!(order_id = %order.id, status = %order.status, "Order updated");
        Ok(order)
    }

    fn orders_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut HashMap<String, Order>) -> R,
    {
        let mut orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut orders)
    }
}
