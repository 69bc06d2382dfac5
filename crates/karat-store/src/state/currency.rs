//! Shared currency context.
//!
//! Reads vastly outnumber writes (every price shown goes through `display`),
//! so the context sits behind an `RwLock`.

use std::sync::{Arc, PoisonError, RwLock};

use karat_core::{CoreResult, CurrencyContext, ExchangeRates};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct CurrencyState {
    context: Arc<RwLock<CurrencyContext>>,
}

impl CurrencyState {
    pub fn new(context: CurrencyContext) -> Self {
        CurrencyState {
            context: Arc::new(RwLock::new(context)),
        }
    }

    pub fn with_context<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CurrencyContext) -> R,
    {
        let ctx = self.context.read().unwrap_or_else(PoisonError::into_inner);
        f(&ctx)
    }

    pub fn with_context_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CurrencyContext) -> R,
    {
        let mut ctx = self.context.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut ctx)
    }

    /// Switches the shopper's currency.
    pub fn select(&self, code: &str) -> CoreResult<()> {
        self.with_context_mut(|ctx| ctx.select(code))?;
        debug!(currency = code, "Currency selected");
        Ok(())
    }

    /// Picks the currency for a country and returns its code.
    pub fn detect(&self, country: &str) -> String {
        let code = self.with_context_mut(|ctx| ctx.detect(country).to_string());
        debug!(country, currency = %code, "Currency detected");
        code
    }

    /// Merges freshly fetched rates. Returns how many were taken.
    pub fn apply_rates(&self, rates: &ExchangeRates) -> usize {
        let merged = self.with_context_mut(|ctx| ctx.apply_rates(rates));
        info!(merged, offered = rates.len(), "Exchange rates applied");
        merged
    }

    pub fn current(&self) -> String {
        self.with_context(|ctx| ctx.current().to_string())
    }

    /// Formats a base-currency price for the shopper.
    pub fn display(&self, price: Option<f64>) -> String {
        self.with_context(|ctx| ctx.display(price))
    }

    /// Owned copy, for work that must not hold the lock.
    pub fn snapshot(&self) -> CurrencyContext {
        self.with_context(Clone::clone)
    }
}
