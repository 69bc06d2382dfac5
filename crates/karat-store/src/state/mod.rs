//! # State Module
//!
//! Shared mutable storefront state.
//!
//! Each concern gets its own state type so callers declare exactly what they
//! touch, and independent states never block each other.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐          ┌──────────────────────┐                │
//! │  │    CartState     │          │    CurrencyState     │                │
//! │  │                  │          │                      │                │
//! │  │  Arc<Mutex<      │          │  Arc<RwLock<         │                │
//! │  │    Cart          │          │    CurrencyContext   │                │
//! │  │  >>              │          │  >>                  │                │
//! │  └──────────────────┘          └──────────────────────┘                │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • CartState: exclusive access, most operations mutate                 │
//! │  • CurrencyState: many readers (every price shown), rare writers       │
//! │    (shopper selection, rate refresh)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod currency;

pub use cart::{Cart, CartLine, CartState, CartTotals, LineSelection};
pub use currency::CurrencyState;
