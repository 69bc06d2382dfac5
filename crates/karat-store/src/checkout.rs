//! # Checkout
//!
//! Turns a cart into an [`Order`]. This is the only place prices stop being
//! derived: every line is priced once against the current catalog and the
//! result is copied into the order together with the names shown to the
//! shopper, the currency they paid in and the rate used.

use chrono::Utc;
use karat_core::validation::validate_shipping;
use karat_core::{CoreError, CurrencyContext, Order, OrderItem, OrderStatus, ShippingDetails};
use tracing::info;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::StoreResult;
use crate::state::{Cart, CartLine};

/// Places an order for everything in `cart`.
///
/// The cart itself is left untouched; clearing it is up to the caller once
/// the order has been stored.
pub fn place_order(
    cart: &Cart,
    catalog: &Catalog,
    ctx: &CurrencyContext,
    shipping: ShippingDetails,
) -> StoreResult<Order> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    validate_shipping(&shipping)?;

    let items = cart
        .lines
        .iter()
        .map(|line| freeze_line(cart, catalog, line))
        .collect::<StoreResult<Vec<_>>>()?;

    let subtotal: f64 = items.iter().map(|item| item.total_price).sum();
    let now = Utc::now();

    let order = Order {
        id: Uuid::new_v4().to_string(),
        items,
        subtotal,
        currency: ctx.current().to_string(),
        exchange_rate: ctx.rate(),
        display_total: ctx.convert_from_base(subtotal),
        status: OrderStatus::Pending,
        payment_reference: None,
        shipping,
        created_at: now,
        updated_at: now,
        paid_at: None,
    };

    info!(
        order_id = %order.id,
        items = order.items.len(),
        subtotal = order.subtotal,
        currency = %order.currency,
        "Order placed"
    );

    Ok(order)
}

fn freeze_line(cart: &Cart, catalog: &Catalog, line: &CartLine) -> StoreResult<OrderItem> {
    let price = cart.price_line(catalog, line)?;
    let product = catalog.product(&line.product_id)?;
    let metal = catalog.metal(&product.metal_id)?;
    let stone = catalog.stone_for(product, line.stone_id.as_deref())?;

    Ok(OrderItem {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        metal_name: metal.name.clone(),
        karat: line.karat,
        stone_name: stone.map(|s| s.name.clone()),
        quantity: line.quantity,
        ring_size: line.ring_size.clone(),
        notes: line.notes.clone(),
        unit_price: price.unit_price,
        total_price: price.total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::state::LineSelection;

    const SAMPLE: &str = include_str!("../data/catalog.toml");

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address_line1: "12 St James's Square".to_string(),
            address_line2: None,
            city: "London".to_string(),
            postal_code: "SW1Y 4JH".to_string(),
            country: "GB".to_string(),
        }
    }

    fn cart_with_ring(catalog: &Catalog) -> Cart {
        let mut cart = Cart::new();
        cart.add_line(
            catalog,
            LineSelection {
                product_id: "solitaire-ring".to_string(),
                karat: 18,
                stone_id: Some("diamond".to_string()),
                quantity: 2,
                ring_size: Some("6.5".to_string()),
                notes: Some("Engrave 'A.L.'".to_string()),
            },
        )
        .unwrap();
        cart
    }

    #[test]
    fn test_place_order_freezes_prices_and_names() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        let cart = cart_with_ring(&catalog);
        let mut ctx = CurrencyContext::default();
        ctx.select("GBP").unwrap();

        let order = place_order(&cart, &catalog, &ctx, shipping()).unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 1);

        let item = &order.items[0];
        assert_eq!(item.product_name, "Classic Solitaire Ring");
        assert_eq!(item.metal_name, "Gold");
        assert_eq!(item.stone_name.as_deref(), Some("Diamond"));
        assert_eq!(item.ring_size.as_deref(), Some("6.5"));
        assert!(approx_eq(item.unit_price, 1830.0));
        assert!(approx_eq(item.total_price, 3660.0));

        assert!(approx_eq(order.subtotal, 3660.0));
        assert_eq!(order.currency, "GBP");
        assert_eq!(order.exchange_rate, 0.79);
        assert!(approx_eq(order.display_total, 3660.0 * 0.79));
        assert_eq!(order.total_quantity(), 2);
    }

    #[test]
    fn test_order_unaffected_by_later_catalog_changes() {
        let mut catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        let cart = cart_with_ring(&catalog);
        let order = place_order(&cart, &catalog, &CurrencyContext::default(), shipping()).unwrap();

        catalog.products[0].base_price = Some(5000.0);
        catalog.products[0].name = "Renamed".to_string();

        assert!(approx_eq(order.items[0].unit_price, 1830.0));
        assert_eq!(order.items[0].product_name, "Classic Solitaire Ring");
        assert!(cart.subtotal(&catalog).unwrap() > order.subtotal);
    }

    #[test]
    fn test_place_order_rejects_empty_cart() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        let err = place_order(&Cart::new(), &catalog, &CurrencyContext::default(), shipping()).unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::EmptyCart)));
    }

    #[test]
    fn test_place_order_validates_shipping() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        let cart = cart_with_ring(&catalog);

        let mut bad = shipping();
        bad.email = "not-an-email".to_string();

        let err = place_order(&cart, &catalog, &CurrencyContext::default(), bad).unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::Validation(_))));
    }
}
