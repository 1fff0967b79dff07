//! Checkout and stock bookkeeping.
//!
//! Two paths take stock out of inventory: checking out a cart and an admin
//! recording a sale by hand. Both go through [`StockPolicy`] so they always
//! agree on what happens when a request exceeds what is on hand.
//!
//! Functions here mutate the in-memory collections only. They validate
//! everything before touching any product, so on error the slices passed in
//! are unchanged and the caller simply does not persist.

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

use crate::cart::Cart;
use crate::types::{Customer, Product, ProductId, Sale};

/// What to do when a sale asks for more units than are in stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// Reject the whole operation.
    #[default]
    Strict,
    /// Accept the sale and floor stock at zero.
    Clamp,
}

impl StockPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Clamp => "clamp",
        }
    }

    /// Check whether `requested` units can come out of `available`.
    ///
    /// # Errors
    ///
    /// Returns `StockError::Insufficient` under the strict policy when
    /// `requested` exceeds `available`.
    pub fn check(self, product: &Product, requested: u32, available: u32) -> Result<(), StockError> {
        if self == Self::Strict && requested > available {
            return Err(StockError::Insufficient {
                product: product.name.clone(),
                requested,
                available,
            });
        }
        Ok(())
    }
}

impl FromStr for StockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "clamp" => Ok(Self::Clamp),
            other => Err(format!("unknown stock policy '{other}' (expected strict or clamp)")),
        }
    }
}

/// Stock could not cover a sale.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("Not enough stock for {product}: requested {requested}, available {available}.")]
    Insufficient {
        product: String,
        requested: u32,
        available: u32,
    },
}

/// Checkout failures. Nothing has been mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty.")]
    EmptyCart,

    #[error(transparent)]
    Stock(#[from] StockError),
}

/// Turn a cart into sales and take the purchased units out of stock.
///
/// `customer` is the buyer's identity and `seller` the display name of the
/// session performing the checkout. Entries pointing at products that no
/// longer exist still become sales; only stock bookkeeping is skipped for
/// them.
///
/// # Errors
///
/// - `CheckoutError::EmptyCart` if the cart has no entries.
/// - `CheckoutError::Stock` under the strict policy when any entry asks for
///   more than its product has. No product is modified in that case.
pub fn checkout(
    cart: &Cart,
    products: &mut [Product],
    customer: &Customer,
    seller: &str,
    policy: StockPolicy,
) -> Result<Vec<Sale>, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut requested: HashMap<&ProductId, u32> = HashMap::new();
    for entry in cart.entries() {
        let total = requested.entry(&entry.product_id).or_default();
        *total = total.saturating_add(entry.quantity);
    }

    for product in products.iter() {
        if let Some(&quantity) = requested.get(&product.id) {
            policy.check(product, quantity, product.stock)?;
        }
    }

    for product in products.iter_mut() {
        if let Some(&quantity) = requested.get(&product.id) {
            product.stock = product.stock.saturating_sub(quantity);
        }
    }

    Ok(cart
        .entries()
        .iter()
        .map(|entry| {
            Sale::new(
                entry.name.clone(),
                Some(entry.product_id.clone()),
                entry.quantity,
                entry.price,
                customer.clone(),
                seller,
            )
        })
        .collect())
}

/// Apply the stock side of an admin-recorded sale.
///
/// `sale` is the sale as it will be saved; `previous` is the stored version
/// when editing. When the product is unchanged, the units the sale already
/// holds count as available. When the product changes, the old product gets
/// its units back.
///
/// # Errors
///
/// Returns `StockError::Insufficient` under the strict policy when the
/// product cannot cover the quantity. No product is modified in that case.
pub fn record_manual_sale(
    sale: &Sale,
    previous: Option<&Sale>,
    products: &mut [Product],
    policy: StockPolicy,
) -> Result<(), StockError> {
    let held_by = |id: &ProductId| -> u32 {
        previous
            .filter(|prev| prev.product_id.as_ref() == Some(id))
            .map_or(0, |prev| prev.quantity)
    };

    if let Some(id) = &sale.product_id
        && let Some(product) = products.iter().find(|p| &p.id == id)
    {
        let available = product.stock.saturating_add(held_by(id));
        policy.check(product, sale.quantity, available)?;
    }

    if let Some(prev_id) = previous.and_then(|prev| prev.product_id.as_ref())
        && let Some(product) = products.iter_mut().find(|p| &p.id == prev_id)
    {
        product.stock = product.stock.saturating_add(held_by(prev_id));
    }

    if let Some(id) = &sale.product_id
        && let Some(product) = products.iter_mut().find(|p| &p.id == id)
    {
        product.stock = product.stock.saturating_sub(sale.quantity);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn widget(stock: u32) -> Product {
        let mut product = Product::new("Widget", "W-1", 10.0, stock);
        product.id = ProductId::new("p1");
        product
    }

    fn buyer() -> Customer {
        Customer::new("Maria", "maria@example.com", "555-0100")
    }

    fn cart_with(quantity: u32) -> Cart {
        let mut cart = Cart::new();
        cart.add(ProductId::new("p1"), "Widget".to_string(), 10.0, quantity);
        cart
    }

    #[test]
    fn test_checkout_creates_sale_and_decrements_stock() {
        let mut products = vec![widget(5)];

        let sales = checkout(&cart_with(2), &mut products, &buyer(), "Maria", StockPolicy::Strict)
            .unwrap();

        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].quantity, 2);
        assert!((sales[0].price - 10.0).abs() < f64::EPSILON);
        assert_eq!(sales[0].product, "Widget");
        assert_eq!(sales[0].product_id, Some(ProductId::new("p1")));
        assert_eq!(sales[0].customer, buyer());
        assert_eq!(sales[0].seller, "Maria");
        assert_eq!(products[0].stock, 3);
    }

    #[test]
    fn test_checkout_empty_cart_changes_nothing() {
        let mut products = vec![widget(5)];
        let result = checkout(&Cart::new(), &mut products, &buyer(), "Maria", StockPolicy::Strict);

        assert_eq!(result, Err(CheckoutError::EmptyCart));
        assert_eq!(products, vec![widget(5)]);
    }

    #[test]
    fn test_checkout_strict_rejects_over_purchase() {
        let mut products = vec![widget(1)];
        let result = checkout(&cart_with(5), &mut products, &buyer(), "Maria", StockPolicy::Strict);

        assert!(matches!(
            result,
            Err(CheckoutError::Stock(StockError::Insufficient {
                requested: 5,
                available: 1,
                ..
            }))
        ));
        assert_eq!(products[0].stock, 1);
    }

    #[test]
    fn test_checkout_strict_is_all_or_nothing() {
        let mut gadget = Product::new("Gadget", "G-1", 3.0, 10);
        gadget.id = ProductId::new("p2");
        let mut products = vec![gadget, widget(1)];

        let mut cart = cart_with(2);
        cart.add(ProductId::new("p2"), "Gadget".to_string(), 3.0, 4);

        assert!(checkout(&cart, &mut products, &buyer(), "Maria", StockPolicy::Strict).is_err());
        assert_eq!(products[0].stock, 10);
        assert_eq!(products[1].stock, 1);
    }

    #[test]
    fn test_checkout_clamp_floors_at_zero() {
        let mut products = vec![widget(1)];
        let sales = checkout(&cart_with(5), &mut products, &buyer(), "Maria", StockPolicy::Clamp)
            .unwrap();

        assert_eq!(sales[0].quantity, 5);
        assert_eq!(products[0].stock, 0);
    }

    #[test]
    fn test_checkout_dangling_product_still_sells() {
        let mut products: Vec<Product> = Vec::new();
        let sales = checkout(&cart_with(2), &mut products, &buyer(), "Maria", StockPolicy::Strict)
            .unwrap();
        assert_eq!(sales.len(), 1);
    }

    #[test]
    fn test_manual_sale_rejected_when_stock_short() {
        let mut products = vec![widget(1)];
        let sale = Sale::new("Widget", Some(ProductId::new("p1")), 5, 10.0, buyer(), "Admin");

        let result = record_manual_sale(&sale, None, &mut products, StockPolicy::Strict);

        assert!(matches!(result, Err(StockError::Insufficient { .. })));
        assert_eq!(products[0].stock, 1);
    }

    #[test]
    fn test_manual_sale_clamp_floors_at_zero() {
        let mut products = vec![widget(1)];
        let sale = Sale::new("Widget", Some(ProductId::new("p1")), 5, 10.0, buyer(), "Admin");

        record_manual_sale(&sale, None, &mut products, StockPolicy::Clamp).unwrap();
        assert_eq!(products[0].stock, 0);
    }

    #[test]
    fn test_manual_sale_decrements_stock() {
        let mut products = vec![widget(4)];
        let sale = Sale::new("Widget", Some(ProductId::new("p1")), 3, 10.0, buyer(), "Admin");

        record_manual_sale(&sale, None, &mut products, StockPolicy::Strict).unwrap();
        assert_eq!(products[0].stock, 1);
    }

    #[test]
    fn test_manual_sale_without_product_leaves_stock() {
        let mut products = vec![widget(4)];
        let sale = Sale::new("Custom job", None, 30, 1.0, buyer(), "Admin");

        record_manual_sale(&sale, None, &mut products, StockPolicy::Strict).unwrap();
        assert_eq!(products[0].stock, 4);
    }

    #[test]
    fn test_edit_same_product_counts_held_units() {
        // 2 already sold, 1 left on the shelf: raising to 3 is fine.
        let mut products = vec![widget(1)];
        let previous = Sale::new("Widget", Some(ProductId::new("p1")), 2, 10.0, buyer(), "Admin");
        let mut edited = previous.clone();
        edited.quantity = 3;

        record_manual_sale(&edited, Some(&previous), &mut products, StockPolicy::Strict).unwrap();
        assert_eq!(products[0].stock, 0);

        edited.quantity = 4;
        let mut products = vec![widget(1)];
        assert!(
            record_manual_sale(&edited, Some(&previous), &mut products, StockPolicy::Strict)
                .is_err()
        );
        assert_eq!(products[0].stock, 1);
    }

    #[test]
    fn test_edit_switching_product_restores_old_stock() {
        let mut gadget = Product::new("Gadget", "G-1", 3.0, 10);
        gadget.id = ProductId::new("p2");
        let mut products = vec![widget(0), gadget];

        let previous = Sale::new("Widget", Some(ProductId::new("p1")), 2, 10.0, buyer(), "Admin");
        let mut edited = previous.clone();
        edited.product = "Gadget".to_string();
        edited.product_id = Some(ProductId::new("p2"));
        edited.quantity = 4;

        record_manual_sale(&edited, Some(&previous), &mut products, StockPolicy::Strict).unwrap();
        assert_eq!(products[0].stock, 2);
        assert_eq!(products[1].stock, 6);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("strict".parse::<StockPolicy>(), Ok(StockPolicy::Strict));
        assert_eq!(" Clamp ".parse::<StockPolicy>(), Ok(StockPolicy::Clamp));
        assert!("lenient".parse::<StockPolicy>().is_err());
    }
}
