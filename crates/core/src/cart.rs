//! Shopping cart.
//!
//! The cart lives entirely on the client, so everything read back from it is
//! untrusted. [`Cart::from_values`] coerces each entry and silently drops the
//! ones that cannot be coerced; a damaged cookie degrades to a smaller cart
//! rather than an error page.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ProductId, money};

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product_id: ProductId,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl CartEntry {
    /// Coerce an untrusted JSON entry.
    ///
    /// Returns `None` when the product ID is missing, the quantity is not a
    /// non-negative integer, or the price is not a non-negative number.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let product_id = match value.get("product_id")? {
            Value::String(id) if !id.is_empty() => ProductId::new(id.clone()),
            Value::Number(n) => ProductId::new(n.to_string()),
            _ => return None,
        };
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        Some(Self {
            product_id,
            name,
            price: coerce_price(value.get("price")?)?,
            quantity: coerce_quantity(value.get("quantity")?)?,
        })
    }

    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        money::line_total(self.price, self.quantity)
    }
}

/// Integers, digit strings, and non-negative floats (truncated) are accepted.
#[must_use]
pub fn coerce_quantity(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(int) = n.as_u64() {
                return u32::try_from(int).ok();
            }
            let float = n.as_f64()?;
            if !(float.is_finite() && float >= 0.0 && float < f64::from(u32::MAX)) {
                return None;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Range checked above
            let truncated = float.trunc() as u32;
            Some(truncated)
        }
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Finite, non-negative numbers or numeric strings.
#[must_use]
pub fn coerce_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (price.is_finite() && price >= 0.0).then_some(price)
}

/// The cart: at most one entry per product.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Rebuild a cart from untrusted JSON entries.
    ///
    /// Entries that fail coercion or carry a zero quantity are dropped.
    /// Duplicate product IDs are merged.
    #[must_use]
    pub fn from_values(values: &[Value]) -> Self {
        let mut cart = Self::new();
        for entry in values.iter().filter_map(CartEntry::from_value) {
            if entry.quantity > 0 {
                cart.add(entry.product_id, entry.name, entry.price, entry.quantity);
            }
        }
        cart
    }

    /// Add a product, merging with an existing entry for the same product.
    ///
    /// Re-adding keeps the name and price captured by the first add.
    pub fn add(&mut self, product_id: ProductId, name: String, price: f64, quantity: u32) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.product_id == product_id) {
            entry.quantity = entry.quantity.saturating_add(quantity);
        } else {
            self.entries.push(CartEntry {
                product_id,
                name,
                price,
                quantity,
            });
        }
    }

    /// Remove a product's entry. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.product_id != product_id);
        self.entries.len() != before
    }

    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of units across all entries.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |acc, e| acc.saturating_add(e.quantity))
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(CartEntry::line_total).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repeated_adds_merge_into_one_entry() {
        let mut cart = Cart::new();
        for quantity in [1, 4, 2] {
            cart.add(ProductId::new("p1"), "Widget".to_string(), 10.0, quantity);
        }

        assert_eq!(cart.entries().len(), 1);
        assert_eq!(cart.entries()[0].quantity, 7);
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn test_distinct_products_get_distinct_entries() {
        let mut cart = Cart::new();
        cart.add(ProductId::new("p1"), "Widget".to_string(), 10.0, 1);
        cart.add(ProductId::new("p2"), "Gadget".to_string(), 5.0, 2);

        assert_eq!(cart.entries().len(), 2);
        assert_eq!(cart.total(), Decimal::from(20));
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::new();
        cart.add(ProductId::new("p1"), "Widget".to_string(), 10.0, 1);
        assert!(!cart.remove(&ProductId::new("nope")));
        assert!(cart.remove(&ProductId::new("p1")));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_coerce_quantity() {
        assert_eq!(coerce_quantity(&json!(3)), Some(3));
        assert_eq!(coerce_quantity(&json!("4")), Some(4));
        assert_eq!(coerce_quantity(&json!(2.9)), Some(2));
        assert_eq!(coerce_quantity(&json!(-1)), None);
        assert_eq!(coerce_quantity(&json!("two")), None);
        assert_eq!(coerce_quantity(&json!(null)), None);
    }

    #[test]
    fn test_coerce_price() {
        assert_eq!(coerce_price(&json!(10)), Some(10.0));
        assert_eq!(coerce_price(&json!("2.50")), Some(2.5));
        assert_eq!(coerce_price(&json!(-3.0)), None);
        assert_eq!(coerce_price(&json!("NaN")), None);
        assert_eq!(coerce_price(&json!([])), None);
    }

    #[test]
    fn test_from_values_skips_bad_entries() {
        let values = vec![
            json!({"product_id": "p1", "name": "Widget", "price": "10", "quantity": "2"}),
            json!({"product_id": "p2", "name": "Broken", "price": "abc", "quantity": 1}),
            json!({"product_id": "p3", "name": "Zero", "price": 1.0, "quantity": 0}),
            json!({"name": "No id", "price": 1.0, "quantity": 1}),
            json!("not an object"),
            json!({"product_id": "p1", "name": "Widget", "price": 10.0, "quantity": 1}),
        ];

        let cart = Cart::from_values(&values);
        assert_eq!(cart.entries().len(), 1);
        assert_eq!(cart.entries()[0].quantity, 3);
        assert!((cart.entries()[0].price - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut cart = Cart::new();
        cart.add(ProductId::new("p1"), "Widget".to_string(), 10.0, 2);
        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            value,
            json!([{"product_id": "p1", "name": "Widget", "price": 10.0, "quantity": 2}])
        );
    }
}
