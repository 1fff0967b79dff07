//! Sale records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::customer::{self, Customer};
use super::id::{ProductId, SaleId};
use super::money;

/// A recorded sale.
///
/// `customer` is normalized while deserializing, so a sale loaded from any
/// historical file layout always carries the structured form and is written
/// back that way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub quantity: u32,
    pub price: f64,
    #[serde(default, deserialize_with = "customer::deserialize_legacy")]
    pub customer: Customer,
    /// Display name of whoever recorded the sale.
    #[serde(default, deserialize_with = "nullable_string")]
    pub seller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Create a sale with a fresh ID stamped with the current time.
    #[must_use]
    pub fn new(
        product: impl Into<String>,
        product_id: Option<ProductId>,
        quantity: u32,
        price: f64,
        customer: Customer,
        seller: impl Into<String>,
    ) -> Self {
        Self {
            id: SaleId::generate(),
            product: product.into(),
            product_id,
            quantity,
            price,
            customer,
            seller: seller.into(),
            created_at: Some(Utc::now()),
        }
    }

    /// Price times quantity.
    #[must_use]
    pub fn total(&self) -> Decimal {
        money::line_total(self.price, self.quantity)
    }
}

/// Find a sale by ID.
#[must_use]
pub fn find<'a>(sales: &'a [Sale], id: &SaleId) -> Option<&'a Sale> {
    sales.iter().find(|s| &s.id == id)
}

/// The seller was written as `null` when the session had no display name.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_sale_with_string_customer() {
        let sale: Sale = serde_json::from_value(json!({
            "id": "s1",
            "product": "Widget",
            "quantity": 2,
            "price": 10.0,
            "customer": "Ana",
            "seller": null
        }))
        .unwrap();

        assert_eq!(sale.customer, Customer::new("Ana", "", ""));
        assert_eq!(sale.seller, "");
        assert!(sale.product_id.is_none());
        assert!(sale.created_at.is_none());
    }

    #[test]
    fn test_sale_without_customer() {
        let sale: Sale = serde_json::from_value(json!({
            "id": "s2",
            "product": "Widget",
            "quantity": 1,
            "price": 1.5
        }))
        .unwrap();
        assert!(sale.customer.is_empty());
    }

    #[test]
    fn test_sale_writes_structured_customer() {
        let sale = Sale::new("Widget", None, 1, 1.0, Customer::new("Ana", "", ""), "Admin");
        let value = serde_json::to_value(&sale).unwrap();
        assert_eq!(value["customer"], json!({"name": "Ana", "email": "", "phone": ""}));
    }

    #[test]
    fn test_total() {
        let sale = Sale::new("Widget", None, 3, 2.5, Customer::default(), "Admin");
        assert_eq!(sale.total(), Decimal::new(75, 1));
    }
}
