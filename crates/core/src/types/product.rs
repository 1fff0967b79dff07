//! Inventory products.

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product held in inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: f64,
    /// Units on hand. Never negative.
    #[serde(default)]
    pub stock: u32,
    /// Base64 image payload without a `data:` prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_content_type: Option<String>,
}

impl Product {
    /// Create a product with a fresh ID and no image.
    #[must_use]
    pub fn new(name: impl Into<String>, sku: impl Into<String>, price: f64, stock: u32) -> Self {
        Self {
            id: ProductId::generate(),
            name: name.into(),
            sku: sku.into(),
            price,
            stock,
            image_base64: None,
            image_content_type: None,
        }
    }

    /// `data:` URL for embedding the image in a page, if there is one.
    #[must_use]
    pub fn image_data_url(&self) -> Option<String> {
        let data = self.image_base64.as_deref()?;
        let content_type = self.image_content_type.as_deref().unwrap_or("image/png");
        Some(format!("data:{content_type};base64,{data}"))
    }
}

/// Find a product by ID.
#[must_use]
pub fn find<'a>(products: &'a [Product], id: &ProductId) -> Option<&'a Product> {
    products.iter().find(|p| &p.id == id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_product_without_optional_fields() {
        let product: Product =
            serde_json::from_str(r#"{"id": "p1", "name": "Widget", "price": 2.5}"#).unwrap();
        assert_eq!(product.stock, 0);
        assert_eq!(product.sku, "");
        assert!(product.image_data_url().is_none());
    }

    #[test]
    fn test_image_data_url() {
        let mut product = Product::new("Mug", "MUG-1", 8.0, 3);
        product.image_base64 = Some("AAAA".to_string());
        product.image_content_type = Some("image/jpeg".to_string());
        assert_eq!(
            product.image_data_url().as_deref(),
            Some("data:image/jpeg;base64,AAAA")
        );
    }

    #[test]
    fn test_image_fields_omitted_when_absent() {
        let json = serde_json::to_value(Product::new("Mug", "", 1.0, 1)).unwrap();
        assert!(json.get("image_base64").is_none());
    }
}
