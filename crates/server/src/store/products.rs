//! `products.json` repository.

use stockroom_core::{Product, ProductId, types::product};

use super::{Collection, Repository, RepositoryError};

/// The inventory collection.
pub struct Products;

impl Collection for Products {
    const FILE_NAME: &'static str = "products.json";
    const KEY: &'static str = "products";
    type Item = Product;
}

/// Repository for inventory products.
pub type ProductRepository<'a> = Repository<'a, Products>;

impl Repository<'_, Products> {
    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the document cannot be read.
    pub async fn get_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.get_all().await?;
        Ok(product::find(&products, id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::store::JsonStore;

    #[tokio::test]
    async fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let repo = ProductRepository::new(&store);

        let mug = Product::new("Mug", "MUG-1", 8.5, 12);
        let id = mug.id.clone();
        repo.persist(&[mug]).await.unwrap();

        let found = repo.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.name, "Mug");
        assert_eq!(found.stock, 12);
        assert!(repo.get_by_id(&ProductId::new("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_records_without_sku_or_image_load() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("products.json"),
            r#"{"products": [{"id": "p1", "name": "Widget", "price": 10.0, "stock": 5}]}"#,
        )
        .await
        .unwrap();
        let store = JsonStore::new(dir.path());

        let products = ProductRepository::new(&store).get_all().await.unwrap();
        assert_eq!(products[0].sku, "");
        assert!(products[0].image_base64.is_none());
    }
}
