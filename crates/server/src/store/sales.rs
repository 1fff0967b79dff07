//! `sales.json` repository.
//!
//! Older documents stored the customer as free text or a loose object; the
//! record type normalizes those on read, so persisting after any load writes
//! the structured form back.

use stockroom_core::{Sale, SaleId, types::sale};

use super::{Collection, Repository, RepositoryError};

/// The sales collection.
pub struct Sales;

impl Collection for Sales {
    const FILE_NAME: &'static str = "sales.json";
    const KEY: &'static str = "sales";
    type Item = Sale;
}

/// Repository for sales records.
pub type SaleRepository<'a> = Repository<'a, Sales>;

impl Repository<'_, Sales> {
    /// Get a sale by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the document cannot be read.
    pub async fn get_by_id(&self, id: &SaleId) -> Result<Option<Sale>, RepositoryError> {
        let sales = self.get_all().await?;
        Ok(sale::find(&sales, id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::Value;
    use stockroom_core::Customer;

    use super::*;
    use crate::store::JsonStore;

    #[tokio::test]
    async fn test_legacy_customers_normalized_and_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("sales.json"),
            r#"{"sales": [
                {"id": "s1", "product": "Widget", "quantity": 1, "price": 2.0, "customer": "  Ana  "},
                {"id": "s2", "product": "Widget", "quantity": 1, "price": 2.0,
                 "customer": {"name": "Bo", "phone": 5550100}},
                {"id": "s3", "product": "Widget", "quantity": 1, "price": 2.0, "seller": null}
            ]}"#,
        )
        .await
        .unwrap();
        let store = JsonStore::new(dir.path());
        let repo = SaleRepository::new(&store);

        let sales = repo.get_all().await.unwrap();
        assert_eq!(sales[0].customer, Customer::new("Ana", "", ""));
        assert_eq!(sales[1].customer, Customer::new("Bo", "", "5550100"));
        assert!(sales[2].customer.is_empty());
        assert_eq!(sales[2].seller, "");

        repo.persist(&sales).await.unwrap();
        let raw = tokio::fs::read_to_string(dir.path().join("sales.json")).await.unwrap();
        let document: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(document["sales"][0]["customer"]["name"], "Ana");
        assert_eq!(document["sales"][0]["customer"]["email"], "");
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let repo = SaleRepository::new(&store);

        let sale = Sale::new("Widget", None, 2, 3.0, Customer::default(), "Admin");
        let id = sale.id.clone();
        repo.persist(&[sale]).await.unwrap();

        assert_eq!(repo.get_by_id(&id).await.unwrap().unwrap().quantity, 2);
        assert!(repo.get_by_id(&SaleId::new("nope")).await.unwrap().is_none());
    }
}
