//! Validation of submitted forms.
//!
//! Forms arrive as raw strings so that a rejected submission can be rendered
//! back exactly as typed. Validation collects every problem instead of
//! stopping at the first one.

use serde::{Deserialize, Serialize};

use crate::types::{Customer, Product, ProductId, Sale, User, is_admin_username, product, user};

/// Raw sale form as submitted by an admin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleForm {
    /// Inventory product picked from the dropdown; empty for free text.
    pub product_id: String,
    pub product: String,
    pub quantity: String,
    pub price: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

/// A validated sale form.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleInput {
    pub product: String,
    pub product_id: Option<ProductId>,
    pub quantity: u32,
    pub price: f64,
    pub customer: Customer,
}

impl SaleForm {
    /// Populate the form from a stored sale for editing.
    #[must_use]
    pub fn from_sale(sale: &Sale) -> Self {
        Self {
            product_id: sale
                .product_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            product: sale.product.clone(),
            quantity: sale.quantity.to_string(),
            price: sale.price.to_string(),
            customer_name: sale.customer.name.clone(),
            customer_email: sale.customer.email.clone(),
            customer_phone: sale.customer.phone.clone(),
        }
    }

    /// Fill product name and, when blank, price from the selected product.
    ///
    /// Runs before validation so a product picked from inventory satisfies
    /// the "product is required" rule on its own.
    pub fn prefill_from(&mut self, products: &[Product]) {
        let id = self.product_id.trim();
        if id.is_empty() {
            return;
        }
        if let Some(selected) = product::find(products, &ProductId::new(id)) {
            self.product.clone_from(&selected.name);
            if self.price.trim().is_empty() {
                self.price = selected.price.to_string();
            }
        }
    }

    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns every user-facing validation message, in field order.
    pub fn validate(&self) -> Result<SaleInput, Vec<String>> {
        let mut errors = Vec::new();

        let product = self.product.trim();
        if product.is_empty() {
            errors.push("Product is required.".to_string());
        }

        let quantity = parse_whole_number(&self.quantity);
        match quantity {
            None => errors.push("Quantity must be a whole number.".to_string()),
            Some(0) => errors.push("Quantity must be at least 1.".to_string()),
            Some(_) => {}
        }

        let price = parse_amount(&self.price, "Price", &mut errors);

        match (quantity, price) {
            (Some(quantity), Some(price)) if errors.is_empty() => Ok(SaleInput {
                product: product.to_owned(),
                product_id: non_empty(&self.product_id).map(ProductId::new),
                quantity,
                price,
                customer: Customer::new(
                    self.customer_name.trim(),
                    self.customer_email.trim(),
                    self.customer_phone.trim(),
                ),
            }),
            _ => Err(errors),
        }
    }
}

/// Raw product form as submitted by an admin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub sku: String,
    pub price: String,
    pub stock: String,
}

/// A validated product form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub sku: String,
    pub price: f64,
    pub stock: u32,
}

impl ProductForm {
    /// Populate the form from a stored product for editing.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            sku: product.sku.clone(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
        }
    }

    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns every user-facing validation message, in field order.
    pub fn validate(&self) -> Result<ProductInput, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Name is required.".to_string());
        }

        let price = parse_amount(&self.price, "Price", &mut errors);

        let stock = parse_whole_number(&self.stock);
        if stock.is_none() {
            errors.push("Stock must be a whole number.".to_string());
        }

        match (price, stock) {
            (Some(price), Some(stock)) if errors.is_empty() => Ok(ProductInput {
                name: name.to_owned(),
                sku: self.sku.trim().to_owned(),
                price,
                stock,
            }),
            _ => Err(errors),
        }
    }
}

/// Raw registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl RegistrationForm {
    /// Validate against the existing users and build the new account.
    ///
    /// # Errors
    ///
    /// Returns every user-facing validation message.
    pub fn validate(&self, existing: &[User]) -> Result<User, Vec<String>> {
        let mut errors = Vec::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.push("Username is required.".to_string());
        } else if username.chars().any(char::is_whitespace) {
            errors.push("Username cannot contain spaces.".to_string());
        } else if is_admin_username(username) || user::find(existing, username).is_some() {
            errors.push("That username is already taken.".to_string());
        }

        if self.password.is_empty() {
            errors.push("Password is required.".to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let name = self.name.trim();
        Ok(User {
            username: username.to_owned(),
            password: self.password.clone(),
            name: (if name.is_empty() { username } else { name }).to_owned(),
            email: self.email.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
        })
    }
}

/// Digits only, so "+3", "3.0" and "-1" are all rejected.
fn parse_whole_number(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_amount(raw: &str, label: &str, errors: &mut Vec<String>) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(format!("{label} is required."));
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) if !value.is_finite() => {
            errors.push(format!("{label} must be a number."));
            None
        }
        Ok(value) if value < 0.0 => {
            errors.push(format!("{label} cannot be negative."));
            None
        }
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(format!("{label} must be a number."));
            None
        }
    }
}

fn non_empty(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    (!raw.is_empty()).then_some(raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn sale_form(product: &str, quantity: &str, price: &str) -> SaleForm {
        SaleForm {
            product: product.to_string(),
            quantity: quantity.to_string(),
            price: price.to_string(),
            ..SaleForm::default()
        }
    }

    #[test]
    fn test_valid_sale_form() {
        let mut form = sale_form(" Widget ", "2", "10.5");
        form.customer_name = "Ana".to_string();

        let input = form.validate().unwrap();
        assert_eq!(input.product, "Widget");
        assert_eq!(input.quantity, 2);
        assert!((input.price - 10.5).abs() < f64::EPSILON);
        assert_eq!(input.customer, Customer::new("Ana", "", ""));
        assert!(input.product_id.is_none());
    }

    #[test]
    fn test_sale_form_errors_in_order() {
        let errors = sale_form("", "two", "").validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Product is required.",
                "Quantity must be a whole number.",
                "Price is required."
            ]
        );
    }

    #[test]
    fn test_sale_form_rejects_negative_and_garbage_price() {
        let errors = sale_form("Widget", "1", "-2").validate().unwrap_err();
        assert_eq!(errors, vec!["Price cannot be negative."]);

        let errors = sale_form("Widget", "1", "ten").validate().unwrap_err();
        assert_eq!(errors, vec!["Price must be a number."]);
    }

    #[test]
    fn test_sale_form_rejects_signed_and_zero_quantity() {
        assert!(sale_form("Widget", "-1", "1").validate().is_err());
        assert!(sale_form("Widget", "+1", "1").validate().is_err());
        let errors = sale_form("Widget", "0", "1").validate().unwrap_err();
        assert_eq!(errors, vec!["Quantity must be at least 1."]);
    }

    #[test]
    fn test_prefill_from_inventory() {
        let mut widget = Product::new("Widget", "W-1", 10.0, 5);
        widget.id = ProductId::new("p1");

        let mut form = sale_form("", "1", "");
        form.product_id = "p1".to_string();
        form.prefill_from(&[widget.clone()]);

        let input = form.validate().unwrap();
        assert_eq!(input.product, "Widget");
        assert!((input.price - 10.0).abs() < f64::EPSILON);
        assert_eq!(input.product_id, Some(ProductId::new("p1")));

        // An explicit price wins over the catalog price.
        let mut form = sale_form("", "1", "7");
        form.product_id = "p1".to_string();
        form.prefill_from(&[widget]);
        assert!((form.validate().unwrap().price - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sale_form_round_trips_stored_sale() {
        let sale = Sale::new(
            "Widget",
            Some(ProductId::new("p1")),
            3,
            2.5,
            Customer::new("Ana", "ana@example.com", ""),
            "Admin",
        );
        let form = SaleForm::from_sale(&sale);
        assert_eq!(form.product_id, "p1");
        assert_eq!(form.quantity, "3");
        assert_eq!(form.customer_email, "ana@example.com");
    }

    #[test]
    fn test_product_form() {
        let form = ProductForm {
            name: "Mug".to_string(),
            sku: " MUG-1 ".to_string(),
            price: "8".to_string(),
            stock: "12".to_string(),
        };
        let input = form.validate().unwrap();
        assert_eq!(input.sku, "MUG-1");
        assert_eq!(input.stock, 12);

        let errors = ProductForm::default().validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Name is required.",
                "Price is required.",
                "Stock must be a whole number."
            ]
        );
    }

    #[test]
    fn test_registration() {
        let existing = vec![User {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            name: "Administrator".to_string(),
            email: String::new(),
            phone: String::new(),
        }];

        let taken = RegistrationForm {
            username: "admin".to_string(),
            password: "x".to_string(),
            ..RegistrationForm::default()
        };
        assert_eq!(
            taken.validate(&existing).unwrap_err(),
            vec!["That username is already taken."]
        );

        let fresh = RegistrationForm {
            username: "maria".to_string(),
            password: "secret".to_string(),
            email: "maria@example.com".to_string(),
            ..RegistrationForm::default()
        };
        let user = fresh.validate(&existing).unwrap();
        assert_eq!(user.name, "maria");
        assert_eq!(user.email, "maria@example.com");

        // Reserved even when no admin record exists yet.
        let reserved = RegistrationForm {
            username: "admin".to_string(),
            password: "x".to_string(),
            ..RegistrationForm::default()
        };
        assert!(reserved.validate(&[]).is_err());

        let blank = RegistrationForm::default().validate(&existing).unwrap_err();
        assert_eq!(blank.len(), 2);
    }
}
