//! Inventory management (admin).
//!
//! Product forms are multipart so an image can ride along. Images are kept
//! inline in `products.json` as base64 with their content type.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::{
    Product, ProductId, format_money,
    forms::ProductForm,
    types::{money, product},
};

use super::{Page, redirect_with};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Flash;
use crate::state::AppState;
use crate::store::ProductRepository;

/// Largest accepted image upload.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// One row of the inventory table.
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price: String,
    pub stock: u32,
    pub image_url: Option<String>,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            price: format_money(money::to_decimal(product.price)),
            stock: product.stock,
            image_url: product.image_data_url(),
        }
    }
}

/// Inventory list template.
#[derive(Template, WebTemplate)]
#[template(path = "inventory/list.html")]
pub struct InventoryListTemplate {
    pub page: Page,
    pub products: Vec<ProductRow>,
}

/// Product form template, shared by create and edit.
#[derive(Template, WebTemplate)]
#[template(path = "inventory/form.html")]
pub struct ProductFormTemplate {
    pub page: Page,
    pub title: &'static str,
    pub action: String,
    pub form: ProductForm,
    /// Current image when editing.
    pub image_url: Option<String>,
}

/// An uploaded image.
#[derive(Debug)]
struct Image {
    bytes: Vec<u8>,
    content_type: String,
}

/// A parsed multipart product submission.
#[derive(Debug, Default)]
struct ProductSubmission {
    form: ProductForm,
    image: Option<Image>,
    remove_image: bool,
    errors: Vec<String>,
}

impl ProductSubmission {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut submission = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            if name == "image" {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                // Browsers send an empty part when no file was picked
                if !bytes.is_empty() {
                    submission.accept_image(bytes.to_vec(), content_type);
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            match name.as_str() {
                "name" => submission.form.name = value,
                "sku" => submission.form.sku = value,
                "price" => submission.form.price = value,
                "stock" => submission.form.stock = value,
                "remove_image" => submission.remove_image = !value.is_empty(),
                _ => {}
            }
        }

        Ok(submission)
    }

    fn accept_image(&mut self, bytes: Vec<u8>, content_type: String) {
        if !content_type.starts_with("image/") {
            self.errors.push("Image must be an image file.".to_string());
        } else if bytes.len() > MAX_IMAGE_BYTES {
            self.errors.push("Image must be 2 MiB or smaller.".to_string());
        } else {
            self.image = Some(Image {
                bytes,
                content_type,
            });
        }
    }

    /// Apply the submission's image choice to `product`.
    fn apply_image(&self, product: &mut Product) {
        if let Some(image) = &self.image {
            product.image_base64 = Some(STANDARD.encode(&image.bytes));
            product.image_content_type = Some(image.content_type.clone());
        } else if self.remove_image {
            product.image_base64 = None;
            product.image_content_type = None;
        }
    }
}

/// Display all products.
#[instrument(skip_all)]
pub async fn index(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response> {
    let products = ProductRepository::new(state.store()).get_all().await?;
    Ok(InventoryListTemplate {
        page: Page::new(&session, Some(user)).await,
        products: products.iter().map(ProductRow::from).collect(),
    }
    .into_response())
}

/// Display the new product form.
pub async fn new_page(RequireAdmin(user): RequireAdmin, session: Session) -> Response {
    ProductFormTemplate {
        page: Page::new(&session, Some(user)).await,
        title: "New product",
        action: "/inventory/new".to_string(),
        form: ProductForm::default(),
        image_url: None,
    }
    .into_response()
}

/// Create a product.
#[instrument(skip_all)]
pub async fn create(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let submission = ProductSubmission::read(multipart).await?;
    let input = match submission.form.validate() {
        Ok(input) if submission.errors.is_empty() => input,
        result => {
            let mut errors = result.err().unwrap_or_default();
            errors.extend(submission.errors.iter().cloned());
            let page = Page::new(&session, Some(user)).await.with_errors(&errors);
            return Ok(ProductFormTemplate {
                page,
                title: "New product",
                action: "/inventory/new".to_string(),
                form: submission.form,
                image_url: None,
            }
            .into_response());
        }
    };

    let mut created = Product::new(input.name, input.sku, input.price, input.stock);
    submission.apply_image(&mut created);

    let store = state.store();
    let _guard = store.write_lock().await;
    let repo = ProductRepository::new(store);
    let mut products = repo.get_all().await?;
    products.push(created.clone());
    repo.persist(&products).await?;

    tracing::info!(product_id = %created.id, stock = created.stock, "Product created");
    Ok(redirect_with(&session, Flash::success("Product created."), "/inventory").await)
}

/// Display the edit form for a product.
pub async fn edit_page(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let existing = ProductRepository::new(state.store())
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductFormTemplate {
        page: Page::new(&session, Some(user)).await,
        title: "Edit product",
        action: format!("/inventory/{id}/edit"),
        form: ProductForm::from_product(&existing),
        image_url: existing.image_data_url(),
    }
    .into_response())
}

/// Update a product.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn update(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let id = ProductId::new(id);
    let submission = ProductSubmission::read(multipart).await?;

    let store = state.store();
    let _guard = store.write_lock().await;
    let repo = ProductRepository::new(store);
    let mut products = repo.get_all().await?;
    let existing = product::find(&products, &id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let input = match submission.form.validate() {
        Ok(input) if submission.errors.is_empty() => input,
        result => {
            let mut errors = result.err().unwrap_or_default();
            errors.extend(submission.errors.iter().cloned());
            let page = Page::new(&session, Some(user)).await.with_errors(&errors);
            return Ok(ProductFormTemplate {
                page,
                title: "Edit product",
                action: format!("/inventory/{id}/edit"),
                form: submission.form,
                image_url: existing.image_data_url(),
            }
            .into_response());
        }
    };

    if let Some(slot) = products.iter_mut().find(|p| p.id == id) {
        slot.name = input.name;
        slot.sku = input.sku;
        slot.price = input.price;
        slot.stock = input.stock;
        submission.apply_image(slot);
    }
    repo.persist(&products).await?;

    tracing::info!(stock = input.stock, "Product updated");
    Ok(redirect_with(&session, Flash::success("Product updated."), "/inventory").await)
}

/// Delete a product. Sales that reference it are kept as they are.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn delete(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let store = state.store();
    let _guard = store.write_lock().await;
    let repo = ProductRepository::new(store);

    let mut products = repo.get_all().await?;
    let before = products.len();
    products.retain(|p| p.id != id);
    if products.len() == before {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    repo.persist(&products).await?;

    tracing::info!("Product deleted");
    Ok(redirect_with(&session, Flash::info("Product deleted."), "/inventory").await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_image_rules() {
        let mut submission = ProductSubmission::default();
        submission.accept_image(vec![1, 2, 3], "text/plain".to_string());
        assert_eq!(submission.errors, vec!["Image must be an image file."]);
        assert!(submission.image.is_none());

        let mut submission = ProductSubmission::default();
        submission.accept_image(vec![0; MAX_IMAGE_BYTES + 1], "image/png".to_string());
        assert_eq!(submission.errors, vec!["Image must be 2 MiB or smaller."]);
    }

    #[test]
    fn test_apply_image() {
        let mut product = Product::new("Mug", "", 1.0, 1);

        let mut submission = ProductSubmission::default();
        submission.accept_image(b"png".to_vec(), "image/png".to_string());
        submission.apply_image(&mut product);
        assert_eq!(product.image_base64.as_deref(), Some("cG5n"));
        assert_eq!(product.image_content_type.as_deref(), Some("image/png"));

        // No new upload and no removal keeps the current image.
        ProductSubmission::default().apply_image(&mut product);
        assert!(product.image_base64.is_some());

        let removal = ProductSubmission {
            remove_image: true,
            ..ProductSubmission::default()
        };
        removal.apply_image(&mut product);
        assert!(product.image_base64.is_none());
        assert!(product.image_content_type.is_none());
    }
}
