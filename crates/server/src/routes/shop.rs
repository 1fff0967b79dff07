//! Catalog for customers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::{Product, format_money, types::money};

use super::Page;
use crate::cart_cookie::CartCookie;
use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::state::AppState;
use crate::store::ProductRepository;

/// A product card in the catalog.
pub struct ShopItem {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price: String,
    pub stock: u32,
    pub in_stock: bool,
    pub image_url: Option<String>,
}

impl From<&Product> for ShopItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            price: format_money(money::to_decimal(product.price)),
            stock: product.stock,
            in_stock: product.stock > 0,
            image_url: product.image_data_url(),
        }
    }
}

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopTemplate {
    pub page: Page,
    pub items: Vec<ShopItem>,
    pub cart_count: u32,
}

/// Display the catalog.
#[instrument(skip_all)]
pub async fn index(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
    session: Session,
    CartCookie(cart): CartCookie,
) -> Result<Response> {
    let products = ProductRepository::new(state.store()).get_all().await?;
    Ok(ShopTemplate {
        page: Page::new(&session, Some(user)).await,
        items: products.iter().map(ShopItem::from).collect(),
        cart_count: cart.item_count(),
    }
    .into_response())
}
