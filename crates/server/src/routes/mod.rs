//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Redirect to the role landing page
//! GET  /health                  - Liveness
//! GET  /health/ready            - Data directory readable
//!
//! # Auth
//! GET  /login                   - Login page
//! POST /login                   - Login action
//! GET  /register                - Registration page
//! POST /register                - Registration action
//! GET  /logout                  - Logout action
//!
//! # Sales (admin)
//! GET  /sales                   - Sales list
//! GET  /sales/new               - New sale form
//! POST /sales/new               - Record a sale
//! GET  /sales/{id}/edit         - Edit sale form
//! POST /sales/{id}/edit         - Update a sale
//! POST /sales/{id}/delete       - Delete a sale
//!
//! # Inventory (admin, multipart forms)
//! GET  /inventory               - Product list
//! GET  /inventory/new           - New product form
//! POST /inventory/new           - Create a product
//! GET  /inventory/{id}/edit     - Edit product form
//! POST /inventory/{id}/edit     - Update a product
//! POST /inventory/{id}/delete   - Delete a product
//!
//! # Shop and cart (customers)
//! GET  /shop                    - Catalog
//! GET  /cart                    - Cart page
//! POST /cart/add                - Add to cart
//! POST /cart/remove             - Remove from cart
//! POST /cart/checkout           - Turn the cart into sales
//!
//! # Export (admin)
//! GET  /export/sales.csv        - Sales CSV (`?inventory=true` appends inventory)
//! GET  /export/report.xlsx      - Sales and inventory workbook
//! ```

pub mod auth;
pub mod cart;
pub mod export;
pub mod health;
pub mod inventory;
pub mod sales;
pub mod shop;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{Datelike, Utc};
use tower_sessions::Session;

use crate::middleware::{push_flash, take_flashes};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;

/// Request body limit for inventory forms: a 2 MiB image plus the text
/// fields and multipart framing.
const INVENTORY_BODY_LIMIT: usize = 3 * 1024 * 1024;

/// Shared layout data for every rendered page.
pub struct Page {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
    pub year: i32,
}

impl Page {
    /// Build the layout for `user`, draining pending flash messages.
    pub async fn new(session: &Session, user: Option<CurrentUser>) -> Self {
        Self {
            user,
            flashes: take_flashes(session).await,
            year: Utc::now().year(),
        }
    }

    /// Add messages rendered on this page only.
    #[must_use]
    pub fn with_errors(mut self, errors: &[String]) -> Self {
        self.flashes.extend(errors.iter().map(Flash::error));
        self
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(CurrentUser::is_admin)
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user.as_ref().map_or("", |u| u.display_name.as_str())
    }
}

/// Queue a flash and redirect. A flash that cannot be stored is logged and
/// the redirect still happens.
pub async fn redirect_with(session: &Session, flash: Flash, to: &str) -> Response {
    if let Err(e) = push_flash(session, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
    Redirect::to(to).into_response()
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout))
}

/// Create the sales routes router.
pub fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(sales::index))
        .route("/new", get(sales::new_page).post(sales::create))
        .route("/{id}/edit", get(sales::edit_page).post(sales::update))
        .route("/{id}/delete", post(sales::delete))
}

/// Create the inventory routes router.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(inventory::index))
        .route("/new", get(inventory::new_page).post(inventory::create))
        .route("/{id}/edit", get(inventory::edit_page).post(inventory::update))
        .route("/{id}/delete", post(inventory::delete))
        .layer(DefaultBodyLimit::max(INVENTORY_BODY_LIMIT))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/checkout", post(cart::checkout))
}

/// Create the export routes router.
pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/sales.csv", get(export::sales_csv))
        .route("/report.xlsx", get(export::report_xlsx))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth_routes())
        .nest("/sales", sales_routes())
        .nest("/inventory", inventory_routes())
        .route("/shop", get(shop::index))
        .nest("/cart", cart_routes())
        .nest("/export", export_routes())
}
