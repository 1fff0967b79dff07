//! Shopping cart handlers.
//!
//! The cart itself travels in the `cart` cookie (see [`crate::cart_cookie`]);
//! only checkout touches the data directory.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::{
    Cart, CheckoutError, Customer, ProductId, checkout as run_checkout, format_money,
    types::money,
};

use super::{Page, redirect_with};
use crate::cart_cookie::{self, CartCookie, CartCookieError};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireCustomer;
use crate::models::Flash;
use crate::state::AppState;
use crate::store::{ProductRepository, SaleRepository, persist_pair};

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    #[serde(default)]
    pub quantity: String,
}

impl AddToCartForm {
    /// Requested quantity; blank, unparsable or zero means one.
    fn quantity(&self) -> u32 {
        self.quantity.trim().parse::<u32>().unwrap_or(1).max(1)
    }
}

/// Remove-from-cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// One line on the cart page.
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub page: Page,
    pub lines: Vec<CartLine>,
    pub total: String,
}

/// Redirect after saving `cart` in the cookie.
async fn store_and_redirect(
    state: &AppState,
    session: &Session,
    cart: &Cart,
    flash: Flash,
    to: &str,
) -> Response {
    match cart_cookie::store(cart, state.config().is_secure()) {
        Ok(cookie) => {
            let mut response = redirect_with(session, flash, to).await;
            response.headers_mut().append(header::SET_COOKIE, cookie);
            response
        }
        Err(CartCookieError::TooLarge { size }) => {
            tracing::warn!(size, "Cart too large for cookie");
            redirect_with(
                session,
                Flash::error("Your cart is full. Check out or remove items first."),
                "/cart",
            )
            .await
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode cart cookie");
            redirect_with(session, Flash::error("Could not update your cart."), "/cart").await
        }
    }
}

/// Display the cart.
pub async fn show(
    RequireCustomer(user): RequireCustomer,
    session: Session,
    CartCookie(cart): CartCookie,
) -> Response {
    let lines = cart
        .entries()
        .iter()
        .map(|entry| CartLine {
            product_id: entry.product_id.to_string(),
            name: entry.name.clone(),
            price: format_money(money::to_decimal(entry.price)),
            quantity: entry.quantity,
            line_total: format_money(entry.line_total()),
        })
        .collect();

    CartTemplate {
        page: Page::new(&session, Some(user)).await,
        lines,
        total: format_money(cart.total()),
    }
    .into_response()
}

/// Add a product to the cart. Name and price are copied from inventory.
#[instrument(skip_all)]
pub async fn add(
    RequireCustomer(_user): RequireCustomer,
    State(state): State<AppState>,
    session: Session,
    CartCookie(mut cart): CartCookie,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id.trim());
    let Some(product) = ProductRepository::new(state.store()).get_by_id(&id).await? else {
        tracing::warn!(product_id = %id, "Add to cart for unknown product");
        return Ok(redirect_with(
            &session,
            Flash::error("That product no longer exists."),
            "/shop",
        )
        .await);
    };

    let quantity = form.quantity();
    cart.add(product.id, product.name.clone(), product.price, quantity);
    tracing::debug!(product_id = %id, quantity, "Added to cart");

    Ok(store_and_redirect(
        &state,
        &session,
        &cart,
        Flash::success(format!("Added {} to your cart.", product.name)),
        "/shop",
    )
    .await)
}

/// Remove a product from the cart.
pub async fn remove(
    RequireCustomer(_user): RequireCustomer,
    State(state): State<AppState>,
    session: Session,
    CartCookie(mut cart): CartCookie,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let flash = if cart.remove(&ProductId::new(form.product_id.trim())) {
        Flash::info("Item removed from your cart.")
    } else {
        Flash::info("That item was not in your cart.")
    };
    store_and_redirect(&state, &session, &cart, flash, "/cart").await
}

/// Turn the cart into sales and take the units out of stock.
///
/// Everything happens under the store's write lock. Stock is restored if the
/// sales write fails, and the cookie is only cleared once both documents are
/// persisted.
#[instrument(skip_all)]
pub async fn checkout(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
    session: Session,
    CartCookie(cart): CartCookie,
) -> Result<Response> {
    let store = state.store();
    let _guard = store.write_lock().await;
    let products_repo = ProductRepository::new(store);
    let sales_repo = SaleRepository::new(store);

    let mut products = products_repo.get_all().await?;
    let products_before = products.clone();
    let buyer = Customer::new(
        user.display_name.clone(),
        user.email.clone(),
        user.phone.clone(),
    );

    let new_sales = match run_checkout(
        &cart,
        &mut products,
        &buyer,
        &user.display_name,
        state.stock_policy(),
    ) {
        Ok(new_sales) => new_sales,
        Err(e @ CheckoutError::EmptyCart) => {
            return Ok(redirect_with(&session, Flash::error(e.to_string()), "/cart").await);
        }
        Err(e @ CheckoutError::Stock(_)) => {
            tracing::warn!(error = %e, "Checkout rejected by stock policy");
            return Ok(redirect_with(&session, Flash::error(e.to_string()), "/cart").await);
        }
    };

    let mut sales = sales_repo.get_all().await?;
    sales.extend(new_sales.iter().cloned());
    persist_pair(&products_repo, &products, &products_before, &sales_repo, &sales).await?;

    let units = cart.item_count();
    add_breadcrumb("cart", "Checked out", &[("units", &units.to_string())]);
    tracing::info!(
        username = %user.username,
        sales = new_sales.len(),
        units,
        "Checkout complete"
    );

    let mut response = redirect_with(
        &session,
        Flash::success(format!(
            "Purchase complete: {units} item(s), {}.",
            format_money(cart.total())
        )),
        "/shop",
    )
    .await;
    response
        .headers_mut()
        .append(header::SET_COOKIE, cart_cookie::clear(state.config().is_secure()));
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_quantity_defaults_to_one() {
        let form = |q: &str| AddToCartForm {
            product_id: "p1".to_string(),
            quantity: q.to_string(),
        };
        assert_eq!(form("").quantity(), 1);
        assert_eq!(form("0").quantity(), 1);
        assert_eq!(form("abc").quantity(), 1);
        assert_eq!(form(" 3 ").quantity(), 3);
    }
}
