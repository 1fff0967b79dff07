//! Sales management (admin).
//!
//! Recording or editing a sale that references an inventory product moves
//! that product's stock under the configured stock policy. Deleting a sale
//! leaves stock alone.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::{
    Product, Sale, SaleId, format_money,
    forms::{SaleForm, SaleInput},
    record_manual_sale,
    types::{money, sale},
};

use super::{Page, redirect_with};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Flash;
use crate::state::AppState;
use crate::store::{ProductRepository, SaleRepository, persist_pair};

/// One row of the sales table.
pub struct SaleRow {
    pub id: String,
    pub product: String,
    pub quantity: u32,
    pub price: String,
    pub total: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub seller: String,
    pub recorded: String,
}

impl From<&Sale> for SaleRow {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id.to_string(),
            product: sale.product.clone(),
            quantity: sale.quantity,
            price: format_money(money::to_decimal(sale.price)),
            total: format_money(sale.total()),
            customer_name: sale.customer.name.clone(),
            customer_email: sale.customer.email.clone(),
            customer_phone: sale.customer.phone.clone(),
            seller: sale.seller.clone(),
            recorded: sale
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Inventory entry in the product dropdown.
pub struct ProductOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

fn product_options(products: &[Product], selected: &str) -> Vec<ProductOption> {
    products
        .iter()
        .map(|p| ProductOption {
            id: p.id.to_string(),
            label: format!(
                "{} ({}, {} in stock)",
                p.name,
                format_money(money::to_decimal(p.price)),
                p.stock
            ),
            selected: p.id.as_str() == selected.trim(),
        })
        .collect()
}

/// Sales list template.
#[derive(Template, WebTemplate)]
#[template(path = "sales/list.html")]
pub struct SalesListTemplate {
    pub page: Page,
    pub sales: Vec<SaleRow>,
    pub grand_total: String,
}

/// Sale form template, shared by create and edit.
#[derive(Template, WebTemplate)]
#[template(path = "sales/form.html")]
pub struct SaleFormTemplate {
    pub page: Page,
    pub title: &'static str,
    pub action: String,
    pub form: SaleForm,
    pub products: Vec<ProductOption>,
}

impl SaleFormTemplate {
    fn new(page: Page, action: String, form: SaleForm, products: &[Product]) -> Self {
        let editing = action.ends_with("/edit");
        Self {
            page,
            title: if editing { "Edit sale" } else { "New sale" },
            products: product_options(products, &form.product_id),
            action,
            form,
        }
    }
}

/// Display all sales.
#[instrument(skip_all)]
pub async fn index(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response> {
    let sales = SaleRepository::new(state.store()).get_all().await?;
    let grand_total: Decimal = sales.iter().map(Sale::total).sum();

    Ok(SalesListTemplate {
        page: Page::new(&session, Some(user)).await,
        sales: sales.iter().map(SaleRow::from).collect(),
        grand_total: format_money(grand_total),
    }
    .into_response())
}

/// Display the new sale form.
pub async fn new_page(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response> {
    let products = ProductRepository::new(state.store()).get_all().await?;
    let page = Page::new(&session, Some(user)).await;
    Ok(SaleFormTemplate::new(page, "/sales/new".to_string(), SaleForm::default(), &products)
        .into_response())
}

fn build_sale(input: SaleInput, seller: &str) -> Sale {
    Sale::new(
        input.product,
        input.product_id,
        input.quantity,
        input.price,
        input.customer,
        seller,
    )
}

/// Record a new sale.
#[instrument(skip_all)]
pub async fn create(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(mut form): Form<SaleForm>,
) -> Result<Response> {
    let store = state.store();
    let _guard = store.write_lock().await;
    let products_repo = ProductRepository::new(store);
    let sales_repo = SaleRepository::new(store);

    let mut products = products_repo.get_all().await?;
    form.prefill_from(&products);

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            tracing::debug!(?errors, "Sale form rejected");
            let page = Page::new(&session, Some(user)).await.with_errors(&errors);
            return Ok(SaleFormTemplate::new(page, "/sales/new".to_string(), form, &products)
                .into_response());
        }
    };

    let sale = build_sale(input, &user.display_name);
    if let Err(e) = record_manual_sale(&sale, None, &mut products, state.stock_policy()) {
        tracing::warn!(error = %e, "Sale rejected by stock policy");
        let page = Page::new(&session, Some(user)).await.with_errors(&[e.to_string()]);
        return Ok(SaleFormTemplate::new(page, "/sales/new".to_string(), form, &products)
            .into_response());
    }

    let sales_before = sales_repo.get_all().await?;
    let mut sales = sales_before.clone();
    sales.push(sale.clone());
    if sale.product_id.is_some() {
        persist_pair(&sales_repo, &sales, &sales_before, &products_repo, &products).await?;
    } else {
        sales_repo.persist(&sales).await?;
    }

    tracing::info!(
        sale_id = %sale.id,
        product_id = ?sale.product_id,
        quantity = sale.quantity,
        "Sale recorded"
    );
    Ok(redirect_with(&session, Flash::success("Sale created."), "/sales").await)
}

/// Display the edit form for a sale.
pub async fn edit_page(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = SaleId::new(id);
    let existing = SaleRepository::new(state.store())
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("sale {id}")))?;
    let products = ProductRepository::new(state.store()).get_all().await?;

    let page = Page::new(&session, Some(user)).await;
    Ok(SaleFormTemplate::new(
        page,
        format!("/sales/{id}/edit"),
        SaleForm::from_sale(&existing),
        &products,
    )
    .into_response())
}

/// Update an existing sale.
#[instrument(skip_all, fields(sale_id = %id))]
pub async fn update(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(mut form): Form<SaleForm>,
) -> Result<Response> {
    let id = SaleId::new(id);
    let action = format!("/sales/{id}/edit");
    let store = state.store();
    let _guard = store.write_lock().await;
    let products_repo = ProductRepository::new(store);
    let sales_repo = SaleRepository::new(store);

    let mut sales = sales_repo.get_all().await?;
    let existing = sale::find(&sales, &id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("sale {id}")))?;

    let mut products = products_repo.get_all().await?;
    form.prefill_from(&products);

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let page = Page::new(&session, Some(user)).await.with_errors(&errors);
            return Ok(SaleFormTemplate::new(page, action, form, &products).into_response());
        }
    };

    let updated = Sale {
        id: existing.id.clone(),
        product: input.product,
        product_id: input.product_id,
        quantity: input.quantity,
        price: input.price,
        customer: input.customer,
        seller: existing.seller.clone(),
        created_at: existing.created_at,
    };

    if let Err(e) = record_manual_sale(&updated, Some(&existing), &mut products, state.stock_policy())
    {
        tracing::warn!(error = %e, "Sale edit rejected by stock policy");
        let page = Page::new(&session, Some(user)).await.with_errors(&[e.to_string()]);
        return Ok(SaleFormTemplate::new(page, action, form, &products).into_response());
    }

    let touches_stock = existing.product_id.is_some() || updated.product_id.is_some();
    let sales_before = sales.clone();
    if let Some(slot) = sales.iter_mut().find(|s| s.id == id) {
        *slot = updated;
    }
    if touches_stock {
        persist_pair(&sales_repo, &sales, &sales_before, &products_repo, &products).await?;
    } else {
        sales_repo.persist(&sales).await?;
    }

    tracing::info!("Sale updated");
    Ok(redirect_with(&session, Flash::success("Sale updated."), "/sales").await)
}

/// Delete a sale. Stock is not restored.
#[instrument(skip_all, fields(sale_id = %id))]
pub async fn delete(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = SaleId::new(id);
    let store = state.store();
    let _guard = store.write_lock().await;
    let repo = SaleRepository::new(store);

    let mut sales = repo.get_all().await?;
    let before = sales.len();
    sales.retain(|s| s.id != id);
    if sales.len() == before {
        return Err(AppError::NotFound(format!("sale {id}")));
    }
    repo.persist(&sales).await?;

    tracing::info!("Sale deleted");
    Ok(redirect_with(&session, Flash::info("Sale deleted."), "/sales").await)
}
