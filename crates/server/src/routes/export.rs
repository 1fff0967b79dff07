//! Report downloads (admin).

use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::export::{self as report, ExportFormat};
use crate::middleware::RequireAdmin;
use crate::state::AppState;
use crate::store::{ProductRepository, SaleRepository};

/// Query parameters for the CSV export.
#[derive(Debug, Default, Deserialize)]
pub struct CsvQuery {
    #[serde(default)]
    pub inventory: Option<String>,
}

impl CsvQuery {
    fn include_inventory(&self) -> bool {
        self.inventory.as_deref().is_some_and(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            )
        })
    }
}

async fn download(state: &AppState, format: ExportFormat, include_inventory: bool) -> Result<Response> {
    let sales = SaleRepository::new(state.store()).get_all().await?;
    let products = ProductRepository::new(state.store()).get_all().await?;
    let body = report::render(format, &sales, &products, include_inventory)?;

    tracing::info!(
        format = format.file_name(),
        sales = sales.len(),
        include_inventory,
        "Report exported"
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name()),
            ),
        ],
        body,
    )
        .into_response())
}

/// Sales CSV, with the inventory block when `?inventory=true`.
#[instrument(skip_all)]
pub async fn sales_csv(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<CsvQuery>,
) -> Result<Response> {
    download(&state, ExportFormat::Csv, query.include_inventory()).await
}

/// Sales and inventory workbook.
#[instrument(skip_all)]
pub async fn report_xlsx(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Response> {
    download(&state, ExportFormat::Xlsx, true).await
}
