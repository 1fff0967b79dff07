//! Sales and inventory reports.
//!
//! CSV carries the sales rows and, on request, a blank separator line
//! followed by the inventory rows. The XLSX workbook always has a `Sales`
//! and an `Inventory` sheet with the same columns.
//!
//! Text cells starting with a formula trigger (`=`, `+`, `-`, `@`) get a
//! leading apostrophe so spreadsheet applications show them as text.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use stockroom_core::{Product, Sale, types::money};
use thiserror::Error;

/// Column headers of the sales block.
pub const SALES_HEADER: [&str; 9] = [
    "id",
    "product",
    "quantity",
    "price",
    "seller",
    "customer_name",
    "customer_email",
    "customer_phone",
    "total",
];

/// Column headers of the inventory block.
pub const INVENTORY_HEADER: [&str; 5] = ["inventory_id", "name", "sku", "price", "stock"];

/// Errors from building a report.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Report file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// Download file name.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "sales.csv",
            Self::Xlsx => "report.xlsx",
        }
    }
}

/// Render a report in `format`. `include_inventory` only affects CSV.
///
/// # Errors
///
/// Returns `ExportError` if encoding fails.
pub fn render(
    format: ExportFormat,
    sales: &[Sale],
    products: &[Product],
    include_inventory: bool,
) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => sales_csv(sales, include_inventory.then_some(products)),
        ExportFormat::Xlsx => workbook(sales, products),
    }
}

fn sale_row(sale: &Sale) -> [String; 9] {
    [
        sale.id.to_string(),
        neutralize(&sale.product),
        sale.quantity.to_string(),
        format!("{:.2}", sale.price),
        neutralize(&sale.seller),
        neutralize(&sale.customer.name),
        neutralize(&sale.customer.email),
        neutralize_phone(&sale.customer.phone),
        format!("{:.2}", sale.total()),
    ]
}

fn product_row(product: &Product) -> [String; 5] {
    [
        product.id.to_string(),
        neutralize(&product.name),
        neutralize(&product.sku),
        format!("{:.2}", product.price),
        product.stock.to_string(),
    ]
}

fn csv_block<const N: usize>(
    header: [&str; N],
    rows: impl Iterator<Item = [String; N]>,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Sales CSV, optionally followed by a blank line and the inventory block.
///
/// # Errors
///
/// Returns `ExportError::Csv` if a record cannot be written.
pub fn sales_csv(sales: &[Sale], inventory: Option<&[Product]>) -> Result<Vec<u8>, ExportError> {
    let mut out = csv_block(SALES_HEADER, sales.iter().map(sale_row))?;
    if let Some(products) = inventory {
        // A blank record would be written as `""`, so the separator is raw.
        out.push(b'\n');
        out.extend(csv_block(INVENTORY_HEADER, products.iter().map(product_row))?);
    }
    Ok(out)
}

fn write_header(sheet: &mut Worksheet, header: &[&str], bold: &Format) -> Result<(), XlsxError> {
    for (col, title) in (0u16..).zip(header) {
        sheet.write_string_with_format(0, col, *title, bold)?;
    }
    Ok(())
}

/// XLSX workbook with `Sales` and `Inventory` sheets.
///
/// # Errors
///
/// Returns `ExportError::Xlsx` if the workbook cannot be built.
pub fn workbook(sales: &[Sale], products: &[Product]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let money_format = Format::new().set_num_format("0.00");

    let sheet = workbook.add_worksheet();
    sheet.set_name("Sales")?;
    write_header(sheet, &SALES_HEADER, &bold)?;
    for (row, sale) in (1u32..).zip(sales) {
        sheet.write_string(row, 0, sale.id.as_str())?;
        sheet.write_string(row, 1, &sale.product)?;
        sheet.write_number(row, 2, f64::from(sale.quantity))?;
        sheet.write_number_with_format(row, 3, sale.price, &money_format)?;
        sheet.write_string(row, 4, &sale.seller)?;
        sheet.write_string(row, 5, &sale.customer.name)?;
        sheet.write_string(row, 6, &sale.customer.email)?;
        sheet.write_string(row, 7, &sale.customer.phone)?;
        sheet.write_number_with_format(row, 8, money::to_f64(sale.total()), &money_format)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Inventory")?;
    write_header(sheet, &INVENTORY_HEADER, &bold)?;
    for (row, product) in (1u32..).zip(products) {
        sheet.write_string(row, 0, product.id.as_str())?;
        sheet.write_string(row, 1, &product.name)?;
        sheet.write_string(row, 2, &product.sku)?;
        sheet.write_number_with_format(row, 3, product.price, &money_format)?;
        sheet.write_number(row, 4, f64::from(product.stock))?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn neutralize(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@']) {
        format!("'{value}")
    } else {
        value.to_owned()
    }
}

/// Phone numbers made only of digits and dialing punctuation stay as typed,
/// so `+34 600 123 456` is not turned into `'+34 600 123 456`.
fn neutralize_phone(value: &str) -> String {
    let mut chars = value.chars();
    let dialable = chars.next().is_some_and(|c| c == '+' || c.is_ascii_digit())
        && chars.all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.'));
    if dialable {
        value.to_owned()
    } else {
        neutralize(value)
    }
}
