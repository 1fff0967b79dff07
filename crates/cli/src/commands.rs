//! CLI command implementations.
//!
//! Every command goes through the same `JsonStore` the server uses, taking
//! its write lock for changes, so the files stay in the layout the web app
//! reads.

use std::path::Path;

use thiserror::Error;

use stockroom_core::forms::RegistrationForm;
use stockroom_server::config::{AppConfig, ConfigError};
use stockroom_server::export::{self, ExportError, ExportFormat};
use stockroom_server::store::{JsonStore, ProductRepository, RepositoryError, SaleRepository, UserRepository};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] RepositoryError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Failed to write {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid account: {}", .0.join(" "))]
    InvalidAccount(Vec<String>),
}

/// Create whatever data files are missing.
///
/// # Errors
///
/// Returns an error if a document cannot be read or written.
pub async fn seed(config: &AppConfig) -> Result<(), CommandError> {
    let store = JsonStore::new(&config.data_dir);
    let created = store.bootstrap(&config.admin_password).await?;

    if created.is_empty() {
        tracing::info!(dir = %store.dir().display(), "Data directory already complete");
    } else {
        tracing::info!(dir = %store.dir().display(), files = ?created, "Seeded data directory");
    }
    Ok(())
}

/// Create a customer account with the same rules as the registration page.
///
/// # Errors
///
/// Returns `CommandError::InvalidAccount` with every validation message, or a
/// storage error.
pub async fn create_user(config: &AppConfig, form: &RegistrationForm) -> Result<(), CommandError> {
    let store = JsonStore::new(&config.data_dir);
    let _guard = store.write_lock().await;
    let users = UserRepository::new(&store);

    let account = form
        .validate(&users.get_all().await?)
        .map_err(CommandError::InvalidAccount)?;
    users.create(account.clone()).await?;

    tracing::info!(username = %account.username, name = %account.name, "User created");
    Ok(())
}

/// Render a report and write it to `output`.
///
/// # Errors
///
/// Returns an error if the data cannot be loaded, the report cannot be
/// built, or the file cannot be written.
pub async fn export(
    config: &AppConfig,
    format: ExportFormat,
    output: &Path,
    include_inventory: bool,
) -> Result<(), CommandError> {
    let store = JsonStore::new(&config.data_dir);
    let sales = SaleRepository::new(&store).get_all().await?;
    let products = ProductRepository::new(&store).get_all().await?;

    let bytes = export::render(format, &sales, &products, include_inventory)?;
    tokio::fs::write(output, &bytes)
        .await
        .map_err(|source| CommandError::Output {
            path: output.display().to_string(),
            source,
        })?;

    tracing::info!(
        path = %output.display(),
        sales = sales.len(),
        bytes = bytes.len(),
        "Report written"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> AppConfig {
        AppConfig::with_data_dir(dir)
    }

    #[tokio::test]
    async fn test_seed_then_create_user() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        seed(&config).await.unwrap();

        let form = RegistrationForm {
            username: "maria".to_string(),
            password: "secret".to_string(),
            ..RegistrationForm::default()
        };
        create_user(&config, &form).await.unwrap();

        let store = JsonStore::new(dir.path());
        let maria = UserRepository::new(&store)
            .get_by_username("maria")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(maria.name, "maria");

        let again = create_user(&config, &form).await;
        assert!(matches!(again, Err(CommandError::InvalidAccount(_))));
    }

    #[tokio::test]
    async fn test_export_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        seed(&config).await.unwrap();

        let output = dir.path().join("out.csv");
        export(&config, ExportFormat::Csv, &output, true).await.unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("id,product,quantity"));
        assert!(written.contains("\n\ninventory_id,name,sku,price,stock\n"));
    }
}
