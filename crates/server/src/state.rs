//! Application state shared across handlers.

use std::sync::Arc;

use stockroom_core::StockPolicy;

use crate::config::AppConfig;
use crate::store::JsonStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the configuration and the JSON store
/// whose writer gate serializes every mutation.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: JsonStore,
}

impl AppState {
    /// Create application state rooted at `config.data_dir`.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let store = JsonStore::new(config.data_dir.clone());
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the JSON store.
    #[must_use]
    pub fn store(&self) -> &JsonStore {
        &self.inner.store
    }

    /// Stock policy shared by checkout and manual sales.
    #[must_use]
    pub fn stock_policy(&self) -> StockPolicy {
        self.inner.config.stock_policy
    }
}
