//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `STOCKROOM_HOST` - Bind address (default: 127.0.0.1)
//! - `STOCKROOM_PORT` - Listen port (default: 5000)
//! - `STOCKROOM_BASE_URL` - Public URL; `https://` turns on secure cookies
//!   (default: <http://localhost:5000>)
//! - `STOCKROOM_DATA_DIR` - Directory holding the JSON documents (default: data)
//! - `STOCKROOM_STATIC_DIR` - Stylesheets and other assets (default: crates/server/static)
//! - `STOCKROOM_ADMIN_PASSWORD` - Password given to the seeded admin user (default: admin123)
//! - `STOCKROOM_STOCK_POLICY` - `strict` or `clamp` (default: strict)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use stockroom_core::StockPolicy;
use thiserror::Error;

/// Default password for the bootstrap admin account.
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Directory with `users.json`, `sales.json` and `products.json`
    pub data_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Password for the admin account created on first start
    pub admin_password: SecretString,
    /// Stock policy shared by checkout and manual sales
    pub stock_policy: StockPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOCKROOM_HOST", "127.0.0.1")?;
        let port = parse_env("STOCKROOM_PORT", "5000")?;
        let stock_policy = get_env_or_default("STOCKROOM_STOCK_POLICY", StockPolicy::Strict.as_str())
            .parse::<StockPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOCKROOM_STOCK_POLICY".to_string(), e))?;

        Ok(Self {
            host,
            port,
            base_url: get_env_or_default("STOCKROOM_BASE_URL", "http://localhost:5000"),
            data_dir: PathBuf::from(get_env_or_default("STOCKROOM_DATA_DIR", "data")),
            static_dir: PathBuf::from(get_env_or_default(
                "STOCKROOM_STATIC_DIR",
                "crates/server/static",
            )),
            admin_password: SecretString::from(get_env_or_default(
                "STOCKROOM_ADMIN_PASSWORD",
                DEFAULT_ADMIN_PASSWORD,
            )),
            stock_policy,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Configuration for a server rooted at `data_dir` with every other value
    /// at its default. Used by the CLI and tests.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            base_url: "http://localhost:5000".to_string(),
            data_dir: data_dir.into(),
            static_dir: PathBuf::from("crates/server/static"),
            admin_password: SecretString::from(DEFAULT_ADMIN_PASSWORD),
            stock_policy: StockPolicy::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a sample rate and check it lies in `0.0..=1.0`.
fn parse_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("{rate} is outside 0.0..=1.0"),
        ))
    }
}
