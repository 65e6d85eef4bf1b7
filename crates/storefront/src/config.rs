//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `STOREFRONT_CURRENCY` - Display currency: BRL, USD, EUR or GBP (default: BRL)
//! - `CATALOG_API_URL` - Catalog and auth service (default: <https://fakestoreapi.com>)
//! - `CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `CATALOG_TIMEOUT_SECS` - Upstream request timeout (default: 10)
//! - `CHECKOUT_ORDER_DELAY_MS` - Simulated order latency (default: 2000)
//! - `CHECKOUT_SUCCESS_DISPLAY_MS` - Success screen auto-close delay (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use scoder_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
///
/// Implements `Debug` manually to redact the Sentry DSN.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Currency used to display prices
    pub currency: CurrencyCode,
    /// Catalog service settings
    pub catalog: CatalogConfig,
    /// Checkout timings
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment name (e.g. "production")
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("currency", &self.currency)
            .field("catalog", &self.catalog)
            .field("checkout", &self.checkout)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

/// External catalog service configuration.
///
/// The same service issues login tokens.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL, without trailing slash
    pub base_url: Url,
    /// How long fetched products stay cached
    pub cache_ttl: Duration,
    /// Timeout for each upstream request
    pub timeout: Duration,
}

/// Checkout timing configuration.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutConfig {
    /// How long the simulated order submission takes
    pub order_delay: Duration,
    /// How long the success step stays open before closing itself
    pub success_display: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            order_delay: Duration::from_millis(2000),
            success_display: Duration::from_millis(3000),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set to a value
    /// that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        let currency = parse_env("STOREFRONT_CURRENCY", "BRL")?;

        let catalog = CatalogConfig::from_env()?;
        let checkout = CheckoutConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN").map(SecretString::from);
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            host,
            port,
            base_url,
            currency,
            catalog,
            checkout,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_env_or_default("CATALOG_API_URL", "https://fakestoreapi.com");
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .map_err(|e| ConfigError::InvalidEnvVar("CATALOG_API_URL".to_string(), e.to_string()))?;

        Ok(Self {
            base_url,
            cache_ttl: Duration::from_secs(parse_env("CATALOG_CACHE_TTL_SECS", "300")?),
            timeout: Duration::from_secs(parse_env("CATALOG_TIMEOUT_SECS", "10")?),
        })
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            order_delay: Duration::from_millis(parse_env("CHECKOUT_ORDER_DELAY_MS", "2000")?),
            success_display: Duration::from_millis(parse_env(
                "CHECKOUT_SUCCESS_DISPLAY_MS",
                "3000",
            )?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to a default.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            currency: CurrencyCode::BRL,
            catalog: CatalogConfig {
                base_url: Url::parse("https://fakestoreapi.com").unwrap(),
                cache_ttl: Duration::from_secs(300),
                timeout: Duration::from_secs(10),
            },
            checkout: CheckoutConfig::default(),
            sentry_dsn: Some(SecretString::from("https://key@sentry.example.com/1")),
            sentry_environment: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        let mut config = test_config();
        assert!(!config.is_secure());
        config.base_url = "https://shop.example.com".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_debug_redacts_sentry_dsn() {
        let debug_output = format!("{:?}", test_config());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("key@sentry"));
        assert!(debug_output.contains("fakestoreapi.com"));
    }

    #[test]
    fn test_parse_value() {
        let port: u16 = parse_value("STOREFRONT_PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);

        let currency: CurrencyCode = parse_value("STOREFRONT_CURRENCY", "usd").unwrap();
        assert_eq!(currency, CurrencyCode::USD);
    }

    #[test]
    fn test_parse_value_invalid() {
        let err = parse_value::<u16>("STOREFRONT_PORT", "99999").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "STOREFRONT_PORT"));

        let err = parse_value::<CurrencyCode>("STOREFRONT_CURRENCY", "JPY").unwrap_err();
        assert!(err.to_string().contains("STOREFRONT_CURRENCY"));
    }

    #[test]
    fn test_checkout_defaults() {
        let checkout = CheckoutConfig::default();
        assert_eq!(checkout.order_delay, Duration::from_millis(2000));
        assert_eq!(checkout.success_display, Duration::from_millis(3000));
    }
}
