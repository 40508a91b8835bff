//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CATALOG_API_URL` - Base URL of the catalog/stock API (default: `http://localhost:3333`)
//! - `CATALOG_CACHE_TTL_SECS` - How long product lookups are cached (default: 300)
//! - `CART_STORAGE_PATH` - File backing the local key-value store (default: `.rocketshoes/storage.json`)
//! - `CART_STORAGE_KEY` - Key the cart is stored under (default: `@RocketShoes:cart`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Key the cart snapshot is stored under unless overridden.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

const DEFAULT_CATALOG_URL: &str = "http://localhost:3333";
const DEFAULT_STORAGE_PATH: &str = ".rocketshoes/storage.json";
const DEFAULT_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Catalog/stock API configuration
    pub catalog: CatalogConfig,
    /// Local persistence configuration
    pub storage: StorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Catalog/stock API configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL; `/products/{id}` and `/stock/{id}` are resolved against it
    pub base_url: Url,
    /// TTL for cached product lookups (stock is never cached)
    pub product_cache_ttl: Duration,
}

/// Local key-value store configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Path of the JSON file backing the store
    pub path: PathBuf,
    /// Key the cart snapshot is stored under
    pub key: String,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(&get_env_or_default(
            &lookup,
            "CATALOG_API_URL",
            DEFAULT_CATALOG_URL,
        ))?;
        let ttl_secs = get_env_or_default(&lookup, "CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CATALOG_CACHE_TTL_SECS".to_string(), e.to_string())
            })?;

        let path = PathBuf::from(get_env_or_default(
            &lookup,
            "CART_STORAGE_PATH",
            DEFAULT_STORAGE_PATH,
        ));
        let key = get_env_or_default(&lookup, "CART_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            catalog: CatalogConfig {
                base_url,
                product_cache_ttl: Duration::from_secs(ttl_secs),
            },
            storage: StorageConfig { path, key },
            sentry_dsn: get_optional_env(&lookup, "SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable, treating empty values as unset.
fn get_optional_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.is_empty())
}

/// Get a variable with a default value.
fn get_env_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> String {
    get_optional_env(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Parse and validate the catalog base URL.
fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar("CATALOG_API_URL".to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "CATALOG_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CartConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.catalog.base_url.as_str(), "http://localhost:3333/");
        assert_eq!(config.catalog.product_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.storage.key, "@RocketShoes:cart");
        assert_eq!(
            config.storage.path,
            PathBuf::from(".rocketshoes/storage.json")
        );
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = CartConfig::from_lookup(lookup_from(&[
            ("CATALOG_API_URL", "https://api.example.com/v1/"),
            ("CATALOG_CACHE_TTL_SECS", "0"),
            ("CART_STORAGE_PATH", "/tmp/cart.json"),
            ("CART_STORAGE_KEY", "@Test:cart"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ]))
        .unwrap();

        assert_eq!(
            config.catalog.base_url.as_str(),
            "https://api.example.com/v1/"
        );
        assert_eq!(config.catalog.product_cache_ttl, Duration::ZERO);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/cart.json"));
        assert_eq!(config.storage.key, "@Test:cart");
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_empty_sentry_dsn_is_unset() {
        let config = CartConfig::from_lookup(lookup_from(&[("SENTRY_DSN", "")])).unwrap();
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_url() {
        let err = CartConfig::from_lookup(lookup_from(&[("CATALOG_API_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CATALOG_API_URL"));
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = CartConfig::from_lookup(lookup_from(&[("CATALOG_API_URL", "ftp://example.com")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_ttl() {
        let err = CartConfig::from_lookup(lookup_from(&[("CATALOG_CACHE_TTL_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CATALOG_CACHE_TTL_SECS"));
    }

    #[test]
    fn test_blank_storage_key_rejected() {
        let err = CartConfig::from_lookup(lookup_from(&[("CART_STORAGE_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }
}
