//! CLI configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cart_cache::StoreConfig;
use cart_core::Currency;
use cart_observability::LogConfig;
use catalog_validation::ClientConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,

    /// Cart store configuration.
    #[serde(default)]
    pub store: StoreSection,

    /// Catalog configuration.
    #[serde(default)]
    pub catalog: CatalogSection,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }
}

/// Which key-value backend holds the carts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Redis; settings from `[store.redis]`, overridden by `REDIS_*`.
    #[default]
    Redis,
    /// In-process map, gone when the command exits.
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Redis => "redis",
            Backend::Memory => "memory",
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: Backend,

    #[serde(flatten)]
    pub settings: StoreConfig,
}

/// `[catalog]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSection {
    /// JSON or TOML product list served by the local catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_file: Option<PathBuf>,

    /// Currency quoted for prices.
    #[serde(default)]
    pub currency: Currency,

    #[serde(flatten)]
    pub client: ClientConfig,
}

/// Generate a default cart.toml config file.
pub fn generate_default_config() -> String {
    r#"# Cart CLI configuration

[log]
level = "info"
format = "human"

[store]
backend = "redis"
ttl_secs = 86400
key_prefix = "cart"
# last_writer_wins | optimistic
concurrency = "last_writer_wins"
max_attempts = 3

[store.redis]
host = "localhost"
port = 6379
db = 0

[catalog]
# products_file = "products.toml"
currency = "USD"
timeout_ms = 2000
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_cache::ConcurrencyMode;
    use cart_observability::{LogFormat, LogLevel};

    #[test]
    fn test_default_config_parses() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.store.backend, Backend::Redis);
        assert_eq!(config.store.settings.ttl_secs, 86_400);
        assert_eq!(config.store.settings.redis.port, 6379);
        assert_eq!(config.catalog.client.timeout_ms, 2000);
        assert_eq!(config.log.level, LogLevel::Info);
    }

    #[test]
    fn test_sections_are_optional() {
        let config: CliConfig = toml::from_str(
            r#"
            [store]
            backend = "memory"
            concurrency = "optimistic"

            [log]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.backend, Backend::Memory);
        assert_eq!(config.store.settings.concurrency, ConcurrencyMode::Optimistic);
        assert_eq!(config.store.settings.key_prefix, "cart");
        assert_eq!(config.log.format, LogFormat::Json);
        assert!(config.catalog.products_file.is_none());
        assert_eq!(config.catalog.currency, Currency::USD);
    }
}
