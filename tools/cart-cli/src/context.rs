//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use cart_cache::{KvStore, MemoryStore, RedisStore, SessionCartStore};
use cart_core::CallContext;
use cart_observability::{LogLevel, Telemetry};
use catalog_validation::{CatalogClient, CatalogServer, InMemoryCatalog};

use crate::config::{Backend, CliConfig};
use crate::output::Output;

const CONFIG_NAMES: [&str; 3] = ["cart.toml", ".cart.toml", "cart.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
    /// Config file in use, if any.
    pub config_path: Option<PathBuf>,
    /// Logging pipeline handed to every component.
    pub telemetry: Telemetry,
    /// Deadline for each backend call.
    pub timeout: Duration,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output, timeout_ms: u64) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (mut config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        config.store.settings.redis = config.store.settings.redis.clone().with_env();

        let mut log = config.log.clone();
        if output.is_verbose() {
            log.level = LogLevel::Debug;
        }
        let telemetry = Telemetry::new(&log);

        Ok(Self {
            config,
            output,
            cwd,
            config_path,
            telemetry,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Fresh per-call deadline.
    pub fn call(&self) -> CallContext {
        CallContext::with_timeout(self.timeout)
    }

    /// Connect the configured cart store.
    pub async fn store(&self) -> Result<SessionCartStore> {
        let settings = &self.config.store.settings;
        let kv: Arc<dyn KvStore> = match self.config.store.backend {
            Backend::Redis => {
                let logger = self.telemetry.logger("redis");
                let connect = RedisStore::from_config(&settings.redis, &logger);
                let store = self
                    .call()
                    .run(connect)
                    .await
                    .context("Timed out connecting to Redis")?
                    .with_context(|| {
                        format!(
                            "Failed to connect to Redis at {}:{}",
                            settings.redis.host, settings.redis.port
                        )
                    })?;
                Arc::new(store)
            }
            Backend::Memory => {
                self.output
                    .warn("Using the in-memory store; changes are lost when the command exits");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(SessionCartStore::new(
            kv,
            settings.clone(),
            self.telemetry.logger("cart_store"),
        ))
    }

    /// Load the configured product file.
    pub fn product_catalog(&self) -> Result<Option<Arc<InMemoryCatalog>>> {
        let Some(path) = &self.config.catalog.products_file else {
            return Ok(None);
        };
        let path = self.resolve_path(path);
        let catalog = InMemoryCatalog::load(&path)
            .with_context(|| format!("Failed to load product file: {}", path.display()))?;
        self.output
            .debug(&format!("Loaded {} products from {}", catalog.len(), path.display()));
        Ok(Some(Arc::new(catalog)))
    }

    /// Build a catalog client over the configured product file.
    pub fn catalog(&self) -> Result<Option<CatalogClient>> {
        let Some(catalog) = self.product_catalog()? else {
            return Ok(None);
        };

        let server = CatalogServer::new(catalog, self.telemetry.logger("catalog"))
            .with_currency(self.config.catalog.currency);
        Ok(Some(CatalogClient::new(
            Arc::new(server),
            self.config.catalog.client.clone(),
            self.telemetry.logger("catalog_client"),
        )))
    }

    /// Catalog client, or an error explaining how to configure one.
    pub fn require_catalog(&self) -> Result<CatalogClient> {
        self.catalog()?.context(
            "No catalog configured. Set [catalog] products_file in cart.toml.",
        )
    }

    /// Resolve a path relative to the config file, else the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(self.cwd.as_path())
            .join(path)
    }
}
