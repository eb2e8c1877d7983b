//! Store configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sliding time-to-live applied on every save: 24 hours.
pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

/// How a read-modify-write cycle guards against concurrent writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// Plain get then set. Two concurrent mutations of one session can
    /// both read the same state, and the later save silently discards the
    /// earlier one (lost update). Never corrupts the record.
    #[default]
    LastWriterWins,
    /// Save is a compare-and-set against the bytes that were read; on
    /// conflict the mutation is re-applied to fresh state.
    Optimistic,
}

/// Session cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Time-to-live set on every save, in seconds.
    pub ttl_secs: u64,
    /// Key namespace; records live at `<key_prefix>:<session_id>`.
    pub key_prefix: String,
    /// Concurrency guard for mutations.
    pub concurrency: ConcurrencyMode,
    /// Attempts before an optimistic mutation gives up.
    pub max_attempts: u32,
    /// Redis connection settings.
    pub redis: RedisConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
            key_prefix: "cart".to_string(),
            concurrency: ConcurrencyMode::LastWriterWins,
            max_attempts: 3,
            redis: RedisConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Record time-to-live.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Use optimistic concurrency.
    pub fn optimistic(mut self) -> Self {
        self.concurrency = ConcurrencyMode::Optimistic;
        self
    }
}

/// Redis connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
        }
    }
}

impl RedisConfig {
    /// Read `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD` and `REDIS_DB`.
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Override fields with whichever `REDIS_*` variables are set.
    pub fn with_env(self) -> Self {
        self.overlay(|name| std::env::var(name).ok())
    }

    /// Override fields from an arbitrary variable lookup.
    ///
    /// Empty values are ignored; integers that do not parse keep the
    /// current value.
    pub fn overlay(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            host: var("REDIS_HOST").unwrap_or(self.host),
            port: var("REDIS_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.port),
            password: var("REDIS_PASSWORD").or(self.password),
            db: var("REDIS_DB")
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.db),
        }
    }

    /// Connection URL, e.g. `redis://:secret@localhost:6379/0`.
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.ttl(), Duration::from_secs(86_400));
        assert_eq!(config.key_prefix, "cart");
        assert_eq!(config.concurrency, ConcurrencyMode::LastWriterWins);
    }

    #[test]
    fn test_from_toml_partial() {
        let config: StoreConfig = toml::from_str(
            r#"
            concurrency = "optimistic"

            [redis]
            host = "redis.internal"
            "#,
        )
        .unwrap();

        assert_eq!(config.concurrency, ConcurrencyMode::Optimistic);
        assert_eq!(config.ttl_secs, DEFAULT_TTL_SECS);
        assert_eq!(config.redis.host, "redis.internal");
        assert_eq!(config.redis.port, 6379);
    }

    #[test]
    fn test_redis_overlay() {
        let env: HashMap<&str, &str> = [
            ("REDIS_HOST", "cache"),
            ("REDIS_PORT", "not-a-number"),
            ("REDIS_PASSWORD", "secret"),
            ("REDIS_DB", "2"),
        ]
        .into_iter()
        .collect();

        let config = RedisConfig::default().overlay(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.host, "cache");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 2);
        assert_eq!(config.url(), "redis://:secret@cache:6379/2");
    }

    #[test]
    fn test_overlay_keeps_file_values_when_unset() {
        let base = RedisConfig {
            host: "redis.internal".to_string(),
            port: 6380,
            ..Default::default()
        };
        let config = base.clone().overlay(|k| (k == "REDIS_DB").then(|| "3".to_string()));
        assert_eq!(config.host, base.host);
        assert_eq!(config.port, 6380);
        assert_eq!(config.db, 3);
    }

    #[test]
    fn test_redis_url_without_password() {
        assert_eq!(RedisConfig::default().url(), "redis://localhost:6379/0");
    }
}
