//! Redis key-value backend.

use std::time::Duration;

use async_trait::async_trait;
use cart_observability::Logger;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError, Script};
use tracing::{debug, info};

use crate::kv::expiry_secs;
use crate::{KvError, KvStore, RedisConfig};

/// Atomic compare-and-set. `ARGV[1]` is `1` when a current value is
/// expected (`ARGV[2]`), `0` when the key must be absent.
const COMPARE_AND_SET: &str = r#"
local current = redis.call('GET', KEYS[1])
if ARGV[1] == '0' then
  if current then return 0 end
elseif current ~= ARGV[2] then
  return 0
end
redis.call('SET', KEYS[1], ARGV[3], 'EX', ARGV[4])
return 1
"#;

/// Key-value store backed by Redis.
///
/// Values are written with `SET .. EX`, so expiry is enforced by the server.
pub struct RedisStore {
    conn: ConnectionManager,
    cas: Script,
}

impl RedisStore {
    /// Connect to `url`, e.g. `redis://localhost:6379/0`.
    pub async fn connect(url: &str, logger: &Logger) -> Result<Self, KvError> {
        logger
            .scope("connect", async {
                let client = Client::open(url).map_err(kv_error)?;
                let conn = ConnectionManager::new(client).await.map_err(kv_error)?;
                info!(url = %redact(url), "Connected to Redis");
                Ok::<_, KvError>(Self {
                    conn,
                    cas: Script::new(COMPARE_AND_SET),
                })
            })
            .await
    }

    /// Connect using host, port, password and db from `config`.
    pub async fn from_config(config: &RedisConfig, logger: &Logger) -> Result<Self, KvError> {
        Self::connect(&config.url(), logger).await
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(kv_error)?;
        debug!(key, hit = value.is_some(), "Redis GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, value, expiry_secs(ttl))
            .await
            .map_err(kv_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, KvError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(kv_error)?;
        Ok(removed > 0)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<bool, KvError> {
        let mut conn = self.conn.clone();
        let mut invocation = self.cas.key(key);
        invocation
            .arg(if expected.is_some() { "1" } else { "0" })
            .arg(expected.unwrap_or_default())
            .arg(value)
            .arg(expiry_secs(ttl));
        let written: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(kv_error)?;
        Ok(written == 1)
    }

    async fn ping(&self) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(kv_error)?;
        Ok(())
    }
}

fn kv_error(e: RedisError) -> KvError {
    if e.is_timeout() {
        KvError::Timeout(e.to_string())
    } else {
        KvError::Unavailable(e.to_string())
    }
}

/// Drop the password from a connection URL before logging it.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => {
            format!("{}://***@{}", &url[..scheme], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_password() {
        assert_eq!(
            redact("redis://:secret@cache:6379/0"),
            "redis://***@cache:6379/0"
        );
        assert_eq!(redact("redis://localhost:6379/0"), "redis://localhost:6379/0");
    }
}
