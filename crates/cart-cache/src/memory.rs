//! In-process key-value backend with expiry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::kv::expiry_secs;
use crate::{KvError, KvStore};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn new(value: Vec<u8>, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now + Duration::from_secs(expiry_secs(ttl)),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Key-value store held in memory.
///
/// Expiry follows `tokio::time`, so paused-clock tests can advance past a
/// TTL. Latency and outages can be injected to exercise timeout and
/// unavailability paths.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    latency: Option<Duration>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            latency: None,
            available: AtomicBool::new(true),
        }
    }

    /// Delay every operation by `latency` before it touches the map.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulate the backend going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Remaining time to live of a live key.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.lock().ok()?;
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.expires_at.saturating_duration_since(now))
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .map(|entries| entries.values().filter(|e| e.is_live(now)).count())
            .unwrap_or(0)
    }

    /// Check if the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn enter(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, KvError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("connection refused".to_string()));
        }
        self.lock()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, KvError> {
        self.entries
            .lock()
            .map_err(|_| KvError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn live_value<'a>(
        entries: &'a mut HashMap<String, Entry>,
        key: &str,
        now: Instant,
    ) -> Option<&'a Vec<u8>> {
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        entries.get(key).map(|e| &e.value)
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let mut entries = self.enter().await?;
        Ok(Self::live_value(&mut entries, key, Instant::now()).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), KvError> {
        let mut entries = self.enter().await?;
        entries.insert(key.to_string(), Entry::new(value, Instant::now(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, KvError> {
        let mut entries = self.enter().await?;
        let now = Instant::now();
        Ok(entries.remove(key).is_some_and(|e| e.is_live(now)))
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<bool, KvError> {
        let mut entries = self.enter().await?;
        let now = Instant::now();
        let current = Self::live_value(&mut entries, key, now).map(Vec::as_slice);
        if current != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::new(value, now, ttl));
        Ok(true)
    }

    async fn ping(&self) -> Result<(), KvError> {
        self.enter().await.map(|_| ())
    }
}
