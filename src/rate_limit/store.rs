use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Errors from the shared counter store.
///
/// Every variant is absorbed by the admission engine and mapped to
/// fail-open; none of these reach an end user.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Counter store backend error: {0}")]
    Backend(String),

    #[error("Counter store operation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Abstraction over a shared key-value store with per-key expiration.
///
/// Two operations only: read a key and overwrite a key with a fresh TTL.
/// There is deliberately no atomic increment; concurrent requests from the
/// same client can race read-then-write and undercount. Enforcement is
/// best-effort by contract.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read the raw value for a key, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite a key and reset its expiration to `ttl_secs` from now
    async fn put_with_ttl(&self, key: &str, value: &str, ttl_secs: u64)
        -> Result<(), StoreError>;
}

/// Clock abstraction so window expiry can be driven by a test clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// System clock implementation using `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Controllable clock for tests.
///
/// Clones share the same underlying time value, so advancing one clone
/// advances them all.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<Instant>>,
}

impl MockClock {
    /// Create a mock clock starting at a specific instant
    pub fn new(start: Instant) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock by a duration
    pub fn advance(&self, duration: Duration) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time += duration;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

/// Redis-backed counter store (GET / SET EX)
pub struct RedisCounterStore {
    /// Redis connection manager
    connection: ConnectionManager,
}

impl RedisCounterStore {
    /// Create a new Redis counter store
    pub async fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self { connection })
    }

    /// Test the Redis connection
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        redis::cmd("PING")
            .query_async::<_, ()>(&mut connection)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut connection)
            .await?;

        debug!(key, present = value.is_some(), "counter store get");
        Ok(value)
    }

    async fn put_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs)
            .query_async::<_, ()>(&mut connection)
            .await?;

        debug!(key, ttl_secs, "counter store put");
        Ok(())
    }
}

/// In-memory counter store for single-process deployments and tests.
///
/// Expiry is checked lazily on read against the injected clock; expired
/// entries are removed on access.
pub struct MemoryCounterStore {
    entries: DashMap<String, (String, Instant)>,
    clock: Arc<dyn Clock>,
}

impl MemoryCounterStore {
    /// Create a memory store backed by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a memory store with an injected clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of live (possibly expired, not yet purged) entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(key) {
            let (value, expires_at) = entry.value();
            if now < *expires_at {
                return Ok(Some(value.clone()));
            }
        }

        // Entry absent or expired; purge the expired one so the map does
        // not accumulate dead windows.
        self.entries
            .remove_if(key, |_, (_, expires_at)| now >= *expires_at);
        Ok(None)
    }

    async fn put_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let expires_at = self.clock.now() + Duration::from_secs(ttl_secs);
        self.entries
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }
}
