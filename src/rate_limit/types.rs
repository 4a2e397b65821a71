use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rate limit policy for a single named endpoint.
///
/// Policies are immutable after startup. `block_secs` is advisory retry
/// guidance surfaced to rejected clients; it does NOT extend the counter's
/// TTL, which is always `window_secs`. A client can therefore succeed again
/// after `window_secs` even though it was told to wait `block_secs`. This
/// mismatch is intentional and covered by tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPolicy {
    /// Endpoint name this policy applies to (exact match)
    pub endpoint: String,
    /// Maximum number of requests allowed per window
    pub max_requests: u32,
    /// Length of the fixed window (in seconds)
    pub window_secs: u64,
    /// Advisory block duration reported to rejected clients (in seconds)
    pub block_secs: u64,
}

impl EndpointPolicy {
    /// Get the window as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Outcome of an admission check, returned to the routing layer.
///
/// Never persisted; a rejection carries the advisory retry hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request is admitted
    pub admitted: bool,
    /// Retry hint for rejected requests (seconds)
    pub retry_after_secs: Option<u64>,
}

impl RateLimitDecision {
    /// Create an admitted decision
    pub fn admitted() -> Self {
        Self {
            admitted: true,
            retry_after_secs: None,
        }
    }

    /// Create a rejected decision with retry guidance
    pub fn rejected(retry_after_secs: u64) -> Self {
        Self {
            admitted: false,
            retry_after_secs: Some(retry_after_secs),
        }
    }
}

/// Composite counter key for one (endpoint, client) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    /// Endpoint name component
    pub endpoint: String,
    /// Client identity component
    pub client: String,
}

impl CounterKey {
    /// Create a new counter key
    pub fn new(endpoint: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: client.into(),
        }
    }

    /// Render the key for the shared counter store.
    ///
    /// Endpoint names are identifiers and client identities are addresses,
    /// so the colon separator keeps distinct (endpoint, client) pairs
    /// collision-free.
    pub fn to_storage_key(&self) -> String {
        format!("ratelimit:{}:{}", self.endpoint, self.client)
    }
}
