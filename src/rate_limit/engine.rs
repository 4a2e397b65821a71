use super::identity::resolve_client;
use super::policy::PolicyTable;
use super::store::{CounterStore, StoreError};
use super::types::{CounterKey, RateLimitDecision};
use axum::http::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Internal evaluation outcome, kept separate from [`RateLimitDecision`] so
/// the fail-open policy lives at exactly one mapping point instead of being
/// swallowed ad hoc at each store call site.
#[derive(Debug)]
pub enum Evaluation {
    /// Request is within policy (or not subject to one)
    Admitted,
    /// Request exceeds policy; carries the advisory retry hint in seconds
    Rejected { retry_after_secs: u64 },
    /// The counter store failed or timed out
    StoreError(StoreError),
}

/// Fixed-window admission decision engine.
///
/// Stateless per call: all counter state lives in the shared store, which
/// may be accessed concurrently from many handler instances. The engine
/// never causes a request to fail; every internal failure degrades to
/// admission (fail open), and only a policy-driven rejection is surfaced.
pub struct AdmissionEngine {
    /// Shared counter store; `None` when not provisioned (enforcement off)
    store: Option<Arc<dyn CounterStore>>,
    /// Per-endpoint policies
    policies: Arc<PolicyTable>,
    /// Deadline for a single store operation
    op_timeout: Duration,
}

impl AdmissionEngine {
    /// Create an engine over a counter store and policy table
    pub fn new(
        store: Option<Arc<dyn CounterStore>>,
        policies: Arc<PolicyTable>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            store,
            policies,
            op_timeout,
        }
    }

    /// Create an engine with enforcement disabled (every request admitted)
    pub fn disabled(policies: Arc<PolicyTable>) -> Self {
        Self::new(None, policies, Duration::from_millis(500))
    }

    /// Decide whether to admit a request against the named endpoint.
    ///
    /// This is the single point where store failures are mapped to
    /// admission: a rate limiter must never be the reason legitimate
    /// traffic is blocked.
    pub async fn decide(&self, endpoint: &str, headers: &HeaderMap) -> RateLimitDecision {
        match self.evaluate(endpoint, headers).await {
            Evaluation::Admitted => RateLimitDecision::admitted(),
            Evaluation::Rejected { retry_after_secs } => {
                RateLimitDecision::rejected(retry_after_secs)
            }
            Evaluation::StoreError(err) => {
                warn!(endpoint, error = %err, "rate limit check failed, admitting request");
                RateLimitDecision::admitted()
            }
        }
    }

    /// Run the fixed-window check without applying the fail-open mapping
    pub async fn evaluate(&self, endpoint: &str, headers: &HeaderMap) -> Evaluation {
        let Some(store) = &self.store else {
            warn!(endpoint, "counter store not provisioned, skipping rate limit");
            return Evaluation::Admitted;
        };

        let Some(policy) = self.policies.get(endpoint) else {
            warn!(endpoint, "no rate limit policy for endpoint, skipping rate limit");
            return Evaluation::Admitted;
        };

        let client = resolve_client(headers);
        let key = CounterKey::new(endpoint, client).to_storage_key();

        let count = match self.read_count(store.as_ref(), &key).await {
            Ok(count) => count,
            Err(err) => return Evaluation::StoreError(err),
        };

        if count >= u64::from(policy.max_requests) {
            // Rejected requests are not counted toward future windows.
            debug!(%key, count, limit = policy.max_requests, "rate limit exceeded");
            return Evaluation::Rejected {
                retry_after_secs: policy.block_secs,
            };
        }

        if let Err(err) = self
            .write_count(store.as_ref(), &key, count + 1, policy.window_secs)
            .await
        {
            return Evaluation::StoreError(err);
        }

        debug!(%key, count = count + 1, limit = policy.max_requests, "request counted");
        Evaluation::Admitted
    }

    /// Read the current window count for a key; absent or unparsable values
    /// count as zero (an expired window and a fresh one look the same).
    async fn read_count(&self, store: &dyn CounterStore, key: &str) -> Result<u64, StoreError> {
        let value = tokio::time::timeout(self.op_timeout, store.get(key))
            .await
            .map_err(|_| StoreError::Timeout(self.op_timeout))??;

        Ok(value
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0))
    }

    /// Overwrite the window count and re-arm the TTL.
    ///
    /// Read-then-write is not atomic; concurrent requests from the same
    /// client can both observe the same count and undercount traffic. That
    /// race is the accepted cost of keeping the store contract to plain
    /// get/put.
    async fn write_count(
        &self,
        store: &dyn CounterStore,
        key: &str,
        count: u64,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        tokio::time::timeout(
            self.op_timeout,
            store.put_with_ttl(key, &count.to_string(), ttl_secs),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.op_timeout))?
    }
}
