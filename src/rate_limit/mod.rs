//! Rate limiting module
//!
//! Fixed-window request-admission control for named endpoints, backed by a
//! shared key-value counter store with per-key expiration.
//!
//! # Design
//!
//! - **Fixed window**: a counter per (endpoint, client) pair, created with
//!   TTL = window length on first request and overwritten on each admitted
//!   request. No sliding-window or token-bucket precision.
//! - **Best effort**: the store contract is plain get/put, so concurrent
//!   requests can race read-then-write and undercount. Accepted tradeoff.
//! - **Fail open**: a missing store, an unknown endpoint, a store error or
//!   a store timeout all admit the request. The limiter must never be the
//!   single point of failure that blocks legitimate traffic.
//!
//! # Example
//!
//! ```rust,no_run
//! use issue_intake::config::IntakeConfig;
//! use issue_intake::rate_limit::{AdmissionEngine, MemoryCounterStore, PolicyTable};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let policies = IntakeConfig::default_config().rate_limiting.policies;
//!     let engine = AdmissionEngine::new(
//!         Some(Arc::new(MemoryCounterStore::new())),
//!         Arc::new(PolicyTable::new(policies)),
//!         Duration::from_millis(500),
//!     );
//!
//!     let headers = axum::http::HeaderMap::new();
//!     let decision = engine.decide("postIssue", &headers).await;
//!     assert!(decision.admitted);
//! }
//! ```

pub mod engine;
pub mod identity;
pub mod middleware;
pub mod policy;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use engine::{AdmissionEngine, Evaluation};
pub use identity::{resolve_client, UNKNOWN_CLIENT};
pub use middleware::{rate_limit_middleware, rejection_response};
pub use policy::PolicyTable;
pub use store::{
    Clock, CounterStore, MemoryCounterStore, MockClock, RedisCounterStore, StoreError, SystemClock,
};
pub use types::{CounterKey, EndpointPolicy, RateLimitDecision};
