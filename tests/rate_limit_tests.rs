use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use issue_intake::config::IntakeConfig;
use issue_intake::rate_limit::{
    AdmissionEngine, CounterStore, EndpointPolicy, MemoryCounterStore, MockClock, PolicyTable,
    StoreError,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counter store that fails every call, for fault injection
struct UnreachableStore;

#[async_trait]
impl CounterStore for UnreachableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Backend("store unreachable".to_string()))
    }

    async fn put_with_ttl(
        &self,
        _key: &str,
        _value: &str,
        _ttl_secs: u64,
    ) -> Result<(), StoreError> {
        Err(StoreError::Backend("store unreachable".to_string()))
    }
}

fn default_policies() -> Arc<PolicyTable> {
    Arc::new(PolicyTable::new(
        IntakeConfig::default_config().rate_limiting.policies,
    ))
}

/// Engine over a memory store driven by a mock clock
fn clocked_engine() -> (AdmissionEngine, MockClock) {
    let clock = MockClock::new(Instant::now());
    let store = MemoryCounterStore::with_clock(Arc::new(clock.clone()));
    let engine = AdmissionEngine::new(
        Some(Arc::new(store)),
        default_policies(),
        Duration::from_millis(100),
    );
    (engine, clock)
}

fn client(ip: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("cf-connecting-ip", HeaderValue::from_str(ip).unwrap());
    headers
}

#[tokio::test]
async fn full_window_then_reject_then_reset() {
    // Policy {10, 60, 300} on postIssue, client 1.2.3.4.
    let (engine, clock) = clocked_engine();
    let headers = client("1.2.3.4");

    // Calls 1-10 are admitted.
    for i in 1..=10 {
        let decision = engine.decide("postIssue", &headers).await;
        assert!(decision.admitted, "call {} should be admitted", i);
        assert_eq!(decision.retry_after_secs, None);
    }

    // Call 11 in the same window is rejected; the hint advertises the
    // advisory block duration, not the window length.
    let decision = engine.decide("postIssue", &headers).await;
    assert!(!decision.admitted);
    assert_eq!(decision.retry_after_secs, Some(300));

    // Call 12 at +61s lands in a fresh window.
    clock.advance(Duration::from_secs(61));
    let decision = engine.decide("postIssue", &headers).await;
    assert!(decision.admitted);
}

#[tokio::test]
async fn window_resets_before_advertised_block_elapses() {
    // block_secs (300) exceeds window_secs (60); the counter still expires
    // after the window. Known, intentional mismatch.
    let (engine, clock) = clocked_engine();
    let headers = client("1.2.3.4");

    for _ in 0..10 {
        assert!(engine.decide("postIssue", &headers).await.admitted);
    }
    assert!(!engine.decide("postIssue", &headers).await.admitted);

    clock.advance(Duration::from_secs(61));
    assert!(
        engine.decide("postIssue", &headers).await.admitted,
        "client succeeds after window_secs despite being told to wait block_secs"
    );
}

#[tokio::test]
async fn clients_have_independent_counters() {
    let (engine, _clock) = clocked_engine();

    // Exhaust client A's quota.
    let a = client("1.2.3.4");
    for _ in 0..10 {
        assert!(engine.decide("postIssue", &a).await.admitted);
    }
    assert!(!engine.decide("postIssue", &a).await.admitted);

    // Client B is unaffected.
    let b = client("5.6.7.8");
    assert!(engine.decide("postIssue", &b).await.admitted);
}

#[tokio::test]
async fn endpoints_have_independent_counters() {
    let (engine, _clock) = clocked_engine();
    let headers = client("1.2.3.4");

    for _ in 0..10 {
        assert!(engine.decide("postIssue", &headers).await.admitted);
    }
    assert!(!engine.decide("postIssue", &headers).await.admitted);

    // Same client, different endpoint: separate counter.
    assert!(engine.decide("getIssues", &headers).await.admitted);
}

#[tokio::test]
async fn get_issues_policy_enforced() {
    let (engine, _clock) = clocked_engine();
    let headers = client("1.2.3.4");

    for i in 1..=60 {
        let decision = engine.decide("getIssues", &headers).await;
        assert!(decision.admitted, "call {} should be admitted", i);
    }

    let decision = engine.decide("getIssues", &headers).await;
    assert!(!decision.admitted);
    assert_eq!(decision.retry_after_secs, Some(60));
}

#[tokio::test]
async fn unreachable_store_always_admits() {
    let engine = AdmissionEngine::new(
        Some(Arc::new(UnreachableStore)),
        default_policies(),
        Duration::from_millis(100),
    );
    let headers = client("1.2.3.4");

    for _ in 0..50 {
        let decision = engine.decide("postIssue", &headers).await;
        assert!(decision.admitted);
        assert_eq!(decision.retry_after_secs, None);
    }
}

#[tokio::test]
async fn unknown_endpoint_always_admits() {
    let (engine, _clock) = clocked_engine();
    let headers = client("1.2.3.4");

    for _ in 0..50 {
        assert!(engine.decide("putIssue", &headers).await.admitted);
    }
}

#[tokio::test]
async fn missing_address_headers_share_one_counter() {
    // Two header sets with no address headers both resolve to "unknown"
    // and consume the same quota. Expected behavior, not a defect.
    let clock = MockClock::new(Instant::now());
    let store = MemoryCounterStore::with_clock(Arc::new(clock.clone()));
    let policies = Arc::new(PolicyTable::new(vec![EndpointPolicy {
        endpoint: "postIssue".to_string(),
        max_requests: 2,
        window_secs: 60,
        block_secs: 300,
    }]));
    let engine = AdmissionEngine::new(
        Some(Arc::new(store)),
        policies,
        Duration::from_millis(100),
    );

    let first = HeaderMap::new();
    let second = HeaderMap::new();

    assert!(engine.decide("postIssue", &first).await.admitted);
    assert!(engine.decide("postIssue", &second).await.admitted);
    assert!(!engine.decide("postIssue", &first).await.admitted);
}

#[tokio::test]
async fn forwarded_for_clients_are_distinguished() {
    let (engine, _clock) = clocked_engine();

    let mut a = HeaderMap::new();
    a.insert(
        "x-forwarded-for",
        HeaderValue::from_static("1.2.3.4, 10.0.0.1"),
    );

    for _ in 0..10 {
        assert!(engine.decide("postIssue", &a).await.admitted);
    }
    assert!(!engine.decide("postIssue", &a).await.admitted);

    let mut b = HeaderMap::new();
    b.insert(
        "x-forwarded-for",
        HeaderValue::from_static("9.9.9.9, 10.0.0.1"),
    );
    assert!(engine.decide("postIssue", &b).await.admitted);
}
