use axum::http::{HeaderMap, HeaderValue};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use issue_intake::config::IntakeConfig;
use issue_intake::rate_limit::{resolve_client, AdmissionEngine, MemoryCounterStore, PolicyTable};
use std::sync::Arc;
use std::time::Duration;

fn client_headers(ip: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("cf-connecting-ip", HeaderValue::from_str(ip).unwrap());
    headers
}

fn benchmark_identity_resolution(c: &mut Criterion) {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_static("1.2.3.4, 10.0.0.1, 10.0.0.2"),
    );

    c.bench_function("identity_forwarded_for", |b| {
        b.iter(|| black_box(resolve_client(&headers)))
    });
}

fn benchmark_admission_decide(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");

    let policies = IntakeConfig::default_config().rate_limiting.policies;
    let engine = AdmissionEngine::new(
        Some(Arc::new(MemoryCounterStore::new())),
        Arc::new(PolicyTable::new(policies)),
        Duration::from_millis(500),
    );
    let headers = client_headers("1.2.3.4");

    // getIssues admits 60 per window, far more than criterion's sample
    // count spends within a single iteration batch.
    c.bench_function("admission_decide_memory_store", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(engine.decide("getIssues", &headers).await) })
    });
}

fn benchmark_unknown_endpoint(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");

    let policies = IntakeConfig::default_config().rate_limiting.policies;
    let engine = AdmissionEngine::new(
        Some(Arc::new(MemoryCounterStore::new())),
        Arc::new(PolicyTable::new(policies)),
        Duration::from_millis(500),
    );
    let headers = client_headers("1.2.3.4");

    c.bench_function("admission_decide_unknown_endpoint", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(engine.decide("unguarded", &headers).await) })
    });
}

criterion_group!(
    benches,
    benchmark_identity_resolution,
    benchmark_admission_decide,
    benchmark_unknown_endpoint
);
criterion_main!(benches);
