pub mod config;
pub mod error;
pub mod issues;
pub mod rate_limit;

use crate::config::IntakeConfig;
use crate::error::{IntakeError, Result};
use crate::issues::{list_issues, submit_issue, IssueRepository, MemoryIssueRepository};
use crate::rate_limit::{
    rate_limit_middleware, AdmissionEngine, CounterStore, MemoryCounterStore, PolicyTable,
    RedisCounterStore,
};
use axum::{
    http::{header, Method, Uri},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Admission decision engine gating the intake endpoints
    pub engine: Arc<AdmissionEngine>,
    /// Issue persistence boundary
    pub repository: Arc<dyn IssueRepository>,
}

/// Build the axum application.
///
/// `request_timeout` bounds the whole request, including the repository
/// call; requests that exceed it get a 408.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    // The intake form is served from a static origin, so the API answers
    // cross-origin GET/POST from anywhere.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/issues", get(list_issues).post(submit_issue))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .fallback(not_found)
        .layer(cors)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> IntakeError {
    IntakeError::NotFound(uri.path().to_string())
}

/// Build the counter store described by the configuration.
///
/// Returns `None` when enforcement is off or the backend cannot be reached
/// at startup; the engine fails open in both cases.
pub async fn build_counter_store(config: &IntakeConfig) -> Option<Arc<dyn CounterStore>> {
    let settings = &config.rate_limiting;

    if !settings.enabled {
        warn!("rate limiting disabled by configuration");
        return None;
    }

    let Some(redis) = &settings.redis else {
        info!("no redis configured, using in-process counter store");
        return Some(Arc::new(MemoryCounterStore::new()));
    };

    match RedisCounterStore::new(&redis.url).await {
        Ok(store) => {
            if let Err(e) = store.ping().await {
                // The connection manager reconnects on its own; runtime
                // failures fail open per the engine contract.
                warn!(error = %e, "redis ping failed, store calls will fail open until it recovers");
            } else {
                info!("redis counter store connected");
            }
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!(error = %e, "could not reach redis, running without rate limit enforcement");
            None
        }
    }
}

/// Initialize and run the intake service
pub async fn init_service(config: IntakeConfig) -> Result<()> {
    config.validate()?;

    info!("Starting issue intake service");
    info!(
        "Server listening on {}:{}",
        config.server.host, config.server.port
    );

    let store = build_counter_store(&config).await;
    let policies = Arc::new(PolicyTable::new(config.rate_limiting.policies.clone()));
    info!("Loaded {} rate limit policies", policies.len());

    let engine = AdmissionEngine::new(
        store,
        policies,
        Duration::from_millis(config.rate_limiting.store_op_timeout_ms),
    );

    let state = AppState {
        engine: Arc::new(engine),
        repository: Arc::new(MemoryIssueRepository::new()),
    };

    let app = build_app(state, Duration::from_secs(config.server.timeout_secs));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(IntakeError::Io)?;

    info!("Intake service ready to accept connections");

    axum::serve(listener, app)
        .await
        .map_err(|e| IntakeError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

/// Initialize tracing/logging
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "issue_intake=debug,tower_http=debug".into()),
        )
        .with_target(false)
        .compact()
        .init();
}
