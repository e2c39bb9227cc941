//! Plenum API Server Entry Point
//!
//! Bootstraps configuration, seeds the in-memory demo store, and starts the
//! Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use plenum_api::demo::seed_demo_data;
use plenum_api::telemetry::init_tracing;
use plenum_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};
use plenum_review::{AdapterRegistry, AnalysisCoordinator, KeywordAnalyzer, TokioTaskRunner};
use plenum_storage::{InMemoryCacheStore, InMemoryReviewStore};

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing();

    let config = ApiConfig::from_env();

    let store = Arc::new(InMemoryReviewStore::new());
    let demo = seed_demo_data(store.as_ref())?;
    tracing::info!(
        conference_id = %demo.conference_id,
        proposals_session_id = %demo.proposals_session_id,
        grants_session_id = %demo.grants_session_id,
        "Seeded demo data"
    );

    let coordinator = Arc::new(AnalysisCoordinator::new(
        store.clone(),
        Arc::new(InMemoryCacheStore::new()),
        Arc::new(TokioTaskRunner::new()),
        Arc::new(KeywordAnalyzer::default()),
        config.analysis_ttls(),
    ));

    let state = AppState {
        store,
        registry: Arc::new(AdapterRegistry::standard()),
        coordinator,
        start_time: Instant::now(),
    };
    let app = create_api_router(state, &config);

    let addr = resolve_bind_addr(&config)?;
    tracing::info!(%addr, "Starting Plenum API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr(config: &ApiConfig) -> ApiResult<SocketAddr> {
    let addr = format!("{}:{}", config.bind_host, config.bind_port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
