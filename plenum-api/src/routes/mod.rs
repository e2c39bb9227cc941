//! Route handlers and router assembly.

pub mod health;
pub mod recap;
pub mod review;
pub mod summary;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::state::AppState;

/// Build the admin API router.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = if config.cors_origins.is_empty() {
        // Dev mode: allow all
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "Ignoring unparsable CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    Router::new()
        .route("/health", get(health::health))
        .route("/internal/analysis-metrics", get(health::analysis_metrics))
        .route(
            "/admin/review-sessions/:session_id/recap",
            get(recap::get_recap).post(recap::post_recap),
        )
        .route(
            "/admin/review-sessions/:session_id/recap/analysis",
            get(recap::get_analysis),
        )
        .route(
            "/admin/review-sessions/:session_id/items/:item_id",
            get(review::get_review_context).post(review::post_review),
        )
        .route(
            "/admin/review-sessions/:session_id/next",
            get(review::get_next_item),
        )
        .route(
            "/admin/conferences/:conference_id/grants/summary",
            get(summary::get_grant_summary),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
