//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use plenum_review::{AdapterRegistry, AnalysisCoordinator};
use plenum_storage::ReviewStore;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Domain store. In-memory in development; a database-backed
    /// implementation plugs in behind the same trait.
    pub store: Arc<dyn ReviewStore>,
    /// Closed adapter registry (proposals, grants).
    pub registry: Arc<AdapterRegistry>,
    /// Analysis cache/lock orchestration.
    pub coordinator: Arc<AnalysisCoordinator>,
    pub start_time: Instant,
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(Arc<dyn ReviewStore>, store);
crate::impl_from_ref!(Arc<AdapterRegistry>, registry);
crate::impl_from_ref!(Arc<AnalysisCoordinator>, coordinator);
crate::impl_from_ref!(Instant, start_time);
