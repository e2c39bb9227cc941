//! Plenum API - admin HTTP surface for the review engine.

pub mod config;
pub mod demo;
pub mod error;
pub mod macros;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;
