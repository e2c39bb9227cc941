//! API configuration.
//!
//! Loaded from environment variables with development-friendly defaults.

use plenum_review::AnalysisTtls;
use std::time::Duration;

/// Configuration for the admin API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind host (default "0.0.0.0").
    pub bind_host: String,

    /// Bind port (default 3000).
    pub bind_port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// TTL for a successful analysis payload.
    pub analysis_result_ttl: Duration,

    /// TTL for a failed analysis payload.
    pub analysis_error_ttl: Duration,

    /// Lease on the analysis computation lock.
    pub analysis_lock_ttl: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let ttls = AnalysisTtls::default();
        Self {
            bind_host: "0.0.0.0".to_string(),
            bind_port: 3000,
            cors_origins: Vec::new(), // Empty = allow all
            analysis_result_ttl: ttls.result,
            analysis_error_ttl: ttls.error,
            analysis_lock_ttl: ttls.lock,
        }
    }
}

fn env_secs(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PLENUM_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PLENUM_API_PORT` / `PORT`: Bind port (default: 3000)
    /// - `PLENUM_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `PLENUM_ANALYSIS_RESULT_TTL_SECS`: Success payload TTL (default: 86400)
    /// - `PLENUM_ANALYSIS_ERROR_TTL_SECS`: Error payload TTL (default: 120)
    /// - `PLENUM_ANALYSIS_LOCK_TTL_SECS`: Lock lease (default: 1800)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host =
            std::env::var("PLENUM_API_BIND").unwrap_or_else(|_| defaults.bind_host.clone());
        let bind_port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("PLENUM_API_PORT").ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.bind_port);

        let cors_origins = std::env::var("PLENUM_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            bind_host,
            bind_port,
            cors_origins,
            analysis_result_ttl: env_secs(
                "PLENUM_ANALYSIS_RESULT_TTL_SECS",
                defaults.analysis_result_ttl,
            ),
            analysis_error_ttl: env_secs(
                "PLENUM_ANALYSIS_ERROR_TTL_SECS",
                defaults.analysis_error_ttl,
            ),
            analysis_lock_ttl: env_secs(
                "PLENUM_ANALYSIS_LOCK_TTL_SECS",
                defaults.analysis_lock_ttl,
            ),
        }
    }

    /// Shorter TTLs for local iteration.
    pub fn development() -> Self {
        Self {
            analysis_result_ttl: Duration::from_secs(60 * 10),
            analysis_error_ttl: Duration::from_secs(10),
            analysis_lock_ttl: Duration::from_secs(60),
            ..Self::default()
        }
    }

    /// The analysis TTL bundle handed to the coordinator.
    pub fn analysis_ttls(&self) -> AnalysisTtls {
        AnalysisTtls {
            result: self.analysis_result_ttl,
            error: self.analysis_error_ttl,
            lock: self.analysis_lock_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_port, 3000);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.analysis_error_ttl, Duration::from_secs(120));
        assert_eq!(config.analysis_result_ttl, Duration::from_secs(86400));
    }

    #[test]
    fn test_ttl_bundle_matches_config() {
        let config = ApiConfig::development();
        let ttls = config.analysis_ttls();
        assert_eq!(ttls.error, Duration::from_secs(10));
        assert_eq!(ttls.result, Duration::from_secs(600));
        assert_eq!(ttls.lock, Duration::from_secs(60));
    }
}
