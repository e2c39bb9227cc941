//! Recap analysis orchestration.
//!
//! The expensive similarity/clustering computation never runs on the request
//! path. A request either returns a cached payload or acquires the cache lock
//! (atomic add-if-absent) and dispatches one background task; concurrent
//! requests for the same key observe the lock and return `processing` without
//! dispatching. A lock whose task is no longer running is stale and gets
//! reclaimed. Success payloads live long (24 h); error payloads live short
//! (2 min) so failures are never as sticky as successes.

use plenum_core::{
    AnalysisEntry, AnalysisPayload, CacheError, ConferenceId, PlenumResult, RecapAnalysis,
    ReviewSessionType,
};
use plenum_storage::{CacheStore, ReviewStore};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::similarity::Analyzer;
use crate::tasks::{new_task_id, TaskId, TaskRunner};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// TTLs governing the analysis cache entries.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisTtls {
    /// How long a successful result stays cached (default: 24 hours).
    pub result: Duration,
    /// How long an error payload stays cached (default: 2 minutes). Short so
    /// a failed computation is retried soon instead of sticking for a day.
    pub error: Duration,
    /// Lease on the computation lock (default: 30 minutes). Backstop against
    /// a hung task the runner never reports as finished.
    pub lock: Duration,
}

impl Default for AnalysisTtls {
    fn default() -> Self {
        Self {
            result: Duration::from_secs(24 * 60 * 60),
            error: Duration::from_secs(2 * 60),
            lock: Duration::from_secs(30 * 60),
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters for analysis orchestration. Exposed in logs and the state
/// endpoint; no external metrics backend is assumed.
#[derive(Debug, Default)]
pub struct AnalysisMetrics {
    pub dispatched: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
    pub stale_reclaimed: AtomicU64,
    pub duplicates_suppressed: AtomicU64,
}

impl AnalysisMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> AnalysisMetricsSnapshot {
        AnalysisMetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            stale_reclaimed: self.stale_reclaimed.load(Ordering::Relaxed),
            duplicates_suppressed: self.duplicates_suppressed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct AnalysisMetricsSnapshot {
    pub dispatched: u64,
    pub completed: u64,
    pub failed: u64,
    pub stale_reclaimed: u64,
    pub duplicates_suppressed: u64,
}

// ============================================================================
// COORDINATOR
// ============================================================================

/// Key of the cached analysis payload for one (conference, session kind).
pub fn analysis_cache_key(conference_id: ConferenceId, session_type: ReviewSessionType) -> String {
    format!("recap_analysis:conf_{}:{}", conference_id, session_type)
}

/// Key of the computation lock guarding one cache key.
pub fn analysis_lock_key(cache_key: &str) -> String {
    format!("{}:computing", cache_key)
}

/// Orchestrates the analysis cache state machine.
///
/// All collaborators come in as trait objects; nothing here owns a hidden
/// singleton, so tests can substitute any of them.
pub struct AnalysisCoordinator {
    store: Arc<dyn ReviewStore>,
    cache: Arc<dyn CacheStore>,
    runner: Arc<dyn TaskRunner>,
    analyzer: Arc<dyn Analyzer>,
    ttls: AnalysisTtls,
    metrics: Arc<AnalysisMetrics>,
}

impl AnalysisCoordinator {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        cache: Arc<dyn CacheStore>,
        runner: Arc<dyn TaskRunner>,
        analyzer: Arc<dyn Analyzer>,
        ttls: AnalysisTtls,
    ) -> Self {
        Self {
            store,
            cache,
            runner,
            analyzer,
            ttls,
            metrics: Arc::new(AnalysisMetrics::new()),
        }
    }

    pub fn metrics(&self) -> AnalysisMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Check-only request: read-only, never dispatches work.
    ///
    /// Distinguishes "nothing started" (`empty`) from "in progress"
    /// (`processing`) so a polling client never triggers duplicates.
    pub async fn check(
        &self,
        conference_id: ConferenceId,
        session_type: ReviewSessionType,
    ) -> PlenumResult<AnalysisPayload> {
        let key = analysis_cache_key(conference_id, session_type);
        if let Some(value) = self.cache.get(&key).await? {
            return decode_payload(&key, value);
        }
        if self.cache.get(&analysis_lock_key(&key)).await?.is_some() {
            return Ok(AnalysisPayload::Processing);
        }
        Ok(AnalysisPayload::Empty)
    }

    /// Compute-or-fetch request: returns a cached payload when one exists
    /// (unless `recompute`), otherwise dispatches at most one background
    /// computation and returns `processing`.
    pub async fn fetch_or_compute(
        &self,
        conference_id: ConferenceId,
        session_type: ReviewSessionType,
        recompute: bool,
    ) -> PlenumResult<AnalysisPayload> {
        let key = analysis_cache_key(conference_id, session_type);
        if !recompute {
            if let Some(value) = self.cache.get(&key).await? {
                return decode_payload(&key, value);
            }
        }

        let lock_key = analysis_lock_key(&key);
        // Two attempts: the second one only fires after reclaiming a stale
        // lock; losing that race to another reclaimer is fine, the winner
        // dispatches and we report processing either way.
        for _ in 0..2 {
            let task_id = new_task_id();
            if self
                .cache
                .add(&lock_key, Value::String(task_id.to_string()), self.ttls.lock)
                .await?
            {
                self.metrics.dispatched.fetch_add(1, Ordering::Relaxed);
                self.runner.notify_pending();
                let work = run_analysis(
                    Arc::clone(&self.store),
                    Arc::clone(&self.cache),
                    Arc::clone(&self.analyzer),
                    self.ttls,
                    Arc::clone(&self.metrics),
                    conference_id,
                    session_type,
                );
                self.runner
                    .dispatch(task_id, "recap-analysis", Box::pin(work))
                    .await?;
                tracing::info!(
                    %conference_id,
                    session_type = %session_type,
                    %task_id,
                    "Dispatched recap analysis"
                );
                return Ok(AnalysisPayload::Processing);
            }

            // Lock held by someone else: probe the holder's liveness.
            let Some(holder) = self.cache.get(&lock_key).await? else {
                // Holder vanished between add and get; retry the acquisition.
                continue;
            };
            let Some(holder_task) = holder.as_str().and_then(|s| s.parse::<TaskId>().ok()) else {
                // Unreadable lock value: conservatively treat it as held.
                self.metrics
                    .duplicates_suppressed
                    .fetch_add(1, Ordering::Relaxed);
                return Ok(AnalysisPayload::Processing);
            };

            match self.runner.is_finished(holder_task).await {
                Ok(true) => {
                    // The holder finished but left its lock behind (crash
                    // between caching and cleanup). If it actually produced a
                    // result in the meantime, prefer that.
                    if !recompute {
                        if let Some(value) = self.cache.get(&key).await? {
                            return decode_payload(&key, value);
                        }
                    }
                    self.cache.delete(&lock_key).await?;
                    self.metrics.stale_reclaimed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(%holder_task, "Reclaimed stale analysis lock");
                }
                // Still running, or liveness unknown: do not reclaim, do not
                // dispatch a duplicate.
                Ok(false) | Err(_) => {
                    self.metrics
                        .duplicates_suppressed
                        .fetch_add(1, Ordering::Relaxed);
                    return Ok(AnalysisPayload::Processing);
                }
            }
        }
        Ok(AnalysisPayload::Processing)
    }
}

fn decode_payload(key: &str, value: Value) -> PlenumResult<AnalysisPayload> {
    serde_json::from_value(value).map_err(|e| {
        CacheError::Decode {
            key: key.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// The background computation body.
///
/// A deleted conference is a benign no-op: clean up the lock and return
/// without caching anything. A failed computation caches a short-TTL error
/// payload and re-raises so the task runner's own observability still fires.
pub async fn run_analysis(
    store: Arc<dyn ReviewStore>,
    cache: Arc<dyn CacheStore>,
    analyzer: Arc<dyn Analyzer>,
    ttls: AnalysisTtls,
    metrics: Arc<AnalysisMetrics>,
    conference_id: ConferenceId,
    session_type: ReviewSessionType,
) -> PlenumResult<()> {
    let key = analysis_cache_key(conference_id, session_type);
    let lock_key = analysis_lock_key(&key);

    if store.conference_get(conference_id)?.is_none() {
        tracing::info!(%conference_id, "Conference gone before analysis ran, giving up");
        cache.delete(&lock_key).await?;
        return Ok(());
    }

    let started = Instant::now();
    let result = compute_analysis(store.as_ref(), analyzer.as_ref(), conference_id).await;

    match result {
        Ok(analysis) => {
            let payload = encode_payload(&AnalysisPayload::Ready { analysis })?;
            cache.set(&key, payload, ttls.result).await?;
            cache.delete(&lock_key).await?;
            metrics.completed.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                %conference_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Recap analysis completed"
            );
            Ok(())
        }
        Err(error) => {
            let payload = encode_payload(&AnalysisPayload::Error {
                message: format!("analysis failed: {}", error),
            })?;
            cache.set(&key, payload, ttls.error).await?;
            cache.delete(&lock_key).await?;
            metrics.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(%conference_id, %error, "Recap analysis failed");
            Err(error)
        }
    }
}

async fn compute_analysis(
    store: &dyn ReviewStore,
    analyzer: &dyn Analyzer,
    conference_id: ConferenceId,
) -> PlenumResult<RecapAnalysis> {
    let submissions = store.submissions_by_conference(conference_id)?;
    let mut similar = analyzer.similar_talks(&submissions).await?;
    let topic_clusters = analyzer.topic_clusters(&submissions).await?;

    let submissions_list = submissions
        .into_iter()
        .map(|s| AnalysisEntry {
            similar: similar.remove(&s.submission_id).unwrap_or_default(),
            submission_id: s.submission_id,
            title: s.title,
            submission_type: s.submission_type,
            // Accounts live in a separate service; the id is the best
            // identity available here.
            speaker: s.speaker_id.to_string(),
        })
        .collect();

    Ok(RecapAnalysis {
        submissions_list,
        topic_clusters,
    })
}

fn encode_payload(payload: &AnalysisPayload) -> PlenumResult<Value> {
    serde_json::to_value(payload).map_err(|e| {
        CacheError::Backend {
            reason: format!("payload not serializable: {}", e),
        }
        .into()
    })
}
