//! Plenum Test Utilities
//!
//! Centralized test infrastructure for the Plenum workspace:
//! - Entity fixtures for common review scenarios
//! - A recording task runner that captures dispatches without executing them
//! - A failing analyzer for error-path tests
//! - Convenience re-exports of core types

pub use plenum_core::{
    new_entity_id, AnalysisPayload, AuditAction, AvailableScoreOption, Conference, ConferenceId,
    Gender, Grant, GrantId, GrantReimbursement, GrantStatus, GrantType, PlenumError,
    PlenumResult, ReimbursementCategory, ReviewSession, ReviewSessionId, ReviewSessionStatus,
    ReviewSessionType, ReviewTarget, Submission, SubmissionId, SubmissionStatus, UserId,
    UserReview,
};
pub use plenum_storage::{InMemoryCacheStore, InMemoryReviewStore, ReviewStore};

use async_trait::async_trait;
use plenum_core::{AnalysisError, SimilarTalk, TopicClusters};
use plenum_review::similarity::Analyzer;
use plenum_review::tasks::{TaskFuture, TaskId, TaskRunner};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

// ============================================================================
// FIXTURES
// ============================================================================

/// A conference with a stable code.
pub fn conference() -> Conference {
    Conference {
        conference_id: new_entity_id(),
        code: "plenumconf1".to_string(),
        name: "PlenumConf, first edition".to_string(),
        created_at: chrono::Utc::now(),
    }
}

pub fn review_session(
    conference: &Conference,
    session_type: ReviewSessionType,
    status: ReviewSessionStatus,
) -> ReviewSession {
    ReviewSession {
        review_session_id: new_entity_id(),
        conference_id: conference.conference_id,
        session_type,
        status,
        created_at: chrono::Utc::now(),
    }
}

pub fn submission(
    conference: &Conference,
    speaker_id: UserId,
    title: &str,
    tags: &[&str],
) -> Submission {
    Submission {
        submission_id: new_entity_id(),
        conference_id: conference.conference_id,
        speaker_id,
        title: title.to_string(),
        submission_type: "talk".to_string(),
        audience_level: Some("intermediate".to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        status: SubmissionStatus::Proposed,
        pending_status: None,
        created_at: chrono::Utc::now(),
    }
}

pub fn grant(conference: &Conference, name: &str, country_code: Option<&str>) -> Grant {
    Grant {
        grant_id: new_entity_id(),
        conference_id: conference.conference_id,
        user_id: new_entity_id(),
        name: name.to_string(),
        status: GrantStatus::Pending,
        pending_status: None,
        approved_type: None,
        country_code: country_code.map(|c| c.to_string()),
        gender: None,
        occupation: Some("developer".to_string()),
        internal_notes: String::new(),
        created_at: chrono::Utc::now(),
    }
}

pub fn reimbursement_category(
    conference: &Conference,
    name: &str,
    max_amount_cents: i64,
) -> ReimbursementCategory {
    ReimbursementCategory {
        category_id: new_entity_id(),
        conference_id: conference.conference_id,
        name: name.to_string(),
        max_amount_cents,
    }
}

/// Score options 0..=max for a session; the caller inserts them.
pub fn score_scale(session: &ReviewSession, max: i32) -> Vec<AvailableScoreOption> {
    (0..=max)
        .map(|value| AvailableScoreOption {
            option_id: new_entity_id(),
            review_session_id: session.review_session_id,
            numeric_value: value,
            label: format!("{}", value),
        })
        .collect()
}

pub fn review(
    session: &ReviewSession,
    reviewer_id: UserId,
    target: ReviewTarget,
    option: &AvailableScoreOption,
) -> UserReview {
    UserReview {
        review_id: new_entity_id(),
        review_session_id: session.review_session_id,
        reviewer_id,
        target,
        score_option_id: option.option_id,
        comment: None,
        private_comment: None,
        created_at: chrono::Utc::now(),
    }
}

/// Deterministic RNG for selection tests.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

// ============================================================================
// TASK RUNNER DOUBLE
// ============================================================================

/// Task runner that records dispatches without executing them.
///
/// The captured future is dropped, which models a computation that is "in
/// flight" forever - exactly what lock-exclusivity tests need. Liveness
/// answers are scriptable per task id, with a configurable default.
#[derive(Default)]
pub struct RecordingTaskRunner {
    dispatched: Mutex<Vec<TaskId>>,
    finished: Mutex<HashMap<TaskId, bool>>,
    default_finished: AtomicBool,
    fail_status_lookups: AtomicBool,
    pending_signals: AtomicU64,
}

impl RecordingTaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatched.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn dispatched_ids(&self) -> Vec<TaskId> {
        self.dispatched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn pending_signals(&self) -> u64 {
        self.pending_signals.load(Ordering::Relaxed)
    }

    /// Script the liveness answer for one task.
    pub fn mark_finished(&self, task_id: TaskId, finished: bool) {
        self.finished
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(task_id, finished);
    }

    /// Liveness answer for tasks with no scripted value.
    pub fn set_default_finished(&self, finished: bool) {
        self.default_finished.store(finished, Ordering::Relaxed);
    }

    /// Make every liveness lookup fail, modeling a broken task-queue API.
    pub fn fail_status_lookups(&self, fail: bool) {
        self.fail_status_lookups.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl TaskRunner for RecordingTaskRunner {
    async fn dispatch(&self, task_id: TaskId, _label: &str, _work: TaskFuture) -> PlenumResult<()> {
        self.dispatched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(task_id);
        Ok(())
    }

    async fn is_finished(&self, task_id: TaskId) -> PlenumResult<bool> {
        if self.fail_status_lookups.load(Ordering::Relaxed) {
            return Err(AnalysisError::StatusUnavailable {
                task_id,
                reason: "scripted lookup failure".to_string(),
            }
            .into());
        }
        Ok(self
            .finished
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&task_id)
            .copied()
            .unwrap_or_else(|| self.default_finished.load(Ordering::Relaxed)))
    }

    fn notify_pending(&self) {
        self.pending_signals.fetch_add(1, Ordering::Relaxed);
    }
}

// ============================================================================
// ANALYZER DOUBLE
// ============================================================================

/// Analyzer that always fails, for error-path and TTL-asymmetry tests.
#[derive(Debug, Clone, Default)]
pub struct FailingAnalyzer;

#[async_trait]
impl Analyzer for FailingAnalyzer {
    async fn similar_talks(
        &self,
        _submissions: &[Submission],
    ) -> PlenumResult<HashMap<SubmissionId, Vec<SimilarTalk>>> {
        Err(AnalysisError::ComputationFailed {
            reason: "scripted failure".to_string(),
        }
        .into())
    }

    async fn topic_clusters(&self, _submissions: &[Submission]) -> PlenumResult<TopicClusters> {
        Err(AnalysisError::ComputationFailed {
            reason: "scripted failure".to_string(),
        }
        .into())
    }
}
