//! Domain entities for the Plenum review engine.
//!
//! Pure data structures with no behavior beyond trivial accessors. Persistence
//! lives behind the `ReviewStore` trait in plenum-storage; these types carry
//! no storage concerns.

use crate::enums::{
    AuditAction, Gender, GrantStatus, GrantType, ReviewSessionStatus, ReviewSessionType,
    SubmissionStatus,
};
use crate::identity::{
    CategoryId, ConferenceId, EntityId, GrantId, ReimbursementId, ReviewId, ReviewSessionId,
    ScoreOptionId, SubmissionId, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CONFERENCE
// ============================================================================

/// A conference edition. Owned by the surrounding system; plenum only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conference {
    pub conference_id: ConferenceId,
    /// Short code, e.g. "pycon12".
    pub code: String,
    pub name: String,
    pub created_at: Timestamp,
}

// ============================================================================
// REVIEW SESSION
// ============================================================================

/// A bounded round of scoring activity over one kind of reviewable entity
/// for one conference.
///
/// The session type is immutable once items have been reviewed; that
/// invariant is enforced by the surrounding admin, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSession {
    pub review_session_id: ReviewSessionId,
    pub conference_id: ConferenceId,
    pub session_type: ReviewSessionType,
    pub status: ReviewSessionStatus,
    pub created_at: Timestamp,
}

impl ReviewSession {
    /// Whether the recap shortlist is visible for this session.
    ///
    /// Draft sessions are a soft "not ready" state, not an error.
    pub fn recap_visible(&self) -> bool {
        !matches!(self.status, ReviewSessionStatus::Draft)
    }
}

impl fmt::Display for ReviewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} review session ({})",
            self.session_type, self.review_session_id
        )
    }
}

// ============================================================================
// REVIEWABLE ITEMS
// ============================================================================

/// A call-for-proposals submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub submission_id: SubmissionId,
    pub conference_id: ConferenceId,
    pub speaker_id: UserId,
    pub title: String,
    /// Talk, workshop, panel... free-form, defined by the conference.
    pub submission_type: String,
    pub audience_level: Option<String>,
    pub tags: Vec<String>,
    pub status: SubmissionStatus,
    /// Staged status change awaiting a separate confirmation step.
    pub pending_status: Option<SubmissionStatus>,
    pub created_at: Timestamp,
}

/// A financial-aid grant application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub grant_id: GrantId,
    pub conference_id: ConferenceId,
    pub user_id: UserId,
    /// Applicant full name as entered on the application.
    pub name: String,
    pub status: GrantStatus,
    /// Staged status change awaiting a separate confirmation step.
    pub pending_status: Option<GrantStatus>,
    pub approved_type: Option<GrantType>,
    /// ISO 3166-1 alpha-2 country code the applicant travels from.
    pub country_code: Option<String>,
    pub gender: Option<Gender>,
    pub occupation: Option<String>,
    /// Staff-only notes, editable from the recap independently of decisions.
    pub internal_notes: String,
    pub created_at: Timestamp,
}

// ============================================================================
// REVIEWS AND SCORES
// ============================================================================

/// Which reviewable item a review points at.
///
/// Tagged union replacing the dual nullable foreign keys of the original
/// schema; the adapter's `review_target` method is the polymorphism seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReviewTarget {
    Proposal(SubmissionId),
    Grant(GrantId),
}

impl ReviewTarget {
    /// Id of the targeted item, regardless of kind.
    pub fn item_id(&self) -> EntityId {
        match self {
            ReviewTarget::Proposal(id) => *id,
            ReviewTarget::Grant(id) => *id,
        }
    }

    pub fn session_type(&self) -> ReviewSessionType {
        match self {
            ReviewTarget::Proposal(_) => ReviewSessionType::Proposals,
            ReviewTarget::Grant(_) => ReviewSessionType::Grants,
        }
    }
}

/// One reviewer's evaluation of one item within one review session.
///
/// At most one per (reviewer, target, session); the store upserts on that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserReview {
    pub review_id: ReviewId,
    pub review_session_id: ReviewSessionId,
    pub reviewer_id: UserId,
    pub target: ReviewTarget,
    pub score_option_id: ScoreOptionId,
    pub comment: Option<String>,
    pub private_comment: Option<String>,
    pub created_at: Timestamp,
}

/// One permissible score for a session, e.g. 0..=3.
///
/// Options are ranked descending by numeric value for recap display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableScoreOption {
    pub option_id: ScoreOptionId,
    pub review_session_id: ReviewSessionId,
    pub numeric_value: i32,
    pub label: String,
}

// ============================================================================
// REIMBURSEMENTS
// ============================================================================

/// A category of reimbursable cost (ticket, travel, hotel...) with a cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReimbursementCategory {
    pub category_id: CategoryId,
    pub conference_id: ConferenceId,
    pub name: String,
    /// Cap in integer cents; recap approval grants the full cap.
    pub max_amount_cents: i64,
}

/// Money attached to an approved grant for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantReimbursement {
    pub reimbursement_id: ReimbursementId,
    pub grant_id: GrantId,
    pub category_id: CategoryId,
    pub granted_amount_cents: i64,
    pub created_at: Timestamp,
}

// ============================================================================
// AUDIT LOG
// ============================================================================

/// One audit trail row. Written on reimbursement and pending-status mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub entry_id: EntityId,
    pub conference_id: ConferenceId,
    pub action: AuditAction,
    /// Entity the action applies to (grant, submission or reimbursement id).
    pub subject_id: EntityId,
    pub detail: String,
    pub created_at: Timestamp,
}
