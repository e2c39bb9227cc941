//! Identity types for Plenum entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Conference identifier.
pub type ConferenceId = EntityId;

/// Review session identifier.
pub type ReviewSessionId = EntityId;

/// Submission (proposal) identifier.
pub type SubmissionId = EntityId;

/// Grant application identifier.
pub type GrantId = EntityId;

/// User/account identifier (reviewers, speakers, applicants).
pub type UserId = EntityId;

/// Single-review identifier.
pub type ReviewId = EntityId;

/// Score option identifier.
pub type ScoreOptionId = EntityId;

/// Reimbursement category identifier.
pub type CategoryId = EntityId;

/// Reimbursement row identifier.
pub type ReimbursementId = EntityId;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}
