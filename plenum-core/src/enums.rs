//! Enum types for Plenum entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error when parsing an enum from its database string representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} value: {value}")]
pub struct InvalidEnumValue {
    pub kind: &'static str,
    pub value: String,
}

impl InvalidEnumValue {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// ENTITY DISCRIMINATOR
// ============================================================================

/// Entity type discriminator for polymorphic references and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Conference,
    ReviewSession,
    Submission,
    Grant,
    UserReview,
    ScoreOption,
    ReimbursementCategory,
    Reimbursement,
    AuditLogEntry,
}

// ============================================================================
// REVIEW SESSION ENUMS
// ============================================================================

/// Kind of entity a review session scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSessionType {
    /// Call-for-proposals submissions.
    Proposals,
    /// Financial-aid grant applications.
    Grants,
}

impl ReviewSessionType {
    pub const ALL: [ReviewSessionType; 2] = [ReviewSessionType::Proposals, ReviewSessionType::Grants];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ReviewSessionType::Proposals => "proposals",
            ReviewSessionType::Grants => "grants",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, InvalidEnumValue> {
        match s.to_lowercase().as_str() {
            "proposals" => Ok(ReviewSessionType::Proposals),
            "grants" => Ok(ReviewSessionType::Grants),
            _ => Err(InvalidEnumValue::new("review session type", s)),
        }
    }
}

impl fmt::Display for ReviewSessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for ReviewSessionType {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Lifecycle status of a review session.
///
/// Transitions are staff-driven: Draft -> Open -> Completed. The recap
/// shortlist only becomes visible once the session has left Draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSessionStatus {
    Draft,
    Open,
    Completed,
}

impl ReviewSessionStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ReviewSessionStatus::Draft => "draft",
            ReviewSessionStatus::Open => "open",
            ReviewSessionStatus::Completed => "completed",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, InvalidEnumValue> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ReviewSessionStatus::Draft),
            "open" => Ok(ReviewSessionStatus::Open),
            "completed" => Ok(ReviewSessionStatus::Completed),
            _ => Err(InvalidEnumValue::new("review session status", s)),
        }
    }
}

impl fmt::Display for ReviewSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

// ============================================================================
// SUBMISSION STATUS
// ============================================================================

/// Status of a call-for-proposals submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Proposed,
    Accepted,
    WaitingList,
    Rejected,
    Cancelled,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 5] = [
        SubmissionStatus::Proposed,
        SubmissionStatus::Accepted,
        SubmissionStatus::WaitingList,
        SubmissionStatus::Rejected,
        SubmissionStatus::Cancelled,
    ];

    /// Statuses a recap decision may move a submission into.
    pub const DECISIONS: [SubmissionStatus; 3] = [
        SubmissionStatus::Accepted,
        SubmissionStatus::WaitingList,
        SubmissionStatus::Rejected,
    ];

    pub fn as_db_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Proposed => "proposed",
            SubmissionStatus::Accepted => "accepted",
            SubmissionStatus::WaitingList => "waiting_list",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, InvalidEnumValue> {
        match s.to_lowercase().as_str() {
            "proposed" => Ok(SubmissionStatus::Proposed),
            "accepted" => Ok(SubmissionStatus::Accepted),
            "waiting_list" => Ok(SubmissionStatus::WaitingList),
            "rejected" => Ok(SubmissionStatus::Rejected),
            "cancelled" => Ok(SubmissionStatus::Cancelled),
            _ => Err(InvalidEnumValue::new("submission status", s)),
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// GRANT ENUMS
// ============================================================================

/// Status of a grant application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    Pending,
    Approved,
    WaitingList,
    WaitingListMaybe,
    WaitingForConfirmation,
    Confirmed,
    Rejected,
    Refused,
    DidNotAttend,
}

impl GrantStatus {
    pub const ALL: [GrantStatus; 9] = [
        GrantStatus::Pending,
        GrantStatus::Approved,
        GrantStatus::WaitingList,
        GrantStatus::WaitingListMaybe,
        GrantStatus::WaitingForConfirmation,
        GrantStatus::Confirmed,
        GrantStatus::Rejected,
        GrantStatus::Refused,
        GrantStatus::DidNotAttend,
    ];

    /// Statuses a recap decision may move a grant into.
    pub const DECISIONS: [GrantStatus; 4] = [
        GrantStatus::Approved,
        GrantStatus::WaitingList,
        GrantStatus::WaitingListMaybe,
        GrantStatus::Rejected,
    ];

    /// Statuses whose money counts toward the planned budget.
    pub const BUDGET: [GrantStatus; 3] = [
        GrantStatus::Approved,
        GrantStatus::WaitingForConfirmation,
        GrantStatus::Confirmed,
    ];

    /// Whether this status's attached amounts count toward the planned budget.
    pub fn counts_toward_budget(&self) -> bool {
        Self::BUDGET.contains(self)
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            GrantStatus::Pending => "pending",
            GrantStatus::Approved => "approved",
            GrantStatus::WaitingList => "waiting_list",
            GrantStatus::WaitingListMaybe => "waiting_list_maybe",
            GrantStatus::WaitingForConfirmation => "waiting_for_confirmation",
            GrantStatus::Confirmed => "confirmed",
            GrantStatus::Rejected => "rejected",
            GrantStatus::Refused => "refused",
            GrantStatus::DidNotAttend => "did_not_attend",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, InvalidEnumValue> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(GrantStatus::Pending),
            "approved" => Ok(GrantStatus::Approved),
            "waiting_list" => Ok(GrantStatus::WaitingList),
            "waiting_list_maybe" => Ok(GrantStatus::WaitingListMaybe),
            "waiting_for_confirmation" => Ok(GrantStatus::WaitingForConfirmation),
            "confirmed" => Ok(GrantStatus::Confirmed),
            "rejected" => Ok(GrantStatus::Rejected),
            "refused" => Ok(GrantStatus::Refused),
            "did_not_attend" => Ok(GrantStatus::DidNotAttend),
            _ => Err(InvalidEnumValue::new("grant status", s)),
        }
    }
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for GrantStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// What an approved grant covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    TicketOnly,
    TicketHotel,
    TicketTravel,
    TicketHotelTravel,
}

impl GrantType {
    pub const ALL: [GrantType; 4] = [
        GrantType::TicketOnly,
        GrantType::TicketHotel,
        GrantType::TicketTravel,
        GrantType::TicketHotelTravel,
    ];

    pub fn as_db_str(&self) -> &'static str {
        match self {
            GrantType::TicketOnly => "ticket_only",
            GrantType::TicketHotel => "ticket_hotel",
            GrantType::TicketTravel => "ticket_travel",
            GrantType::TicketHotelTravel => "ticket_hotel_travel",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Self-reported gender of a grant applicant, used only for recap statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl Gender {
    pub const ALL: [Gender; 4] = [
        Gender::Male,
        Gender::Female,
        Gender::Other,
        Gender::PreferNotToSay,
    ];

    pub fn as_db_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::PreferNotToSay => "prefer_not_to_say",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

// ============================================================================
// AUDIT ACTIONS
// ============================================================================

/// Action recorded in the conference audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ReimbursementCreated,
    ReimbursementUpdated,
    ReimbursementDeleted,
    PendingStatusSet,
    PendingStatusCleared,
    InternalNotesUpdated,
}

impl AuditAction {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AuditAction::ReimbursementCreated => "reimbursement_created",
            AuditAction::ReimbursementUpdated => "reimbursement_updated",
            AuditAction::ReimbursementDeleted => "reimbursement_deleted",
            AuditAction::PendingStatusSet => "pending_status_set",
            AuditAction::PendingStatusCleared => "pending_status_cleared",
            AuditAction::InternalNotesUpdated => "internal_notes_updated",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}
