//! Error types for Plenum operations

use crate::enums::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type:?} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Cache backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend error: {reason}")]
    Backend { reason: String },

    #[error("Cached value for {key} is not decodable: {reason}")]
    Decode { key: String, reason: String },
}

/// Review engine errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("No review adapter registered for session type {session_type}")]
    UnregisteredSessionType { session_type: String },

    #[error("Session {session_id} is a {actual} session, expected {expected}")]
    SessionTypeMismatch {
        session_id: Uuid,
        expected: String,
        actual: String,
    },

    #[error("Unknown decision '{decision}' for a {session_type} session")]
    UnknownDecision {
        decision: String,
        session_type: String,
    },

    #[error("Decision references unknown item {item_id}")]
    UnknownItem { item_id: Uuid },

    #[error("Decision references unknown reimbursement category {category_id}")]
    UnknownCategory { category_id: Uuid },

    #[error("Score option {option_id} does not belong to session {session_id}")]
    ForeignScoreOption { option_id: Uuid, session_id: Uuid },
}

/// Background analysis errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Similarity computation failed: {reason}")]
    ComputationFailed { reason: String },

    #[error("Task dispatch failed: {reason}")]
    DispatchFailed { reason: String },

    #[error("Task runner could not report status for task {task_id}: {reason}")]
    StatusUnavailable { task_id: Uuid, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Plenum errors.
#[derive(Debug, Clone, Error)]
pub enum PlenumError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Plenum operations.
pub type PlenumResult<T> = Result<T, PlenumError>;

// =============================================================================
// TESTS
// =============================================================================
