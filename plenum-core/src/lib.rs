//! Plenum Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

pub mod analysis;
pub mod countries;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;

pub use analysis::{
    AnalysisEntry, AnalysisPayload, RecapAnalysis, SimilarTalk, TopicCluster, TopicClusters,
};
pub use countries::{
    continent_for, display_label, flag_glyph, resolve_country, Continent, CountryInfo,
};
pub use entities::{
    AuditLogEntry, AvailableScoreOption, Conference, Grant, GrantReimbursement,
    ReimbursementCategory, ReviewSession, ReviewTarget, Submission, UserReview,
};
pub use enums::{
    AuditAction, EntityType, Gender, GrantStatus, GrantType, InvalidEnumValue,
    ReviewSessionStatus, ReviewSessionType, SubmissionStatus,
};
pub use error::{
    AnalysisError, CacheError, ConfigError, PlenumError, PlenumResult, ReviewError, StorageError,
};
pub use identity::{
    new_entity_id, CategoryId, ConferenceId, EntityId, GrantId, ReimbursementId, ReviewId,
    ReviewSessionId, ScoreOptionId, SubmissionId, Timestamp, UserId,
};
