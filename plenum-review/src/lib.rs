//! Plenum Review - the recap engine.
//!
//! Three cooperating pieces: polymorphic review adapters (shortlist
//! annotation, bulk decisions, next-item selection), pure grant statistics
//! aggregation, and the cache-locked background analysis coordinator.

pub mod adapters;
pub mod analysis;
pub mod similarity;
pub mod summary;
pub mod tasks;

pub use adapters::{
    AdapterRegistry, GrantsReviewAdapter, NextItemOptions, ProposalsReviewAdapter,
    RecapContext, RecapDecisionRequest, RecapExtra, RecapItem, RecapItemDetail, RecapOutcome,
    RecapScore, ReviewAdapter, ReviewHints, ReviewItemContext,
};
pub use analysis::{
    analysis_cache_key, analysis_lock_key, run_analysis, AnalysisCoordinator, AnalysisMetrics,
    AnalysisMetricsSnapshot, AnalysisTtls,
};
pub use similarity::{Analyzer, KeywordAnalyzer};
pub use summary::{
    grant_summary, CountryRow, FinancialSummary, GrantSummary, SpeakerStatus, StatusCounts,
};
pub use tasks::{new_task_id, TaskFuture, TaskId, TaskRunner, TokioTaskRunner};
