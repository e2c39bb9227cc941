//! Polymorphic review adapters.
//!
//! One adapter per reviewable entity kind (proposals, grants). Each produces
//! the annotated recap shortlist, applies bulk decisions, renders per-item
//! review context and picks the next item for a reviewer. Dispatch goes
//! through `AdapterRegistry`, a closed map keyed by session type that fails
//! loudly on an unregistered kind - a new session type without an adapter is
//! a programming error, not a runtime condition to swallow.

mod grants;
mod proposals;

pub use grants::GrantsReviewAdapter;
pub use proposals::ProposalsReviewAdapter;

use plenum_core::{
    AvailableScoreOption, CategoryId, EntityId, Grant, GrantStatus, PlenumResult,
    ReimbursementCategory, ReviewError, ReviewSession, ReviewSessionId, ReviewSessionType,
    ReviewTarget, Submission, SubmissionId, SubmissionStatus, UserId, UserReview,
};
use plenum_storage::ReviewStore;
use rand::seq::IndexedRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// RECAP TYPES
// ============================================================================

/// Aggregated score of one item across a session's reviews.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RecapScore {
    /// Mean of the numeric scores; None when the item has no reviews.
    pub mean: Option<f64>,
    /// Population standard deviation; None when the item has no reviews.
    pub stddev: Option<f64>,
    pub vote_count: usize,
}

/// One annotated row of the recap shortlist.
#[derive(Debug, Clone, Serialize)]
pub struct RecapItem {
    pub item_id: EntityId,
    pub title: String,
    /// Speaker or applicant identity.
    pub owner_id: UserId,
    pub score: RecapScore,
    pub detail: RecapItemDetail,
}

/// Kind-specific recap annotations.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecapItemDetail {
    Proposal {
        status: SubmissionStatus,
        pending_status: Option<SubmissionStatus>,
        submission_type: String,
        tags: Vec<String>,
        audience_level: Option<String>,
    },
    Grant {
        status: GrantStatus,
        pending_status: Option<GrantStatus>,
        country_code: Option<String>,
        country_label: Option<String>,
        has_sent_a_proposal: bool,
        proposals_ids: Vec<SubmissionId>,
        approved_category_ids: Vec<CategoryId>,
        internal_notes: String,
    },
}

/// Everything the recap page needs for one session.
#[derive(Debug, Clone, Serialize)]
pub struct RecapContext {
    pub session_id: ReviewSessionId,
    pub session_label: String,
    pub session_type: ReviewSessionType,
    /// Decision strings accepted by a recap POST for this session.
    pub valid_decisions: Vec<String>,
    /// Score options, ranked descending.
    pub score_options: Vec<AvailableScoreOption>,
    pub items: Vec<RecapItem>,
    pub extra: RecapExtra,
}

/// Kind-specific recap lookups.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecapExtra {
    Proposals {
        /// Grant status per speaker, for the "has financial aid" column.
        grants_by_user: HashMap<UserId, GrantStatus>,
    },
    Grants {
        categories: Vec<ReimbursementCategory>,
        /// Competing submissions per applicant, prefetched for display.
        submissions_by_user: HashMap<UserId, Vec<SubmissionId>>,
    },
}

/// One typed decision from a recap POST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecapDecisionRequest {
    pub item_id: EntityId,
    /// Target status as a db string; None leaves the item's status untouched.
    #[serde(default)]
    pub decision: Option<String>,
    /// Grants only: categories to reimburse when the decision is approved.
    #[serde(default)]
    pub reimbursement_category_ids: Vec<CategoryId>,
    /// Grants only: new internal notes, applied independently of decisions.
    #[serde(default)]
    pub notes: Option<String>,
}

/// What a recap POST ended up doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecapOutcome {
    pub pending_set: usize,
    pub pending_cleared: usize,
    pub reimbursements_created: usize,
    pub reimbursements_updated: usize,
    pub reimbursements_deleted: usize,
    pub notes_updated: usize,
}

// ============================================================================
// REVIEW CONTEXT TYPES
// ============================================================================

/// Caller-supplied UI state carried through the review page untouched.
/// These are hints, not persisted state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewHints {
    #[serde(default)]
    pub comment_draft: Option<String>,
    #[serde(default)]
    pub excluded_tags: Vec<String>,
    #[serde(default)]
    pub seen: Vec<EntityId>,
}

/// Full detail needed to render one item for one reviewer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewItemContext {
    Proposal {
        submission: Submission,
        /// Other submissions by the same speaker at this conference.
        speaker_submissions: Vec<Submission>,
        my_review: Option<UserReview>,
        score_options: Vec<AvailableScoreOption>,
        hints: ReviewHints,
    },
    Grant {
        grant: Grant,
        /// Grants the same applicant received at other conferences.
        previous_grants: Vec<Grant>,
        my_review: Option<UserReview>,
        score_options: Vec<AvailableScoreOption>,
        hints: ReviewHints,
    },
}

/// Exclusions for next-item selection.
#[derive(Debug, Clone, Default)]
pub struct NextItemOptions {
    /// Item the reviewer explicitly skipped.
    pub skip_item: Option<EntityId>,
    /// Proposals only: tags the reviewer opted out of.
    pub exclude_tags: Vec<String>,
    /// Items already shown this browsing session.
    pub seen: Vec<EntityId>,
}

// ============================================================================
// ADAPTER TRAIT AND REGISTRY
// ============================================================================

/// Strategy interface over one reviewable entity kind.
pub trait ReviewAdapter: Send + Sync {
    fn session_type(&self) -> ReviewSessionType;

    /// Annotated shortlist, ordered by mean score descending (no-review items
    /// last) with a deterministic tie-break.
    fn recap_items(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
    ) -> PlenumResult<Vec<RecapItem>>;

    /// Shortlist plus session metadata and kind-specific lookups.
    fn recap_context(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
    ) -> PlenumResult<RecapContext>;

    /// Apply bulk decisions. Only items named in `decisions` are touched; the
    /// whole request is validated first and applied atomically.
    fn process_recap_decisions(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
        decisions: &[RecapDecisionRequest],
    ) -> PlenumResult<RecapOutcome>;

    /// Full detail for one item and one reviewer.
    fn review_context(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
        item_id: EntityId,
        reviewer_id: UserId,
        hints: &ReviewHints,
    ) -> PlenumResult<ReviewItemContext>;

    /// Pick the next item for a reviewer: uniformly at random among the
    /// eligible items with the fewest existing votes. Duplicate assignment
    /// under concurrent reviewers is tolerated - selection is load
    /// balancing, not exclusive claiming.
    fn next_to_review(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
        reviewer_id: UserId,
        opts: &NextItemOptions,
        rng: &mut dyn RngCore,
    ) -> PlenumResult<Option<EntityId>>;

    /// The seam that keeps `UserReview` polymorphic: which target a review
    /// of this item points at.
    fn review_target(&self, item_id: EntityId) -> ReviewTarget;
}

/// Closed registry mapping session types to adapters.
pub struct AdapterRegistry {
    adapters: HashMap<ReviewSessionType, Arc<dyn ReviewAdapter>>,
}

impl AdapterRegistry {
    /// Registry with the two standard adapters.
    pub fn standard() -> Self {
        let mut registry = Self {
            adapters: HashMap::new(),
        };
        registry.register(Arc::new(ProposalsReviewAdapter));
        registry.register(Arc::new(GrantsReviewAdapter));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn ReviewAdapter>) {
        self.adapters.insert(adapter.session_type(), adapter);
    }

    /// Adapter for a session type; fails for an unregistered kind.
    pub fn get(&self, session_type: ReviewSessionType) -> PlenumResult<Arc<dyn ReviewAdapter>> {
        self.adapters.get(&session_type).cloned().ok_or_else(|| {
            ReviewError::UnregisteredSessionType {
                session_type: session_type.to_string(),
            }
            .into()
        })
    }

    /// Adapter for a session.
    pub fn for_session(&self, session: &ReviewSession) -> PlenumResult<Arc<dyn ReviewAdapter>> {
        self.get(session.session_type)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Guard against calling an adapter with a session of the wrong kind.
pub(crate) fn check_session(
    adapter_type: ReviewSessionType,
    session: &ReviewSession,
) -> PlenumResult<()> {
    if session.session_type != adapter_type {
        return Err(ReviewError::SessionTypeMismatch {
            session_id: session.review_session_id,
            expected: adapter_type.to_string(),
            actual: session.session_type.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Mean / population stddev / count over raw numeric scores.
pub(crate) fn score_stats(values: &[f64]) -> RecapScore {
    if values.is_empty() {
        return RecapScore::default();
    }
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    RecapScore {
        mean: Some(mean),
        stddev: Some(variance.sqrt()),
        vote_count: count,
    }
}

/// Per-target numeric scores for one session, resolved through its score
/// options. Reviews pointing at an option from another session are skipped.
pub(crate) fn scores_by_target(
    reviews: &[UserReview],
    options: &[AvailableScoreOption],
) -> HashMap<EntityId, Vec<f64>> {
    let values: HashMap<EntityId, f64> = options
        .iter()
        .map(|o| (o.option_id, f64::from(o.numeric_value)))
        .collect();
    let mut by_target: HashMap<EntityId, Vec<f64>> = HashMap::new();
    for review in reviews {
        if let Some(value) = values.get(&review.score_option_id) {
            by_target
                .entry(review.target.item_id())
                .or_default()
                .push(*value);
        }
    }
    by_target
}

/// How score ties are broken after the mean comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TieBreak {
    /// Stable id ascending only.
    ById,
    /// Standard deviation ascending (most agreement first), then id.
    ByStdDevThenId,
}

/// Order recap items: mean descending with None last, tie-break, then id
/// ascending for full determinism.
pub(crate) fn sort_recap_items(items: &mut [RecapItem], tie_break: TieBreak) {
    items.sort_by(|a, b| {
        compare_scores(a.score.mean, b.score.mean)
            .then_with(|| match tie_break {
                TieBreak::ById => Ordering::Equal,
                TieBreak::ByStdDevThenId => compare_stddev(a.score.stddev, b.score.stddev),
            })
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
}

fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x), // descending
        (Some(_), None) => Ordering::Less,     // scored before unscored
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_stddev(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y), // ascending
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// One item eligible for next-to-review selection.
pub(crate) struct NextCandidate {
    pub item_id: EntityId,
    pub tags: Vec<String>,
}

/// Greedy load-balancing pick: drop exclusions, keep the minimum-vote-count
/// set, draw uniformly at random from it.
pub(crate) fn pick_next(
    candidates: &[NextCandidate],
    reviews: &[UserReview],
    reviewer_id: UserId,
    opts: &NextItemOptions,
    rng: &mut dyn RngCore,
) -> Option<EntityId> {
    let mut votes: HashMap<EntityId, usize> = HashMap::new();
    let mut reviewed_by_me: Vec<EntityId> = Vec::new();
    for review in reviews {
        let item_id = review.target.item_id();
        *votes.entry(item_id).or_default() += 1;
        if review.reviewer_id == reviewer_id {
            reviewed_by_me.push(item_id);
        }
    }

    let eligible: Vec<&NextCandidate> = candidates
        .iter()
        .filter(|c| !reviewed_by_me.contains(&c.item_id))
        .filter(|c| opts.skip_item != Some(c.item_id))
        .filter(|c| !opts.seen.contains(&c.item_id))
        .filter(|c| {
            opts.exclude_tags.is_empty()
                || !c.tags.iter().any(|tag| opts.exclude_tags.contains(tag))
        })
        .collect();

    let min_votes = eligible
        .iter()
        .map(|c| votes.get(&c.item_id).copied().unwrap_or(0))
        .min()?;
    let least_reviewed: Vec<EntityId> = eligible
        .iter()
        .filter(|c| votes.get(&c.item_id).copied().unwrap_or(0) == min_votes)
        .map(|c| c.item_id)
        .collect();
    least_reviewed.choose(rng).copied()
}
