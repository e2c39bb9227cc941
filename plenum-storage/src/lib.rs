//! Plenum Storage - Store Trait and In-Memory Implementation
//!
//! Defines the storage abstraction the review engine consumes. Production
//! persistence (SQL, an ORM, a remote service) plugs in behind `ReviewStore`;
//! the in-memory implementation here backs development and tests.

pub mod cache;

pub use cache::{CacheStats, CacheStore, InMemoryCacheStore};

use plenum_core::{
    new_entity_id, AuditLogEntry, AvailableScoreOption, CategoryId, Conference, ConferenceId,
    EntityType, Grant, GrantId, GrantReimbursement, GrantStatus, PlenumError, PlenumResult,
    ReimbursementCategory, ReimbursementId, ReviewId, ReviewSession, ReviewSessionId,
    StorageError, Submission, SubmissionId, SubmissionStatus, UserId, UserReview,
};
use std::collections::HashMap;
use std::sync::RwLock;

// ============================================================================
// RECAP BATCH
// ============================================================================

/// Create-or-update of one reimbursement row to a category's cap.
#[derive(Debug, Clone, PartialEq)]
pub struct ReimbursementUpsert {
    pub grant_id: GrantId,
    pub category_id: CategoryId,
    pub amount_cents: i64,
}

/// The full set of mutations produced by one recap POST.
///
/// The engine validates and assembles the batch; the store applies it under a
/// single write lock so a request's decision, reimbursement and notes
/// mutations are all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct RecapBatch {
    /// (submission, staged status) pairs; `None` clears the pending status.
    pub proposal_pending: Vec<(SubmissionId, Option<SubmissionStatus>)>,
    /// (grant, staged status) pairs; `None` clears the pending status.
    pub grant_pending: Vec<(GrantId, Option<GrantStatus>)>,
    pub reimbursement_upserts: Vec<ReimbursementUpsert>,
    pub reimbursement_deletes: Vec<ReimbursementId>,
    /// (grant, new internal notes) pairs, independent of decisions.
    pub notes_updates: Vec<(GrantId, String)>,
    pub audit_entries: Vec<AuditLogEntry>,
}

impl RecapBatch {
    pub fn is_empty(&self) -> bool {
        self.proposal_pending.is_empty()
            && self.grant_pending.is_empty()
            && self.reimbursement_upserts.is_empty()
            && self.reimbursement_deletes.is_empty()
            && self.notes_updates.is_empty()
            && self.audit_entries.is_empty()
    }
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Storage trait for the review domain.
///
/// This is the "domain query layer" collaborator of the recap engine: it
/// supplies the rows the adapters annotate and aggregates, and applies the
/// mutations they stage. Implementations must be thread-safe.
pub trait ReviewStore: Send + Sync {
    // === Conferences ===

    fn conference_insert(&self, c: &Conference) -> PlenumResult<()>;
    fn conference_get(&self, id: ConferenceId) -> PlenumResult<Option<Conference>>;

    // === Review sessions ===

    fn review_session_insert(&self, s: &ReviewSession) -> PlenumResult<()>;
    fn review_session_get(&self, id: ReviewSessionId) -> PlenumResult<Option<ReviewSession>>;

    // === Submissions ===

    fn submission_insert(&self, s: &Submission) -> PlenumResult<()>;
    fn submission_get(&self, id: SubmissionId) -> PlenumResult<Option<Submission>>;
    /// Submissions for a conference, ordered by id ascending.
    fn submissions_by_conference(&self, conference_id: ConferenceId)
        -> PlenumResult<Vec<Submission>>;
    /// All submissions by one speaker, across conferences, ordered by id.
    fn submissions_by_speaker(&self, speaker_id: UserId) -> PlenumResult<Vec<Submission>>;

    // === Grants ===

    fn grant_insert(&self, g: &Grant) -> PlenumResult<()>;
    fn grant_get(&self, id: GrantId) -> PlenumResult<Option<Grant>>;
    /// Grants for a conference, ordered by id ascending.
    fn grants_by_conference(&self, conference_id: ConferenceId) -> PlenumResult<Vec<Grant>>;
    /// All grants by one applicant, across conferences, ordered by id.
    fn grants_by_user(&self, user_id: UserId) -> PlenumResult<Vec<Grant>>;

    // === Score options ===

    fn score_option_insert(&self, o: &AvailableScoreOption) -> PlenumResult<()>;
    /// Options for a session, ranked descending by numeric value.
    fn score_options_by_session(
        &self,
        session_id: ReviewSessionId,
    ) -> PlenumResult<Vec<AvailableScoreOption>>;

    // === Reviews ===

    /// Insert or update the review identified by (reviewer, target, session).
    /// Returns the id of the stored row.
    fn user_review_upsert(&self, review: &UserReview) -> PlenumResult<ReviewId>;
    fn user_reviews_by_session(
        &self,
        session_id: ReviewSessionId,
    ) -> PlenumResult<Vec<UserReview>>;

    // === Reimbursements ===

    fn reimbursement_category_insert(&self, c: &ReimbursementCategory) -> PlenumResult<()>;
    fn reimbursement_category_get(
        &self,
        id: CategoryId,
    ) -> PlenumResult<Option<ReimbursementCategory>>;
    fn reimbursement_categories_by_conference(
        &self,
        conference_id: ConferenceId,
    ) -> PlenumResult<Vec<ReimbursementCategory>>;
    fn reimbursements_by_grant(&self, grant_id: GrantId)
        -> PlenumResult<Vec<GrantReimbursement>>;
    /// Reimbursements for every grant of a conference.
    fn reimbursements_by_conference(
        &self,
        conference_id: ConferenceId,
    ) -> PlenumResult<Vec<GrantReimbursement>>;

    // === Audit log ===

    fn audit_log_by_conference(
        &self,
        conference_id: ConferenceId,
    ) -> PlenumResult<Vec<AuditLogEntry>>;

    // === Recap mutations ===

    /// Apply one recap POST's mutations atomically. The whole batch is
    /// validated against current state first; any unknown reference rejects
    /// the batch without applying anything.
    fn apply_recap_batch(&self, batch: RecapBatch) -> PlenumResult<()>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Default)]
struct StoreInner {
    conferences: HashMap<ConferenceId, Conference>,
    sessions: HashMap<ReviewSessionId, ReviewSession>,
    submissions: HashMap<SubmissionId, Submission>,
    grants: HashMap<GrantId, Grant>,
    score_options: HashMap<plenum_core::ScoreOptionId, AvailableScoreOption>,
    reviews: HashMap<ReviewId, UserReview>,
    categories: HashMap<CategoryId, ReimbursementCategory>,
    reimbursements: HashMap<ReimbursementId, GrantReimbursement>,
    audit_log: Vec<AuditLogEntry>,
}

/// In-memory `ReviewStore` for development and testing.
///
/// One `RwLock` guards the whole dataset: reads share, and
/// `apply_recap_batch` holds the write lock for its full validate-then-apply
/// cycle, which is what makes a recap POST atomic.
#[derive(Debug, Default)]
pub struct InMemoryReviewStore {
    inner: RwLock<StoreInner>,
}

fn insert_err(entity_type: EntityType, reason: &str) -> PlenumError {
    StorageError::InsertFailed {
        entity_type,
        reason: reason.to_string(),
    }
    .into()
}

fn not_found(entity_type: EntityType, id: uuid::Uuid) -> PlenumError {
    StorageError::NotFound { entity_type, id }.into()
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *inner = StoreInner::default();
    }

    pub fn submission_count(&self) -> usize {
        self.read().map(|i| i.submissions.len()).unwrap_or(0)
    }

    pub fn grant_count(&self) -> usize {
        self.read().map(|i| i.grants.len()).unwrap_or(0)
    }

    pub fn review_count(&self) -> usize {
        self.read().map(|i| i.reviews.len()).unwrap_or(0)
    }

    fn read(&self) -> PlenumResult<std::sync::RwLockReadGuard<'_, StoreInner>> {
        self.inner
            .read()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn write(&self) -> PlenumResult<std::sync::RwLockWriteGuard<'_, StoreInner>> {
        self.inner
            .write()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn validate_batch(inner: &StoreInner, batch: &RecapBatch) -> PlenumResult<()> {
        for (id, _) in &batch.proposal_pending {
            if !inner.submissions.contains_key(id) {
                return Err(not_found(EntityType::Submission, *id));
            }
        }
        for (id, _) in &batch.grant_pending {
            if !inner.grants.contains_key(id) {
                return Err(not_found(EntityType::Grant, *id));
            }
        }
        for upsert in &batch.reimbursement_upserts {
            if !inner.grants.contains_key(&upsert.grant_id) {
                return Err(not_found(EntityType::Grant, upsert.grant_id));
            }
            if !inner.categories.contains_key(&upsert.category_id) {
                return Err(not_found(
                    EntityType::ReimbursementCategory,
                    upsert.category_id,
                ));
            }
        }
        for id in &batch.reimbursement_deletes {
            if !inner.reimbursements.contains_key(id) {
                return Err(not_found(EntityType::Reimbursement, *id));
            }
        }
        for (id, _) in &batch.notes_updates {
            if !inner.grants.contains_key(id) {
                return Err(not_found(EntityType::Grant, *id));
            }
        }
        Ok(())
    }
}

impl ReviewStore for InMemoryReviewStore {
    fn conference_insert(&self, c: &Conference) -> PlenumResult<()> {
        let mut inner = self.write()?;
        if inner.conferences.contains_key(&c.conference_id) {
            return Err(insert_err(EntityType::Conference, "already exists"));
        }
        inner.conferences.insert(c.conference_id, c.clone());
        Ok(())
    }

    fn conference_get(&self, id: ConferenceId) -> PlenumResult<Option<Conference>> {
        Ok(self.read()?.conferences.get(&id).cloned())
    }

    fn review_session_insert(&self, s: &ReviewSession) -> PlenumResult<()> {
        let mut inner = self.write()?;
        if inner.sessions.contains_key(&s.review_session_id) {
            return Err(insert_err(EntityType::ReviewSession, "already exists"));
        }
        inner.sessions.insert(s.review_session_id, s.clone());
        Ok(())
    }

    fn review_session_get(&self, id: ReviewSessionId) -> PlenumResult<Option<ReviewSession>> {
        Ok(self.read()?.sessions.get(&id).cloned())
    }

    fn submission_insert(&self, s: &Submission) -> PlenumResult<()> {
        let mut inner = self.write()?;
        if inner.submissions.contains_key(&s.submission_id) {
            return Err(insert_err(EntityType::Submission, "already exists"));
        }
        inner.submissions.insert(s.submission_id, s.clone());
        Ok(())
    }

    fn submission_get(&self, id: SubmissionId) -> PlenumResult<Option<Submission>> {
        Ok(self.read()?.submissions.get(&id).cloned())
    }

    fn submissions_by_conference(
        &self,
        conference_id: ConferenceId,
    ) -> PlenumResult<Vec<Submission>> {
        let inner = self.read()?;
        let mut rows: Vec<Submission> = inner
            .submissions
            .values()
            .filter(|s| s.conference_id == conference_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.submission_id);
        Ok(rows)
    }

    fn submissions_by_speaker(&self, speaker_id: UserId) -> PlenumResult<Vec<Submission>> {
        let inner = self.read()?;
        let mut rows: Vec<Submission> = inner
            .submissions
            .values()
            .filter(|s| s.speaker_id == speaker_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.submission_id);
        Ok(rows)
    }

    fn grant_insert(&self, g: &Grant) -> PlenumResult<()> {
        let mut inner = self.write()?;
        if inner.grants.contains_key(&g.grant_id) {
            return Err(insert_err(EntityType::Grant, "already exists"));
        }
        inner.grants.insert(g.grant_id, g.clone());
        Ok(())
    }

    fn grant_get(&self, id: GrantId) -> PlenumResult<Option<Grant>> {
        Ok(self.read()?.grants.get(&id).cloned())
    }

    fn grants_by_conference(&self, conference_id: ConferenceId) -> PlenumResult<Vec<Grant>> {
        let inner = self.read()?;
        let mut rows: Vec<Grant> = inner
            .grants
            .values()
            .filter(|g| g.conference_id == conference_id)
            .cloned()
            .collect();
        rows.sort_by_key(|g| g.grant_id);
        Ok(rows)
    }

    fn grants_by_user(&self, user_id: UserId) -> PlenumResult<Vec<Grant>> {
        let inner = self.read()?;
        let mut rows: Vec<Grant> = inner
            .grants
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|g| g.grant_id);
        Ok(rows)
    }

    fn score_option_insert(&self, o: &AvailableScoreOption) -> PlenumResult<()> {
        let mut inner = self.write()?;
        if inner.score_options.contains_key(&o.option_id) {
            return Err(insert_err(EntityType::ScoreOption, "already exists"));
        }
        inner.score_options.insert(o.option_id, o.clone());
        Ok(())
    }

    fn score_options_by_session(
        &self,
        session_id: ReviewSessionId,
    ) -> PlenumResult<Vec<AvailableScoreOption>> {
        let inner = self.read()?;
        let mut rows: Vec<AvailableScoreOption> = inner
            .score_options
            .values()
            .filter(|o| o.review_session_id == session_id)
            .cloned()
            .collect();
        // Ranked descending for recap display.
        rows.sort_by(|a, b| b.numeric_value.cmp(&a.numeric_value));
        Ok(rows)
    }

    fn user_review_upsert(&self, review: &UserReview) -> PlenumResult<ReviewId> {
        let mut inner = self.write()?;
        let existing_id = inner
            .reviews
            .values()
            .find(|r| {
                r.review_session_id == review.review_session_id
                    && r.reviewer_id == review.reviewer_id
                    && r.target == review.target
            })
            .map(|r| r.review_id);

        match existing_id {
            Some(id) => {
                let row = inner
                    .reviews
                    .get_mut(&id)
                    .ok_or_else(|| not_found(EntityType::UserReview, id))?;
                row.score_option_id = review.score_option_id;
                row.comment = review.comment.clone();
                row.private_comment = review.private_comment.clone();
                Ok(id)
            }
            None => {
                inner.reviews.insert(review.review_id, review.clone());
                Ok(review.review_id)
            }
        }
    }

    fn user_reviews_by_session(
        &self,
        session_id: ReviewSessionId,
    ) -> PlenumResult<Vec<UserReview>> {
        let inner = self.read()?;
        let mut rows: Vec<UserReview> = inner
            .reviews
            .values()
            .filter(|r| r.review_session_id == session_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.review_id);
        Ok(rows)
    }

    fn reimbursement_category_insert(&self, c: &ReimbursementCategory) -> PlenumResult<()> {
        let mut inner = self.write()?;
        if inner.categories.contains_key(&c.category_id) {
            return Err(insert_err(EntityType::ReimbursementCategory, "already exists"));
        }
        inner.categories.insert(c.category_id, c.clone());
        Ok(())
    }

    fn reimbursement_category_get(
        &self,
        id: CategoryId,
    ) -> PlenumResult<Option<ReimbursementCategory>> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    fn reimbursement_categories_by_conference(
        &self,
        conference_id: ConferenceId,
    ) -> PlenumResult<Vec<ReimbursementCategory>> {
        let inner = self.read()?;
        let mut rows: Vec<ReimbursementCategory> = inner
            .categories
            .values()
            .filter(|c| c.conference_id == conference_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.category_id);
        Ok(rows)
    }

    fn reimbursements_by_grant(
        &self,
        grant_id: GrantId,
    ) -> PlenumResult<Vec<GrantReimbursement>> {
        let inner = self.read()?;
        let mut rows: Vec<GrantReimbursement> = inner
            .reimbursements
            .values()
            .filter(|r| r.grant_id == grant_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.reimbursement_id);
        Ok(rows)
    }

    fn reimbursements_by_conference(
        &self,
        conference_id: ConferenceId,
    ) -> PlenumResult<Vec<GrantReimbursement>> {
        let inner = self.read()?;
        let mut rows: Vec<GrantReimbursement> = inner
            .reimbursements
            .values()
            .filter(|r| {
                inner
                    .grants
                    .get(&r.grant_id)
                    .map(|g| g.conference_id == conference_id)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.reimbursement_id);
        Ok(rows)
    }

    fn audit_log_by_conference(
        &self,
        conference_id: ConferenceId,
    ) -> PlenumResult<Vec<AuditLogEntry>> {
        let inner = self.read()?;
        Ok(inner
            .audit_log
            .iter()
            .filter(|e| e.conference_id == conference_id)
            .cloned()
            .collect())
    }

    fn apply_recap_batch(&self, batch: RecapBatch) -> PlenumResult<()> {
        let mut inner = self.write()?;
        Self::validate_batch(&inner, &batch)?;

        for (id, pending) in &batch.proposal_pending {
            if let Some(submission) = inner.submissions.get_mut(id) {
                submission.pending_status = *pending;
            }
        }
        for (id, pending) in &batch.grant_pending {
            if let Some(grant) = inner.grants.get_mut(id) {
                grant.pending_status = *pending;
            }
        }
        for upsert in &batch.reimbursement_upserts {
            let existing_id = inner
                .reimbursements
                .values()
                .find(|r| r.grant_id == upsert.grant_id && r.category_id == upsert.category_id)
                .map(|r| r.reimbursement_id);
            match existing_id {
                Some(id) => {
                    if let Some(row) = inner.reimbursements.get_mut(&id) {
                        row.granted_amount_cents = upsert.amount_cents;
                    }
                }
                None => {
                    let id = new_entity_id();
                    inner.reimbursements.insert(
                        id,
                        GrantReimbursement {
                            reimbursement_id: id,
                            grant_id: upsert.grant_id,
                            category_id: upsert.category_id,
                            granted_amount_cents: upsert.amount_cents,
                            created_at: chrono::Utc::now(),
                        },
                    );
                }
            }
        }
        for id in &batch.reimbursement_deletes {
            inner.reimbursements.remove(id);
        }
        for (id, notes) in &batch.notes_updates {
            if let Some(grant) = inner.grants.get_mut(id) {
                grant.internal_notes = notes.clone();
            }
        }
        inner.audit_log.extend(batch.audit_entries);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use plenum_core::{
        Gender, ReviewSessionStatus, ReviewSessionType, ReviewTarget,
    };

    fn conference() -> Conference {
        Conference {
            conference_id: new_entity_id(),
            code: "rustconf24".to_string(),
            name: "RustConf 2024".to_string(),
            created_at: Utc::now(),
        }
    }

    fn grant(conference_id: ConferenceId) -> Grant {
        Grant {
            grant_id: new_entity_id(),
            conference_id,
            user_id: new_entity_id(),
            name: "Dana".to_string(),
            status: GrantStatus::Pending,
            pending_status: None,
            approved_type: None,
            country_code: Some("BR".to_string()),
            gender: Some(Gender::Female),
            occupation: Some("student".to_string()),
            internal_notes: String::new(),
            created_at: Utc::now(),
        }
    }

    fn session(conference_id: ConferenceId) -> ReviewSession {
        ReviewSession {
            review_session_id: new_entity_id(),
            conference_id,
            session_type: ReviewSessionType::Grants,
            status: ReviewSessionStatus::Open,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_conference_roundtrip() {
        let store = InMemoryReviewStore::new();
        let conf = conference();
        store.conference_insert(&conf).unwrap();
        assert_eq!(store.conference_get(conf.conference_id).unwrap(), Some(conf));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = InMemoryReviewStore::new();
        let conf = conference();
        store.conference_insert(&conf).unwrap();
        assert!(store.conference_insert(&conf).is_err());
    }

    #[test]
    fn test_score_options_ranked_descending() {
        let store = InMemoryReviewStore::new();
        let session_id = new_entity_id();
        for value in [1, 3, 0, 2] {
            store
                .score_option_insert(&AvailableScoreOption {
                    option_id: new_entity_id(),
                    review_session_id: session_id,
                    numeric_value: value,
                    label: format!("score {}", value),
                })
                .unwrap();
        }
        let values: Vec<i32> = store
            .score_options_by_session(session_id)
            .unwrap()
            .iter()
            .map(|o| o.numeric_value)
            .collect();
        assert_eq!(values, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_user_review_upsert_is_unique_per_reviewer_target_session() {
        let store = InMemoryReviewStore::new();
        let session_id = new_entity_id();
        let reviewer = new_entity_id();
        let target = ReviewTarget::Grant(new_entity_id());
        let first_option = new_entity_id();
        let second_option = new_entity_id();

        let mut review = UserReview {
            review_id: new_entity_id(),
            review_session_id: session_id,
            reviewer_id: reviewer,
            target,
            score_option_id: first_option,
            comment: None,
            private_comment: None,
            created_at: Utc::now(),
        };
        let first_id = store.user_review_upsert(&review).unwrap();

        review.review_id = new_entity_id();
        review.score_option_id = second_option;
        review.comment = Some("changed my mind".to_string());
        let second_id = store.user_review_upsert(&review).unwrap();

        assert_eq!(first_id, second_id);
        let rows = store.user_reviews_by_session(session_id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score_option_id, second_option);
        assert_eq!(rows[0].comment.as_deref(), Some("changed my mind"));
    }

    #[test]
    fn test_apply_recap_batch_sets_and_clears_pending() {
        let store = InMemoryReviewStore::new();
        let conf = conference();
        store.conference_insert(&conf).unwrap();
        let g = grant(conf.conference_id);
        store.grant_insert(&g).unwrap();

        store
            .apply_recap_batch(RecapBatch {
                grant_pending: vec![(g.grant_id, Some(GrantStatus::Approved))],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            store.grant_get(g.grant_id).unwrap().unwrap().pending_status,
            Some(GrantStatus::Approved)
        );

        store
            .apply_recap_batch(RecapBatch {
                grant_pending: vec![(g.grant_id, None)],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            store.grant_get(g.grant_id).unwrap().unwrap().pending_status,
            None
        );
    }

    #[test]
    fn test_apply_recap_batch_rejects_unknown_grant_without_side_effects() {
        let store = InMemoryReviewStore::new();
        let conf = conference();
        store.conference_insert(&conf).unwrap();
        let g = grant(conf.conference_id);
        store.grant_insert(&g).unwrap();

        let result = store.apply_recap_batch(RecapBatch {
            grant_pending: vec![
                (g.grant_id, Some(GrantStatus::Approved)),
                (new_entity_id(), Some(GrantStatus::Rejected)),
            ],
            ..Default::default()
        });
        assert!(result.is_err());
        // Nothing applied: the batch is all-or-nothing.
        assert_eq!(
            store.grant_get(g.grant_id).unwrap().unwrap().pending_status,
            None
        );
    }

    #[test]
    fn test_reimbursement_upsert_updates_existing_row() {
        let store = InMemoryReviewStore::new();
        let conf = conference();
        store.conference_insert(&conf).unwrap();
        let g = grant(conf.conference_id);
        store.grant_insert(&g).unwrap();
        let category = ReimbursementCategory {
            category_id: new_entity_id(),
            conference_id: conf.conference_id,
            name: "Travel".to_string(),
            max_amount_cents: 40_000,
        };
        store.reimbursement_category_insert(&category).unwrap();

        let upsert = ReimbursementUpsert {
            grant_id: g.grant_id,
            category_id: category.category_id,
            amount_cents: 40_000,
        };
        store
            .apply_recap_batch(RecapBatch {
                reimbursement_upserts: vec![upsert.clone()],
                ..Default::default()
            })
            .unwrap();
        store
            .apply_recap_batch(RecapBatch {
                reimbursement_upserts: vec![ReimbursementUpsert {
                    amount_cents: 35_000,
                    ..upsert
                }],
                ..Default::default()
            })
            .unwrap();

        let rows = store.reimbursements_by_grant(g.grant_id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].granted_amount_cents, 35_000);
    }

    #[test]
    fn test_reimbursements_by_conference_joins_through_grants() {
        let store = InMemoryReviewStore::new();
        let conf_a = conference();
        let conf_b = conference();
        store.conference_insert(&conf_a).unwrap();
        store.conference_insert(&conf_b).unwrap();
        let grant_a = grant(conf_a.conference_id);
        let grant_b = grant(conf_b.conference_id);
        store.grant_insert(&grant_a).unwrap();
        store.grant_insert(&grant_b).unwrap();
        let category = ReimbursementCategory {
            category_id: new_entity_id(),
            conference_id: conf_a.conference_id,
            name: "Ticket".to_string(),
            max_amount_cents: 15_000,
        };
        store.reimbursement_category_insert(&category).unwrap();

        for g in [&grant_a, &grant_b] {
            store
                .apply_recap_batch(RecapBatch {
                    reimbursement_upserts: vec![ReimbursementUpsert {
                        grant_id: g.grant_id,
                        category_id: category.category_id,
                        amount_cents: 15_000,
                    }],
                    ..Default::default()
                })
                .unwrap();
        }

        let rows = store
            .reimbursements_by_conference(conf_a.conference_id)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].grant_id, grant_a.grant_id);
    }

    #[test]
    fn test_audit_entries_are_appended() {
        let store = InMemoryReviewStore::new();
        let conf = conference();
        store.conference_insert(&conf).unwrap();
        let g = grant(conf.conference_id);
        store.grant_insert(&g).unwrap();

        store
            .apply_recap_batch(RecapBatch {
                notes_updates: vec![(g.grant_id, "call the applicant".to_string())],
                audit_entries: vec![AuditLogEntry {
                    entry_id: new_entity_id(),
                    conference_id: conf.conference_id,
                    action: plenum_core::AuditAction::InternalNotesUpdated,
                    subject_id: g.grant_id,
                    detail: "notes updated".to_string(),
                    created_at: Utc::now(),
                }],
                ..Default::default()
            })
            .unwrap();

        assert_eq!(
            store.grant_get(g.grant_id).unwrap().unwrap().internal_notes,
            "call the applicant"
        );
        assert_eq!(
            store
                .audit_log_by_conference(conf.conference_id)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_session_roundtrip_and_counts() {
        let store = InMemoryReviewStore::new();
        let conf = conference();
        store.conference_insert(&conf).unwrap();
        let s = session(conf.conference_id);
        store.review_session_insert(&s).unwrap();
        assert_eq!(
            store.review_session_get(s.review_session_id).unwrap(),
            Some(s)
        );
        assert_eq!(store.grant_count(), 0);
        store.grant_insert(&grant(conf.conference_id)).unwrap();
        assert_eq!(store.grant_count(), 1);
        store.clear();
        assert_eq!(store.grant_count(), 0);
    }
}
