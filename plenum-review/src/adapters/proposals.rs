//! Review adapter for call-for-proposals submissions.

use plenum_core::{
    new_entity_id, AuditAction, AuditLogEntry, EntityId, GrantStatus, PlenumResult, ReviewError,
    ReviewSession, ReviewSessionType, ReviewTarget, SubmissionStatus, UserId,
};
use plenum_storage::{RecapBatch, ReviewStore};
use rand::RngCore;
use std::collections::HashMap;

use super::{
    check_session, pick_next, score_stats, scores_by_target, sort_recap_items, NextCandidate,
    NextItemOptions, RecapContext, RecapDecisionRequest, RecapExtra, RecapItem, RecapItemDetail,
    RecapOutcome, ReviewAdapter, ReviewHints, ReviewItemContext, TieBreak,
};

/// Adapter over `Submission` items.
pub struct ProposalsReviewAdapter;

impl ProposalsReviewAdapter {
    fn parse_decision(&self, decision: &str) -> PlenumResult<SubmissionStatus> {
        let status = SubmissionStatus::from_db_str(decision).map_err(|_| {
            ReviewError::UnknownDecision {
                decision: decision.to_string(),
                session_type: ReviewSessionType::Proposals.to_string(),
            }
        })?;
        if !SubmissionStatus::DECISIONS.contains(&status) {
            return Err(ReviewError::UnknownDecision {
                decision: decision.to_string(),
                session_type: ReviewSessionType::Proposals.to_string(),
            }
            .into());
        }
        Ok(status)
    }
}

impl ReviewAdapter for ProposalsReviewAdapter {
    fn session_type(&self) -> ReviewSessionType {
        ReviewSessionType::Proposals
    }

    fn recap_items(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
    ) -> PlenumResult<Vec<RecapItem>> {
        check_session(self.session_type(), session)?;
        let submissions = store.submissions_by_conference(session.conference_id)?;
        let reviews = store.user_reviews_by_session(session.review_session_id)?;
        let options = store.score_options_by_session(session.review_session_id)?;
        let scores = scores_by_target(&reviews, &options);

        let mut items: Vec<RecapItem> = submissions
            .into_iter()
            .map(|submission| {
                let values = scores
                    .get(&submission.submission_id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                RecapItem {
                    item_id: submission.submission_id,
                    title: submission.title.clone(),
                    owner_id: submission.speaker_id,
                    score: score_stats(values),
                    detail: RecapItemDetail::Proposal {
                        status: submission.status,
                        pending_status: submission.pending_status,
                        submission_type: submission.submission_type,
                        tags: submission.tags,
                        audience_level: submission.audience_level,
                    },
                }
            })
            .collect();
        sort_recap_items(&mut items, TieBreak::ById);
        Ok(items)
    }

    fn recap_context(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
    ) -> PlenumResult<RecapContext> {
        let items = self.recap_items(store, session)?;
        let session_label = match store.conference_get(session.conference_id)? {
            Some(conference) => format!("{} proposals review", conference.code),
            None => session.to_string(),
        };
        // Financial-aid status per speaker, so reviewers see who asked for a
        // grant before accepting a talk.
        let grants_by_user: HashMap<UserId, GrantStatus> = store
            .grants_by_conference(session.conference_id)?
            .into_iter()
            .map(|g| (g.user_id, g.status))
            .collect();

        Ok(RecapContext {
            session_id: session.review_session_id,
            session_label,
            session_type: self.session_type(),
            valid_decisions: SubmissionStatus::DECISIONS
                .iter()
                .map(|s| s.as_db_str().to_string())
                .collect(),
            score_options: store.score_options_by_session(session.review_session_id)?,
            items,
            extra: RecapExtra::Proposals { grants_by_user },
        })
    }

    fn process_recap_decisions(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
        decisions: &[RecapDecisionRequest],
    ) -> PlenumResult<RecapOutcome> {
        check_session(self.session_type(), session)?;
        let submissions: HashMap<EntityId, _> = store
            .submissions_by_conference(session.conference_id)?
            .into_iter()
            .map(|s| (s.submission_id, s))
            .collect();

        let mut batch = RecapBatch::default();
        let mut outcome = RecapOutcome::default();

        for request in decisions {
            let Some(decision) = request.decision.as_deref() else {
                continue;
            };
            let submission = submissions
                .get(&request.item_id)
                .ok_or(ReviewError::UnknownItem {
                    item_id: request.item_id,
                })?;
            let status = self.parse_decision(decision)?;

            // Decision equal to the current status is a no-op signal: clear
            // the staged change instead of re-staging it.
            if status == submission.status {
                batch
                    .proposal_pending
                    .push((submission.submission_id, None));
                outcome.pending_cleared += 1;
                batch.audit_entries.push(AuditLogEntry {
                    entry_id: new_entity_id(),
                    conference_id: session.conference_id,
                    action: AuditAction::PendingStatusCleared,
                    subject_id: submission.submission_id,
                    detail: format!("decision matched current status {}", status),
                    created_at: chrono::Utc::now(),
                });
            } else {
                batch
                    .proposal_pending
                    .push((submission.submission_id, Some(status)));
                outcome.pending_set += 1;
                batch.audit_entries.push(AuditLogEntry {
                    entry_id: new_entity_id(),
                    conference_id: session.conference_id,
                    action: AuditAction::PendingStatusSet,
                    subject_id: submission.submission_id,
                    detail: format!("staged {} -> {}", submission.status, status),
                    created_at: chrono::Utc::now(),
                });
            }
        }

        store.apply_recap_batch(batch)?;
        Ok(outcome)
    }

    fn review_context(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
        item_id: EntityId,
        reviewer_id: UserId,
        hints: &ReviewHints,
    ) -> PlenumResult<ReviewItemContext> {
        check_session(self.session_type(), session)?;
        let submission = store
            .submission_get(item_id)?
            .filter(|s| s.conference_id == session.conference_id)
            .ok_or(ReviewError::UnknownItem { item_id })?;

        let speaker_submissions: Vec<_> = store
            .submissions_by_speaker(submission.speaker_id)?
            .into_iter()
            .filter(|s| {
                s.conference_id == session.conference_id && s.submission_id != item_id
            })
            .collect();

        let target = self.review_target(item_id);
        let my_review = store
            .user_reviews_by_session(session.review_session_id)?
            .into_iter()
            .find(|r| r.reviewer_id == reviewer_id && r.target == target);

        Ok(ReviewItemContext::Proposal {
            submission,
            speaker_submissions,
            my_review,
            score_options: store.score_options_by_session(session.review_session_id)?,
            hints: hints.clone(),
        })
    }

    fn next_to_review(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
        reviewer_id: UserId,
        opts: &NextItemOptions,
        rng: &mut dyn RngCore,
    ) -> PlenumResult<Option<EntityId>> {
        check_session(self.session_type(), session)?;
        // Withdrawn submissions are not reviewable.
        let candidates: Vec<NextCandidate> = store
            .submissions_by_conference(session.conference_id)?
            .into_iter()
            .filter(|s| s.status != SubmissionStatus::Cancelled)
            .map(|s| NextCandidate {
                item_id: s.submission_id,
                tags: s.tags,
            })
            .collect();
        let reviews = store.user_reviews_by_session(session.review_session_id)?;
        Ok(pick_next(&candidates, &reviews, reviewer_id, opts, rng))
    }

    fn review_target(&self, item_id: EntityId) -> ReviewTarget {
        ReviewTarget::Proposal(item_id)
    }
}
