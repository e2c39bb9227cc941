//! Review adapter for financial-aid grant applications.

use plenum_core::{
    display_label, new_entity_id, AuditAction, AuditLogEntry, CategoryId, EntityId, GrantStatus,
    PlenumResult, ReimbursementCategory, ReviewError, ReviewSession, ReviewSessionType,
    ReviewTarget, SubmissionId, UserId,
};
use plenum_storage::{RecapBatch, ReimbursementUpsert, ReviewStore};
use rand::RngCore;
use std::collections::{HashMap, HashSet};

use super::{
    check_session, pick_next, score_stats, scores_by_target, sort_recap_items, NextCandidate,
    NextItemOptions, RecapContext, RecapDecisionRequest, RecapExtra, RecapItem, RecapItemDetail,
    RecapOutcome, ReviewAdapter, ReviewHints, ReviewItemContext, TieBreak,
};

/// Adapter over `Grant` items.
pub struct GrantsReviewAdapter;

impl GrantsReviewAdapter {
    fn parse_decision(&self, decision: &str) -> PlenumResult<GrantStatus> {
        let status = GrantStatus::from_db_str(decision).map_err(|_| {
            ReviewError::UnknownDecision {
                decision: decision.to_string(),
                session_type: ReviewSessionType::Grants.to_string(),
            }
        })?;
        if !GrantStatus::DECISIONS.contains(&status) {
            return Err(ReviewError::UnknownDecision {
                decision: decision.to_string(),
                session_type: ReviewSessionType::Grants.to_string(),
            }
            .into());
        }
        Ok(status)
    }
}

impl ReviewAdapter for GrantsReviewAdapter {
    fn session_type(&self) -> ReviewSessionType {
        ReviewSessionType::Grants
    }

    fn recap_items(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
    ) -> PlenumResult<Vec<RecapItem>> {
        check_session(self.session_type(), session)?;
        let grants = store.grants_by_conference(session.conference_id)?;
        let reviews = store.user_reviews_by_session(session.review_session_id)?;
        let options = store.score_options_by_session(session.review_session_id)?;
        let scores = scores_by_target(&reviews, &options);

        let mut items = Vec::with_capacity(grants.len());
        for grant in grants {
            let values = scores
                .get(&grant.grant_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            // Existential check: has this applicant also sent a proposal?
            let proposals_ids: Vec<SubmissionId> = store
                .submissions_by_speaker(grant.user_id)?
                .into_iter()
                .filter(|s| s.conference_id == session.conference_id)
                .map(|s| s.submission_id)
                .collect();
            let approved_category_ids: Vec<CategoryId> = store
                .reimbursements_by_grant(grant.grant_id)?
                .into_iter()
                .map(|r| r.category_id)
                .collect();

            items.push(RecapItem {
                item_id: grant.grant_id,
                title: grant.name.clone(),
                owner_id: grant.user_id,
                score: score_stats(values),
                detail: RecapItemDetail::Grant {
                    status: grant.status,
                    pending_status: grant.pending_status,
                    country_label: grant.country_code.as_deref().map(display_label),
                    country_code: grant.country_code,
                    has_sent_a_proposal: !proposals_ids.is_empty(),
                    proposals_ids,
                    approved_category_ids,
                    internal_notes: grant.internal_notes,
                },
            });
        }
        // Grants break score ties by reviewer agreement (stddev ascending).
        sort_recap_items(&mut items, TieBreak::ByStdDevThenId);
        Ok(items)
    }

    fn recap_context(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
    ) -> PlenumResult<RecapContext> {
        let items = self.recap_items(store, session)?;
        let session_label = match store.conference_get(session.conference_id)? {
            Some(conference) => format!("{} grants review", conference.code),
            None => session.to_string(),
        };
        // Prefetch competing submissions per applicant for display.
        let mut submissions_by_user: HashMap<UserId, Vec<SubmissionId>> = HashMap::new();
        for submission in store.submissions_by_conference(session.conference_id)? {
            submissions_by_user
                .entry(submission.speaker_id)
                .or_default()
                .push(submission.submission_id);
        }
        let applicants: HashSet<UserId> = items.iter().map(|i| i.owner_id).collect();
        submissions_by_user.retain(|user_id, _| applicants.contains(user_id));

        Ok(RecapContext {
            session_id: session.review_session_id,
            session_label,
            session_type: self.session_type(),
            valid_decisions: GrantStatus::DECISIONS
                .iter()
                .map(|s| s.as_db_str().to_string())
                .collect(),
            score_options: store.score_options_by_session(session.review_session_id)?,
            items,
            extra: RecapExtra::Grants {
                categories: store
                    .reimbursement_categories_by_conference(session.conference_id)?,
                submissions_by_user,
            },
        })
    }

    fn process_recap_decisions(
        &self,
        store: &dyn ReviewStore,
        session: &ReviewSession,
        decisions: &[RecapDecisionRequest],
    ) -> PlenumResult<RecapOutcome> {
        check_session(self.session_type(), session)?;
        let grants: HashMap<EntityId, _> = store
            .grants_by_conference(session.conference_id)?
            .into_iter()
            .map(|g| (g.grant_id, g))
            .collect();
        let categories: HashMap<CategoryId, ReimbursementCategory> = store
            .reimbursement_categories_by_conference(session.conference_id)?
            .into_iter()
            .map(|c| (c.category_id, c))
            .collect();

        let mut batch = RecapBatch::default();
        let mut outcome = RecapOutcome::default();
        let now = chrono::Utc::now();

        let audit = |action: AuditAction, subject_id: EntityId, detail: String| AuditLogEntry {
            entry_id: new_entity_id(),
            conference_id: session.conference_id,
            action,
            subject_id,
            detail,
            created_at: now,
        };

        for request in decisions {
            let Some(decision) = request.decision.as_deref() else {
                continue;
            };
            let grant = grants.get(&request.item_id).ok_or(ReviewError::UnknownItem {
                item_id: request.item_id,
            })?;
            let status = self.parse_decision(decision)?;

            if status == grant.status {
                // No-op signal: clear the staged change and leave the money
                // untouched.
                batch.grant_pending.push((grant.grant_id, None));
                outcome.pending_cleared += 1;
                batch.audit_entries.push(audit(
                    AuditAction::PendingStatusCleared,
                    grant.grant_id,
                    format!("decision matched current status {}", status),
                ));
                continue;
            }

            batch.grant_pending.push((grant.grant_id, Some(status)));
            outcome.pending_set += 1;
            batch.audit_entries.push(audit(
                AuditAction::PendingStatusSet,
                grant.grant_id,
                format!("staged {} -> {}", grant.status, status),
            ));

            let existing = store.reimbursements_by_grant(grant.grant_id)?;
            if status == GrantStatus::Approved {
                let selected: HashSet<CategoryId> =
                    request.reimbursement_category_ids.iter().copied().collect();
                for category_id in &selected {
                    let category =
                        categories
                            .get(category_id)
                            .ok_or(ReviewError::UnknownCategory {
                                category_id: *category_id,
                            })?;
                    let previous = existing.iter().find(|r| r.category_id == *category_id);
                    batch.reimbursement_upserts.push(ReimbursementUpsert {
                        grant_id: grant.grant_id,
                        category_id: *category_id,
                        amount_cents: category.max_amount_cents,
                    });
                    match previous {
                        Some(row) => {
                            outcome.reimbursements_updated += 1;
                            batch.audit_entries.push(audit(
                                AuditAction::ReimbursementUpdated,
                                row.reimbursement_id,
                                format!(
                                    "{}: {} -> {} cents",
                                    category.name, row.granted_amount_cents,
                                    category.max_amount_cents
                                ),
                            ));
                        }
                        None => {
                            outcome.reimbursements_created += 1;
                            batch.audit_entries.push(audit(
                                AuditAction::ReimbursementCreated,
                                grant.grant_id,
                                format!("{}: {} cents", category.name, category.max_amount_cents),
                            ));
                        }
                    }
                }
                // Unselected existing reimbursements are withdrawn.
                for row in existing.iter().filter(|r| !selected.contains(&r.category_id)) {
                    batch.reimbursement_deletes.push(row.reimbursement_id);
                    outcome.reimbursements_deleted += 1;
                    batch.audit_entries.push(audit(
                        AuditAction::ReimbursementDeleted,
                        row.reimbursement_id,
                        "category unselected on approval".to_string(),
                    ));
                }
            } else {
                // Any decision other than approved withdraws all money.
                for row in &existing {
                    batch.reimbursement_deletes.push(row.reimbursement_id);
                    outcome.reimbursements_deleted += 1;
                    batch.audit_entries.push(audit(
                        AuditAction::ReimbursementDeleted,
                        row.reimbursement_id,
                        format!("grant decision is {}", status),
                    ));
                }
            }
        }

        // Notes travel independently of decisions: a row can change notes
        // without being decided on.
        for request in decisions {
            let Some(notes) = request.notes.as_deref() else {
                continue;
            };
            let grant = grants.get(&request.item_id).ok_or(ReviewError::UnknownItem {
                item_id: request.item_id,
            })?;
            if grant.internal_notes != notes {
                batch
                    .notes_updates
                    .push((grant.grant_id, notes.to_string()));
                outcome.notes_updated += 1;
                batch.audit_entries.push(audit(
                    AuditAction::InternalNotesUpdated,
                    grant.grant_id,
                    "internal notes updated".to_string(),
                ));
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
        let grant = store
            .grant_get(item_id)?
            .filter(|g| g.conference_id == session.conference_id)
            .ok_or(ReviewError::UnknownItem { item_id })?;

        // Prior grants from the same person across earlier conferences.
        let previous_grants: Vec<_> = store
            .grants_by_user(grant.user_id)?
            .into_iter()
            .filter(|g| g.grant_id != item_id)
            .collect();

        let target = self.review_target(item_id);
        let my_review = store
            .user_reviews_by_session(session.review_session_id)?
            .into_iter()
            .find(|r| r.reviewer_id == reviewer_id && r.target == target);

        Ok(ReviewItemContext::Grant {
            grant,
            previous_grants,
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
        let candidates: Vec<NextCandidate> = store
            .grants_by_conference(session.conference_id)?
            .into_iter()
            .map(|g| NextCandidate {
                item_id: g.grant_id,
                tags: Vec::new(),
            })
            .collect();
        let reviews = store.user_reviews_by_session(session.review_session_id)?;
        Ok(pick_next(&candidates, &reviews, reviewer_id, opts, rng))
    }

    fn review_target(&self, item_id: EntityId) -> ReviewTarget {
        ReviewTarget::Grant(item_id)
    }
}
