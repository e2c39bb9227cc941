//! End-to-end properties of the recap engine: lock exclusivity, stale-lock
//! reclaim, check-only polling, TTL asymmetry, deterministic ordering,
//! idempotent decisions and load-balanced next-item selection.

use plenum_review::adapters::{AdapterRegistry, NextItemOptions, RecapDecisionRequest};
use plenum_review::analysis::{analysis_cache_key, AnalysisCoordinator, AnalysisTtls};
use plenum_review::similarity::KeywordAnalyzer;
use plenum_review::tasks::TokioTaskRunner;
use plenum_test_utils::{
    conference, grant, reimbursement_category, review, review_session, score_scale, seeded_rng,
    submission, AnalysisPayload, Conference, FailingAnalyzer, GrantStatus, InMemoryCacheStore,
    InMemoryReviewStore, RecordingTaskRunner, ReviewSession, ReviewSessionStatus,
    ReviewSessionType, ReviewStore, ReviewTarget, new_entity_id,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct GrantFixture {
    store: Arc<InMemoryReviewStore>,
    conference: Conference,
    session: ReviewSession,
    options: Vec<plenum_test_utils::AvailableScoreOption>,
}

/// Conference with an open grants session and a 0..=3 score scale.
fn grants_fixture() -> GrantFixture {
    let store = Arc::new(InMemoryReviewStore::new());
    let conf = conference();
    store.conference_insert(&conf).unwrap();
    let session = review_session(&conf, ReviewSessionType::Grants, ReviewSessionStatus::Open);
    store.review_session_insert(&session).unwrap();
    let options = score_scale(&session, 3);
    for option in &options {
        store.score_option_insert(option).unwrap();
    }
    GrantFixture {
        store,
        conference: conf,
        session,
        options,
    }
}

fn option_with_value(
    options: &[plenum_test_utils::AvailableScoreOption],
    value: i32,
) -> &plenum_test_utils::AvailableScoreOption {
    options
        .iter()
        .find(|o| o.numeric_value == value)
        .expect("score option")
}

fn coordinator(
    store: Arc<InMemoryReviewStore>,
    cache: Arc<InMemoryCacheStore>,
    runner: Arc<RecordingTaskRunner>,
) -> AnalysisCoordinator {
    AnalysisCoordinator::new(
        store,
        cache,
        runner,
        Arc::new(KeywordAnalyzer::default()),
        AnalysisTtls::default(),
    )
}

// ============================================================================
// P1-P4: CACHE LOCK STATE MACHINE
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_fetches_dispatch_exactly_once() {
    let fixture = grants_fixture();
    let runner = Arc::new(RecordingTaskRunner::new());
    let coordinator = Arc::new(coordinator(
        Arc::clone(&fixture.store),
        Arc::new(InMemoryCacheStore::new()),
        Arc::clone(&runner),
    ));

    let conference_id = fixture.conference.conference_id;
    let mut handles = Vec::new();
    for _ in 0..16 {
        let coordinator = Arc::clone(&coordinator);
        handles.push(tokio::spawn(async move {
            coordinator
                .fetch_or_compute(conference_id, ReviewSessionType::Grants, false)
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), AnalysisPayload::Processing);
    }
    assert_eq!(runner.dispatch_count(), 1);
    // The watchdog fires once per dispatch, not per request.
    assert_eq!(runner.pending_signals(), 1);
}

#[tokio::test]
async fn stale_lock_is_reclaimed_and_one_new_task_dispatched() {
    let fixture = grants_fixture();
    let runner = Arc::new(RecordingTaskRunner::new());
    let coordinator = coordinator(
        Arc::clone(&fixture.store),
        Arc::new(InMemoryCacheStore::new()),
        Arc::clone(&runner),
    );
    let conference_id = fixture.conference.conference_id;

    let first = coordinator
        .fetch_or_compute(conference_id, ReviewSessionType::Grants, false)
        .await
        .unwrap();
    assert_eq!(first, AnalysisPayload::Processing);
    let stale_task = runner.dispatched_ids()[0];

    // The worker died: its task reads as finished, no result was cached.
    runner.mark_finished(stale_task, true);

    let second = coordinator
        .fetch_or_compute(conference_id, ReviewSessionType::Grants, false)
        .await
        .unwrap();
    assert_eq!(second, AnalysisPayload::Processing);
    assert_eq!(runner.dispatch_count(), 2);
    assert_eq!(coordinator.metrics().stale_reclaimed, 1);
}

#[tokio::test]
async fn active_lock_suppresses_duplicate_dispatch() {
    let fixture = grants_fixture();
    let runner = Arc::new(RecordingTaskRunner::new());
    let coordinator = coordinator(
        Arc::clone(&fixture.store),
        Arc::new(InMemoryCacheStore::new()),
        Arc::clone(&runner),
    );
    let conference_id = fixture.conference.conference_id;

    coordinator
        .fetch_or_compute(conference_id, ReviewSessionType::Grants, false)
        .await
        .unwrap();
    // Task still running (the recording runner's default answer).
    let second = coordinator
        .fetch_or_compute(conference_id, ReviewSessionType::Grants, false)
        .await
        .unwrap();
    assert_eq!(second, AnalysisPayload::Processing);
    assert_eq!(runner.dispatch_count(), 1);
    assert_eq!(coordinator.metrics().duplicates_suppressed, 1);
}

#[tokio::test]
async fn failed_liveness_lookup_is_treated_as_still_active() {
    let fixture = grants_fixture();
    let runner = Arc::new(RecordingTaskRunner::new());
    let coordinator = coordinator(
        Arc::clone(&fixture.store),
        Arc::new(InMemoryCacheStore::new()),
        Arc::clone(&runner),
    );
    let conference_id = fixture.conference.conference_id;

    coordinator
        .fetch_or_compute(conference_id, ReviewSessionType::Grants, false)
        .await
        .unwrap();
    runner.fail_status_lookups(true);

    let second = coordinator
        .fetch_or_compute(conference_id, ReviewSessionType::Grants, false)
        .await
        .unwrap();
    // Conservative default: no reclaim, no duplicate.
    assert_eq!(second, AnalysisPayload::Processing);
    assert_eq!(runner.dispatch_count(), 1);
}

#[tokio::test]
async fn check_only_never_dispatches_in_any_state() {
    let fixture = grants_fixture();
    let cache = Arc::new(InMemoryCacheStore::new());
    let runner = Arc::new(RecordingTaskRunner::new());
    let coordinator = coordinator(
        Arc::clone(&fixture.store),
        Arc::clone(&cache),
        Arc::clone(&runner),
    );
    let conference_id = fixture.conference.conference_id;
    let session_type = ReviewSessionType::Grants;

    // Empty state.
    assert_eq!(
        coordinator.check(conference_id, session_type).await.unwrap(),
        AnalysisPayload::Empty
    );
    assert_eq!(runner.dispatch_count(), 0);

    // Computing state.
    coordinator
        .fetch_or_compute(conference_id, session_type, false)
        .await
        .unwrap();
    assert_eq!(
        coordinator.check(conference_id, session_type).await.unwrap(),
        AnalysisPayload::Processing
    );
    assert_eq!(runner.dispatch_count(), 1);

    // Error state, seeded directly.
    use plenum_storage::CacheStore;
    let key = analysis_cache_key(conference_id, session_type);
    cache
        .set(
            &key,
            serde_json::to_value(AnalysisPayload::Error {
                message: "boom".to_string(),
            })
            .unwrap(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();
    assert!(coordinator
        .check(conference_id, session_type)
        .await
        .unwrap()
        .is_error());
    assert_eq!(runner.dispatch_count(), 1);
}

#[tokio::test]
async fn cached_result_is_returned_without_dispatch() {
    let fixture = grants_fixture();
    let cache = Arc::new(InMemoryCacheStore::new());
    let runner = Arc::new(RecordingTaskRunner::new());
    let coordinator = coordinator(
        Arc::clone(&fixture.store),
        Arc::clone(&cache),
        Arc::clone(&runner),
    );
    let conference_id = fixture.conference.conference_id;

    use plenum_storage::CacheStore;
    let key = analysis_cache_key(conference_id, ReviewSessionType::Grants);
    cache
        .set(
            &key,
            serde_json::to_value(AnalysisPayload::Error {
                message: "previous failure".to_string(),
            })
            .unwrap(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let payload = coordinator
        .fetch_or_compute(conference_id, ReviewSessionType::Grants, false)
        .await
        .unwrap();
    assert!(payload.is_error());
    assert_eq!(runner.dispatch_count(), 0);

    // recompute bypasses the cached payload and re-dispatches.
    let payload = coordinator
        .fetch_or_compute(conference_id, ReviewSessionType::Grants, true)
        .await
        .unwrap();
    assert_eq!(payload, AnalysisPayload::Processing);
    assert_eq!(runner.dispatch_count(), 1);
}

/// Poll `check` until the payload leaves the processing/empty states.
async fn wait_for_settled(
    coordinator: &AnalysisCoordinator,
    conference_id: plenum_test_utils::ConferenceId,
    session_type: ReviewSessionType,
) -> AnalysisPayload {
    for _ in 0..200 {
        let payload = coordinator.check(conference_id, session_type).await.unwrap();
        if payload.is_cacheable() {
            return payload;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("analysis never settled");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn error_payloads_expire_long_before_results() {
    let fixture = grants_fixture();
    let cache = Arc::new(InMemoryCacheStore::new());
    let ttls = AnalysisTtls::default();
    let conference_id = fixture.conference.conference_id;

    // Failing analyzer: the task caches a short-lived error payload.
    let failing = AnalysisCoordinator::new(
        fixture.store.clone(),
        cache.clone(),
        Arc::new(TokioTaskRunner::new()),
        Arc::new(FailingAnalyzer),
        ttls,
    );
    failing
        .fetch_or_compute(conference_id, ReviewSessionType::Grants, false)
        .await
        .unwrap();
    let settled = wait_for_settled(&failing, conference_id, ReviewSessionType::Grants).await;
    assert!(settled.is_error());

    // Inside the error TTL the failure is returned as-is...
    cache.advance(ttls.error / 2);
    assert!(failing
        .check(conference_id, ReviewSessionType::Grants)
        .await
        .unwrap()
        .is_error());

    // ...and past it the state is empty again, so a fetch re-dispatches.
    cache.advance(ttls.error);
    assert_eq!(
        failing
            .check(conference_id, ReviewSessionType::Grants)
            .await
            .unwrap(),
        AnalysisPayload::Empty
    );
    let payload = failing
        .fetch_or_compute(conference_id, ReviewSessionType::Grants, false)
        .await
        .unwrap();
    assert_eq!(payload, AnalysisPayload::Processing);
    let settled = wait_for_settled(&failing, conference_id, ReviewSessionType::Grants).await;
    assert!(settled.is_error());
    assert_eq!(failing.metrics().dispatched, 2);
    assert_eq!(failing.metrics().failed, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn successful_results_survive_well_past_the_error_ttl() {
    let fixture = grants_fixture();
    let speaker = new_entity_id();
    for title in ["Async Rust services", "Async Rust pipelines"] {
        fixture
            .store
            .submission_insert(&submission(&fixture.conference, speaker, title, &["rust"]))
            .unwrap();
    }
    let cache = Arc::new(InMemoryCacheStore::new());
    let ttls = AnalysisTtls::default();
    let conference_id = fixture.conference.conference_id;

    let coordinator = AnalysisCoordinator::new(
        fixture.store.clone(),
        cache.clone(),
        Arc::new(TokioTaskRunner::new()),
        Arc::new(KeywordAnalyzer::default()),
        ttls,
    );
    coordinator
        .fetch_or_compute(conference_id, ReviewSessionType::Proposals, false)
        .await
        .unwrap();
    let settled =
        wait_for_settled(&coordinator, conference_id, ReviewSessionType::Proposals).await;
    let AnalysisPayload::Ready { analysis } = settled else {
        panic!("expected ready payload");
    };
    assert_eq!(analysis.submissions_list.len(), 2);

    // Hours later (far past the error TTL) the result is still served.
    cache.advance(ttls.result / 2);
    assert!(matches!(
        coordinator
            .check(conference_id, ReviewSessionType::Proposals)
            .await
            .unwrap(),
        AnalysisPayload::Ready { .. }
    ));
    assert_eq!(coordinator.metrics().dispatched, 1);
    assert_eq!(coordinator.metrics().completed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deleted_conference_makes_the_task_give_up_quietly() {
    let store = Arc::new(InMemoryReviewStore::new());
    let cache = Arc::new(InMemoryCacheStore::new());
    let coordinator = AnalysisCoordinator::new(
        store.clone(),
        cache.clone(),
        Arc::new(TokioTaskRunner::new()),
        Arc::new(KeywordAnalyzer::default()),
        AnalysisTtls::default(),
    );

    // Conference id that was never inserted (or was deleted since dispatch).
    let ghost = new_entity_id();
    coordinator
        .fetch_or_compute(ghost, ReviewSessionType::Proposals, false)
        .await
        .unwrap();

    // The lock is released and nothing is cached - not even an error.
    for _ in 0..200 {
        if coordinator
            .check(ghost, ReviewSessionType::Proposals)
            .await
            .unwrap()
            == AnalysisPayload::Empty
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("lock was never cleaned up");
}

// ============================================================================
// P5: DETERMINISTIC RECAP ORDERING
// ============================================================================

#[test]
fn recap_orders_by_mean_descending_with_unreviewed_last() {
    let fixture = grants_fixture();
    let registry = AdapterRegistry::standard();
    let adapter = registry.for_session(&fixture.session).unwrap();

    let g1 = grant(&fixture.conference, "G1", Some("IT"));
    let g2 = grant(&fixture.conference, "G2", Some("FR"));
    let g3 = grant(&fixture.conference, "G3", Some("DE"));
    for g in [&g1, &g2, &g3] {
        fixture.store.grant_insert(g).unwrap();
    }

    // G1: scores 2 and 3 (mean 2.5); G2: score 1; G3: unreviewed.
    for (target, value) in [
        (ReviewTarget::Grant(g1.grant_id), 2),
        (ReviewTarget::Grant(g1.grant_id), 3),
        (ReviewTarget::Grant(g2.grant_id), 1),
    ] {
        fixture
            .store
            .user_review_upsert(&review(
                &fixture.session,
                new_entity_id(),
                target,
                option_with_value(&fixture.options, value),
            ))
            .unwrap();
    }

    let items = adapter
        .recap_items(fixture.store.as_ref(), &fixture.session)
        .unwrap();
    let ids: Vec<_> = items.iter().map(|i| i.item_id).collect();
    assert_eq!(ids, vec![g1.grant_id, g2.grant_id, g3.grant_id]);
    assert_eq!(items[0].score.mean, Some(2.5));
    assert_eq!(items[0].score.vote_count, 2);
    assert_eq!(items[1].score.mean, Some(1.0));
    assert_eq!(items[2].score.mean, None);

    // Same inputs, same order, every time.
    for _ in 0..5 {
        let again = adapter
            .recap_items(fixture.store.as_ref(), &fixture.session)
            .unwrap();
        let again_ids: Vec<_> = again.iter().map(|i| i.item_id).collect();
        assert_eq!(again_ids, ids);
    }
}

#[test]
fn grant_ties_prefer_reviewer_agreement() {
    let fixture = grants_fixture();
    let registry = AdapterRegistry::standard();
    let adapter = registry.for_session(&fixture.session).unwrap();

    // Same mean 2.0: spread scores {1,3} vs agreeing scores {2,2}.
    let spread = grant(&fixture.conference, "spread", None);
    let agreed = grant(&fixture.conference, "agreed", None);
    for g in [&spread, &agreed] {
        fixture.store.grant_insert(g).unwrap();
    }
    for (g, values) in [(&spread, [1, 3]), (&agreed, [2, 2])] {
        for value in values {
            fixture
                .store
                .user_review_upsert(&review(
                    &fixture.session,
                    new_entity_id(),
                    ReviewTarget::Grant(g.grant_id),
                    option_with_value(&fixture.options, value),
                ))
                .unwrap();
        }
    }

    let items = adapter
        .recap_items(fixture.store.as_ref(), &fixture.session)
        .unwrap();
    assert_eq!(items[0].item_id, agreed.grant_id);
    assert_eq!(items[1].item_id, spread.grant_id);
}

// ============================================================================
// P7 AND DECISION PROCESSING
// ============================================================================

#[test]
fn noop_decision_clears_pending_and_leaves_money_alone() {
    let fixture = grants_fixture();
    let registry = AdapterRegistry::standard();
    let adapter = registry.for_session(&fixture.session).unwrap();

    let category = reimbursement_category(&fixture.conference, "Travel", 40_000);
    fixture
        .store
        .reimbursement_category_insert(&category)
        .unwrap();
    let mut g = grant(&fixture.conference, "Dana", Some("BR"));
    g.status = GrantStatus::Approved;
    g.pending_status = Some(GrantStatus::Rejected);
    fixture.store.grant_insert(&g).unwrap();

    // Existing reimbursement from a previous approval round.
    fixture
        .store
        .apply_recap_batch(plenum_storage::RecapBatch {
            reimbursement_upserts: vec![plenum_storage::ReimbursementUpsert {
                grant_id: g.grant_id,
                category_id: category.category_id,
                amount_cents: 40_000,
            }],
            ..Default::default()
        })
        .unwrap();

    // Decision equals the current status: a no-op signal.
    let outcome = adapter
        .process_recap_decisions(
            fixture.store.as_ref(),
            &fixture.session,
            &[RecapDecisionRequest {
                item_id: g.grant_id,
                decision: Some("approved".to_string()),
                reimbursement_category_ids: vec![],
                notes: None,
            }],
        )
        .unwrap();

    assert_eq!(outcome.pending_cleared, 1);
    assert_eq!(outcome.pending_set, 0);
    assert_eq!(outcome.reimbursements_created, 0);
    assert_eq!(outcome.reimbursements_deleted, 0);

    let row = fixture.store.grant_get(g.grant_id).unwrap().unwrap();
    assert_eq!(row.pending_status, None);
    // Money untouched despite the empty category selection.
    let rows = fixture.store.reimbursements_by_grant(g.grant_id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].granted_amount_cents, 40_000);
}

#[test]
fn grant_approval_grants_category_caps_and_prunes_unselected() {
    let fixture = grants_fixture();
    let registry = AdapterRegistry::standard();
    let adapter = registry.for_session(&fixture.session).unwrap();

    let travel = reimbursement_category(&fixture.conference, "Travel", 40_000);
    let ticket = reimbursement_category(&fixture.conference, "Ticket", 15_000);
    for c in [&travel, &ticket] {
        fixture.store.reimbursement_category_insert(c).unwrap();
    }
    let g = grant(&fixture.conference, "Dana", Some("BR"));
    fixture.store.grant_insert(&g).unwrap();

    // Approve with both categories.
    let outcome = adapter
        .process_recap_decisions(
            fixture.store.as_ref(),
            &fixture.session,
            &[RecapDecisionRequest {
                item_id: g.grant_id,
                decision: Some("approved".to_string()),
                reimbursement_category_ids: vec![travel.category_id, ticket.category_id],
                notes: None,
            }],
        )
        .unwrap();
    assert_eq!(outcome.pending_set, 1);
    assert_eq!(outcome.reimbursements_created, 2);
    let rows = fixture.store.reimbursements_by_grant(g.grant_id).unwrap();
    assert_eq!(rows.len(), 2);
    let amounts: HashMap<_, _> = rows
        .iter()
        .map(|r| (r.category_id, r.granted_amount_cents))
        .collect();
    assert_eq!(amounts[&travel.category_id], 40_000);
    assert_eq!(amounts[&ticket.category_id], 15_000);

    // Approve again with only travel selected: ticket row is withdrawn.
    let outcome = adapter
        .process_recap_decisions(
            fixture.store.as_ref(),
            &fixture.session,
            &[RecapDecisionRequest {
                item_id: g.grant_id,
                decision: Some("approved".to_string()),
                reimbursement_category_ids: vec![travel.category_id],
                notes: None,
            }],
        )
        .unwrap();
    assert_eq!(outcome.reimbursements_updated, 1);
    assert_eq!(outcome.reimbursements_deleted, 1);
    let rows = fixture.store.reimbursements_by_grant(g.grant_id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category_id, travel.category_id);

    // A non-approved decision withdraws everything.
    adapter
        .process_recap_decisions(
            fixture.store.as_ref(),
            &fixture.session,
            &[RecapDecisionRequest {
                item_id: g.grant_id,
                decision: Some("rejected".to_string()),
                reimbursement_category_ids: vec![],
                notes: None,
            }],
        )
        .unwrap();
    assert!(fixture
        .store
        .reimbursements_by_grant(g.grant_id)
        .unwrap()
        .is_empty());

    // Every mutation left an audit trail.
    assert!(!fixture
        .store
        .audit_log_by_conference(fixture.conference.conference_id)
        .unwrap()
        .is_empty());
}

#[test]
fn absent_items_are_untouched_and_notes_travel_independently() {
    let fixture = grants_fixture();
    let registry = AdapterRegistry::standard();
    let adapter = registry.for_session(&fixture.session).unwrap();

    let decided = grant(&fixture.conference, "decided", None);
    let untouched = grant(&fixture.conference, "untouched", None);
    for g in [&decided, &untouched] {
        fixture.store.grant_insert(g).unwrap();
    }

    let outcome = adapter
        .process_recap_decisions(
            fixture.store.as_ref(),
            &fixture.session,
            &[
                RecapDecisionRequest {
                    item_id: decided.grant_id,
                    decision: Some("waiting_list".to_string()),
                    reimbursement_category_ids: vec![],
                    notes: None,
                },
                // Notes-only request: no decision at all.
                RecapDecisionRequest {
                    item_id: untouched.grant_id,
                    decision: None,
                    reimbursement_category_ids: vec![],
                    notes: Some("strong application, revisit".to_string()),
                },
            ],
        )
        .unwrap();
    assert_eq!(outcome.pending_set, 1);
    assert_eq!(outcome.notes_updated, 1);

    let decided_row = fixture.store.grant_get(decided.grant_id).unwrap().unwrap();
    assert_eq!(decided_row.pending_status, Some(GrantStatus::WaitingList));
    let untouched_row = fixture
        .store
        .grant_get(untouched.grant_id)
        .unwrap()
        .unwrap();
    assert_eq!(untouched_row.pending_status, None);
    assert_eq!(untouched_row.internal_notes, "strong application, revisit");
}

#[test]
fn invalid_decision_rejects_the_whole_request() {
    let fixture = grants_fixture();
    let registry = AdapterRegistry::standard();
    let adapter = registry.for_session(&fixture.session).unwrap();

    let g = grant(&fixture.conference, "Dana", None);
    fixture.store.grant_insert(&g).unwrap();

    // "confirmed" is a real status but not a recap decision.
    let result = adapter.process_recap_decisions(
        fixture.store.as_ref(),
        &fixture.session,
        &[
            RecapDecisionRequest {
                item_id: g.grant_id,
                decision: Some("approved".to_string()),
                reimbursement_category_ids: vec![],
                notes: None,
            },
            RecapDecisionRequest {
                item_id: g.grant_id,
                decision: Some("confirmed".to_string()),
                reimbursement_category_ids: vec![],
                notes: None,
            },
        ],
    );
    assert!(result.is_err());
    // Atomicity: the valid first decision was not applied either.
    assert_eq!(
        fixture
            .store
            .grant_get(g.grant_id)
            .unwrap()
            .unwrap()
            .pending_status,
        None
    );
}

// ============================================================================
// P8: LOAD-BALANCED NEXT-ITEM SELECTION
// ============================================================================

#[test]
fn sequential_selection_stays_within_one_vote_of_the_minimum() {
    let fixture = grants_fixture();
    let registry = AdapterRegistry::standard();
    let adapter = registry.for_session(&fixture.session).unwrap();

    let grants: Vec<_> = (0..5)
        .map(|i| grant(&fixture.conference, &format!("G{}", i), None))
        .collect();
    for g in &grants {
        fixture.store.grant_insert(g).unwrap();
    }

    let mut rng = seeded_rng(42);
    let mut votes: HashMap<_, usize> = grants.iter().map(|g| (g.grant_id, 0)).collect();

    for _ in 0..23 {
        let picked = adapter
            .next_to_review(
                fixture.store.as_ref(),
                &fixture.session,
                new_entity_id(), // fresh reviewer each round
                &NextItemOptions::default(),
                &mut rng,
            )
            .unwrap()
            .expect("eligible item");
        fixture
            .store
            .user_review_upsert(&review(
                &fixture.session,
                new_entity_id(),
                ReviewTarget::Grant(picked),
                option_with_value(&fixture.options, 2),
            ))
            .unwrap();
        *votes.get_mut(&picked).unwrap() += 1;

        let max = votes.values().max().unwrap();
        let min = votes.values().min().unwrap();
        assert!(
            max - min <= 1,
            "coverage drifted: max {} min {} after {:?}",
            max,
            min,
            votes
        );
    }
    // 23 picks over 5 items: every item was seen at least 4 times.
    assert!(votes.values().all(|v| *v >= 4));
}

#[test]
fn selection_excludes_reviewed_skipped_and_seen_items() {
    let fixture = grants_fixture();
    let registry = AdapterRegistry::standard();
    let adapter = registry.for_session(&fixture.session).unwrap();

    let grants: Vec<_> = (0..3)
        .map(|i| grant(&fixture.conference, &format!("G{}", i), None))
        .collect();
    for g in &grants {
        fixture.store.grant_insert(g).unwrap();
    }
    let reviewer = new_entity_id();
    fixture
        .store
        .user_review_upsert(&review(
            &fixture.session,
            reviewer,
            ReviewTarget::Grant(grants[0].grant_id),
            option_with_value(&fixture.options, 1),
        ))
        .unwrap();

    let mut rng = seeded_rng(1);
    let picked = adapter
        .next_to_review(
            fixture.store.as_ref(),
            &fixture.session,
            reviewer,
            &NextItemOptions {
                skip_item: Some(grants[1].grant_id),
                exclude_tags: vec![],
                seen: vec![],
            },
            &mut rng,
        )
        .unwrap();
    // Already-reviewed grants[0] and skipped grants[1] are out.
    assert_eq!(picked, Some(grants[2].grant_id));

    let picked = adapter
        .next_to_review(
            fixture.store.as_ref(),
            &fixture.session,
            reviewer,
            &NextItemOptions {
                skip_item: Some(grants[1].grant_id),
                exclude_tags: vec![],
                seen: vec![grants[2].grant_id],
            },
            &mut rng,
        )
        .unwrap();
    assert_eq!(picked, None);
}

#[test]
fn proposal_selection_honors_tag_exclusions() {
    let store = Arc::new(InMemoryReviewStore::new());
    let conf = conference();
    store.conference_insert(&conf).unwrap();
    let session = review_session(&conf, ReviewSessionType::Proposals, ReviewSessionStatus::Open);
    store.review_session_insert(&session).unwrap();

    let web = submission(&conf, new_entity_id(), "Web things", &["web"]);
    let data = submission(&conf, new_entity_id(), "Data things", &["data"]);
    store.submission_insert(&web).unwrap();
    store.submission_insert(&data).unwrap();

    let registry = AdapterRegistry::standard();
    let adapter = registry.for_session(&session).unwrap();
    let mut rng = seeded_rng(3);
    let picked = adapter
        .next_to_review(
            store.as_ref(),
            &session,
            new_entity_id(),
            &NextItemOptions {
                skip_item: None,
                exclude_tags: vec!["web".to_string()],
                seen: vec![],
            },
            &mut rng,
        )
        .unwrap();
    assert_eq!(picked, Some(data.submission_id));
}
