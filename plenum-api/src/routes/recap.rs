//! Recap endpoints: the staff-facing aggregate view, bulk decisions, and the
//! polled analysis state machine.

use axum::extract::{Path, Query, State};
use axum::Json;
use plenum_core::{AnalysisPayload, ReviewSession};
use plenum_review::{RecapContext, RecapDecisionRequest, RecapOutcome};
use plenum_storage::ReviewStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub(crate) fn load_session(
    store: &dyn ReviewStore,
    session_id: Uuid,
) -> ApiResult<ReviewSession> {
    store
        .review_session_get(session_id)?
        .ok_or_else(|| ApiError::session_not_found(session_id))
}

/// Recap response: either the shortlist, or the soft "not ready" state while
/// the session is still a draft. The latter is a normal waiting state, not an
/// error - pollers keep the same 200 path for both.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RecapResponse {
    NotReady { status: &'static str },
    Ready(Box<RecapContext>),
}

/// GET /admin/review-sessions/{id}/recap
pub async fn get_recap(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<RecapResponse>> {
    let session = load_session(state.store.as_ref(), session_id)?;
    if !session.recap_visible() {
        return Ok(Json(RecapResponse::NotReady {
            status: "not_ready",
        }));
    }
    let adapter = state.registry.for_session(&session)?;
    let context = adapter.recap_context(state.store.as_ref(), &session)?;
    Ok(Json(RecapResponse::Ready(Box::new(context))))
}

/// POST /admin/review-sessions/{id}/recap
pub async fn post_recap(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(decisions): Json<Vec<RecapDecisionRequest>>,
) -> ApiResult<Json<RecapOutcome>> {
    let session = load_session(state.store.as_ref(), session_id)?;
    if !session.recap_visible() {
        return Err(ApiError::state_conflict(
            "Recap decisions are not accepted while the session is a draft",
        ));
    }
    let adapter = state.registry.for_session(&session)?;
    let outcome = adapter.process_recap_decisions(state.store.as_ref(), &session, &decisions)?;
    tracing::info!(
        %session_id,
        pending_set = outcome.pending_set,
        pending_cleared = outcome.pending_cleared,
        reimbursements_created = outcome.reimbursements_created,
        reimbursements_deleted = outcome.reimbursements_deleted,
        "Applied recap decisions"
    );
    Ok(Json(outcome))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisQuery {
    /// `check=1`: read-only poll, never dispatches work.
    pub check: Option<String>,
    /// `recompute=1`: bypass the cached payload and recompute.
    pub recompute: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("1") | Some("true"))
}

/// GET /admin/review-sessions/{id}/recap/analysis?check=1|recompute=1
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<AnalysisQuery>,
) -> ApiResult<Json<AnalysisPayload>> {
    let session = load_session(state.store.as_ref(), session_id)?;
    let payload = if flag(&query.check) {
        state
            .coordinator
            .check(session.conference_id, session.session_type)
            .await?
    } else {
        state
            .coordinator
            .fetch_or_compute(
                session.conference_id,
                session.session_type,
                flag(&query.recompute),
            )
            .await?
    };
    Ok(Json(payload))
}
