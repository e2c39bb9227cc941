//! Grant summary endpoint: dense recap statistics over one conference.

use axum::extract::{Path, State};
use axum::Json;
use plenum_review::{grant_summary, GrantSummary};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /admin/conferences/{id}/grants/summary
pub async fn get_grant_summary(
    State(state): State<AppState>,
    Path(conference_id): Path<Uuid>,
) -> ApiResult<Json<GrantSummary>> {
    let store = state.store.as_ref();
    if store.conference_get(conference_id)?.is_none() {
        return Err(ApiError::entity_not_found(format!(
            "Conference {} not found",
            conference_id
        )));
    }

    let grants = store.grants_by_conference(conference_id)?;
    let reimbursements = store.reimbursements_by_conference(conference_id)?;
    let speakers: HashSet<_> = store
        .submissions_by_conference(conference_id)?
        .into_iter()
        .map(|s| s.speaker_id)
        .collect();

    Ok(Json(grant_summary(&grants, &reimbursements, &speakers)))
}
