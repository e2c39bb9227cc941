//! Per-item review endpoints: item context for one reviewer and
//! next-to-review selection.

use axum::extract::{Path, Query, State};
use axum::Json;
use plenum_core::{new_entity_id, ReviewError, ReviewTarget, UserReview};
use plenum_review::{NextItemOptions, ReviewHints, ReviewItemContext};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::recap::load_session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn parse_uuid_list(raw: &Option<String>) -> ApiResult<Vec<Uuid>> {
    raw.as_deref()
        .unwrap_or_default()
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.trim()
                .parse()
                .map_err(|_| ApiError::invalid_input(format!("Invalid id: {}", part)))
        })
        .collect()
}

fn parse_tag_list(raw: &Option<String>) -> Vec<String> {
    raw.as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn require_reviewer(reviewer_id: Option<Uuid>) -> ApiResult<Uuid> {
    reviewer_id.ok_or_else(|| ApiError::invalid_input("reviewer_id query parameter is required"))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewContextQuery {
    pub reviewer_id: Option<Uuid>,
    /// Unsaved comment draft, echoed back for optimistic UI state.
    pub comment: Option<String>,
    /// Comma-separated tags the reviewer opted out of.
    pub exclude: Option<String>,
    /// Comma-separated item ids already shown this browsing session.
    pub seen: Option<String>,
}

/// GET /admin/review-sessions/{id}/items/{item_id}
pub async fn get_review_context(
    State(state): State<AppState>,
    Path((session_id, item_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ReviewContextQuery>,
) -> ApiResult<Json<ReviewItemContext>> {
    let session = load_session(state.store.as_ref(), session_id)?;
    let reviewer_id = require_reviewer(query.reviewer_id)?;
    let hints = ReviewHints {
        comment_draft: query.comment.clone(),
        excluded_tags: parse_tag_list(&query.exclude),
        seen: parse_uuid_list(&query.seen)?,
    };
    let adapter = state.registry.for_session(&session)?;
    let context =
        adapter.review_context(state.store.as_ref(), &session, item_id, reviewer_id, &hints)?;
    Ok(Json(context))
}

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub reviewer_id: Uuid,
    pub score_option_id: Uuid,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub private_comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitReviewResponse {
    pub review_id: Uuid,
}

/// POST /admin/review-sessions/{id}/items/{item_id}
///
/// Upserts the caller's review of one item: a reviewer scoring the same item
/// twice updates their earlier review instead of adding a second one.
pub async fn post_review(
    State(state): State<AppState>,
    Path((session_id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SubmitReviewRequest>,
) -> ApiResult<Json<SubmitReviewResponse>> {
    let session = load_session(state.store.as_ref(), session_id)?;
    let adapter = state.registry.for_session(&session)?;

    let options = state.store.score_options_by_session(session_id)?;
    if !options
        .iter()
        .any(|option| option.option_id == request.score_option_id)
    {
        return Err(plenum_core::PlenumError::from(ReviewError::ForeignScoreOption {
            option_id: request.score_option_id,
            session_id,
        })
        .into());
    }

    let target = adapter.review_target(item_id);
    let item_exists = match target {
        ReviewTarget::Proposal(id) => state
            .store
            .submission_get(id)?
            .map(|s| s.conference_id == session.conference_id)
            .unwrap_or(false),
        ReviewTarget::Grant(id) => state
            .store
            .grant_get(id)?
            .map(|g| g.conference_id == session.conference_id)
            .unwrap_or(false),
    };
    if !item_exists {
        return Err(ApiError::item_not_found(item_id));
    }

    let review_id = state.store.user_review_upsert(&UserReview {
        review_id: new_entity_id(),
        review_session_id: session_id,
        reviewer_id: request.reviewer_id,
        target,
        score_option_id: request.score_option_id,
        comment: request.comment,
        private_comment: request.private_comment,
        created_at: chrono::Utc::now(),
    })?;
    Ok(Json(SubmitReviewResponse { review_id }))
}

#[derive(Debug, Default, Deserialize)]
pub struct NextItemQuery {
    pub reviewer_id: Option<Uuid>,
    /// Item the reviewer explicitly skipped.
    pub skip: Option<Uuid>,
    pub exclude: Option<String>,
    pub seen: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NextItemResponse {
    /// None when no eligible item remains.
    pub item_id: Option<Uuid>,
}

/// GET /admin/review-sessions/{id}/next
pub async fn get_next_item(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<NextItemQuery>,
) -> ApiResult<Json<NextItemResponse>> {
    let session = load_session(state.store.as_ref(), session_id)?;
    let reviewer_id = require_reviewer(query.reviewer_id)?;
    let opts = NextItemOptions {
        skip_item: query.skip,
        exclude_tags: parse_tag_list(&query.exclude),
        seen: parse_uuid_list(&query.seen)?,
    };
    let adapter = state.registry.for_session(&session)?;
    let item_id = adapter.next_to_review(
        state.store.as_ref(),
        &session,
        reviewer_id,
        &opts,
        &mut rand::rng(),
    )?;
    Ok(Json(NextItemResponse { item_id }))
}
