//! Submission intake, queue, and workflow endpoints.

use super::{ApiResult, AppState};
use crate::core::submission::{self, ContactDetails, SubmissionStatus};
use crate::entities::submission::Model as SubmissionModel;
use crate::notify::{self, CallbackAction};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

/// Body of an intake request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    /// Which queue the submission joins
    pub category: String,
    /// Who to reach and how
    #[serde(flatten)]
    pub contact: ContactDetails,
}

/// Accepts a new submission, assigns its tracking token, and emits the
/// received notification.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateSubmissionRequest>,
) -> ApiResult<(StatusCode, Json<SubmissionModel>)> {
    let created = submission::create_submission(
        &state.db,
        state.gateway.as_ref(),
        &request.category,
        request.contact,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Returns the oldest still-waiting submission in a category.
///
/// An empty queue is a successful `null` response, not an error.
pub async fn next_waiting(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<Json<Option<SubmissionModel>>> {
    let next = submission::next_waiting(&state.db, &category).await?;
    Ok(Json(next))
}

/// Body of a status change request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    /// Desired status
    pub target: SubmissionStatus,
}

/// Moves a submission along the workflow.
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<SetStatusRequest>,
) -> ApiResult<Json<SubmissionModel>> {
    let updated =
        submission::transition(&state.db, state.gateway.as_ref(), id, request.target).await?;
    Ok(Json(updated))
}

/// Query parameters for the submission listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Restrict to one category
    pub category: Option<String>,
    /// Restrict to one workflow status
    pub status: Option<SubmissionStatus>,
}

/// Lists submissions in arrival order, optionally filtered.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<SubmissionModel>>> {
    let rows =
        submission::list_submissions(&state.db, query.category.as_deref(), query.status).await?;
    Ok(Json(rows))
}

/// Body of an inbound notification-channel callback.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    /// Which submission the operator acted on
    pub submission_id: i64,
    /// What the operator chose
    pub action: CallbackAction,
}

/// Applies an operator action arriving from the notification channel.
pub async fn callback(
    State(state): State<AppState>,
    Json(request): Json<CallbackRequest>,
) -> ApiResult<Json<SubmissionModel>> {
    let updated = notify::apply_callback(
        &state.db,
        state.gateway.as_ref(),
        request.submission_id,
        request.action,
    )
    .await?;
    Ok(Json(updated))
}
