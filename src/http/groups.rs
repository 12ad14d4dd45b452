//! Group endpoints (administrative only).

use super::{ApiResult, AppState};
use crate::core::group;
use crate::entities::group::Model as GroupModel;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

/// Body of a group creation request.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    /// Unique group name
    pub name: String,
}

/// Creates a group that keys can be issued under.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<GroupModel>)> {
    let created = group::create_group(&state.db, request.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// How many keys a group-level operation touched.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeOutcome {
    /// Keys affected alongside the group
    pub cascaded_keys: u64,
}

/// Deactivates a group and every key it owns.
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CascadeOutcome>> {
    let cascaded_keys = group::deactivate_group(&state.db, id).await?;
    Ok(Json(CascadeOutcome { cascaded_keys }))
}

/// Deletes a group along with its keys.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CascadeOutcome>> {
    let cascaded_keys = group::delete_group(&state.db, id).await?;
    Ok(Json(CascadeOutcome { cascaded_keys }))
}
