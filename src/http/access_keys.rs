//! Access key endpoints.
//!
//! `validate` is the single public entry point; everything else sits behind
//! the admin credential check in the router.

use super::{ApiResult, AppState};
use crate::core::access_key::{
    self, DurationPolicy, KeySpec, KeyView, RoleTag, UsagePolicy, ValidationOutcome,
};
use crate::entities::access_key::Model as AccessKeyModel;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

/// Default attribution when an issuing request names no operator.
const DEFAULT_CREATED_BY: &str = "admin-console";

/// Body of a validation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    /// The secret presented by the visitor
    pub secret_value: String,
    /// The role the visitor is trying to act as
    pub role_tag: RoleTag,
}

/// Validates a presented secret and meters usage on success.
///
/// Denials are plain 200 responses carrying `granted: false`; the reason
/// vocabulary deliberately says nothing about which keys exist.
pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> ApiResult<Json<ValidationOutcome>> {
    let outcome =
        access_key::validate_key(&state.db, &request.secret_value, request.role_tag).await?;
    Ok(Json(outcome))
}

/// Body of a single-key creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyRequest {
    /// Human-readable label
    pub display_name: String,
    /// Role the key is issued for
    pub role_tag: RoleTag,
    /// Group that owns the key
    pub owner_group_id: i64,
    /// Lifetime policy
    pub duration: DurationPolicy,
    /// Usage cap policy
    pub max_uses: UsagePolicy,
    /// Operator issuing the key
    #[serde(default)]
    pub created_by: Option<String>,
    /// Free-form annotations stored with the key
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Issues a single key with a freshly generated secret.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateKeyRequest>,
) -> ApiResult<(StatusCode, Json<AccessKeyModel>)> {
    let key = access_key::create_key(
        &state.db,
        request.display_name,
        request.role_tag,
        request.owner_group_id,
        request.duration,
        request.max_uses,
        request
            .created_by
            .unwrap_or_else(|| DEFAULT_CREATED_BY.to_string()),
        request.metadata.unwrap_or_else(|| serde_json::json!({})),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(key)))
}

/// Body of a bulk creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateRequest {
    /// Group that owns every key in the batch
    pub owner_group_id: i64,
    /// Lifetime policy shared by the batch
    pub duration: DurationPolicy,
    /// Usage cap policy shared by the batch
    pub max_uses: UsagePolicy,
    /// Operator issuing the batch
    #[serde(default)]
    pub created_by: Option<String>,
    /// Per-key name and role specs
    pub keys: Vec<KeySpec>,
}

/// Issues a batch of keys; per-key failures are reported alongside the
/// successes rather than aborting the batch.
pub async fn bulk_create(
    State(state): State<AppState>,
    Json(request): Json<BulkCreateRequest>,
) -> ApiResult<(StatusCode, Json<access_key::BulkOutcome>)> {
    let outcome = access_key::bulk_create_keys(
        &state.db,
        request.owner_group_id,
        request.duration,
        request.max_uses,
        request
            .created_by
            .unwrap_or_else(|| DEFAULT_CREATED_BY.to_string()),
        request.keys,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Query parameters for the key listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Restrict the listing to one group's keys
    pub owner_group_id: Option<i64>,
}

/// Lists keys with their status computed at request time.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<KeyView>>> {
    let keys = access_key::list_keys(&state.db, query.owner_group_id).await?;
    Ok(Json(keys))
}

/// Deactivates a key so validation denies it.
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<AccessKeyModel>> {
    let key = access_key::deactivate_key(&state.db, id).await?;
    Ok(Json(key))
}

/// Reactivates a previously deactivated key.
pub async fn reactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<AccessKeyModel>> {
    let key = access_key::reactivate_key(&state.db, id).await?;
    Ok(Json(key))
}

/// Permanently deletes a key.
pub async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    access_key::delete_key(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
