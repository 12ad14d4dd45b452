//! Static-credential gate for the administrative endpoints.

use super::AppState;
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Header carrying the administrative credential.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Rejects requests whose `X-Admin-Token` header does not match the
/// configured credential.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    if provided == Some(state.admin_token.as_str()) {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "invalid admin credential" })),
        )
            .into_response()
    }
}
