//! HTTP request layer - routers, shared state, and error mapping.
//!
//! Handlers are thin wrappers over `core`: they deserialize, delegate, and
//! map the crate error taxonomy onto status codes. Domain denials on the
//! public validate endpoint are plain 200 responses; only infrastructure
//! failures cross the boundary as opaque 500s.

/// Access key endpoints (public validate + administrative management)
pub mod access_keys;
/// Static-credential gate for the administrative endpoints
pub mod auth;
/// Group endpoints (administrative)
pub mod groups;
/// Submission intake, queue, and workflow endpoints
pub mod submissions;

use crate::errors::Error;
use crate::notify::NotificationGateway;
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection for all store operations
    pub db: DatabaseConnection,
    /// Outbound notification channel
    pub gateway: Arc<dyn NotificationGateway>,
    /// Static credential required on administrative endpoints
    pub admin_token: String,
}

impl AppState {
    /// Creates the shared request state.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn NotificationGateway>,
        admin_token: String,
    ) -> Self {
        Self {
            db,
            gateway,
            admin_token,
        }
    }
}

/// Builds the full application router.
///
/// Public surface: key validation, submission intake, the queue/status
/// workflow, and the notification channel's callback entry point.
/// Administrative surface (behind the `X-Admin-Token` check): key and group
/// management plus the submission listing.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/access-keys",
            post(access_keys::create).get(access_keys::list),
        )
        .route("/access-keys/bulk", post(access_keys::bulk_create))
        .route("/access-keys/:id/deactivate", patch(access_keys::deactivate))
        .route("/access-keys/:id/reactivate", patch(access_keys::reactivate))
        .route("/access-keys/:id", delete(access_keys::remove))
        .route("/groups", post(groups::create))
        .route("/groups/:id/deactivate", patch(groups::deactivate))
        .route("/groups/:id", delete(groups::remove))
        .route("/submissions", get(submissions::list))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/access-keys/validate", post(access_keys::validate))
        .route("/submissions", post(submissions::create))
        // Static segment first: keeps the category route from clashing with
        // the :id parameter used by the status route.
        .route("/submissions/next/:category", get(submissions::next_waiting))
        .route("/submissions/:id/status", patch(submissions::set_status))
        .route("/notifications/callback", post(submissions::callback))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error wrapper that maps the crate taxonomy onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl From<ApiError> for Error {
    fn from(error: ApiError) -> Self {
        error.0
    }
}

impl ApiError {
    /// The status code this error maps to.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::Validation { .. }
            | Error::InvalidCategory { .. }
            | Error::IllegalTransition { .. } => StatusCode::BAD_REQUEST,
            Error::KeyNotFound { .. }
            | Error::GroupNotFound { .. }
            | Error::SubmissionNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Infrastructure failures stay opaque; domain failures carry their
        // specific reason string.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "Request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Convenience result type for request handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
