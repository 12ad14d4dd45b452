//! Notification gateway seam - events out, callbacks in.
//!
//! The concrete notification channel (the thing that renders human-readable
//! messages with buttons) lives outside this system. This module defines the
//! events it receives, the trait it implements, and the translation of its
//! button-style callbacks back into workflow transitions. Callbacks go
//! through the exact same `core::submission::transition` call the HTTP
//! status endpoint uses - one code path, two entry points.

use crate::core::submission::SubmissionStatus;
use crate::entities::submission;
use crate::errors::Result;
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A workflow event handed to the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum WorkflowEvent {
    /// A new submission arrived and is waiting.
    #[serde(rename_all = "camelCase")]
    SubmissionReceived {
        /// Id of the new submission
        submission_id: i64,
        /// Its assigned sequence token
        token: String,
        /// Its category
        category: String,
        /// Who submitted it
        contact_name: String,
    },
    /// Advisory signal: after a submission reached a terminal state, this is
    /// the oldest one still waiting in the same category.
    #[serde(rename_all = "camelCase")]
    NextInLine {
        /// Id of the next waiting submission
        submission_id: i64,
        /// Its sequence token
        token: String,
        /// Its category
        category: String,
    },
}

/// The outbound half of the notification channel.
///
/// Implementations must be cheap to call from request handlers; delivery
/// failures are reported, never panicked, and callers treat them as
/// non-fatal.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Delivers one workflow event to the channel.
    async fn notify(&self, event: WorkflowEvent) -> Result<()>;
}

/// Default gateway: emits events as structured log lines.
///
/// Stands in for the real channel, which is an external collaborator. Useful
/// in development and as the fallback when no channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogGateway;

#[async_trait]
impl NotificationGateway for LogGateway {
    async fn notify(&self, event: WorkflowEvent) -> Result<()> {
        match &event {
            WorkflowEvent::SubmissionReceived {
                submission_id,
                token,
                category,
                contact_name,
            } => info!(
                submission_id,
                token, category, contact_name, "Workflow event: submission received"
            ),
            WorkflowEvent::NextInLine {
                submission_id,
                token,
                category,
            } => info!(
                submission_id,
                token, category, "Workflow event: next in line"
            ),
        }
        Ok(())
    }
}

/// A button-style action the channel can send back for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallbackAction {
    /// The operator reached out to the submitter
    MarkContacted,
    /// The request was fulfilled
    MarkCompleted,
    /// The request was withdrawn or abandoned
    MarkCancelled,
}

impl CallbackAction {
    /// The workflow status this action requests.
    #[must_use]
    pub const fn target_status(self) -> SubmissionStatus {
        match self {
            Self::MarkContacted => SubmissionStatus::Contacted,
            Self::MarkCompleted => SubmissionStatus::Completed,
            Self::MarkCancelled => SubmissionStatus::Cancelled,
        }
    }
}

/// Applies an inbound channel callback as a workflow transition.
///
/// # Errors
/// Propagates exactly what [`crate::core::submission::transition`] reports,
/// including `IllegalTransition` when the button is stale.
pub async fn apply_callback(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    submission_id: i64,
    action: CallbackAction,
) -> Result<submission::Model> {
    info!(submission_id, ?action, "Applying notification callback");
    crate::core::submission::transition(db, gateway, submission_id, action.target_status()).await
}
