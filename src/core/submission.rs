//! Submission business logic - intake and the FIFO status workflow.
//!
//! A submission is born `waiting` with a freshly minted sequence token and
//! then only moves along the fixed edge set below. Transitions are applied
//! as a compare-and-swap on the current status, so two racing operators can
//! never both "win" the same edge; the loser observes the state the winner
//! left behind. Entering a terminal state emits an advisory next-in-line
//! event for the notification channel - a read, never a mutation.

use crate::{
    core::sequence,
    entities::{Submission, submission},
    errors::{Error, Result},
    notify::{NotificationGateway, WorkflowEvent},
};
use chrono::Utc;
use sea_orm::{
    DatabaseConnection, DbErr, QueryOrder, Set, prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument, warn};

/// Workflow status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Newly arrived, nobody has reached out yet
    Waiting,
    /// An operator has contacted the submitter
    Contacted,
    /// The request was fulfilled (terminal)
    Completed,
    /// The request was withdrawn or abandoned (terminal)
    Cancelled,
}

impl SubmissionStatus {
    /// Stable string representation, as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Contacted => "contacted",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a stored status string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(Self::Waiting),
            "contacted" => Some(Self::Contacted),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether this status has no outgoing edges.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The legal edge set. Re-applying the current status is not an edge.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Contacted | Self::Cancelled)
                | (Self::Contacted, Self::Completed | Self::Cancelled)
        )
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact details carried by an incoming submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    /// Submitter's name
    pub name: String,
    /// Phone number (this or email must be present)
    #[serde(default)]
    pub phone: String,
    /// Email address (this or phone must be present)
    #[serde(default)]
    pub email: String,
    /// Optional freeform note
    #[serde(default)]
    pub note: Option<String>,
}

impl ContactDetails {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation {
                message: "contact name cannot be empty".to_string(),
            });
        }
        if self.phone.trim().is_empty() && self.email.trim().is_empty() {
            return Err(Error::Validation {
                message: "at least one of phone or email is required".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_stored_status(submission: &submission::Model) -> Result<SubmissionStatus> {
    SubmissionStatus::parse(&submission.status).ok_or_else(|| {
        Error::Database(DbErr::Custom(format!(
            "submission {} carries unknown status '{}'",
            submission.id, submission.status
        )))
    })
}

/// Accepts a new form submission.
///
/// Mints the next sequence token for the category, persists the submission
/// as `waiting`, and hands a received-event to the notification channel.
/// Channel failure is logged and leaves `notification_sent` false; the
/// submission itself is never lost over a channel outage.
#[instrument(skip(db, gateway, contact), fields(contact_name = %contact.name))]
pub async fn create_submission(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    category: &str,
    contact: ContactDetails,
) -> Result<submission::Model> {
    contact.validate()?;
    let token = sequence::next_token(db, category).await?;

    let now = Utc::now();
    let created = submission::ActiveModel {
        token: Set(token),
        category: Set(category.to_string()),
        contact_name: Set(contact.name.trim().to_string()),
        contact_phone: Set(contact.phone.trim().to_string()),
        contact_email: Set(contact.email.trim().to_string()),
        note: Set(contact.note),
        status: Set(SubmissionStatus::Waiting.as_str().to_string()),
        submitted_at: Set(now),
        updated_at: Set(now),
        notification_sent: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(submission_id = created.id, token = %created.token, "Submission accepted");

    let event = WorkflowEvent::SubmissionReceived {
        submission_id: created.id,
        token: created.token.clone(),
        category: created.category.clone(),
        contact_name: created.contact_name.clone(),
    };
    if let Err(e) = gateway.notify(event).await {
        warn!(submission_id = created.id, error = %e, "Intake notification failed");
        return Ok(created);
    }

    let mut model: submission::ActiveModel = created.into();
    model.notification_sent = Set(true);
    Ok(model.update(db).await?)
}

/// Fetches a submission by id.
pub async fn get_submission(db: &DatabaseConnection, id: i64) -> Result<submission::Model> {
    Submission::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::SubmissionNotFound { id })
}

/// Returns the oldest still-waiting submission in a category, if any.
///
/// Strict FIFO: earliest `submitted_at` wins, ties broken by insertion order
/// (ascending id). An empty queue is a normal outcome, not an error.
#[instrument(skip(db))]
pub async fn next_waiting(
    db: &DatabaseConnection,
    category: &str,
) -> Result<Option<submission::Model>> {
    if !sequence::is_known_category(category) {
        return Err(Error::InvalidCategory {
            category: category.to_string(),
        });
    }

    Submission::find()
        .filter(submission::Column::Category.eq(category))
        .filter(submission::Column::Status.eq(SubmissionStatus::Waiting.as_str()))
        .order_by_asc(submission::Column::SubmittedAt)
        .order_by_asc(submission::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists submissions, optionally narrowed by category and/or status,
/// oldest first.
pub async fn list_submissions(
    db: &DatabaseConnection,
    category: Option<&str>,
    status: Option<SubmissionStatus>,
) -> Result<Vec<submission::Model>> {
    let mut query = Submission::find()
        .order_by_asc(submission::Column::SubmittedAt)
        .order_by_asc(submission::Column::Id);
    if let Some(category) = category {
        query = query.filter(submission::Column::Category.eq(category));
    }
    if let Some(status) = status {
        query = query.filter(submission::Column::Status.eq(status.as_str()));
    }
    query.all(db).await.map_err(Into::into)
}

/// Moves a submission along one workflow edge.
///
/// The edge is validated against the observed status, then applied as a
/// compare-and-swap on that status. If a racing transition got there first,
/// the request is re-validated against the state the winner left, so the
/// caller always gets an accurate `IllegalTransition`. Entering a terminal
/// state hands the next waiting submission (if any) to the notification
/// channel as an advisory signal.
#[instrument(skip(db, gateway))]
pub async fn transition(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    id: i64,
    target: SubmissionStatus,
) -> Result<submission::Model> {
    let current_model = get_submission(db, id).await?;
    let current = parse_stored_status(&current_model)?;

    if !current.can_transition_to(target) {
        return Err(Error::IllegalTransition {
            from: current.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }

    let swapped = Submission::update_many()
        .col_expr(submission::Column::Status, Expr::value(target.as_str()))
        .col_expr(submission::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(submission::Column::Id.eq(id))
        .filter(submission::Column::Status.eq(current.as_str()))
        .exec(db)
        .await?;

    if swapped.rows_affected == 0 {
        // A racing transition won; report against the status it left behind.
        let observed = get_submission(db, id).await?;
        return Err(Error::IllegalTransition {
            from: observed.status,
            to: target.as_str().to_string(),
        });
    }

    let updated = get_submission(db, id).await?;
    info!(
        submission_id = id,
        from = %current,
        to = %target,
        "Submission transitioned"
    );

    if target.is_terminal() {
        advise_next_in_line(db, gateway, &updated.category).await;
    }

    Ok(updated)
}

/// Looks up the next waiting submission and hands it to the channel.
/// Purely advisory: lookup or delivery failure is logged, never surfaced.
async fn advise_next_in_line(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    category: &str,
) {
    match next_waiting(db, category).await {
        Ok(Some(next)) => {
            let event = WorkflowEvent::NextInLine {
                submission_id: next.id,
                token: next.token.clone(),
                category: next.category.clone(),
            };
            if let Err(e) = gateway.notify(event).await {
                warn!(category, error = %e, "Next-in-line notification failed");
            }
        }
        Ok(None) => {}
        Err(e) => warn!(category, error = %e, "Next-in-line lookup failed"),
    }
}
