//! Submission entity - Incoming form submissions and their workflow status.
//!
//! Each submission carries a unique sequence token assigned at creation and a
//! status that only moves along the workflow edges in `core::submission`.
//! Submissions are never deleted; terminal rows stay as the audit trail.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Submission database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    /// Unique identifier for the submission
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable sequence token (e.g. `"DEMO-042"`), immutable once assigned
    #[sea_orm(unique)]
    pub token: String,
    /// Submission category (one of the fixed known set)
    pub category: String,
    /// Name of the person submitting the form
    pub contact_name: String,
    /// Contact phone number
    pub contact_phone: String,
    /// Contact email address
    pub contact_email: String,
    /// Optional freeform note from the submitter
    pub note: Option<String>,
    /// Workflow status: `"waiting"`, `"contacted"`, `"completed"`, or `"cancelled"`
    pub status: String,
    /// When the submission arrived; FIFO ordering key
    pub submitted_at: DateTimeUtc,
    /// When the status last changed
    pub updated_at: DateTimeUtc,
    /// Whether the notification channel acknowledged the intake event
    pub notification_sent: bool,
}

/// `Submission` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
