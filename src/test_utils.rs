//! Shared test utilities for formgate.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults, plus gateway doubles
//! for asserting on workflow events.

use crate::{
    config::database::create_tables,
    core::{access_key::RoleTag, submission::ContactDetails, submission::SubmissionStatus},
    entities::{access_key, group, submission},
    errors::{Error, Result},
    notify::{NotificationGateway, WorkflowEvent},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
///
/// The pool is pinned to a single connection so every query - including the
/// concurrent ones in the contention tests - sees the same in-memory
/// database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await?;
    create_tables(&db).await?;
    Ok(db)
}

/// Creates an active test group with the given name.
pub async fn create_test_group(db: &DatabaseConnection, name: &str) -> Result<group::Model> {
    crate::core::group::create_group(db, name.to_string()).await
}

/// Inserts a test access key directly, bypassing the generation loop, so
/// tests control the expiry and cap exactly.
///
/// # Defaults
/// * `secret_value`: derived from the key count (unique per test database)
/// * `active`: true
/// * `usage_count`: 0
pub async fn create_test_key(
    db: &DatabaseConnection,
    owner_group_id: i64,
    role_tag: RoleTag,
    expires_at: Option<DateTime<Utc>>,
    max_uses: Option<i64>,
) -> Result<access_key::Model> {
    use sea_orm::EntityTrait;
    let existing = crate::entities::AccessKey::find().all(db).await?.len();
    let secret_value = format!("TEST-KEY{existing:04}-AAAA-BBBB");

    access_key::ActiveModel {
        display_name: Set(format!("Test key {existing}")),
        secret_value: Set(secret_value),
        owner_group_id: Set(owner_group_id),
        role_tag: Set(role_tag.as_str().to_string()),
        expires_at: Set(expires_at),
        max_uses: Set(max_uses),
        usage_count: Set(0),
        active: Set(true),
        created_by: Set("test-admin".to_string()),
        metadata: Set(serde_json::json!({})),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Contact details with sensible defaults for intake tests.
pub fn test_contact(name: &str) -> ContactDetails {
    ContactDetails {
        name: name.to_string(),
        phone: "010-0000-0000".to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        note: None,
    }
}

/// Inserts a waiting submission directly with an explicit `submitted_at`,
/// for FIFO-ordering tests that need controlled timestamps.
pub async fn insert_submission_at(
    db: &DatabaseConnection,
    category: &str,
    token: &str,
    submitted_at: DateTime<Utc>,
) -> Result<submission::Model> {
    submission::ActiveModel {
        token: Set(token.to_string()),
        category: Set(category.to_string()),
        contact_name: Set("Test Contact".to_string()),
        contact_phone: Set("010-0000-0000".to_string()),
        contact_email: Set("test@example.com".to_string()),
        note: Set(None),
        status: Set(SubmissionStatus::Waiting.as_str().to_string()),
        submitted_at: Set(submitted_at),
        updated_at: Set(submitted_at),
        notification_sent: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Gateway double that records every event it is handed.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingGateway {
    /// A snapshot of the events delivered so far.
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events.lock().expect("event lock poisoned").clone()
    }

    /// Forgets previously delivered events.
    pub fn clear(&self) {
        self.events.lock().expect("event lock poisoned").clear();
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn notify(&self, event: WorkflowEvent) -> Result<()> {
        self.events.lock().expect("event lock poisoned").push(event);
        Ok(())
    }
}

/// Gateway double that always fails delivery, for outage tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingGateway;

#[async_trait]
impl NotificationGateway for FailingGateway {
    async fn notify(&self, _event: WorkflowEvent) -> Result<()> {
        Err(Error::Gateway {
            message: "channel unreachable".to_string(),
        })
    }
}
