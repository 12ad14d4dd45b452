//! Group business logic - owning organizations and their cascades.
//!
//! Deactivating or deleting a group must take its keys with it, and that
//! cascade is an explicit database transaction here rather than a store-side
//! trigger, so the multi-record update is all-or-nothing.

use crate::{
    entities::{AccessKey, Group, access_key, group},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// Creates a new group with a globally unique name.
///
/// # Errors
/// [`Error::Validation`] for an empty or already-taken name.
#[instrument(skip(db))]
pub async fn create_group(db: &DatabaseConnection, name: String) -> Result<group::Model> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "group name cannot be empty".to_string(),
        });
    }

    let inserted = group::ActiveModel {
        name: Set(name.clone()),
        active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(group) => {
            info!(group_id = group.id, name, "Created group");
            Ok(group)
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(Error::Validation {
                message: format!("group name '{name}' is already taken"),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Fetches a group by id.
pub async fn get_group(db: &DatabaseConnection, group_id: i64) -> Result<group::Model> {
    Group::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })
}

/// Deactivates a group and every key it owns, in one transaction.
///
/// Returns the number of keys that were flipped inactive alongside the group.
#[instrument(skip(db))]
pub async fn deactivate_group(db: &DatabaseConnection, group_id: i64) -> Result<u64> {
    let txn = db.begin().await?;

    let group = Group::find_by_id(group_id)
        .one(&txn)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })?;

    let mut model: group::ActiveModel = group.into();
    model.active = Set(false);
    model.update(&txn).await?;

    let keys = AccessKey::update_many()
        .col_expr(access_key::Column::Active, Expr::value(false))
        .filter(access_key::Column::OwnerGroupId.eq(group_id))
        .filter(access_key::Column::Active.eq(true))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    info!(group_id, cascaded_keys = keys.rows_affected, "Deactivated group");
    Ok(keys.rows_affected)
}

/// Deletes a group and every key it owns, in one transaction.
///
/// Returns the number of keys deleted with the group.
#[instrument(skip(db))]
pub async fn delete_group(db: &DatabaseConnection, group_id: i64) -> Result<u64> {
    let txn = db.begin().await?;

    let group = Group::find_by_id(group_id)
        .one(&txn)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })?;

    let keys = AccessKey::delete_many()
        .filter(access_key::Column::OwnerGroupId.eq(group_id))
        .exec(&txn)
        .await?;
    group.delete(&txn).await?;

    txn.commit().await?;
    info!(group_id, cascaded_keys = keys.rows_affected, "Deleted group");
    Ok(keys.rows_affected)
}
