//! Access key business logic - validation, metering, and credential admin.
//!
//! Validation is the hot path: a key is looked up by its secret and role,
//! policy-checked in order (deactivated, expired, usage-capped), and then the
//! grant itself is a single conditional `usage_count = usage_count + 1`
//! UPDATE carrying the same guards. The read never decides the grant; only
//! the guarded increment does, so two concurrent validations of a key with
//! one remaining use can never both succeed.

use crate::{
    entities::{AccessKey, Group, access_key},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sea_orm::{
    Condition, DatabaseConnection, QueryOrder, Set, SqlErr, prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Generation attempts before a colliding secret aborts key creation.
const SECRET_GENERATION_ATTEMPTS: u32 = 5;

/// Secret format: four groups of four uppercase alphanumerics.
const SECRET_GROUPS: usize = 4;
const SECRET_GROUP_LEN: usize = 4;
const SECRET_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Role a key is issued for. A key issued for one role never validates for
/// another, even with the correct secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleTag {
    /// Administers a single group
    GroupAdmin,
    /// Staff access within a group
    Staff,
    /// Regular member access
    Member,
    /// Out-of-band special access
    Special,
}

impl RoleTag {
    /// Stable string representation, as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GroupAdmin => "group-admin",
            Self::Staff => "staff",
            Self::Member => "member",
            Self::Special => "special",
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a validation attempt was denied.
///
/// These are the only reason strings the public validate endpoint exposes -
/// category names, nothing that would help enumerate valid keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenialReason {
    /// No key matches the secret and role
    NotFound,
    /// The key (or its owning group) was deactivated
    Deactivated,
    /// The key's expiry time has passed
    Expired,
    /// The key's usage cap is spent
    UsageExceeded,
}

/// Outcome of a validation attempt. Denials are outcomes, not errors.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    /// Whether access was granted
    pub granted: bool,
    /// Denial reason when not granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
    /// Post-increment usage count when granted, for observability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<i64>,
}

impl ValidationOutcome {
    const fn granted(usage_count: i64) -> Self {
        Self {
            granted: true,
            reason: None,
            usage_count: Some(usage_count),
        }
    }

    const fn denied(reason: DenialReason) -> Self {
        Self {
            granted: false,
            reason: Some(reason),
            usage_count: None,
        }
    }
}

/// Symbolic key lifetime chosen at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationPolicy {
    /// The key never expires
    Never,
    /// Expires one day after creation
    OneDay,
    /// Expires one week after creation
    OneWeek,
    /// Expires thirty days after creation
    OneMonth,
    /// Expires ninety days after creation
    ThreeMonths,
}

impl DurationPolicy {
    /// Maps the symbolic duration to an absolute expiry from `created_at`.
    #[must_use]
    pub fn expires_at(self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Never => None,
            Self::OneDay => Some(created_at + Duration::days(1)),
            Self::OneWeek => Some(created_at + Duration::days(7)),
            Self::OneMonth => Some(created_at + Duration::days(30)),
            Self::ThreeMonths => Some(created_at + Duration::days(90)),
        }
    }
}

/// Symbolic usage cap: the string `"unlimited"` or a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UsagePolicy {
    /// A concrete maximum number of successful validations
    Limited(i64),
    /// The symbolic `"unlimited"` keyword
    Keyword(UsageKeyword),
}

/// Keyword form of [`UsagePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageKeyword {
    /// No cap on successful validations
    Unlimited,
}

impl UsagePolicy {
    /// Maps the policy to the stored `max_uses` value.
    ///
    /// # Errors
    /// Rejects non-positive concrete caps as [`Error::Validation`].
    pub fn max_uses(self) -> Result<Option<i64>> {
        match self {
            Self::Keyword(UsageKeyword::Unlimited) => Ok(None),
            Self::Limited(n) if n > 0 => Ok(Some(n)),
            Self::Limited(n) => Err(Error::Validation {
                message: format!("maxUses must be positive, got {n}"),
            }),
        }
    }
}

/// Computed key status, derived from current time and usage - never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStatus {
    /// Usable right now
    Active,
    /// Past its expiry time
    Expired,
    /// Usage cap spent
    MaxedOut,
    /// Explicitly deactivated
    Deactivated,
}

/// Derives the presentation status of a key at `now`.
///
/// Precedence mirrors the validator's check order: deactivation first, then
/// expiry, then the usage cap.
#[must_use]
pub fn key_status(key: &access_key::Model, now: DateTime<Utc>) -> KeyStatus {
    if !key.active {
        KeyStatus::Deactivated
    } else if key.expires_at.is_some_and(|t| t <= now) {
        KeyStatus::Expired
    } else if key.max_uses.is_some_and(|cap| key.usage_count >= cap) {
        KeyStatus::MaxedOut
    } else {
        KeyStatus::Active
    }
}

/// An access key together with its computed status, for administrative listings.
#[derive(Debug, Clone, Serialize)]
pub struct KeyView {
    /// The stored key record
    #[serde(flatten)]
    pub key: access_key::Model,
    /// Status derived at listing time
    pub status: KeyStatus,
}

/// Validates a secret against a role and meters usage on success.
///
/// The lookup requires an exact `(secret_value, role_tag)` match. Policy
/// checks run in a fixed order so the caller always sees the most specific
/// reason: deactivated, then expired, then usage-exceeded. The increment and
/// the final policy check are one conditional UPDATE, so the usage cap holds
/// under concurrent validations.
#[instrument(skip(db, secret_value))]
pub async fn validate_key(
    db: &DatabaseConnection,
    secret_value: &str,
    role_tag: RoleTag,
) -> Result<ValidationOutcome> {
    let Some(key) = AccessKey::find()
        .filter(access_key::Column::SecretValue.eq(secret_value))
        .filter(access_key::Column::RoleTag.eq(role_tag.as_str()))
        .one(db)
        .await?
    else {
        debug!(%role_tag, "Validation denied: no matching key");
        return Ok(ValidationOutcome::denied(DenialReason::NotFound));
    };

    if !key.active {
        debug!(key_id = key.id, "Validation denied: key deactivated");
        return Ok(ValidationOutcome::denied(DenialReason::Deactivated));
    }

    let now = Utc::now();
    if key.expires_at.is_some_and(|t| t <= now) {
        debug!(key_id = key.id, "Validation denied: key expired");
        return Ok(ValidationOutcome::denied(DenialReason::Expired));
    }

    // The grant: one conditional increment re-stating every policy guard, so
    // a racing deactivation, expiry, or final use cannot slip through.
    let granted = AccessKey::update_many()
        .col_expr(
            access_key::Column::UsageCount,
            Expr::col(access_key::Column::UsageCount).add(1),
        )
        .filter(access_key::Column::Id.eq(key.id))
        .filter(access_key::Column::Active.eq(true))
        .filter(
            Condition::any()
                .add(access_key::Column::ExpiresAt.is_null())
                .add(access_key::Column::ExpiresAt.gt(now)),
        )
        .filter(
            Condition::any()
                .add(access_key::Column::MaxUses.is_null())
                .add(
                    Expr::col(access_key::Column::UsageCount)
                        .lt(Expr::col(access_key::Column::MaxUses)),
                ),
        )
        .exec(db)
        .await?;

    if granted.rows_affected == 0 {
        // Some guard failed between our read and the increment; re-read to
        // report the state that actually blocked the grant.
        let reason = match AccessKey::find_by_id(key.id).one(db).await? {
            None => DenialReason::NotFound,
            Some(k) if !k.active => DenialReason::Deactivated,
            Some(k) if k.expires_at.is_some_and(|t| t <= now) => DenialReason::Expired,
            Some(_) => DenialReason::UsageExceeded,
        };
        debug!(key_id = key.id, ?reason, "Validation denied by guarded increment");
        return Ok(ValidationOutcome::denied(reason));
    }

    let usage_count = AccessKey::find_by_id(key.id)
        .one(db)
        .await?
        .map_or(key.usage_count + 1, |k| k.usage_count);
    info!(key_id = key.id, %role_tag, usage_count, "Access granted");
    Ok(ValidationOutcome::granted(usage_count))
}

/// Generates a grouped random secret, e.g. `"7QKX-0N4C-ZR2M-A9TD"`.
fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..SECRET_GROUPS)
        .map(|_| {
            (0..SECRET_GROUP_LEN)
                .map(|_| char::from(SECRET_CHARSET[rng.gen_range(0..SECRET_CHARSET.len())]))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Issues a new access key for a group.
///
/// The owning group must exist and be active. Secret generation retries a
/// bounded number of times on store-level uniqueness collisions; a colliding
/// attempt commits nothing.
///
/// # Errors
/// [`Error::Validation`] for an empty display name or inactive group,
/// [`Error::GroupNotFound`] for a missing group, and
/// [`Error::GenerationExhausted`] if every generation attempt collided.
#[allow(clippy::too_many_arguments)]
#[instrument(skip(db, metadata))]
pub async fn create_key(
    db: &DatabaseConnection,
    display_name: String,
    role_tag: RoleTag,
    owner_group_id: i64,
    duration: DurationPolicy,
    usage: UsagePolicy,
    created_by: String,
    metadata: serde_json::Value,
) -> Result<access_key::Model> {
    let display_name = display_name.trim().to_string();
    if display_name.is_empty() {
        return Err(Error::Validation {
            message: "displayName cannot be empty".to_string(),
        });
    }

    let group = Group::find_by_id(owner_group_id)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound {
            id: owner_group_id,
        })?;
    if !group.active {
        return Err(Error::Validation {
            message: format!("group '{}' is deactivated", group.name),
        });
    }

    let now = Utc::now();
    let expires_at = duration.expires_at(now);
    let max_uses = usage.max_uses()?;

    for attempt in 1..=SECRET_GENERATION_ATTEMPTS {
        let secret_value = generate_secret();
        let inserted = access_key::ActiveModel {
            display_name: Set(display_name.clone()),
            secret_value: Set(secret_value),
            owner_group_id: Set(owner_group_id),
            role_tag: Set(role_tag.as_str().to_string()),
            expires_at: Set(expires_at),
            max_uses: Set(max_uses),
            usage_count: Set(0),
            active: Set(true),
            created_by: Set(created_by.clone()),
            metadata: Set(metadata.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await;

        match inserted {
            Ok(key) => {
                info!(key_id = key.id, %role_tag, owner_group_id, "Issued access key");
                return Ok(key);
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                warn!(attempt, "Generated secret collided, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::GenerationExhausted {
        attempts: SECRET_GENERATION_ATTEMPTS,
    })
}

/// One requested key within a bulk creation call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySpec {
    /// Label for the new key
    pub display_name: String,
    /// Role the key is issued for
    pub role_tag: RoleTag,
}

/// A per-key failure within a bulk creation call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    /// Display name of the key that could not be created
    pub display_name: String,
    /// Why it failed
    pub error: String,
}

/// Result of a bulk creation call; both sides can be non-empty.
#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    /// Keys that were created
    pub created: Vec<access_key::Model>,
    /// Keys that failed, with reasons
    pub failed: Vec<BulkFailure>,
}

/// Creates a batch of keys sharing one group, duration, and usage policy.
/// Each key is attempted independently; one failure never aborts the rest.
#[instrument(skip(db, specs), fields(requested = specs.len()))]
pub async fn bulk_create_keys(
    db: &DatabaseConnection,
    owner_group_id: i64,
    duration: DurationPolicy,
    usage: UsagePolicy,
    created_by: String,
    specs: Vec<KeySpec>,
) -> Result<BulkOutcome> {
    let mut outcome = BulkOutcome {
        created: Vec::new(),
        failed: Vec::new(),
    };

    for spec in specs {
        let attempt = create_key(
            db,
            spec.display_name.clone(),
            spec.role_tag,
            owner_group_id,
            duration,
            usage,
            created_by.clone(),
            serde_json::json!({}),
        )
        .await;
        match attempt {
            Ok(key) => outcome.created.push(key),
            Err(e) => outcome.failed.push(BulkFailure {
                display_name: spec.display_name,
                error: e.to_string(),
            }),
        }
    }

    info!(
        created = outcome.created.len(),
        failed = outcome.failed.len(),
        "Bulk key creation finished"
    );
    Ok(outcome)
}

/// Lists keys (optionally for one group) with their computed status.
pub async fn list_keys(
    db: &DatabaseConnection,
    owner_group_id: Option<i64>,
) -> Result<Vec<KeyView>> {
    let mut query = AccessKey::find().order_by_asc(access_key::Column::Id);
    if let Some(group_id) = owner_group_id {
        query = query.filter(access_key::Column::OwnerGroupId.eq(group_id));
    }

    let now = Utc::now();
    let keys = query.all(db).await?;
    Ok(keys
        .into_iter()
        .map(|key| {
            let status = key_status(&key, now);
            KeyView { key, status }
        })
        .collect())
}

/// Deactivates a key; a deactivated key denies validation until reactivated.
#[instrument(skip(db))]
pub async fn deactivate_key(db: &DatabaseConnection, key_id: i64) -> Result<access_key::Model> {
    set_key_active(db, key_id, false).await
}

/// Reactivates a previously deactivated key.
#[instrument(skip(db))]
pub async fn reactivate_key(db: &DatabaseConnection, key_id: i64) -> Result<access_key::Model> {
    set_key_active(db, key_id, true).await
}

async fn set_key_active(
    db: &DatabaseConnection,
    key_id: i64,
    active: bool,
) -> Result<access_key::Model> {
    let key = AccessKey::find_by_id(key_id)
        .one(db)
        .await?
        .ok_or(Error::KeyNotFound { id: key_id })?;

    let mut model: access_key::ActiveModel = key.into();
    model.active = Set(active);
    let updated = model.update(db).await?;
    info!(key_id, active, "Changed key active flag");
    Ok(updated)
}

/// Permanently deletes a key.
#[instrument(skip(db))]
pub async fn delete_key(db: &DatabaseConnection, key_id: i64) -> Result<()> {
    let deleted = AccessKey::delete_by_id(key_id).exec(db).await?;
    if deleted.rows_affected == 0 {
        return Err(Error::KeyNotFound { id: key_id });
    }
    info!(key_id, "Deleted access key");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{create_test_group, create_test_key, setup_test_db};
    use sea_orm::Set;

    #[tokio::test]
    async fn test_create_then_validate_round_trip() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Northside High").await?;

        let key = create_key(
            &db,
            "Front desk key".to_string(),
            RoleTag::Staff,
            group.id,
            DurationPolicy::OneWeek,
            UsagePolicy::Limited(1),
            "admin".to_string(),
            serde_json::json!({}),
        )
        .await?;

        let first = validate_key(&db, &key.secret_value, RoleTag::Staff).await?;
        assert!(first.granted);
        assert_eq!(first.usage_count, Some(1));

        let second = validate_key(&db, &key.secret_value, RoleTag::Staff).await?;
        assert!(!second.granted);
        assert_eq!(second.reason, Some(DenialReason::UsageExceeded));

        Ok(())
    }

    #[tokio::test]
    async fn test_role_mismatch_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Group").await?;
        let key = create_test_key(&db, group.id, RoleTag::Member, None, None).await?;

        let outcome = validate_key(&db, &key.secret_value, RoleTag::GroupAdmin).await?;
        assert!(!outcome.granted);
        assert_eq!(outcome.reason, Some(DenialReason::NotFound));

        // The failed attempt must not meter usage
        let unchanged = AccessKey::find_by_id(key.id).one(&db).await?.unwrap();
        assert_eq!(unchanged.usage_count, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_secret_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let outcome = validate_key(&db, "ZZZZ-ZZZZ-ZZZZ-ZZZZ", RoleTag::Member).await?;
        assert!(!outcome.granted);
        assert_eq!(outcome.reason, Some(DenialReason::NotFound));

        Ok(())
    }

    #[tokio::test]
    async fn test_deactivated_key_denied() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Group").await?;
        let key = create_test_key(&db, group.id, RoleTag::Member, None, None).await?;

        deactivate_key(&db, key.id).await?;
        let outcome = validate_key(&db, &key.secret_value, RoleTag::Member).await?;
        assert!(!outcome.granted);
        assert_eq!(outcome.reason, Some(DenialReason::Deactivated));

        reactivate_key(&db, key.id).await?;
        let outcome = validate_key(&db, &key.secret_value, RoleTag::Member).await?;
        assert!(outcome.granted);

        Ok(())
    }

    #[tokio::test]
    async fn test_expiry_boundary_denied_even_with_uses_left() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Group").await?;
        let key = create_test_key(&db, group.id, RoleTag::Member, None, Some(5)).await?;

        // Push the expiry one second into the past
        let mut model: access_key::ActiveModel = key.clone().into();
        model.expires_at = Set(Some(Utc::now() - Duration::seconds(1)));
        model.update(&db).await?;

        let outcome = validate_key(&db, &key.secret_value, RoleTag::Member).await?;
        assert!(!outcome.granted);
        assert_eq!(outcome.reason, Some(DenialReason::Expired));

        let unchanged = AccessKey::find_by_id(key.id).one(&db).await?.unwrap();
        assert_eq!(unchanged.usage_count, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_usage_metering_under_contention() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Group").await?;
        let max_uses = 3;
        let attempts = 10;
        let key = create_test_key(&db, group.id, RoleTag::Member, None, Some(max_uses)).await?;

        let outcomes = futures::future::join_all(
            (0..attempts).map(|_| validate_key(&db, &key.secret_value, RoleTag::Member)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

        let granted = outcomes.iter().filter(|o| o.granted).count();
        let exceeded = outcomes
            .iter()
            .filter(|o| o.reason == Some(DenialReason::UsageExceeded))
            .count();
        assert_eq!(granted, usize::try_from(max_uses).unwrap());
        assert_eq!(exceeded, attempts - granted);

        let final_key = AccessKey::find_by_id(key.id).one(&db).await?.unwrap();
        assert_eq!(final_key.usage_count, max_uses, "Cap must never be overshot");

        Ok(())
    }

    #[tokio::test]
    async fn test_create_key_validates_inputs() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Group").await?;

        let empty_name = create_key(
            &db,
            "   ".to_string(),
            RoleTag::Member,
            group.id,
            DurationPolicy::Never,
            UsagePolicy::Keyword(UsageKeyword::Unlimited),
            "admin".to_string(),
            serde_json::json!({}),
        )
        .await;
        assert!(matches!(empty_name, Err(Error::Validation { .. })));

        let missing_group = create_key(
            &db,
            "Key".to_string(),
            RoleTag::Member,
            9999,
            DurationPolicy::Never,
            UsagePolicy::Keyword(UsageKeyword::Unlimited),
            "admin".to_string(),
            serde_json::json!({}),
        )
        .await;
        assert!(matches!(
            missing_group,
            Err(Error::GroupNotFound { id: 9999 })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_key_rejects_deactivated_group() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Closing Down").await?;
        crate::core::group::deactivate_group(&db, group.id).await?;

        let result = create_key(
            &db,
            "Key".to_string(),
            RoleTag::Member,
            group.id,
            DurationPolicy::Never,
            UsagePolicy::Keyword(UsageKeyword::Unlimited),
            "admin".to_string(),
            serde_json::json!({}),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_secret_format_and_duration_mapping() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Group").await?;

        let key = create_key(
            &db,
            "Formatted".to_string(),
            RoleTag::Special,
            group.id,
            DurationPolicy::OneWeek,
            UsagePolicy::Keyword(UsageKeyword::Unlimited),
            "admin".to_string(),
            serde_json::json!({"issued-for": "open day"}),
        )
        .await?;

        let parts: Vec<&str> = key.secret_value.split('-').collect();
        assert_eq!(parts.len(), SECRET_GROUPS);
        assert!(parts.iter().all(|p| {
            p.len() == SECRET_GROUP_LEN
                && p.bytes().all(|b| SECRET_CHARSET.contains(&b))
        }));

        let expires = key.expires_at.expect("one-week keys must expire");
        let lifetime = expires - key.created_at;
        assert_eq!(lifetime, Duration::days(7));
        assert!(key.max_uses.is_none());

        Ok(())
    }

    #[test]
    fn test_duration_policy_never_has_no_expiry() {
        let now = Utc::now();
        assert_eq!(DurationPolicy::Never.expires_at(now), None);
        assert_eq!(
            DurationPolicy::OneDay.expires_at(now),
            Some(now + Duration::days(1))
        );
        assert_eq!(
            DurationPolicy::ThreeMonths.expires_at(now),
            Some(now + Duration::days(90))
        );
    }

    #[test]
    fn test_usage_policy_mapping() {
        assert_eq!(
            UsagePolicy::Keyword(UsageKeyword::Unlimited).max_uses().unwrap(),
            None
        );
        assert_eq!(UsagePolicy::Limited(25).max_uses().unwrap(), Some(25));
        assert!(UsagePolicy::Limited(0).max_uses().is_err());
        assert!(UsagePolicy::Limited(-3).max_uses().is_err());
    }

    #[test]
    fn test_usage_policy_wire_formats() {
        let unlimited: UsagePolicy = serde_json::from_str("\"unlimited\"").unwrap();
        assert_eq!(unlimited, UsagePolicy::Keyword(UsageKeyword::Unlimited));
        let capped: UsagePolicy = serde_json::from_str("12").unwrap();
        assert_eq!(capped, UsagePolicy::Limited(12));
    }

    #[tokio::test]
    async fn test_bulk_create_is_partial_failure_tolerant() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Group").await?;

        let outcome = bulk_create_keys(
            &db,
            group.id,
            DurationPolicy::OneMonth,
            UsagePolicy::Limited(10),
            "admin".to_string(),
            vec![
                KeySpec {
                    display_name: "Homeroom A".to_string(),
                    role_tag: RoleTag::Staff,
                },
                KeySpec {
                    display_name: "  ".to_string(),
                    role_tag: RoleTag::Member,
                },
                KeySpec {
                    display_name: "Homeroom B".to_string(),
                    role_tag: RoleTag::Member,
                },
            ],
        )
        .await?;

        assert_eq!(outcome.created.len(), 2);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].display_name, "  ");

        Ok(())
    }

    #[tokio::test]
    async fn test_list_keys_with_computed_status() -> Result<()> {
        let db = setup_test_db().await?;
        let group_a = create_test_group(&db, "Group A").await?;
        let group_b = create_test_group(&db, "Group B").await?;

        let active = create_test_key(&db, group_a.id, RoleTag::Member, None, None).await?;
        let spent = create_test_key(&db, group_a.id, RoleTag::Member, None, Some(1)).await?;
        validate_key(&db, &spent.secret_value, RoleTag::Member).await?;
        let off = create_test_key(&db, group_a.id, RoleTag::Member, None, None).await?;
        deactivate_key(&db, off.id).await?;
        create_test_key(&db, group_b.id, RoleTag::Staff, None, None).await?;

        let views = list_keys(&db, Some(group_a.id)).await?;
        assert_eq!(views.len(), 3);
        let status_of = |id: i64| views.iter().find(|v| v.key.id == id).unwrap().status;
        assert_eq!(status_of(active.id), KeyStatus::Active);
        assert_eq!(status_of(spent.id), KeyStatus::MaxedOut);
        assert_eq!(status_of(off.id), KeyStatus::Deactivated);

        let all = list_keys(&db, None).await?;
        assert_eq!(all.len(), 4);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_key() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db, "Group").await?;
        let key = create_test_key(&db, group.id, RoleTag::Member, None, None).await?;

        delete_key(&db, key.id).await?;
        assert!(AccessKey::find_by_id(key.id).one(&db).await?.is_none());

        let again = delete_key(&db, key.id).await;
        assert!(matches!(again, Err(Error::KeyNotFound { .. })));

        Ok(())
    }

    #[test]
    fn test_key_status_precedence() {
        let now = Utc::now();
        let base = access_key::Model {
            id: 1,
            display_name: "k".to_string(),
            secret_value: "AAAA-BBBB-CCCC-DDDD".to_string(),
            owner_group_id: 1,
            role_tag: "member".to_string(),
            expires_at: Some(now - Duration::seconds(1)),
            max_uses: Some(1),
            usage_count: 1,
            active: false,
            created_by: "admin".to_string(),
            metadata: serde_json::json!({}),
            created_at: now,
        };

        // Deactivation wins over everything
        assert_eq!(key_status(&base, now), KeyStatus::Deactivated);

        let expired = access_key::Model { active: true, ..base.clone() };
        assert_eq!(key_status(&expired, now), KeyStatus::Expired);

        let maxed = access_key::Model {
            active: true,
            expires_at: None,
            ..base.clone()
        };
        assert_eq!(key_status(&maxed, now), KeyStatus::MaxedOut);

        let healthy = access_key::Model {
            active: true,
            expires_at: None,
            usage_count: 0,
            ..base
        };
        assert_eq!(key_status(&healthy, now), KeyStatus::Active);
    }
}
