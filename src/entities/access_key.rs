//! Access key entity - Issued credentials gating access to the portal.
//!
//! Each key carries a globally unique opaque `secret_value`, is scoped to an
//! owning group and a single role, and may be expirable and/or use-capped.
//! `usage_count` is a hot contended field and is only ever mutated through a
//! single conditional UPDATE (see `core::access_key`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Access key database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "access_keys")]
pub struct Model {
    /// Unique identifier for the key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable label chosen by the issuing administrator
    pub display_name: String,
    /// Opaque random credential string, globally unique across all keys
    #[sea_orm(unique)]
    pub secret_value: String,
    /// ID of the group this key belongs to
    pub owner_group_id: i64,
    /// Role the key was issued for: `"group-admin"`, `"staff"`, `"member"`, or `"special"`
    pub role_tag: String,
    /// Absolute expiry time, None for keys that never expire
    pub expires_at: Option<DateTimeUtc>,
    /// Maximum permitted successful validations, None for unlimited
    pub max_uses: Option<i64>,
    /// Successful validations so far; never exceeds `max_uses` when set
    pub usage_count: i64,
    /// Whether the key is currently usable (deactivation flips this)
    pub active: bool,
    /// Who issued the key
    pub created_by: String,
    /// Freeform administrative metadata (string -> JSON value map)
    pub metadata: Json,
    /// When the key was issued
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `AccessKey` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each key belongs to one owning group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::OwnerGroupId",
        to = "super::group::Column::Id"
    )]
    Group,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
