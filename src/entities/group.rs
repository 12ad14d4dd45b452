//! Group entity - Organizations that own issued access keys.
//!
//! Deactivating or deleting a group cascades to its keys; both cascades run
//! as one database transaction in `core::group`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    /// Unique identifier for the group
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique human-readable group name
    #[sea_orm(unique)]
    pub name: String,
    /// Whether the group (and by extension its keys) is active
    pub active: bool,
    /// When the group was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Group and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One group owns many access keys
    #[sea_orm(has_many = "super::access_key::Entity")]
    AccessKeys,
}

impl Related<super::access_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccessKeys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
