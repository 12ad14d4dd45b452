//! Sequence counter entity - per-category monotonic token counters.
//!
//! One row per submission category, created lazily on first use and never
//! deleted. `count` only increases, and only through a single conditional
//! UPDATE inside a transaction (see `core::sequence`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sequence counter database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sequence_counters")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Submission category this counter numbers (e.g. `"demo"`)
    #[sea_orm(unique)]
    pub category: String,
    /// Last issued sequence number; monotonically increasing
    pub count: i64,
    /// Token prefix for the category (e.g. `"DEMO"`)
    pub prefix: String,
}

/// `SequenceCounter` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
