//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod access_key;
pub mod group;
pub mod sequence_counter;
pub mod submission;

// Re-export specific types to avoid conflicts
pub use access_key::{Column as AccessKeyColumn, Entity as AccessKey, Model as AccessKeyModel};
pub use group::{Column as GroupColumn, Entity as Group, Model as GroupModel};
pub use sequence_counter::{
    Column as SequenceCounterColumn, Entity as SequenceCounter, Model as SequenceCounterModel,
};
pub use submission::{Column as SubmissionColumn, Entity as Submission, Model as SubmissionModel};
