//! Unified error type for formgate.
//!
//! Domain denials that callers are expected to recover from (a key failing
//! validation, the FIFO queue being empty) are *not* errors; they are
//! structured outcomes in `core`. Everything here either aborts the current
//! request or signals a broken precondition.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing or malformed.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },

    /// A request carried malformed or missing fields.
    #[error("Validation error: {message}")]
    Validation {
        /// Field-level detail, safe to surface to the caller
        message: String,
    },

    /// A submission category outside the fixed known set.
    #[error("Unknown submission category: {category}")]
    InvalidCategory {
        /// The rejected category value
        category: String,
    },

    /// An access key referenced by id does not exist.
    #[error("Access key not found: {id}")]
    KeyNotFound {
        /// The missing key's id
        id: i64,
    },

    /// A group referenced by id does not exist.
    #[error("Group not found: {id}")]
    GroupNotFound {
        /// The missing group's id
        id: i64,
    },

    /// A submission referenced by id does not exist.
    #[error("Submission not found: {id}")]
    SubmissionNotFound {
        /// The missing submission's id
        id: i64,
    },

    /// A workflow transition outside the state machine's edges.
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition {
        /// Status the submission was observed in
        from: String,
        /// Status that was requested
        to: String,
    },

    /// The notification channel rejected or failed to deliver an event.
    #[error("Notification gateway error: {message}")]
    Gateway {
        /// Channel-specific failure detail
        message: String,
    },

    /// Secret generation kept colliding with existing keys.
    #[error("Secret generation exhausted after {attempts} attempts")]
    GenerationExhausted {
        /// How many generation attempts were made
        attempts: u32,
    },

    /// Database error from SeaORM.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
