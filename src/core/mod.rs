//! Core business logic for formgate.
//!
//! Everything in this module is framework-agnostic: functions take a
//! `DatabaseConnection` (and, where workflow events fire, a
//! `NotificationGateway`) and return `Result` types. The HTTP layer and the
//! notification callback path are both thin wrappers over these functions.

/// Access key validation, metering, and credential administration
pub mod access_key;
/// Group lifecycle and cascading effects on owned keys
pub mod group;
/// Per-category sequence token generation
pub mod sequence;
/// Submission intake and the FIFO status workflow
pub mod submission;
