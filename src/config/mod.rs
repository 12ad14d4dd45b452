/// Database configuration and connection management
pub mod database;

/// Runtime application settings loaded from the environment
pub mod settings;

pub use settings::{AppConfig, load_app_configuration};
