//! Runtime application settings.
//!
//! All configuration comes from environment variables (optionally via a
//! `.env` file loaded in `main`). The admin token is the single static
//! credential protecting the administrative endpoints; there is deliberately
//! no per-operator account system here.

use crate::errors::{Error, Result};
use std::env;
use tracing::info;

/// Default SQLite database location when `DATABASE_URL` is unset.
const DEFAULT_DATABASE_URL: &str = "sqlite://data/formgate.sqlite";

/// Default listen address when `FORMGATE_BIND_ADDR` is unset.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Application configuration shared across the process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Static credential required on administrative endpoints
    pub admin_token: String,
}

/// Loads the application configuration from the environment.
///
/// `FORMGATE_ADMIN_TOKEN` is required; the other settings fall back to local
/// defaults suitable for development.
pub fn load_app_configuration() -> Result<AppConfig> {
    let config = build_config(|name| env::var(name).ok())?;
    info!(
        database_url = %config.database_url,
        bind_addr = %config.bind_addr,
        "Loaded application configuration"
    );
    Ok(config)
}

/// Assembles an [`AppConfig`] from a variable lookup function.
///
/// Separated from the environment so the parsing rules can be tested without
/// mutating process-global state.
fn build_config(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig> {
    let database_url =
        lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
    let bind_addr =
        lookup("FORMGATE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let admin_token = lookup("FORMGATE_ADMIN_TOKEN").ok_or_else(|| Error::Config {
        message: "FORMGATE_ADMIN_TOKEN must be set".to_string(),
    })?;

    if admin_token.trim().is_empty() {
        return Err(Error::Config {
            message: "FORMGATE_ADMIN_TOKEN must not be empty".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        bind_addr,
        admin_token,
    })
}
