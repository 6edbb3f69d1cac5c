//! Shared domain types and configuration for VenturePulse.

mod app_config;
mod auth;
mod config;
mod types;

pub use app_config::{AppConfig, Environment};
pub use auth::AdminPolicy;
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{SignalItem, SourceType, ValidationStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
