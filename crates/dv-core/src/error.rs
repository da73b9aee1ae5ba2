//! Error types
//!
//! Generation itself cannot fail; only building a configuration can.

use thiserror::Error;

/// Errors raised while constructing a [`Config`](crate::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown value '{value}' for option '{key}'")]
    UnknownOption { key: String, value: String },

    #[error("unknown option '{0}'")]
    UnknownKey(String),

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}
