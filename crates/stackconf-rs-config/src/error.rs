//! Error types for settings loading and validation.

use thiserror::Error;

/// Errors returned while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a settings layer failed.
    #[error("failed to read settings: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// A settings layer is not valid JSON5.
    #[error("failed to parse settings: {0}")]
    ParseFailed(#[from] json5::Error),
    /// The merged value does not decode into the settings model.
    #[error("failed to decode settings: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A specific field failed validation.
    #[error("invalid settings at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// Generic validation failure.
    #[error("invalid settings: {0}")]
    Invalid(String),
}
