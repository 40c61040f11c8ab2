//! Error types for the merge pipeline.

use stackconf_rs_config::ConfigError;
use stackconf_rs_protocol::SourceError;
use thiserror::Error;

/// Errors returned by catalog, merge and session operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Fetching from the config source failed.
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    /// Settings failed to load or validate.
    #[error("settings error: {0}")]
    Config(#[from] ConfigError),
    /// The catalog is malformed.
    #[error("catalog error: {0}")]
    Catalog(String),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON decoding failed.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// A property pattern did not compile.
    #[error("invalid pattern: {0}")]
    Pattern(String),
    /// Service is not declared by the catalog.
    #[error("unknown service: {0}")]
    UnknownService(String),
    /// Config group is unknown to the service.
    #[error("unknown config group {group} for service {service}")]
    UnknownGroup { service: String, group: String },
}
