//! Engine settings models and layered settings loading.
//!
//! This crate owns the stackconf settings schema, validation, and the
//! layer-merging logic used by the merge pipeline and its hosts.

mod error;
mod loader;
mod model;

/// Public error type returned by settings loading and validation APIs.
pub use error::ConfigError;
/// Layered settings types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Settings schema models.
pub use model::*;
