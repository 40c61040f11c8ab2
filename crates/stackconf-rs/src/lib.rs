//! Public surface for stackconf.
//!
//! This crate re-exports the settings, core and protocol crates and provides
//! small setup helpers to keep consumer initialization consistent.

/// Re-export for convenience.
pub use stackconf_rs_config as config;
pub use stackconf_rs_core as core;
/// Re-export for convenience.
pub use stackconf_rs_protocol as protocol;

use log::info;
use stackconf_rs_config::{LayeredConfigOptions, StackconfConfig};
use stackconf_rs_core::{ConfigCatalog, ConfigSession, CoreError, MergeSettings};
use stackconf_rs_protocol::ConfigSource;
use std::path::Path;
use std::sync::Arc;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}

/// Open a session from layered settings and a catalog file.
pub fn open_session(
    options: LayeredConfigOptions,
    catalog_path: impl AsRef<Path>,
    source: Arc<dyn ConfigSource>,
) -> Result<ConfigSession, CoreError> {
    let layered = StackconfConfig::load_layered_with_options(options)?;
    info!("settings loaded (layers={})", layered.layers.len());
    session_from_config(&layered.config, catalog_path, source)
}

/// Open a session from already-loaded settings.
pub fn session_from_config(
    config: &StackconfConfig,
    catalog_path: impl AsRef<Path>,
    source: Arc<dyn ConfigSource>,
) -> Result<ConfigSession, CoreError> {
    let settings = MergeSettings::from_config(config)?;
    let catalog = ConfigCatalog::load_from_path(catalog_path, &settings)?;
    Ok(ConfigSession::new(Arc::new(catalog), source, settings))
}
