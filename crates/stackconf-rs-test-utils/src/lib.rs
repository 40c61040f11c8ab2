//! Test helpers shared across stackconf crates.

pub mod fixtures;
pub mod gated;
pub mod source;

pub use gated::{GateHandle, GatedConfigSource};
pub use source::{FailingConfigSource, StaticConfigSource};
