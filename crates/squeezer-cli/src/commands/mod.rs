//! CLI command implementations.

pub mod common;
pub mod curve;
pub mod presets;
pub mod process;
