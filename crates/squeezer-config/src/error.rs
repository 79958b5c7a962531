//! Errors from reading, writing and checking compressor configurations.
//!
//! [`CompressorConfig::load`](crate::CompressorConfig::load) reports missing
//! or malformed files, [`CompressorConfig::save`](crate::CompressorConfig::save)
//! (behind the CLI's `--save-config`) reports unwritable destinations, and
//! [`load_factory_preset`](crate::load_factory_preset) reports unknown names.
//! The CLI prints these through `anyhow`, so every message names the file or
//! preset involved.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading, saving or validating a [`CompressorConfig`](crate::CompressorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read compressor config '{path}': {source}")]
    ReadFile {
        /// File passed to `load`.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be written.
    #[error("cannot write compressor config '{path}': {source}")]
    WriteFile {
        /// File passed to `save`.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML, or a key has the wrong type.
    #[error("malformed compressor config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML.
    #[error("cannot serialize compressor config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// No factory preset has this name.
    #[error("unknown factory preset '{0}'")]
    PresetNotFound(String),

    /// A parameter is out of range or a selector is unknown.
    #[error("invalid compressor config: {0}")]
    Validation(#[from] crate::validation::ValidationError),
}

impl ConfigError {
    pub(crate) fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }
}
