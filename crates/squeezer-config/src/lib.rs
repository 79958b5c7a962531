//! Configuration and presets for the squeezer compressor.
//!
//! A [`CompressorConfig`] is the on-disk, human-editable form of every
//! compressor parameter. It is loaded from TOML, checked with
//! [`CompressorConfig::validate`], and pushed into an engine instance with
//! [`CompressorConfig::apply`].
//!
//! # Example
//!
//! ```rust
//! use squeezer_config::{CompressorConfig, get_factory_preset};
//! use squeezer_core::Compressor;
//!
//! let config = get_factory_preset("vocal").unwrap();
//! config.validate().unwrap();
//!
//! let mut compressor = Compressor::<f32>::new(2, 48000.0);
//! config.apply(&mut compressor);
//! assert_eq!(compressor.threshold(), config.threshold_db);
//!
//! let parsed = CompressorConfig::from_toml("threshold_db = -12.0").unwrap();
//! assert_eq!(parsed.ratio, 2.0);
//! ```

mod config;
mod error;

/// Parameter range checks.
pub mod validation;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use config::{CompressorConfig, parse_design, parse_detector, parse_gain_stage};
pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_preset_toml, factory_presets,
    get_factory_preset, is_factory_preset, load_factory_preset,
};
pub use validation::{ValidationError, ValidationResult};
