//! Parameter range checks for [`CompressorConfig`].
//!
//! Every numeric field has a closed range in [`PARAM_RANGES`]. Selectors
//! (detector, gain stage and design) must name a known variant. All problems are
//! collected, so one pass reports every bad field.
//!
//! ```rust
//! use squeezer_config::{CompressorConfig, ValidationError};
//!
//! let config = CompressorConfig { ratio: 0.0, wet_mix: 150.0, ..Default::default() };
//! match config.validate() {
//!     Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use crate::config::{CompressorConfig, parse_design, parse_detector, parse_gain_stage};
use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Selector that names no known variant.
    #[error("unknown {param} '{value}' (expected one of: {expected})")]
    UnknownSelector {
        /// Name of the selector field.
        param: String,
        /// The unrecognized value.
        value: String,
        /// Comma-separated list of valid names.
        expected: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Allowed `(name, min, max)` for every numeric field.
pub const PARAM_RANGES: &[(&str, f32, f32)] = &[
    ("threshold_db", -96.0, 12.0),
    ("ratio", 0.1, 100.0),
    ("knee_width_db", 0.0, 48.0),
    ("rms_window_ms", 0.0, 500.0),
    ("attack_ms", 0.0, 2000.0),
    ("release_ms", 0.0, 5000.0),
    ("stereo_link", 0.0, 100.0),
    ("makeup_gain_db", -36.0, 36.0),
    ("wet_mix", 0.0, 100.0),
    ("crest_factor_db", 0.0, 40.0),
    ("input_trim_db", -36.0, 36.0),
    ("look_ahead_ms", 0.0, 100.0),
];

/// Range of a numeric parameter, if it exists.
pub fn param_range(name: &str) -> Option<(f32, f32)> {
    PARAM_RANGES
        .iter()
        .find(|(param, _, _)| *param == name)
        .map(|&(_, min, max)| (min, max))
}

fn check_range(errors: &mut Vec<ValidationError>, param: &str, value: f32) {
    let Some((min, max)) = param_range(param) else {
        return;
    };
    // NaN is never contained
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            param: param.to_string(),
            value,
            min,
            max,
        });
    }
}

/// Check every field of `config`.
///
/// Returns the single error directly, or [`ValidationError::Multiple`] when
/// more than one field is bad.
pub fn validate_config(config: &CompressorConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    for (param, value) in config.numeric_fields() {
        check_range(&mut errors, param, value);
    }

    if parse_detector(&config.detector).is_none() {
        errors.push(ValidationError::UnknownSelector {
            param: "detector".to_string(),
            value: config.detector.clone(),
            expected: "linear, smooth-decoupled, smooth-branching".to_string(),
        });
    }
    if parse_gain_stage(&config.gain_stage).is_none() {
        errors.push(ValidationError::UnknownSelector {
            param: "gain_stage".to_string(),
            value: config.gain_stage.clone(),
            expected: "fet, optical".to_string(),
        });
    }
    if parse_design(&config.design).is_none() {
        errors.push(ValidationError::UnknownSelector {
            param: "design".to_string(),
            value: config.design.clone(),
            expected: "feed-forward, feed-back".to_string(),
        });
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
