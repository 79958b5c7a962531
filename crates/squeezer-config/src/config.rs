//! Compressor configuration file format and operations.

use num_traits::Float;
use serde::{Deserialize, Serialize};
use squeezer_core::compressor::{DEFAULT_CREST_FACTOR_DB, DEFAULT_STEREO_LINK, DEFAULT_WET_MIX};
use squeezer_core::curve::{DEFAULT_ATTACK_MS, DEFAULT_RELEASE_MS};
use squeezer_core::gain_computer::{DEFAULT_KNEE_WIDTH_DB, DEFAULT_RATIO, DEFAULT_THRESHOLD_DB};
use squeezer_core::params::DEFAULT_RMS_WINDOW_MS;
use squeezer_core::{Compressor, Design, Detector, GainStageKind, SideChainParams};
use std::path::Path;

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_config};

/// Every user-facing compressor parameter.
///
/// Missing keys take the engine defaults, so a file only needs to name what
/// it changes.
///
/// # TOML Format
///
/// ```toml
/// name = "Vocal"
/// description = "Smooth optical levelling"
///
/// threshold_db = -24.0
/// ratio = 3.0
/// knee_width_db = 6.0
/// rms_window_ms = 10.0
/// attack_ms = 15.0
/// release_ms = 250.0
/// detector = "smooth-branching"
/// gain_stage = "optical"
///
/// design = "feed-forward"
/// external_side_chain = false
/// listen_to_side_chain = false
/// stereo_link = 100.0
/// auto_makeup_gain = false
/// makeup_gain_db = 3.0
/// wet_mix = 100.0
/// crest_factor_db = 20.0
/// input_trim_db = 0.0
/// look_ahead_ms = 0.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompressorConfig {
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Threshold in dB.
    pub threshold_db: f32,
    /// Ratio; below 1 selects upward expansion.
    pub ratio: f32,
    /// Knee width in dB.
    pub knee_width_db: f32,
    /// Detector RMS window in ms (0 bypasses the filter).
    pub rms_window_ms: f32,
    /// Attack rate in ms.
    pub attack_ms: f32,
    /// Release rate in ms.
    pub release_ms: f32,
    /// Detector curve: `linear`, `smooth-decoupled` or `smooth-branching`.
    pub detector: String,
    /// Gain stage: `fet` or `optical`.
    pub gain_stage: String,

    /// Side-chain topology: `feed-forward` or `feed-back`.
    pub design: String,
    /// Key the side chain from the external input.
    pub external_side_chain: bool,
    /// Output the side-chain signal instead of the compressed audio.
    pub listen_to_side_chain: bool,
    /// Stereo link in percent.
    pub stereo_link: f32,
    /// Automatic makeup gain.
    pub auto_makeup_gain: bool,
    /// Manual makeup gain in dB.
    pub makeup_gain_db: f32,
    /// Wet mix in percent.
    pub wet_mix: f32,
    /// Crest factor added to the detector level, in dB.
    pub crest_factor_db: f32,
    /// Input trim of the detector level, in dB.
    pub input_trim_db: f32,
    /// Look-ahead in ms, realised as ring-buffer pre-delay by the host
    /// while the undelayed signal keys the side chain.
    pub look_ahead_ms: f32,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            threshold_db: DEFAULT_THRESHOLD_DB as f32,
            ratio: DEFAULT_RATIO as f32,
            knee_width_db: DEFAULT_KNEE_WIDTH_DB as f32,
            rms_window_ms: DEFAULT_RMS_WINDOW_MS as f32,
            attack_ms: DEFAULT_ATTACK_MS as f32,
            release_ms: DEFAULT_RELEASE_MS as f32,
            detector: Detector::default().name().to_string(),
            gain_stage: GainStageKind::default().name().to_string(),
            design: Design::default().name().to_string(),
            external_side_chain: false,
            listen_to_side_chain: false,
            stereo_link: DEFAULT_STEREO_LINK as f32,
            auto_makeup_gain: false,
            makeup_gain_db: 0.0,
            wet_mix: DEFAULT_WET_MIX as f32,
            crest_factor_db: DEFAULT_CREST_FACTOR_DB as f32,
            input_trim_db: 0.0,
            look_ahead_ms: 0.0,
        }
    }
}

/// Parse a detector name (case-insensitive, `_` accepted for `-`).
pub fn parse_detector(name: &str) -> Option<Detector> {
    let name = normalize(name);
    Detector::ALL.into_iter().find(|d| d.name() == name)
}

/// Parse a gain stage name (case-insensitive).
pub fn parse_gain_stage(name: &str) -> Option<GainStageKind> {
    let name = normalize(name);
    GainStageKind::ALL.into_iter().find(|g| g.name() == name)
}

/// Parse a design name (case-insensitive, `_` accepted for `-`).
pub fn parse_design(name: &str) -> Option<Design> {
    let name = normalize(name);
    Design::ALL.into_iter().find(|d| d.name() == name)
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}

impl CompressorConfig {
    /// Create a default configuration with a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every parameter range and selector.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    /// Selected detector curve, falling back to the default for unknown names.
    pub fn detector(&self) -> Detector {
        parse_detector(&self.detector).unwrap_or_default()
    }

    /// Selected gain stage, falling back to the default for unknown names.
    pub fn gain_stage(&self) -> GainStageKind {
        parse_gain_stage(&self.gain_stage).unwrap_or_default()
    }

    /// Selected side-chain design, falling back to feed-forward for unknown
    /// names.
    pub fn design(&self) -> Design {
        parse_design(&self.design).unwrap_or_default()
    }

    /// Side-chain snapshot of this configuration.
    pub fn params(&self) -> SideChainParams {
        SideChainParams {
            threshold_db: self.threshold_db,
            ratio: self.ratio,
            knee_width_db: self.knee_width_db,
            rms_window_ms: self.rms_window_ms,
            attack_ms: self.attack_ms,
            release_ms: self.release_ms,
            detector: self.detector(),
            gain_stage: self.gain_stage(),
        }
    }

    /// Push every parameter into `compressor`.
    ///
    /// Call [`validate`](Self::validate) first; out-of-range values trip the
    /// engine's debug assertions.
    pub fn apply<F: Float + From<f32>>(&self, compressor: &mut Compressor<F>) {
        compressor.apply_params(&self.params());
        compressor.set_design(self.design());
        compressor.set_external_side_chain(self.external_side_chain);
        compressor.set_listen_to_side_chain(self.listen_to_side_chain);
        compressor.set_stereo_link(self.stereo_link.into());
        compressor.set_auto_makeup_gain(self.auto_makeup_gain);
        compressor.set_makeup_gain(self.makeup_gain_db.into());
        compressor.set_wet_mix(self.wet_mix.into());
        compressor.set_crest_factor(self.crest_factor_db.into());
        compressor.set_input_trim(self.input_trim_db.into());
    }

    /// Look-ahead in whole samples at `sample_rate`.
    pub fn look_ahead_samples(&self, sample_rate: u32) -> usize {
        let samples = f64::from(self.look_ahead_ms.max(0.0)) * f64::from(sample_rate) / 1000.0;
        samples.round() as usize
    }

    /// `(name, value)` of every numeric field, in file order.
    pub(crate) fn numeric_fields(&self) -> [(&'static str, f32); 12] {
        [
            ("threshold_db", self.threshold_db),
            ("ratio", self.ratio),
            ("knee_width_db", self.knee_width_db),
            ("rms_window_ms", self.rms_window_ms),
            ("attack_ms", self.attack_ms),
            ("release_ms", self.release_ms),
            ("stereo_link", self.stereo_link),
            ("makeup_gain_db", self.makeup_gain_db),
            ("wet_mix", self.wet_mix),
            ("crest_factor_db", self.crest_factor_db),
            ("input_trim_db", self.input_trim_db),
            ("look_ahead_ms", self.look_ahead_ms),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = CompressorConfig::from_toml("").unwrap();
        assert_eq!(config, CompressorConfig::default());
    }

    #[test]
    fn defaults_match_engine() {
        let config = CompressorConfig::default();
        let compressor = Compressor::<f32>::new(2, 48000.0);
        assert_eq!(config.params(), compressor.params());
        assert_eq!(config.stereo_link, compressor.stereo_link());
        assert_eq!(config.wet_mix, compressor.wet_mix());
        assert_eq!(config.crest_factor_db, compressor.crest_factor_db());
        assert_eq!(config.design(), compressor.design());
        assert_eq!(config.external_side_chain, compressor.external_side_chain());
        assert_eq!(config.listen_to_side_chain, compressor.listen_to_side_chain());
    }

    #[test]
    fn selectors_parse_loosely() {
        assert_eq!(parse_detector("Smooth_Decoupled"), Some(Detector::SmoothDecoupled));
        assert_eq!(parse_detector(" linear "), Some(Detector::Linear));
        assert_eq!(parse_gain_stage("OPTICAL"), Some(GainStageKind::Optical));
        assert_eq!(parse_gain_stage("tube"), None);
        assert_eq!(parse_design("Feed_Back"), Some(Design::FeedBack));
        assert_eq!(parse_design("sideways"), None);
    }

    #[test]
    fn apply_reaches_every_parameter() {
        let config = CompressorConfig {
            threshold_db: -18.0,
            ratio: 6.0,
            knee_width_db: 4.0,
            rms_window_ms: 0.0,
            attack_ms: 1.0,
            release_ms: 50.0,
            detector: "linear".to_string(),
            gain_stage: "optical".to_string(),
            design: "feed-back".to_string(),
            external_side_chain: true,
            listen_to_side_chain: true,
            stereo_link: 50.0,
            auto_makeup_gain: true,
            makeup_gain_db: 2.0,
            wet_mix: 75.0,
            crest_factor_db: 12.0,
            input_trim_db: -3.0,
            ..Default::default()
        };
        let mut compressor = Compressor::<f64>::new(2, 44100.0);
        config.apply(&mut compressor);

        assert_eq!(compressor.threshold(), -18.0);
        assert!((compressor.ratio() - 6.0).abs() < 1e-9);
        assert_eq!(compressor.knee_width(), 4.0);
        assert_eq!(compressor.rms_window_ms(), 0.0);
        assert_eq!(compressor.attack_ms(), 1.0);
        assert_eq!(compressor.release_ms(), 50.0);
        assert_eq!(compressor.detector(), Detector::Linear);
        assert_eq!(compressor.gain_stage(), GainStageKind::Optical);
        assert_eq!(compressor.design(), Design::FeedBack);
        assert!(compressor.external_side_chain());
        assert!(compressor.listen_to_side_chain());
        assert_eq!(compressor.stereo_link(), 50.0);
        assert!(compressor.auto_makeup_gain());
        assert_eq!(compressor.makeup_gain_db(), 2.0);
        assert_eq!(compressor.wet_mix(), 75.0);
        assert_eq!(compressor.crest_factor_db(), 12.0);
        assert_eq!(compressor.input_trim_db(), -3.0);
    }

    #[test]
    fn ratio_below_one_selects_expansion() {
        let config = CompressorConfig {
            ratio: 0.5,
            ..Default::default()
        };
        let mut compressor = Compressor::<f32>::new(1, 48000.0);
        config.apply(&mut compressor);
        assert!(compressor.upward_expansion());
    }

    #[test]
    fn look_ahead_rounds_to_samples() {
        let config = CompressorConfig {
            look_ahead_ms: 5.0,
            ..Default::default()
        };
        assert_eq!(config.look_ahead_samples(48000), 240);
        assert_eq!(CompressorConfig::default().look_ahead_samples(44100), 0);
    }

    #[test]
    fn unknown_selector_falls_back() {
        let config = CompressorConfig {
            detector: "nope".to_string(),
            ..Default::default()
        };
        assert_eq!(config.detector(), Detector::SmoothBranching);
        assert!(config.validate().is_err());

        let config = CompressorConfig {
            design: "sideways".to_string(),
            ..Default::default()
        };
        assert_eq!(config.design(), Design::FeedForward);
        assert!(config.validate().is_err());
    }
}
