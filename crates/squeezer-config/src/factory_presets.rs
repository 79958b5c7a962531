//! Factory presets bundled with the squeezer library.
//!
//! Presets are embedded TOML, parsed on request, so they are always
//! available without external files and exercise the same loader as
//! user configuration files.

use crate::{CompressorConfig, ConfigError};

/// Array of factory preset names for external access.
pub static FACTORY_PRESET_NAMES: &[&str] =
    &["gentle", "vocal", "drum-bus", "opto-leveler", "brickwall", "vintage-feedback"];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("gentle", GENTLE_PRESET),
    ("vocal", VOCAL_PRESET),
    ("drum-bus", DRUM_BUS_PRESET),
    ("opto-leveler", OPTO_LEVELER_PRESET),
    ("brickwall", BRICKWALL_PRESET),
    ("vintage-feedback", VINTAGE_FEEDBACK_PRESET),
];

const GENTLE_PRESET: &str = r#"
name = "Gentle"
description = "Low ratio glue with a wide knee"
threshold_db = -24.0
ratio = 1.5
knee_width_db = 12.0
attack_ms = 30.0
release_ms = 300.0
detector = "smooth-branching"
gain_stage = "fet"
auto_makeup_gain = true
"#;

const VOCAL_PRESET: &str = r#"
name = "Vocal"
description = "Smooth levelling for lead vocals"
threshold_db = -22.0
ratio = 3.0
knee_width_db = 6.0
rms_window_ms = 15.0
attack_ms = 15.0
release_ms = 250.0
detector = "smooth-decoupled"
gain_stage = "optical"
makeup_gain_db = 4.0
"#;

const DRUM_BUS_PRESET: &str = r#"
name = "Drum Bus"
description = "Punchy bus compression that lets transients through"
threshold_db = -18.0
ratio = 4.0
knee_width_db = 3.0
rms_window_ms = 5.0
attack_ms = 20.0
release_ms = 120.0
detector = "linear"
gain_stage = "fet"
stereo_link = 100.0
makeup_gain_db = 3.0
wet_mix = 70.0
"#;

const OPTO_LEVELER_PRESET: &str = r#"
name = "Opto Leveler"
description = "Slow program-dependent levelling"
threshold_db = -30.0
ratio = 2.5
knee_width_db = 6.0
rms_window_ms = 50.0
attack_ms = 10.0
release_ms = 500.0
detector = "smooth-branching"
gain_stage = "optical"
auto_makeup_gain = true
"#;

const BRICKWALL_PRESET: &str = r#"
name = "Brickwall"
description = "Hard-knee peak limiting with look-ahead"
threshold_db = -6.0
ratio = 20.0
knee_width_db = 0.0
rms_window_ms = 0.0
attack_ms = 0.5
release_ms = 80.0
detector = "smooth-branching"
gain_stage = "fet"
crest_factor_db = 0.0
look_ahead_ms = 5.0
"#;

const VINTAGE_FEEDBACK_PRESET: &str = r#"
name = "Vintage Feedback"
description = "Feed-back detection on the compressed output, like older hardware"
threshold_db = -26.0
ratio = 4.0
knee_width_db = 6.0
attack_ms = 20.0
release_ms = 200.0
detector = "smooth-decoupled"
gain_stage = "optical"
design = "feed-back"
makeup_gain_db = 3.0
"#;

/// All factory presets, parsed.
pub fn factory_presets() -> Vec<CompressorConfig> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml_str)| CompressorConfig::from_toml(toml_str).ok())
        .collect()
}

/// Get a factory preset by name (case-insensitive).
pub fn get_factory_preset(name: &str) -> Option<CompressorConfig> {
    factory_preset_toml(name).and_then(|toml_str| CompressorConfig::from_toml(toml_str).ok())
}

/// Raw TOML of a factory preset.
pub fn factory_preset_toml(name: &str) -> Option<&'static str> {
    FACTORY_PRESETS_TOML
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, toml_str)| *toml_str)
}

/// Get a factory preset or a [`ConfigError::PresetNotFound`].
pub fn load_factory_preset(name: &str) -> Result<CompressorConfig, ConfigError> {
    let toml_str =
        factory_preset_toml(name).ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))?;
    CompressorConfig::from_toml(toml_str)
}

/// Factory preset names.
pub fn factory_preset_names() -> &'static [&'static str] {
    FACTORY_PRESET_NAMES
}

/// Check whether a name refers to a factory preset.
pub fn is_factory_preset(name: &str) -> bool {
    factory_preset_toml(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_parse_and_validate() {
        for &name in FACTORY_PRESET_NAMES {
            let preset = load_factory_preset(name)
                .unwrap_or_else(|e| panic!("{name} failed to parse: {e}"));
            preset
                .validate()
                .unwrap_or_else(|e| panic!("{name} failed validation: {e}"));
            assert!(preset.name.is_some(), "{name} has no display name");
        }
        assert_eq!(factory_presets().len(), FACTORY_PRESET_NAMES.len());
    }

    #[test]
    fn names_and_table_agree() {
        let table: Vec<&str> = FACTORY_PRESETS_TOML.iter().map(|(n, _)| *n).collect();
        assert_eq!(table, FACTORY_PRESET_NAMES);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(is_factory_preset("Drum-Bus"));
        assert!(get_factory_preset("OPTO-LEVELER").is_some());
        assert!(!is_factory_preset("nonexistent"));
    }

    #[test]
    fn missing_preset_is_an_error() {
        assert!(matches!(
            load_factory_preset("squash"),
            Err(ConfigError::PresetNotFound(ref n)) if n == "squash"
        ));
    }

    #[test]
    fn brickwall_uses_look_ahead() {
        let preset = get_factory_preset("brickwall").unwrap();
        assert_eq!(preset.look_ahead_samples(48000), 240);
        assert_eq!(preset.crest_factor_db, 0.0);
    }

    #[test]
    fn vintage_feedback_detects_on_output() {
        let preset = get_factory_preset("vintage-feedback").unwrap();
        assert_eq!(preset.design(), squeezer_core::Design::FeedBack);
        assert!(!preset.external_side_chain);
    }

    #[test]
    fn unset_keys_keep_defaults() {
        let preset = get_factory_preset("gentle").unwrap();
        let defaults = CompressorConfig::default();
        assert_eq!(preset.rms_window_ms, defaults.rms_window_ms);
        assert_eq!(preset.wet_mix, defaults.wet_mix);
    }
}
