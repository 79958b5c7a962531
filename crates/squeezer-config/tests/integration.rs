//! Integration tests for squeezer-config.
//!
//! These tests verify end-to-end functionality across modules: files on
//! disk, validation and application to a running compressor.

use squeezer_config::{CompressorConfig, ConfigError, factory_presets, get_factory_preset};
use squeezer_core::{Compressor, Design, Detector, GainStageKind, SharedParams};
use tempfile::TempDir;

fn sine(num_samples: usize, amplitude: f32) -> Vec<f32> {
    (0..num_samples)
        .map(|i| (i as f32 * 0.05).sin() * amplitude)
        .collect()
}

/// Save a configuration, load it back and compare.
#[test]
fn test_save_and_load_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bus.toml");

    let config = CompressorConfig {
        threshold_db: -14.0,
        ratio: 5.0,
        detector: "smooth-decoupled".to_string(),
        gain_stage: "optical".to_string(),
        design: "feed-back".to_string(),
        external_side_chain: true,
        look_ahead_ms: 2.5,
        ..CompressorConfig::new("Bus").with_description("Test bus")
    };
    config.save(&path).unwrap();

    let loaded = CompressorConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.detector(), Detector::SmoothDecoupled);
    assert_eq!(loaded.gain_stage(), GainStageKind::Optical);
    assert_eq!(loaded.design(), Design::FeedBack);
    assert!(loaded.external_side_chain);
}

/// A listening config routes the external key to the output.
#[test]
fn test_listen_to_side_chain_from_file() {
    let config = CompressorConfig::from_toml(
        "external_side_chain = true\nlisten_to_side_chain = true\nthreshold_db = -30.0\n",
    )
    .unwrap();
    config.validate().unwrap();

    let mut compressor = Compressor::<f32>::new(2, 48000.0);
    config.apply(&mut compressor);

    let mut main = vec![sine(4800, 0.5), sine(4800, 0.5)];
    let key = vec![sine(4800, 0.25), sine(4800, 0.125)];
    compressor.process_block_with_side_chain(&mut main, &key);

    assert_eq!(main, key);
    assert!(compressor.max_gain_reduction() > 0.0);
}

/// A hand-written partial file fills in defaults.
#[test]
fn test_partial_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("partial.toml");
    std::fs::write(&path, "ratio = 8.0\ngain_stage = \"optical\"\n").unwrap();

    let loaded = CompressorConfig::load(&path).unwrap();
    assert_eq!(loaded.ratio, 8.0);
    assert_eq!(loaded.threshold_db, CompressorConfig::default().threshold_db);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_missing_file_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.toml");

    let err = CompressorConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let err = CompressorConfig::from_toml("ratio = \"four\"").unwrap_err();
    assert!(matches!(err, ConfigError::TomlParse(_)));
}

/// Every factory preset runs a stereo block cleanly.
#[test]
fn test_factory_presets_process_audio() {
    for preset in factory_presets() {
        let mut compressor = Compressor::<f32>::new(2, 48000.0);
        preset.apply(&mut compressor);

        let mut left = sine(4800, 0.8);
        let mut right = sine(4800, 0.6);
        compressor.process_block(&mut [&mut left[..], &mut right[..]]);

        assert!(
            left.iter().chain(&right).all(|s| s.is_finite()),
            "{:?} produced non-finite output",
            preset.name
        );
        assert!(
            compressor.max_gain_reduction() > 0.0,
            "{:?} never compressed a loud sine",
            preset.name
        );
    }
}

/// Config snapshots travel through the shared parameter mailbox.
#[test]
fn test_config_through_shared_params() {
    let preset = get_factory_preset("opto-leveler").unwrap();
    let shared = SharedParams::default();
    shared.store(&preset.params());

    let mut generation = 0;
    let params = shared.load_if_changed(&mut generation).unwrap();

    let mut compressor = Compressor::<f32>::new(1, 44100.0);
    compressor.apply_params(&params);
    let applied = compressor.params();
    assert_eq!(applied.threshold_db, preset.threshold_db);
    assert!((applied.ratio - preset.ratio).abs() < 1e-4);
    assert_eq!(applied.release_ms, preset.release_ms);
    assert_eq!(compressor.gain_stage(), GainStageKind::Optical);
}
