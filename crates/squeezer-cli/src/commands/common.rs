//! Shared CLI helpers used across multiple commands.

use clap::Args;
use squeezer_config::{CompressorConfig, load_factory_preset};
use std::path::Path;

/// Command-line overrides for individual compressor parameters.
#[derive(Args, Debug, Default, Clone)]
pub struct ParamOverrides {
    /// Threshold in dB
    #[arg(short, long, allow_negative_numbers = true)]
    pub threshold: Option<f32>,

    /// Ratio (below 1 for upward expansion)
    #[arg(short, long)]
    pub ratio: Option<f32>,

    /// Knee width in dB
    #[arg(short, long)]
    pub knee: Option<f32>,

    /// Detector RMS window in ms (0 bypasses the filter)
    #[arg(long)]
    pub rms_window: Option<f32>,

    /// Attack rate in ms
    #[arg(short, long)]
    pub attack: Option<f32>,

    /// Release rate in ms
    #[arg(long)]
    pub release: Option<f32>,

    /// Detector curve (linear, smooth-decoupled, smooth-branching)
    #[arg(long)]
    pub detector: Option<String>,

    /// Gain stage (fet, optical)
    #[arg(long)]
    pub gain_stage: Option<String>,

    /// Side-chain design (feed-forward, feed-back)
    #[arg(long)]
    pub design: Option<String>,

    /// Output the side-chain signal instead of the compressed audio
    #[arg(long)]
    pub listen_side_chain: bool,

    /// Stereo link in percent
    #[arg(long)]
    pub stereo_link: Option<f32>,

    /// Enable automatic makeup gain
    #[arg(long)]
    pub auto_makeup: bool,

    /// Makeup gain in dB
    #[arg(long, allow_negative_numbers = true)]
    pub makeup: Option<f32>,

    /// Wet mix in percent
    #[arg(long)]
    pub wet: Option<f32>,

    /// Crest factor in dB
    #[arg(long)]
    pub crest_factor: Option<f32>,

    /// Detector input trim in dB
    #[arg(long, allow_negative_numbers = true)]
    pub trim: Option<f32>,

    /// Look-ahead in ms
    #[arg(long)]
    pub look_ahead: Option<f32>,
}

impl ParamOverrides {
    /// Overwrite every field of `config` that was given on the command line.
    pub fn apply_to(&self, config: &mut CompressorConfig) {
        let numeric = [
            (self.threshold, &mut config.threshold_db),
            (self.ratio, &mut config.ratio),
            (self.knee, &mut config.knee_width_db),
            (self.rms_window, &mut config.rms_window_ms),
            (self.attack, &mut config.attack_ms),
            (self.release, &mut config.release_ms),
            (self.stereo_link, &mut config.stereo_link),
            (self.makeup, &mut config.makeup_gain_db),
            (self.wet, &mut config.wet_mix),
            (self.crest_factor, &mut config.crest_factor_db),
            (self.trim, &mut config.input_trim_db),
            (self.look_ahead, &mut config.look_ahead_ms),
        ];
        for (value, field) in numeric {
            if let Some(value) = value {
                *field = value;
            }
        }

        if let Some(detector) = &self.detector {
            config.detector.clone_from(detector);
        }
        if let Some(gain_stage) = &self.gain_stage {
            config.gain_stage.clone_from(gain_stage);
        }
        if let Some(design) = &self.design {
            config.design.clone_from(design);
        }
        if self.listen_side_chain {
            config.listen_to_side_chain = true;
        }
        if self.auto_makeup {
            config.auto_makeup_gain = true;
        }
    }
}

/// Build the effective configuration: preset or file, then overrides.
///
/// The result is validated, so it can be applied to an engine directly.
pub fn load_config(
    config_path: Option<&Path>,
    preset: Option<&str>,
    overrides: &ParamOverrides,
) -> anyhow::Result<CompressorConfig> {
    let mut config = match (config_path, preset) {
        (Some(path), _) => CompressorConfig::load(path)?,
        (None, Some(name)) => load_factory_preset(name).map_err(|e| {
            anyhow::anyhow!("{e}. Use 'squeezer presets' to see available presets.")
        })?,
        (None, None) => CompressorConfig::default(),
    };

    overrides.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

/// Linear amplitude to dBFS, with silence at -120 dB.
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}

/// Peak absolute value.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0, f32::max)
}
