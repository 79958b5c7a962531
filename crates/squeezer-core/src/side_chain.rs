//! The side chain: detector level in, smoothed gain reduction out.
//!
//! ```text
//! level (dB) ─► GainComputer ─► RMS filter ─► DetectorCurve ─► GainStage ─► reduction (dB)
//!                    │                                              ▲
//!                    └──────────── ideal reduction ─────────────────┘
//! ```
//!
//! All parameter setters are cheap and may be called between samples, but
//! nothing here is synchronized; cross-thread changes go through
//! [`SharedParams`](crate::SharedParams) and [`SideChain::apply_params`].

use crate::curve::{CompressorCurve, DEFAULT_ATTACK_MS, DEFAULT_RELEASE_MS, Detector, DetectorCurve};
use crate::gain_computer::GainComputer;
use crate::gain_stage::{GainStage, GainStageKind, GainStageModel};
use crate::math::{blend, cast, log_coefficient};
use crate::params::{DEFAULT_RMS_WINDOW_MS, SideChainParams};
use num_traits::Float;

/// Input level used to derive the automatic makeup gain.
const AUTO_GAIN_REFERENCE_LEVEL_DB: f64 = 0.0;

/// Compressor side chain for one channel.
///
/// # Example
///
/// ```rust
/// use squeezer_core::{Detector, SideChain};
///
/// let mut side_chain = SideChain::<f64>::new(48000.0);
/// side_chain.set_threshold(-20.0);
/// side_chain.set_ratio(4.0);
/// side_chain.set_detector(Detector::SmoothDecoupled);
///
/// for _ in 0..48000 {
///     side_chain.process_sample(-8.0);
/// }
///
/// // 12 dB above threshold at 4:1
/// assert!((side_chain.get_gain_reduction(false) - 9.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct SideChain<F> {
    sample_rate: F,
    gain_computer: GainComputer<F>,

    rms_window_ms: F,
    rms_coeff: F,
    detector_level_squared: F,

    attack_ms: F,
    release_ms: F,
    curve: DetectorCurve<F>,
    stage: GainStageModel<F>,

    ideal_reduction: F,
    gain_reduction: F,
    gain_compensation: F,
}

impl<F: Float> SideChain<F> {
    /// Create a side chain with default parameters at `sample_rate`.
    ///
    /// Defaults: -32 dB threshold, 2:1, hard knee, 10 ms RMS window,
    /// 10 ms attack, 100 ms release, smooth-branching detector, FET stage.
    pub fn new(sample_rate: F) -> Self {
        assert!(sample_rate > F::zero(), "sample rate must be positive");

        let attack_ms = cast(DEFAULT_ATTACK_MS);
        let release_ms = cast(DEFAULT_RELEASE_MS);

        let mut side_chain = Self {
            sample_rate,
            gain_computer: GainComputer::new(),
            rms_window_ms: F::zero(),
            rms_coeff: F::zero(),
            detector_level_squared: F::zero(),
            attack_ms,
            release_ms,
            curve: DetectorCurve::new(Detector::default(), sample_rate, attack_ms, release_ms),
            stage: GainStageModel::new(GainStageKind::default(), sample_rate, F::zero()),
            ideal_reduction: F::zero(),
            gain_reduction: F::zero(),
            gain_compensation: F::zero(),
        };
        side_chain.set_detector_rms_filter(cast(DEFAULT_RMS_WINDOW_MS));
        side_chain.update_gain_compensation();
        side_chain
    }

    /// Clear all signal state. Parameters are kept.
    pub fn reset(&mut self) {
        self.detector_level_squared = F::zero();
        self.ideal_reduction = F::zero();
        self.gain_reduction = F::zero();
        self.curve.reset();
        self.stage.reset_gain_reduction(F::zero());
    }

    /// Current sample rate in Hz.
    pub fn sample_rate(&self) -> F {
        self.sample_rate
    }

    /// Change the sample rate, recomputing every coefficient.
    ///
    /// Curve and stage are rebuilt (and therefore reset).
    pub fn set_sample_rate(&mut self, sample_rate: F) {
        assert!(sample_rate > F::zero(), "sample rate must be positive");
        if sample_rate == self.sample_rate {
            return;
        }

        self.sample_rate = sample_rate;
        self.set_detector_rms_filter(self.rms_window_ms);
        self.curve = DetectorCurve::new(
            self.curve.detector(),
            sample_rate,
            self.attack_ms,
            self.release_ms,
        );
        self.stage = GainStageModel::new(self.stage.kind(), sample_rate, self.gain_reduction);
    }

    /// Threshold in dB.
    pub fn threshold(&self) -> F {
        self.gain_computer.threshold()
    }

    /// Set the threshold in dB.
    pub fn set_threshold(&mut self, threshold: F) {
        self.gain_computer.set_threshold(threshold);
        self.update_gain_compensation();
    }

    /// Compression ratio.
    pub fn ratio(&self) -> F {
        self.gain_computer.ratio()
    }

    /// Set the compression ratio (`> 0`).
    pub fn set_ratio(&mut self, ratio: F) {
        self.gain_computer.set_ratio(ratio);
        self.update_gain_compensation();
    }

    /// Knee width in dB.
    pub fn knee_width(&self) -> F {
        self.gain_computer.knee_width()
    }

    /// Set the knee width in dB (`0` = hard knee).
    pub fn set_knee_width(&mut self, knee_width: F) {
        self.gain_computer.set_knee_width(knee_width);
        self.update_gain_compensation();
    }

    /// Detector RMS window in ms (`0` when bypassed).
    pub fn rms_window_ms(&self) -> F {
        self.rms_window_ms
    }

    /// Set the detector RMS window in ms; `<= 0` bypasses the filter.
    pub fn set_detector_rms_filter(&mut self, window_ms: F) {
        if window_ms <= F::zero() {
            self.rms_window_ms = F::zero();
            self.rms_coeff = F::zero();
        } else {
            self.rms_window_ms = window_ms;
            self.rms_coeff = log_coefficient(window_ms, self.sample_rate);
        }
    }

    /// Attack rate in ms.
    pub fn attack_ms(&self) -> F {
        self.attack_ms
    }

    /// Set the attack rate in ms. Level state is kept.
    pub fn set_attack_rate(&mut self, attack_ms: F) {
        self.attack_ms = attack_ms;
        self.curve.set_attack_rate(attack_ms);
    }

    /// Release rate in ms.
    pub fn release_ms(&self) -> F {
        self.release_ms
    }

    /// Set the release rate in ms. Level state is kept.
    pub fn set_release_rate(&mut self, release_ms: F) {
        self.release_ms = release_ms;
        self.curve.set_release_rate(release_ms);
    }

    /// Active detector curve.
    pub fn detector(&self) -> Detector {
        self.curve.detector()
    }

    /// Select the detector curve. Switching builds a fresh, reset curve.
    pub fn set_detector(&mut self, detector: Detector) {
        if detector == self.curve.detector() {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("side_chain: detector {} -> {}", self.curve.detector(), detector);

        self.curve = DetectorCurve::new(detector, self.sample_rate, self.attack_ms, self.release_ms);
    }

    /// Active gain stage.
    pub fn gain_stage(&self) -> GainStageKind {
        self.stage.kind()
    }

    /// Select the gain stage, seeding it with the current reduction.
    pub fn set_gain_stage(&mut self, kind: GainStageKind) {
        if kind == self.stage.kind() {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("side_chain: gain stage {} -> {}", self.stage.kind(), kind);

        self.stage = GainStageModel::new(kind, self.sample_rate, self.gain_reduction);
        self.update_gain_compensation();
    }

    /// Apply a parameter snapshot, touching only values that changed.
    pub fn apply_params(&mut self, params: &SideChainParams) {
        let threshold: F = cast(params.threshold_db);
        let ratio: F = cast(params.ratio);
        let knee_width: F = cast(params.knee_width_db);
        let rms_window: F = cast(params.rms_window_ms);
        let attack: F = cast(params.attack_ms);
        let release: F = cast(params.release_ms);

        if threshold != self.threshold() {
            self.set_threshold(threshold);
        }
        if (ratio - self.ratio()).abs() > cast(1e-6) {
            self.set_ratio(ratio);
        }
        if knee_width != self.knee_width() {
            self.set_knee_width(knee_width);
        }
        if rms_window != self.rms_window_ms {
            self.set_detector_rms_filter(rms_window);
        }
        if attack != self.attack_ms {
            self.set_attack_rate(attack);
        }
        if release != self.release_ms {
            self.set_release_rate(release);
        }
        self.set_detector(params.detector);
        self.set_gain_stage(params.gain_stage);
    }

    /// Current parameters as a snapshot.
    pub fn params(&self) -> SideChainParams {
        SideChainParams {
            threshold_db: self.threshold().to_f32().unwrap_or_default(),
            ratio: self.ratio().to_f32().unwrap_or_default(),
            knee_width_db: self.knee_width().to_f32().unwrap_or_default(),
            rms_window_ms: self.rms_window_ms.to_f32().unwrap_or_default(),
            attack_ms: self.attack_ms.to_f32().unwrap_or_default(),
            release_ms: self.release_ms.to_f32().unwrap_or_default(),
            detector: self.detector(),
            gain_stage: self.gain_stage(),
        }
    }

    /// Static gain-computer response, without any smoothing.
    #[inline]
    pub fn query_gain_computer(&self, input_level: F) -> F {
        self.gain_computer.process_gain(input_level)
    }

    /// Last unsmoothed gain reduction in dB.
    pub fn ideal_gain_reduction(&self) -> F {
        self.ideal_reduction
    }

    /// Reduction subtracted by [`get_gain_reduction`](Self::get_gain_reduction)
    /// when automatic makeup gain is on.
    pub fn gain_compensation(&self) -> F {
        self.gain_compensation
    }

    /// Current gain reduction in dB, optionally level-compensated.
    #[inline]
    pub fn get_gain_reduction(&self, auto_makeup_gain: bool) -> F {
        if auto_makeup_gain {
            self.gain_reduction - self.gain_compensation
        } else {
            self.gain_reduction
        }
    }

    /// Process one detector level (dB) and return the new gain reduction (dB).
    #[inline]
    pub fn process_sample(&mut self, input_level: F) -> F {
        self.ideal_reduction = self.gain_computer.process_gain(input_level);

        let filtered = self.apply_rms_filter(self.ideal_reduction);
        let smoothed = self.curve.process_sample(filtered);

        self.gain_reduction = self
            .stage
            .process_gain_reduction(smoothed, self.ideal_reduction);
        self.gain_reduction
    }

    #[inline]
    fn apply_rms_filter(&mut self, level: F) -> F {
        if self.rms_window_ms <= F::zero() {
            return level;
        }

        self.detector_level_squared = blend(self.rms_coeff, self.detector_level_squared, level * level);
        self.detector_level_squared.sqrt()
    }

    fn update_gain_compensation(&mut self) {
        self.gain_compensation =
            self.query_gain_computer(cast(AUTO_GAIN_REFERENCE_LEVEL_DB)) / cast(2.0);
    }
}
