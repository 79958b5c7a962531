//! Multi-channel compressor built on [`SideChain`].
//!
//! Per sample and channel:
//!
//! ```text
//! key = x                           feed-forward
//!     | k                           feed-forward, external side chain
//!     | y[n-1]                      feed-back
//!     | k * 10^(-gr_makeup[n-1]/20) feed-back, external side chain
//! |key| (optionally stereo-linked) ─► dB + crest factor + input trim ─► SideChain
//! y = x * 10^(-gr/20) * makeup      (gr inverted for upward expansion)
//! out = y * wet + x * (1 - wet)     (or key when listening to the side chain)
//! ```
//!
//! `k` is the external side-chain input. Without one, the main input is
//! used in its place. A look-ahead host passes the undelayed signal as `k`
//! and the delayed signal as `x`.
//!
//! Bypass, or a wet mix of 0 %, passes audio through untouched and reports
//! zero gain reduction. Input and output are metered by [`LevelMeter`]s in
//! every mode.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use core::fmt;

use crate::curve::{Detector, InvalidSelector};
use crate::gain_stage::GainStageKind;
use crate::math::{cast, decibel_to_level, level_to_decibel};
use crate::meter::LevelMeter;
use crate::params::SideChainParams;
use crate::side_chain::SideChain;
use num_traits::Float;

/// Default crest factor added to the detector level, in dB.
pub const DEFAULT_CREST_FACTOR_DB: f64 = 20.0;
/// Default stereo link in percent.
pub const DEFAULT_STEREO_LINK: f64 = 100.0;
/// Default wet mix in percent.
pub const DEFAULT_WET_MIX: f64 = 100.0;

/// Where the side chain takes its signal from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Design {
    /// Detect on the input.
    #[default]
    FeedForward = 0,
    /// Detect on the previous output sample.
    FeedBack = 1,
}

impl Design {
    /// All designs, in selector order.
    pub const ALL: [Design; 2] = [Design::FeedForward, Design::FeedBack];

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            Design::FeedForward => "feed-forward",
            Design::FeedBack => "feed-back",
        }
    }
}

impl fmt::Display for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Design {
    type Error = InvalidSelector;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Design::FeedForward),
            1 => Ok(Design::FeedBack),
            other => Err(InvalidSelector(other)),
        }
    }
}

/// Compressor for a fixed number of de-interleaved channels.
///
/// # Example
///
/// ```rust
/// use squeezer_core::Compressor;
///
/// let mut compressor = Compressor::<f32>::new(2, 48000.0);
/// compressor.set_threshold(-20.0);
/// compressor.set_ratio(4.0);
///
/// let mut left = vec![0.5_f32; 512];
/// let mut right = vec![0.5_f32; 512];
/// compressor.process_block(&mut [&mut left[..], &mut right[..]]);
///
/// assert!(left[511] < 0.5);
/// assert!(compressor.gain_reduction(0) > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Compressor<F> {
    side_chains: Vec<SideChain<F>>,
    gain_reduction: Vec<F>,
    gain_reduction_with_makeup: Vec<F>,
    frame: Vec<F>,
    key_frame: Vec<F>,
    side_samples: Vec<F>,
    output_samples: Vec<F>,
    input_meter: LevelMeter<F>,
    output_meter: LevelMeter<F>,

    design: Design,
    external_side_chain: bool,
    listen_to_side_chain: bool,

    upward_expansion: bool,
    stereo_link: F,
    link_weight: F,
    link_weight_other: F,

    auto_makeup_gain: bool,
    makeup_gain_db: F,
    makeup_gain: F,

    wet_mix: F,
    wet: F,
    dry: F,

    crest_factor_db: F,
    input_trim_db: F,

    bypass: bool,
}

impl<F: Float> Compressor<F> {
    /// Create a compressor for `channels` channels at `sample_rate`.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is zero.
    pub fn new(channels: usize, sample_rate: F) -> Self {
        assert!(channels > 0, "compressor needs at least one channel");

        let mut compressor = Self {
            side_chains: vec![SideChain::new(sample_rate); channels],
            gain_reduction: vec![F::zero(); channels],
            gain_reduction_with_makeup: vec![F::zero(); channels],
            frame: vec![F::zero(); channels],
            key_frame: vec![F::zero(); channels],
            side_samples: vec![F::zero(); channels],
            output_samples: vec![F::zero(); channels],
            input_meter: LevelMeter::new(channels, sample_rate),
            output_meter: LevelMeter::new(channels, sample_rate),
            design: Design::FeedForward,
            external_side_chain: false,
            listen_to_side_chain: false,
            upward_expansion: false,
            stereo_link: F::zero(),
            link_weight: F::one(),
            link_weight_other: F::zero(),
            auto_makeup_gain: false,
            makeup_gain_db: F::zero(),
            makeup_gain: F::one(),
            wet_mix: F::zero(),
            wet: F::one(),
            dry: F::zero(),
            crest_factor_db: cast(DEFAULT_CREST_FACTOR_DB),
            input_trim_db: F::zero(),
            bypass: false,
        };
        compressor.set_stereo_link(cast(DEFAULT_STEREO_LINK));
        compressor.set_wet_mix(cast(DEFAULT_WET_MIX));
        compressor
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.side_chains.len()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> F {
        self.side_chains[0].sample_rate()
    }

    /// Change the sample rate of every side chain and meter.
    pub fn set_sample_rate(&mut self, sample_rate: F) {
        for side_chain in &mut self.side_chains {
            side_chain.set_sample_rate(sample_rate);
        }
        self.input_meter.set_sample_rate(sample_rate);
        self.output_meter.set_sample_rate(sample_rate);
    }

    /// Side chain of `channel`.
    pub fn side_chain(&self, channel: usize) -> &SideChain<F> {
        &self.side_chains[channel]
    }

    /// Clear all signal state.
    pub fn reset(&mut self) {
        for side_chain in &mut self.side_chains {
            side_chain.reset();
        }
        self.gain_reduction.fill(F::zero());
        self.gain_reduction_with_makeup.fill(F::zero());
        self.output_samples.fill(F::zero());
        self.input_meter.reset();
        self.output_meter.reset();
    }

    /// Threshold in dB.
    pub fn threshold(&self) -> F {
        self.side_chains[0].threshold()
    }

    /// Set the threshold in dB.
    pub fn set_threshold(&mut self, threshold: F) {
        for side_chain in &mut self.side_chains {
            side_chain.set_threshold(threshold);
        }
    }

    /// Ratio; below 1 when upward expansion is active.
    pub fn ratio(&self) -> F {
        let ratio = self.side_chains[0].ratio();
        if self.upward_expansion {
            F::one() / ratio
        } else {
            ratio
        }
    }

    /// Set the ratio. Values below 1 select upward expansion by `1 / ratio`.
    pub fn set_ratio(&mut self, ratio: F) {
        debug_assert!(ratio > F::zero(), "ratio must be positive");

        self.upward_expansion = ratio < F::one();
        let ratio = if self.upward_expansion {
            F::one() / ratio
        } else {
            ratio
        };

        for side_chain in &mut self.side_chains {
            side_chain.set_ratio(ratio);
        }
    }

    /// Whether upward expansion is active.
    pub fn upward_expansion(&self) -> bool {
        self.upward_expansion
    }

    /// Knee width in dB.
    pub fn knee_width(&self) -> F {
        self.side_chains[0].knee_width()
    }

    /// Set the knee width in dB.
    pub fn set_knee_width(&mut self, knee_width: F) {
        for side_chain in &mut self.side_chains {
            side_chain.set_knee_width(knee_width);
        }
    }

    /// Detector RMS window in ms.
    pub fn rms_window_ms(&self) -> F {
        self.side_chains[0].rms_window_ms()
    }

    /// Set the detector RMS window in ms (`<= 0` bypasses it).
    pub fn set_detector_rms_filter(&mut self, window_ms: F) {
        for side_chain in &mut self.side_chains {
            side_chain.set_detector_rms_filter(window_ms);
        }
    }

    /// Attack rate in ms.
    pub fn attack_ms(&self) -> F {
        self.side_chains[0].attack_ms()
    }

    /// Set the attack rate in ms.
    pub fn set_attack_rate(&mut self, attack_ms: F) {
        for side_chain in &mut self.side_chains {
            side_chain.set_attack_rate(attack_ms);
        }
    }

    /// Release rate in ms.
    pub fn release_ms(&self) -> F {
        self.side_chains[0].release_ms()
    }

    /// Set the release rate in ms.
    pub fn set_release_rate(&mut self, release_ms: F) {
        for side_chain in &mut self.side_chains {
            side_chain.set_release_rate(release_ms);
        }
    }

    /// Active detector curve.
    pub fn detector(&self) -> Detector {
        self.side_chains[0].detector()
    }

    /// Select the detector curve.
    pub fn set_detector(&mut self, detector: Detector) {
        for side_chain in &mut self.side_chains {
            side_chain.set_detector(detector);
        }
    }

    /// Active gain stage.
    pub fn gain_stage(&self) -> GainStageKind {
        self.side_chains[0].gain_stage()
    }

    /// Select the gain stage.
    pub fn set_gain_stage(&mut self, kind: GainStageKind) {
        for side_chain in &mut self.side_chains {
            side_chain.set_gain_stage(kind);
        }
    }

    /// Stereo link in percent.
    pub fn stereo_link(&self) -> F {
        self.stereo_link
    }

    /// Set the stereo link in percent (0 = independent, 100 = equal mix).
    ///
    /// Only has an effect on two-channel compressors.
    pub fn set_stereo_link(&mut self, percent: F) {
        debug_assert!(
            percent >= F::zero() && percent <= cast(100.0),
            "stereo link must be within 0..=100 %"
        );
        self.stereo_link = percent;
        self.link_weight_other = percent / cast(200.0);
        self.link_weight = F::one() - self.link_weight_other;
    }

    /// Whether automatic makeup gain is on.
    pub fn auto_makeup_gain(&self) -> bool {
        self.auto_makeup_gain
    }

    /// Enable or disable automatic makeup gain.
    pub fn set_auto_makeup_gain(&mut self, enabled: bool) {
        self.auto_makeup_gain = enabled;
    }

    /// Manual makeup gain in dB.
    pub fn makeup_gain_db(&self) -> F {
        self.makeup_gain_db
    }

    /// Set the manual makeup gain in dB.
    pub fn set_makeup_gain(&mut self, gain_db: F) {
        self.makeup_gain_db = gain_db;
        self.makeup_gain = decibel_to_level(gain_db);
    }

    /// Wet mix in percent.
    pub fn wet_mix(&self) -> F {
        self.wet_mix
    }

    /// Set the wet mix in percent. 0 % bypasses the compressor.
    pub fn set_wet_mix(&mut self, percent: F) {
        debug_assert!(
            percent >= F::zero() && percent <= cast(100.0),
            "wet mix must be within 0..=100 %"
        );
        self.wet_mix = percent;
        self.wet = percent / cast(100.0);
        self.dry = F::one() - self.wet;
    }

    /// Crest factor added to the detector level, in dB.
    pub fn crest_factor_db(&self) -> F {
        self.crest_factor_db
    }

    /// Set the crest factor in dB.
    pub fn set_crest_factor(&mut self, crest_factor_db: F) {
        self.crest_factor_db = crest_factor_db;
    }

    /// Input trim added to the detector level, in dB.
    pub fn input_trim_db(&self) -> F {
        self.input_trim_db
    }

    /// Set the input trim in dB.
    pub fn set_input_trim(&mut self, trim_db: F) {
        self.input_trim_db = trim_db;
    }

    /// Side-chain topology.
    pub fn design(&self) -> Design {
        self.design
    }

    /// Select feed-forward or feed-back detection.
    pub fn set_design(&mut self, design: Design) {
        self.design = design;
    }

    /// Whether the side chain is keyed by the external input.
    pub fn external_side_chain(&self) -> bool {
        self.external_side_chain
    }

    /// Key the side chain from the external input.
    ///
    /// In feed-back mode this selects the alternative feed-back design: the
    /// external input attenuated by the previous gain reduction.
    pub fn set_external_side_chain(&mut self, enabled: bool) {
        self.external_side_chain = enabled;
    }

    /// Whether the output carries the side-chain signal.
    pub fn listen_to_side_chain(&self) -> bool {
        self.listen_to_side_chain
    }

    /// Replace the output with the signal feeding each side chain.
    pub fn set_listen_to_side_chain(&mut self, enabled: bool) {
        self.listen_to_side_chain = enabled;
    }

    /// Set the bypass switch.
    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
    }

    /// True when bypassed or when the wet mix is 0 %.
    pub fn is_bypassed(&self) -> bool {
        self.bypass || self.wet_mix <= F::zero()
    }

    /// Apply a side-chain snapshot to every channel.
    ///
    /// A ratio below 1 selects upward expansion, as with
    /// [`set_ratio`](Self::set_ratio).
    pub fn apply_params(&mut self, params: &SideChainParams) {
        let mut params = *params;
        self.upward_expansion = params.ratio < 1.0;
        if self.upward_expansion {
            params.ratio = 1.0 / params.ratio;
        }

        for side_chain in &mut self.side_chains {
            side_chain.apply_params(&params);
        }
    }

    /// Current side-chain parameters (ratio below 1 for upward expansion).
    pub fn params(&self) -> SideChainParams {
        let mut params = self.side_chains[0].params();
        if self.upward_expansion {
            params.ratio = 1.0 / params.ratio;
        }
        params
    }

    /// Last gain reduction of `channel` in dB, without makeup gain.
    pub fn gain_reduction(&self, channel: usize) -> F {
        if self.is_bypassed() {
            F::zero()
        } else {
            self.gain_reduction[channel]
        }
    }

    /// Last gain reduction of `channel` in dB, less the auto makeup gain.
    pub fn gain_reduction_with_makeup(&self, channel: usize) -> F {
        if self.is_bypassed() {
            F::zero()
        } else {
            self.gain_reduction_with_makeup[channel]
        }
    }

    /// Peak input readout of `channel` in dBFS.
    pub fn peak_input_level(&self, channel: usize) -> F {
        self.input_meter.peak_level(channel)
    }

    /// Average input readout of `channel` in dBFS.
    pub fn average_input_level(&self, channel: usize) -> F {
        self.input_meter.average_level(channel)
    }

    /// Peak output readout of `channel` in dBFS.
    pub fn peak_output_level(&self, channel: usize) -> F {
        self.output_meter.peak_level(channel)
    }

    /// Average output readout of `channel` in dBFS.
    pub fn average_output_level(&self, channel: usize) -> F {
        self.output_meter.average_level(channel)
    }

    /// Largest gain reduction across channels in dB.
    pub fn max_gain_reduction(&self) -> F {
        (0..self.channels())
            .map(|channel| self.gain_reduction(channel))
            .fold(F::zero(), F::max)
    }

    /// Process one frame (one sample per channel) in place.
    ///
    /// With the external side chain enabled, the frame itself serves as
    /// the external input.
    pub fn process_frame(&mut self, frame: &mut [F]) {
        self.process(frame, None);
    }

    /// Process one frame in place, with `side_chain` as the external input.
    ///
    /// `side_chain` only keys detection while the external side chain is
    /// enabled.
    pub fn process_frame_with_side_chain(&mut self, frame: &mut [F], side_chain: &[F]) {
        debug_assert_eq!(side_chain.len(), self.channels(), "channel count mismatch");
        self.process(frame, Some(side_chain));
    }

    fn process(&mut self, frame: &mut [F], external: Option<&[F]>) {
        debug_assert_eq!(frame.len(), self.channels(), "channel count mismatch");

        self.input_meter.process_frame(frame);

        if self.is_bypassed() {
            self.gain_reduction.fill(F::zero());
            self.gain_reduction_with_makeup.fill(F::zero());
            self.output_meter.process_frame(frame);
            return;
        }

        for (channel, &input) in frame.iter().enumerate() {
            let key = external.map_or(input, |samples| samples[channel]);
            self.side_samples[channel] = match (self.design, self.external_side_chain) {
                (Design::FeedForward, false) => input,
                (Design::FeedForward, true) => key,
                (Design::FeedBack, false) => self.output_samples[channel],
                (Design::FeedBack, true) => {
                    key * decibel_to_level(-self.gain_reduction_with_makeup[channel])
                }
            };
        }

        let side = &self.side_samples;
        let linked = side.len() == 2 && self.stereo_link > F::zero();
        for (channel, side_chain) in self.side_chains.iter_mut().enumerate() {
            let level = if linked {
                (side[channel] * self.link_weight).abs()
                    + (side[1 - channel] * self.link_weight_other).abs()
            } else {
                side[channel].abs()
            };

            let level_db = level_to_decibel(level) + self.crest_factor_db + self.input_trim_db;
            side_chain.process_sample(level_db);
        }

        for (channel, sample) in frame.iter_mut().enumerate() {
            let side_chain = &self.side_chains[channel];
            self.gain_reduction[channel] = side_chain.get_gain_reduction(false);
            self.gain_reduction_with_makeup[channel] = side_chain.get_gain_reduction(true);

            let reduction = if self.auto_makeup_gain {
                self.gain_reduction_with_makeup[channel]
            } else {
                self.gain_reduction[channel]
            };
            let gain_db = if self.upward_expansion {
                reduction
            } else {
                -reduction
            };

            let input = *sample;
            let compressed = input * decibel_to_level(gain_db) * self.makeup_gain;
            self.output_samples[channel] = compressed;

            *sample = if self.listen_to_side_chain {
                self.side_samples[channel]
            } else if self.wet < F::one() {
                compressed * self.wet + input * self.dry
            } else {
                compressed
            };
        }

        self.output_meter.process_frame(frame);
    }

    /// Process de-interleaved channel buffers in place.
    ///
    /// All buffers should have the same length; extra samples in longer
    /// buffers are left untouched.
    pub fn process_block<S: AsMut<[F]>>(&mut self, channels: &mut [S]) {
        self.run_block(channels, None::<&[Vec<F>]>);
    }

    /// Process de-interleaved channel buffers in place, keyed by the
    /// de-interleaved external input `side_chain`.
    ///
    /// Processes as many frames as the shortest main or side-chain buffer.
    pub fn process_block_with_side_chain<S, K>(&mut self, channels: &mut [S], side_chain: &[K])
    where
        S: AsMut<[F]>,
        K: AsRef<[F]>,
    {
        debug_assert_eq!(side_chain.len(), self.channels(), "channel count mismatch");
        self.run_block(channels, Some(side_chain));
    }

    fn run_block<S, K>(&mut self, channels: &mut [S], side_chain: Option<&[K]>)
    where
        S: AsMut<[F]>,
        K: AsRef<[F]>,
    {
        debug_assert_eq!(channels.len(), self.channels(), "channel count mismatch");

        let mut frames = channels
            .iter_mut()
            .map(|channel| channel.as_mut().len())
            .min()
            .unwrap_or(0);
        if let Some(keys) = side_chain {
            let shortest = keys.iter().map(|key| key.as_ref().len()).min().unwrap_or(0);
            frames = frames.min(shortest);
        }

        let mut frame = core::mem::take(&mut self.frame);
        let mut key_frame = core::mem::take(&mut self.key_frame);
        for index in 0..frames {
            for (slot, channel) in frame.iter_mut().zip(channels.iter_mut()) {
                *slot = channel.as_mut()[index];
            }

            match side_chain {
                Some(keys) => {
                    for (slot, key) in key_frame.iter_mut().zip(keys) {
                        *slot = key.as_ref()[index];
                    }
                    self.process(&mut frame, Some(&key_frame));
                }
                None => self.process(&mut frame, None),
            }

            for (slot, channel) in frame.iter().zip(channels.iter_mut()) {
                channel.as_mut()[index] = *slot;
            }
        }
        self.frame = frame;
        self.key_frame = key_frame;
    }
}
