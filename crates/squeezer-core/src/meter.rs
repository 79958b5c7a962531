//! Peak and average level meters with analogue-style ballistics.
//!
//! Samples are collected in blocks of 50 ms. At the end of every block the
//! block's peak and RMS level (dBFS) update two readouts per channel:
//!
//! | Readout | Rise | Fall |
//! |---------|------|------|
//! | Peak | immediate, capped at 0 dBFS | linear, 26 dB in 3 s |
//! | Average | logarithmic, 99% in 300 ms | logarithmic, 99% in 300 ms |
//!
//! Readouts start at [`METER_MINIMUM_DB`] and never allocate after
//! construction.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::math::{METER_MINIMUM_DB, blend, cast, level_to_decibel, log_coefficient_with_remainder};
use num_traits::Float;

/// Length of one metering block in seconds.
pub const METER_BLOCK_SECONDS: f64 = 0.050;
/// Fall of the peak readout, in dB per [`PEAK_FALL_SECONDS`].
pub const PEAK_FALL_DB: f64 = 26.0;
/// Time the peak readout takes to fall [`PEAK_FALL_DB`].
pub const PEAK_FALL_SECONDS: f64 = 3.0;
/// Time the average readout takes to cover 99% of a step.
pub const AVERAGE_INERTIA_MS: f64 = 300.0;

/// Per-channel peak and average meter.
///
/// # Example
///
/// ```rust
/// use squeezer_core::LevelMeter;
///
/// let mut meter = LevelMeter::<f32>::new(1, 48000.0);
/// for _ in 0..meter.block_length() {
///     meter.process_frame(&[0.5]);
/// }
/// assert!((meter.peak_level(0) + 6.02).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct LevelMeter<F> {
    block_length: usize,
    collected: usize,
    block_peaks: Vec<F>,
    block_squares: Vec<F>,
    peak_readouts: Vec<F>,
    average_readouts: Vec<F>,
    peak_fall_db: F,
    average_coeff: F,
}

impl<F: Float> LevelMeter<F> {
    /// Create a meter for `channels` channels at `sample_rate`.
    pub fn new(channels: usize, sample_rate: F) -> Self {
        let updates_per_second: F = F::one() / cast(METER_BLOCK_SECONDS);

        let mut meter = Self {
            block_length: 1,
            collected: 0,
            block_peaks: vec![F::zero(); channels],
            block_squares: vec![F::zero(); channels],
            peak_readouts: vec![F::zero(); channels],
            average_readouts: vec![F::zero(); channels],
            peak_fall_db: cast(PEAK_FALL_DB * METER_BLOCK_SECONDS / PEAK_FALL_SECONDS),
            average_coeff: log_coefficient_with_remainder(
                cast(AVERAGE_INERTIA_MS),
                updates_per_second,
                cast(0.01),
            ),
        };
        meter.set_sample_rate(sample_rate);
        meter
    }

    /// Recompute the block length and restart metering.
    pub fn set_sample_rate(&mut self, sample_rate: F) {
        debug_assert!(sample_rate > F::zero(), "sample rate must be positive");
        let block = (sample_rate * cast(METER_BLOCK_SECONDS))
            .round()
            .to_usize()
            .unwrap_or(1);
        self.block_length = block.max(1);
        self.reset();
    }

    /// Samples collected per readout update.
    pub fn block_length(&self) -> usize {
        self.block_length
    }

    /// Drop the current block and return every readout to the floor.
    pub fn reset(&mut self) {
        self.collected = 0;
        self.block_peaks.fill(F::zero());
        self.block_squares.fill(F::zero());
        self.peak_readouts.fill(cast(METER_MINIMUM_DB));
        self.average_readouts.fill(cast(METER_MINIMUM_DB));
    }

    /// Peak readout of `channel` in dBFS.
    pub fn peak_level(&self, channel: usize) -> F {
        self.peak_readouts[channel]
    }

    /// Average (RMS) readout of `channel` in dBFS.
    pub fn average_level(&self, channel: usize) -> F {
        self.average_readouts[channel]
    }

    /// Collect one sample per channel.
    #[inline]
    pub fn process_frame(&mut self, frame: &[F]) {
        debug_assert_eq!(frame.len(), self.block_peaks.len(), "channel count mismatch");

        for ((&sample, peak), squares) in frame
            .iter()
            .zip(self.block_peaks.iter_mut())
            .zip(self.block_squares.iter_mut())
        {
            *peak = peak.max(sample.abs());
            *squares = *squares + sample * sample;
        }

        self.collected += 1;
        if self.collected >= self.block_length {
            self.update_readouts();
        }
    }

    fn update_readouts(&mut self) {
        let length: F = cast(self.block_length);
        let channels = self.block_peaks.iter_mut().zip(self.block_squares.iter_mut());

        for (channel, (peak, squares)) in channels.enumerate() {
            let peak_db = level_to_decibel(*peak);
            let rms_db = level_to_decibel((*squares / length).sqrt());

            let readout = &mut self.peak_readouts[channel];
            *readout = if peak_db >= F::zero() {
                F::zero()
            } else if peak_db >= *readout {
                peak_db
            } else {
                (*readout - self.peak_fall_db).max(peak_db)
            };

            let readout = &mut self.average_readouts[channel];
            if rms_db != *readout {
                *readout = blend(self.average_coeff, *readout, rms_db);
            }

            *peak = F::zero();
            *squares = F::zero();
        }

        self.collected = 0;
    }
}
