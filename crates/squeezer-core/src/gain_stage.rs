//! Hardware-emulating gain stages applied after the detector curve.
//!
//! - [`Fet`]: instant gain element, returns the curve output unchanged.
//! - [`Optical`]: photocell model whose attack/release speed depends on the
//!   amount of reduction and on how loud the recent past has been.
//!
//! Swapping the stage on a running side chain builds a fresh instance and
//! seeds it with the current reduction via
//! [`GainStage::reset_gain_reduction`], so the output does not jump.

use crate::curve::InvalidSelector;
use crate::math::{blend, cast, log_coefficient, log_coefficient_with_remainder};
use core::fmt;
use num_traits::Float;

/// Common contract of the gain stages.
pub trait GainStage<F> {
    /// Seed the stage with the reduction (dB) currently applied.
    fn reset_gain_reduction(&mut self, current_reduction: F);

    /// Refine the curve output `current_reduction` (dB) given the
    /// unsmoothed `ideal_reduction` (dB).
    fn process_gain_reduction(&mut self, current_reduction: F, ideal_reduction: F) -> F;
}

/// Gain stage selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GainStageKind {
    /// Field-effect transistor: no extra envelope.
    #[default]
    Fet = 0,
    /// Opto-electronic cell: level- and history-dependent envelope.
    Optical = 1,
}

impl GainStageKind {
    /// All gain stages, in selector order.
    pub const ALL: [GainStageKind; 2] = [GainStageKind::Fet, GainStageKind::Optical];

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            GainStageKind::Fet => "fet",
            GainStageKind::Optical => "optical",
        }
    }
}

impl fmt::Display for GainStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for GainStageKind {
    type Error = InvalidSelector;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GainStageKind::Fet),
            1 => Ok(GainStageKind::Optical),
            other => Err(InvalidSelector(other)),
        }
    }
}

/// FET gain stage (identity).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fet;

impl<F: Float> GainStage<F> for Fet {
    fn reset_gain_reduction(&mut self, _current_reduction: F) {}

    #[inline]
    fn process_gain_reduction(&mut self, current_reduction: F, _ideal_reduction: F) -> F {
        current_reduction
    }
}

/// Dynamic range covered by the optical coefficient table, in dB.
pub const OPTICAL_DECIBELS: usize = 37;
/// Table resolution.
pub const OPTICAL_COEFFICIENTS_PER_DB: usize = 2;
/// Number of attack/release coefficient pairs.
pub const OPTICAL_TABLE_SIZE: usize = OPTICAL_DECIBELS * OPTICAL_COEFFICIENTS_PER_DB;

/// Light-history time constant in milliseconds.
const LIGHT_HISTORY_MS: f64 = 10_000.0;
/// Share of the light history subtracted from the ideal reduction.
const LIGHT_HISTORY_WEIGHT: f64 = 0.15;
/// Soft limit of the distance between the cell and the ideal reduction, in dB.
pub const OPTICAL_SATURATION_DB: f64 = 24.0;
/// Cell envelopes reach 73% of the target in the nominal time.
const OPTICAL_REMAINDER: f64 = 0.27;

/// Optical gain stage.
///
/// Rates come from an empirical resistance curve `480 / (3 + dB)`:
///
/// | Reduction | Attack | Release |
/// |-----------|--------|---------|
/// | 0 dB | 16 ms | 160 ms |
/// | 6 dB | 5.3 ms | 53 ms |
/// | 12 dB | 3.2 ms | 32 ms |
/// | 24 dB | 1.8 ms | 18 ms |
///
/// While the cell lags behind the ideal reduction, the lag `d` reported
/// is saturated to `24 - 24 / (1 + d / 24)` dB; the internal envelope is
/// unaffected.
///
/// The table is computed once per sample rate and owned by the instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Optical<F> {
    sample_rate: F,
    gain_reduction: F,
    light_history: F,
    light_history_coeff: F,
    attack_coeffs: [F; OPTICAL_TABLE_SIZE],
    release_coeffs: [F; OPTICAL_TABLE_SIZE],
}

impl<F: Float> Optical<F> {
    /// Build the stage and its coefficient table for `sample_rate`.
    pub fn new(sample_rate: F) -> Self {
        debug_assert!(sample_rate > F::zero(), "sample rate must be positive");

        let mut stage = Self {
            sample_rate,
            gain_reduction: F::zero(),
            light_history: F::zero(),
            light_history_coeff: F::zero(),
            attack_coeffs: [F::zero(); OPTICAL_TABLE_SIZE],
            release_coeffs: [F::zero(); OPTICAL_TABLE_SIZE],
        };
        stage.set_sample_rate(sample_rate);
        stage
    }

    /// Recompute the coefficient table for a new sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: F) {
        self.sample_rate = sample_rate;
        self.light_history_coeff = log_coefficient(cast(LIGHT_HISTORY_MS), sample_rate);

        let remainder: F = cast(OPTICAL_REMAINDER);
        for index in 0..OPTICAL_TABLE_SIZE {
            let decibels: F = cast::<F, _>(index) / cast(OPTICAL_COEFFICIENTS_PER_DB);
            let resistance = cast::<F, _>(480.0) / (cast::<F, _>(3.0) + decibels);
            let attack_ms = resistance / cast(10.0);
            let release_ms = resistance;

            self.attack_coeffs[index] =
                log_coefficient_with_remainder(attack_ms, sample_rate, remainder);
            self.release_coeffs[index] =
                log_coefficient_with_remainder(release_ms, sample_rate, remainder);
        }
    }

    /// Slow envelope of past ideal reduction (dB).
    pub fn light_history(&self) -> F {
        self.light_history
    }

    /// Attack and release coefficient at table `index`.
    pub fn coefficients(&self, index: usize) -> (F, F) {
        (self.attack_coeffs[index], self.release_coeffs[index])
    }

    /// Table index for an ideal reduction given the current light history.
    pub fn table_index(&self, ideal_reduction: F) -> usize {
        let effective = ideal_reduction - self.light_history * cast(LIGHT_HISTORY_WEIGHT);
        let scaled = (effective * cast(OPTICAL_COEFFICIENTS_PER_DB)).round();
        let last: F = cast(OPTICAL_TABLE_SIZE - 1);

        if scaled <= F::zero() {
            0
        } else if scaled >= last {
            OPTICAL_TABLE_SIZE - 1
        } else {
            scaled.to_usize().unwrap_or(0)
        }
    }
}

impl<F: Float> GainStage<F> for Optical<F> {
    fn reset_gain_reduction(&mut self, current_reduction: F) {
        self.gain_reduction = current_reduction;
        self.light_history = F::zero();
    }

    #[inline]
    fn process_gain_reduction(&mut self, current_reduction: F, ideal_reduction: F) -> F {
        self.light_history = blend(self.light_history_coeff, self.light_history, ideal_reduction);

        let index = self.table_index(ideal_reduction);
        let coefficient = if current_reduction > self.gain_reduction {
            self.attack_coeffs[index]
        } else {
            self.release_coeffs[index]
        };

        self.gain_reduction = blend(coefficient, self.gain_reduction, current_reduction);

        // a lagging cell saturates: its distance to the ideal is soft-limited
        if self.gain_reduction < ideal_reduction {
            let limit: F = cast(OPTICAL_SATURATION_DB);
            let lag = ideal_reduction - self.gain_reduction;
            let lag = limit - limit / (F::one() + lag / limit);
            ideal_reduction - lag
        } else {
            self.gain_reduction
        }
    }
}

/// The active gain stage of a side chain.
#[derive(Debug, Clone, PartialEq)]
pub enum GainStageModel<F> {
    /// See [`Fet`].
    Fet(Fet),
    /// See [`Optical`].
    Optical(Optical<F>),
}

impl<F: Float> GainStageModel<F> {
    /// Build a stage of the given kind seeded with `current_reduction`.
    pub fn new(kind: GainStageKind, sample_rate: F, current_reduction: F) -> Self {
        let mut stage = match kind {
            GainStageKind::Fet => GainStageModel::Fet(Fet),
            GainStageKind::Optical => GainStageModel::Optical(Optical::new(sample_rate)),
        };
        stage.reset_gain_reduction(current_reduction);
        stage
    }

    /// Which stage this is.
    pub fn kind(&self) -> GainStageKind {
        match self {
            GainStageModel::Fet(_) => GainStageKind::Fet,
            GainStageModel::Optical(_) => GainStageKind::Optical,
        }
    }
}

impl<F: Float> GainStage<F> for GainStageModel<F> {
    fn reset_gain_reduction(&mut self, current_reduction: F) {
        match self {
            GainStageModel::Fet(s) => GainStage::<F>::reset_gain_reduction(s, current_reduction),
            GainStageModel::Optical(s) => s.reset_gain_reduction(current_reduction),
        }
    }

    #[inline]
    fn process_gain_reduction(&mut self, current_reduction: F, ideal_reduction: F) -> F {
        match self {
            GainStageModel::Fet(s) => s.process_gain_reduction(current_reduction, ideal_reduction),
            GainStageModel::Optical(s) => s.process_gain_reduction(current_reduction, ideal_reduction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 48000.0;

    #[test]
    fn fet_is_identity() {
        let mut fet = Fet;
        for &(current, ideal) in &[(0.0, 0.0), (3.5, 10.0), (12.0, 1.0), (-2.0, 4.0)] {
            assert_eq!(
                GainStage::<f64>::process_gain_reduction(&mut fet, current, ideal),
                current
            );
        }
    }

    #[test]
    fn selector_round_trip() {
        for kind in GainStageKind::ALL {
            assert_eq!(GainStageKind::try_from(kind as u8), Ok(kind));
        }
        assert_eq!(GainStageKind::try_from(2), Err(InvalidSelector(2)));
    }

    #[test]
    fn optical_table_matches_resistance_curve() {
        let optical = Optical::new(SAMPLE_RATE);
        // index 0 = 0 dB: 16 ms attack, 160 ms release, 73% definition
        let (attack, release) = optical.coefficients(0);
        let expected_attack = (0.27_f64.ln() / (0.016 * SAMPLE_RATE)).exp();
        let expected_release = (0.27_f64.ln() / (0.160 * SAMPLE_RATE)).exp();
        assert!((attack - expected_attack).abs() < 1e-12);
        assert!((release - expected_release).abs() < 1e-12);

        for index in 0..OPTICAL_TABLE_SIZE {
            let (a, r) = optical.coefficients(index);
            assert!(a > 0.0 && a < 1.0);
            assert!(r > a, "release must be slower than attack at {index}");
        }
    }

    #[test]
    fn optical_index_is_clamped() {
        let optical = Optical::<f64>::new(SAMPLE_RATE);
        assert_eq!(optical.table_index(-10.0), 0);
        assert_eq!(optical.table_index(0.0), 0);
        assert_eq!(optical.table_index(6.0), 12);
        assert_eq!(optical.table_index(6.2), 12);
        assert_eq!(optical.table_index(6.3), 13);
        assert_eq!(optical.table_index(100.0), OPTICAL_TABLE_SIZE - 1);
    }

    #[test]
    fn optical_light_history_shifts_index() {
        let mut optical = Optical::new(SAMPLE_RATE);
        optical.reset_gain_reduction(0.0);
        // ten seconds of heavy reduction
        for _ in 0..(SAMPLE_RATE as usize * 10) {
            optical.process_gain_reduction(20.0, 20.0);
        }
        assert!((optical.light_history() - 18.0).abs() < 1e-3);
        // 20 - 18 * 0.15 = 17.3 dB -> index 35 instead of 40
        assert_eq!(optical.table_index(20.0), 35);
    }

    #[test]
    fn optical_lag_saturates() {
        let mut optical = Optical::new(SAMPLE_RATE);
        optical.reset_gain_reduction(0.0);

        // one step towards 60 dB: the cell itself moves only a little
        let ideal = 60.0;
        let out = optical.process_gain_reduction(ideal, ideal);
        let cell = optical.gain_reduction;
        assert!(cell < 30.0);

        let lag = ideal - cell;
        let expected = ideal - (24.0 - 24.0 / (1.0 + lag / 24.0));
        assert!((out - expected).abs() < 1e-9);
        // the reported lag never reaches the limit
        assert!(ideal - out < OPTICAL_SATURATION_DB);
        assert!(out > cell);
    }

    #[test]
    fn optical_above_ideal_is_not_saturated() {
        let mut optical = Optical::new(SAMPLE_RATE);
        optical.reset_gain_reduction(12.0);

        let out = optical.process_gain_reduction(0.0, 0.0);
        assert_eq!(out, optical.gain_reduction);
        assert!(out > 0.0 && out < 12.0);
    }

    #[test]
    fn optical_smooths_towards_current() {
        let mut optical = Optical::new(SAMPLE_RATE);
        optical.reset_gain_reduction(0.0);

        let first = optical.process_gain_reduction(10.0, 10.0);
        assert!(first > 0.0 && first < 10.0);

        let mut out = first;
        for _ in 0..48_000 {
            out = optical.process_gain_reduction(10.0, 10.0);
        }
        assert!((out - 10.0).abs() < 1e-6);

        // falling uses the (slower) release coefficient
        let attack_step = first;
        let release_step = 10.0 - optical.process_gain_reduction(0.0, 0.0);
        assert!(release_step < attack_step);
    }

    #[test]
    fn optical_reset_seeds_state() {
        let mut optical = Optical::new(SAMPLE_RATE);
        optical.reset_gain_reduction(6.0);
        let out = optical.process_gain_reduction(6.0, 6.0);
        assert!((out - 6.0).abs() < 1e-12);
    }

    #[test]
    fn model_dispatch() {
        let mut fet = GainStageModel::new(GainStageKind::Fet, SAMPLE_RATE, 3.0);
        assert_eq!(fet.kind(), GainStageKind::Fet);
        assert_eq!(fet.process_gain_reduction(4.0, 8.0), 4.0);

        let mut optical = GainStageModel::new(GainStageKind::Optical, SAMPLE_RATE, 3.0);
        assert_eq!(optical.kind(), GainStageKind::Optical);
        let out = optical.process_gain_reduction(4.0, 8.0);
        assert!(out > 3.0 && out < 4.0);
    }
}
