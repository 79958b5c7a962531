//! Detector curves: envelope followers that smooth the ideal gain reduction.
//!
//! All three curves share the same attack branch (logarithmic, 90% of target
//! in the attack time) and differ in how they release:
//!
//! | Detector | Release |
//! |----------|---------|
//! | [`Detector::Linear`] | falls 10 dB per release interval, never undershooting the target |
//! | [`Detector::SmoothBranching`] | logarithmic, only while the target is below the state |
//! | [`Detector::SmoothDecoupled`] | logarithmic peak detector feeding the attack envelope |
//!
//! Branching curves route `target >= state` to the attack branch, so a
//! target equal to the current state is always a no-op.
//!
//! A coefficient of `0` (rate `<= 0` ms) means "no smoothing": the state
//! snaps to the target on that branch.

use crate::math::{blend, cast, linear_coefficient, log_coefficient};
use core::fmt;
use num_traits::Float;

/// Default attack rate in milliseconds.
pub const DEFAULT_ATTACK_MS: f64 = 10.0;
/// Default release rate in milliseconds.
pub const DEFAULT_RELEASE_MS: f64 = 100.0;

/// Common contract of the detector curves.
pub trait CompressorCurve<F> {
    /// Zero all envelope state.
    fn reset(&mut self);

    /// Set the attack rate in milliseconds and recompute its coefficient.
    fn set_attack_rate(&mut self, attack_ms: F);

    /// Set the release rate in milliseconds and recompute its coefficient.
    fn set_release_rate(&mut self, release_ms: F);

    /// Advance one sample towards `ideal_reduction` (dB), returning the
    /// smoothed gain reduction (dB).
    fn process_sample(&mut self, ideal_reduction: F) -> F;
}

/// Detector curve selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Detector {
    /// Logarithmic attack, linear release.
    Linear = 0,
    /// Logarithmic peak detector followed by a logarithmic attack envelope.
    SmoothDecoupled = 1,
    /// Logarithmic attack and release, branching on direction.
    #[default]
    SmoothBranching = 2,
}

impl Detector {
    /// All detectors, in selector order.
    pub const ALL: [Detector; 3] = [
        Detector::Linear,
        Detector::SmoothDecoupled,
        Detector::SmoothBranching,
    ];

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            Detector::Linear => "linear",
            Detector::SmoothDecoupled => "smooth-decoupled",
            Detector::SmoothBranching => "smooth-branching",
        }
    }
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw selector value that names no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSelector(pub u8);

impl fmt::Display for InvalidSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid selector value {}", self.0)
    }
}

impl TryFrom<u8> for Detector {
    type Error = InvalidSelector;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Detector::Linear),
            1 => Ok(Detector::SmoothDecoupled),
            2 => Ok(Detector::SmoothBranching),
            other => Err(InvalidSelector(other)),
        }
    }
}

/// Rates and coefficients shared by every curve.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Timing<F> {
    sample_rate: F,
    attack_ms: F,
    release_ms: F,
    attack_coeff: F,
    release_coeff: F,
}

impl<F: Float> Timing<F> {
    fn new(sample_rate: F) -> Self {
        debug_assert!(sample_rate > F::zero(), "sample rate must be positive");
        Self {
            sample_rate,
            attack_ms: F::zero(),
            release_ms: F::zero(),
            attack_coeff: F::zero(),
            release_coeff: F::zero(),
        }
    }

    fn set_attack(&mut self, attack_ms: F) {
        self.attack_ms = attack_ms;
        self.attack_coeff = log_coefficient(attack_ms, self.sample_rate);
    }

    /// Logarithmic attack shared by all curves.
    #[inline]
    fn attack(&self, state: F, target: F) -> F {
        if self.attack_coeff == F::zero() {
            target
        } else {
            blend(self.attack_coeff, state, target)
        }
    }
}

/// Logarithmic attack, linear release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRelease<F> {
    timing: Timing<F>,
    gain_reduction: F,
}

impl<F: Float> LinearRelease<F> {
    /// Create a curve with zero rates (pass-through) at `sample_rate`.
    pub fn new(sample_rate: F) -> Self {
        Self {
            timing: Timing::new(sample_rate),
            gain_reduction: F::zero(),
        }
    }
}

impl<F: Float> CompressorCurve<F> for LinearRelease<F> {
    fn reset(&mut self) {
        self.gain_reduction = F::zero();
    }

    fn set_attack_rate(&mut self, attack_ms: F) {
        self.timing.set_attack(attack_ms);
    }

    fn set_release_rate(&mut self, release_ms: F) {
        self.timing.release_ms = release_ms;
        self.timing.release_coeff = linear_coefficient(release_ms, self.timing.sample_rate);
    }

    #[inline]
    fn process_sample(&mut self, ideal_reduction: F) -> F {
        if ideal_reduction >= self.gain_reduction {
            self.gain_reduction = self.timing.attack(self.gain_reduction, ideal_reduction);
        } else if self.timing.release_coeff == F::zero() {
            self.gain_reduction = ideal_reduction;
        } else {
            // never fall below the target, or the envelope oscillates
            self.gain_reduction =
                (self.gain_reduction - self.timing.release_coeff).max(ideal_reduction);
        }

        self.gain_reduction
    }
}

/// Logarithmic attack and release, selected by direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothBranching<F> {
    timing: Timing<F>,
    gain_reduction: F,
}

impl<F: Float> SmoothBranching<F> {
    /// Create a curve with zero rates (pass-through) at `sample_rate`.
    pub fn new(sample_rate: F) -> Self {
        Self {
            timing: Timing::new(sample_rate),
            gain_reduction: F::zero(),
        }
    }
}

impl<F: Float> CompressorCurve<F> for SmoothBranching<F> {
    fn reset(&mut self) {
        self.gain_reduction = F::zero();
    }

    fn set_attack_rate(&mut self, attack_ms: F) {
        self.timing.set_attack(attack_ms);
    }

    fn set_release_rate(&mut self, release_ms: F) {
        self.timing.release_ms = release_ms;
        self.timing.release_coeff = log_coefficient(release_ms, self.timing.sample_rate);
    }

    #[inline]
    fn process_sample(&mut self, ideal_reduction: F) -> F {
        if ideal_reduction >= self.gain_reduction {
            self.gain_reduction = self.timing.attack(self.gain_reduction, ideal_reduction);
        } else if self.timing.release_coeff == F::zero() {
            self.gain_reduction = ideal_reduction;
        } else {
            self.gain_reduction =
                blend(self.timing.release_coeff, self.gain_reduction, ideal_reduction);
        }

        self.gain_reduction
    }
}

/// Release peak detector feeding a separate attack envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothDecoupled<F> {
    timing: Timing<F>,
    gain_reduction: F,
    intermediate: F,
}

impl<F: Float> SmoothDecoupled<F> {
    /// Create a curve with zero rates (pass-through) at `sample_rate`.
    pub fn new(sample_rate: F) -> Self {
        Self {
            timing: Timing::new(sample_rate),
            gain_reduction: F::zero(),
            intermediate: F::zero(),
        }
    }

    /// Output of the release (peak) stage.
    pub fn intermediate(&self) -> F {
        self.intermediate
    }
}

impl<F: Float> CompressorCurve<F> for SmoothDecoupled<F> {
    fn reset(&mut self) {
        self.gain_reduction = F::zero();
        self.intermediate = F::zero();
    }

    fn set_attack_rate(&mut self, attack_ms: F) {
        self.timing.set_attack(attack_ms);
    }

    fn set_release_rate(&mut self, release_ms: F) {
        self.timing.release_ms = release_ms;
        self.timing.release_coeff = log_coefficient(release_ms, self.timing.sample_rate);
    }

    #[inline]
    fn process_sample(&mut self, ideal_reduction: F) -> F {
        if self.timing.release_coeff == F::zero() {
            self.intermediate = ideal_reduction;
        } else {
            self.intermediate = blend(self.timing.release_coeff, self.intermediate, ideal_reduction)
                .max(ideal_reduction);
        }

        self.gain_reduction = self.timing.attack(self.gain_reduction, self.intermediate);
        self.gain_reduction
    }
}

/// The active detector curve of a side chain.
///
/// A closed set of variants dispatched with a `match`; replacing the value
/// replaces (and thereby resets) only the curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectorCurve<F> {
    /// See [`LinearRelease`].
    Linear(LinearRelease<F>),
    /// See [`SmoothDecoupled`].
    SmoothDecoupled(SmoothDecoupled<F>),
    /// See [`SmoothBranching`].
    SmoothBranching(SmoothBranching<F>),
}

impl<F: Float> DetectorCurve<F> {
    /// Build a freshly reset curve of the given kind with its rates applied.
    pub fn new(detector: Detector, sample_rate: F, attack_ms: F, release_ms: F) -> Self {
        let mut curve = match detector {
            Detector::Linear => DetectorCurve::Linear(LinearRelease::new(sample_rate)),
            Detector::SmoothDecoupled => {
                DetectorCurve::SmoothDecoupled(SmoothDecoupled::new(sample_rate))
            }
            Detector::SmoothBranching => {
                DetectorCurve::SmoothBranching(SmoothBranching::new(sample_rate))
            }
        };
        curve.reset();
        curve.set_attack_rate(attack_ms);
        curve.set_release_rate(release_ms);
        curve
    }

    /// Build a curve with the default 10 ms attack and 100 ms release.
    pub fn with_default_rates(detector: Detector, sample_rate: F) -> Self {
        Self::new(
            detector,
            sample_rate,
            cast(DEFAULT_ATTACK_MS),
            cast(DEFAULT_RELEASE_MS),
        )
    }

    /// Which detector this curve implements.
    pub fn detector(&self) -> Detector {
        match self {
            DetectorCurve::Linear(_) => Detector::Linear,
            DetectorCurve::SmoothDecoupled(_) => Detector::SmoothDecoupled,
            DetectorCurve::SmoothBranching(_) => Detector::SmoothBranching,
        }
    }

    fn timing(&self) -> &Timing<F> {
        match self {
            DetectorCurve::Linear(c) => &c.timing,
            DetectorCurve::SmoothDecoupled(c) => &c.timing,
            DetectorCurve::SmoothBranching(c) => &c.timing,
        }
    }

    /// Attack rate in milliseconds.
    pub fn attack_rate(&self) -> F {
        self.timing().attack_ms
    }

    /// Release rate in milliseconds.
    pub fn release_rate(&self) -> F {
        self.timing().release_ms
    }

    /// Current attack coefficient.
    pub fn attack_coefficient(&self) -> F {
        self.timing().attack_coeff
    }

    /// Current release coefficient (linear for [`Detector::Linear`]).
    pub fn release_coefficient(&self) -> F {
        self.timing().release_coeff
    }

    /// Last smoothed gain reduction in dB.
    pub fn gain_reduction(&self) -> F {
        match self {
            DetectorCurve::Linear(c) => c.gain_reduction,
            DetectorCurve::SmoothDecoupled(c) => c.gain_reduction,
            DetectorCurve::SmoothBranching(c) => c.gain_reduction,
        }
    }
}

impl<F: Float> CompressorCurve<F> for DetectorCurve<F> {
    fn reset(&mut self) {
        match self {
            DetectorCurve::Linear(c) => c.reset(),
            DetectorCurve::SmoothDecoupled(c) => c.reset(),
            DetectorCurve::SmoothBranching(c) => c.reset(),
        }
    }

    fn set_attack_rate(&mut self, attack_ms: F) {
        match self {
            DetectorCurve::Linear(c) => c.set_attack_rate(attack_ms),
            DetectorCurve::SmoothDecoupled(c) => c.set_attack_rate(attack_ms),
            DetectorCurve::SmoothBranching(c) => c.set_attack_rate(attack_ms),
        }
    }

    fn set_release_rate(&mut self, release_ms: F) {
        match self {
            DetectorCurve::Linear(c) => c.set_release_rate(release_ms),
            DetectorCurve::SmoothDecoupled(c) => c.set_release_rate(release_ms),
            DetectorCurve::SmoothBranching(c) => c.set_release_rate(release_ms),
        }
    }

    #[inline]
    fn process_sample(&mut self, ideal_reduction: F) -> F {
        match self {
            DetectorCurve::Linear(c) => c.process_sample(ideal_reduction),
            DetectorCurve::SmoothDecoupled(c) => c.process_sample(ideal_reduction),
            DetectorCurve::SmoothBranching(c) => c.process_sample(ideal_reduction),
        }
    }
}
