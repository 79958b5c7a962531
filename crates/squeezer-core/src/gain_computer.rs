//! Static compression curve: input level in dB to ideal gain reduction in dB.
//!
//! The soft-knee shape follows Giannoulis, Massberg & Reiss, "Digital Dynamic
//! Range Compressor Design - A Tutorial and Analysis", JAES 60(6), 2012.
//!
//! ```text
//!  reduction
//!     ^
//!     |                       /  slope = 1 - 1/ratio
//!     |                     /
//!     |                 _ /
//!     |_______________/      <- quadratic inside the knee
//!     +---------------|---|---|-----> input level
//!                  T-W/2  T  T+W/2
//! ```

use crate::math::cast;
use num_traits::Float;

/// Default threshold in dB.
pub const DEFAULT_THRESHOLD_DB: f64 = -32.0;
/// Default compression ratio.
pub const DEFAULT_RATIO: f64 = 2.0;
/// Default knee width in dB (hard knee).
pub const DEFAULT_KNEE_WIDTH_DB: f64 = 0.0;

/// Stateless gain computer.
///
/// The ratio is stored as `1 - 1/ratio` so that [`process_gain`](Self::process_gain)
/// is a single multiply above the knee. The returned reduction is a positive
/// number of decibels (0 = no reduction).
///
/// # Example
///
/// ```rust
/// use squeezer_core::GainComputer;
///
/// let mut computer = GainComputer::<f64>::new();
/// computer.set_threshold(-12.0);
/// computer.set_ratio(4.0);
/// computer.set_knee_width(0.0);
///
/// assert_eq!(computer.process_gain(-20.0), 0.0);
/// assert!((computer.process_gain(-8.0) - 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainComputer<F> {
    threshold: F,
    internal_ratio: F,
    knee_width: F,
}

impl<F: Float> GainComputer<F> {
    /// Create a gain computer with -32 dB threshold, 2:1 ratio and a hard knee.
    pub fn new() -> Self {
        let mut computer = Self {
            threshold: F::zero(),
            internal_ratio: F::zero(),
            knee_width: F::zero(),
        };
        computer.set_threshold(cast(DEFAULT_THRESHOLD_DB));
        computer.set_ratio(cast(DEFAULT_RATIO));
        computer.set_knee_width(cast(DEFAULT_KNEE_WIDTH_DB));
        computer
    }

    /// Threshold in dB.
    pub fn threshold(&self) -> F {
        self.threshold
    }

    /// Set the threshold in dB.
    pub fn set_threshold(&mut self, threshold: F) {
        self.threshold = threshold;
    }

    /// Compression ratio, recovered from the internal representation.
    pub fn ratio(&self) -> F {
        F::one() / (F::one() - self.internal_ratio)
    }

    /// Set the compression ratio (`> 0`; `1` disables compression).
    pub fn set_ratio(&mut self, ratio: F) {
        debug_assert!(ratio > F::zero(), "compression ratio must be positive");
        self.internal_ratio = F::one() - F::one() / ratio;
    }

    /// Knee width in dB.
    pub fn knee_width(&self) -> F {
        self.knee_width
    }

    /// Set the knee width in dB (`0` = hard knee).
    pub fn set_knee_width(&mut self, knee_width: F) {
        debug_assert!(knee_width >= F::zero(), "knee width must not be negative");
        self.knee_width = knee_width;
    }

    /// Ideal (unsmoothed) gain reduction in dB for `input_level` dB.
    #[inline]
    pub fn process_gain(&self, input_level: F) -> F {
        let above_threshold = input_level - self.threshold;

        if self.knee_width == F::zero() {
            if input_level <= self.threshold {
                F::zero()
            } else {
                above_threshold * self.internal_ratio
            }
        } else {
            let half_knee = self.knee_width / cast(2.0);

            if above_threshold < -half_knee {
                F::zero()
            } else if above_threshold > half_knee {
                above_threshold * self.internal_ratio
            } else {
                let factor = above_threshold + half_knee;
                factor * factor / (self.knee_width * cast(2.0)) * self.internal_ratio
            }
        }
    }
}

impl<F: Float> Default for GainComputer<F> {
    fn default() -> Self {
        Self::new()
    }
}
