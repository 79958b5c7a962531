//! Level conversions and envelope coefficient derivation.
//!
//! Everything here is generic over [`num_traits::Float`] so the same code
//! serves `f32` and `f64` processing paths.
//!
//! # Envelope Coefficients
//!
//! A one-pole envelope `y[n] = c * y[n-1] + (1 - c) * x[n]` is driven by a
//! coefficient `c` in `[0, 1)`. Two derivations are used by the detector
//! curves:
//!
//! | Function | Formula | Meaning |
//! |----------|---------|---------|
//! | [`log_coefficient`] | `exp(ln(0.10) / (t * fs))` | reaches 90% of target in `t` |
//! | [`linear_coefficient`] | `10 / (t * fs)` | falls 10 dB per `t` |
//!
//! A rate of zero (or below) always yields a coefficient of exactly `0`,
//! which callers treat as "apply the new value immediately".

use num_traits::{Float, NumCast, ToPrimitive};

/// Lowest level reported by [`level_to_decibel`], just below the lowest
/// meter segment.
pub const METER_MINIMUM_DB: f64 = -70.01;

/// Fraction of the distance to the target that a logarithmic envelope has
/// *not* covered after one time constant (90% reached).
pub const LOG_ENVELOPE_REMAINDER: f64 = 0.10;

/// Decibels a linear release falls per release interval.
pub const LINEAR_RELEASE_DB: f64 = 10.0;

/// Convert a primitive into the processing float type.
///
/// Every value converted here is a finite literal or parameter, which
/// `f32`/`f64` always represent, so the fallback is never observed.
#[inline]
pub(crate) fn cast<F: Float, T: ToPrimitive>(value: T) -> F {
    <F as NumCast>::from(value).unwrap_or_else(F::zero)
}

/// Convert a linear level to decibels.
///
/// Returns [`METER_MINIMUM_DB`] for silence and for anything quieter, so
/// the result is always finite.
///
/// # Example
/// ```rust
/// use squeezer_core::level_to_decibel;
///
/// assert!((level_to_decibel(1.0_f64)).abs() < 1e-12);
/// assert_eq!(level_to_decibel(0.0_f32), -70.01);
/// ```
#[inline]
pub fn level_to_decibel<F: Float>(level: F) -> F {
    let floor: F = cast(METER_MINIMUM_DB);

    if level == F::zero() {
        return floor;
    }

    let decibels = cast::<F, _>(20.0) * level.abs().log10();
    if decibels < floor { floor } else { decibels }
}

/// Convert decibels to a linear level (`10^(dB / 20)`).
///
/// # Example
/// ```rust
/// use squeezer_core::decibel_to_level;
///
/// assert!((decibel_to_level(-6.0206_f64) - 0.5).abs() < 1e-4);
/// ```
#[inline]
pub fn decibel_to_level<F: Float>(decibels: F) -> F {
    cast::<F, _>(10.0).powf(decibels / cast(20.0))
}

/// Logarithmic envelope coefficient reaching 90% of the target in `rate_ms`.
///
/// Returns `0` when `rate_ms <= 0`.
#[inline]
pub fn log_coefficient<F: Float>(rate_ms: F, sample_rate: F) -> F {
    log_coefficient_with_remainder(rate_ms, sample_rate, cast(LOG_ENVELOPE_REMAINDER))
}

/// Logarithmic envelope coefficient leaving `remainder` of the distance to
/// the target uncovered after `rate_ms`.
///
/// `remainder = 0.10` gives the usual 90% definition, `0.27` the 73% one
/// used by the optical cell model. Returns `0` when `rate_ms <= 0`.
#[inline]
pub fn log_coefficient_with_remainder<F: Float>(rate_ms: F, sample_rate: F, remainder: F) -> F {
    if rate_ms <= F::zero() {
        return F::zero();
    }

    let rate_in_samples = sample_rate * rate_ms / cast(1000.0);
    (remainder.ln() / rate_in_samples).exp()
}

/// Linear release coefficient: decibels subtracted per sample so that the
/// envelope falls 10 dB every `rate_ms`.
///
/// Returns `0` when `rate_ms <= 0`.
#[inline]
pub fn linear_coefficient<F: Float>(rate_ms: F, sample_rate: F) -> F {
    if rate_ms <= F::zero() {
        return F::zero();
    }

    let rate_in_samples = sample_rate * rate_ms / cast(1000.0);
    cast::<F, _>(LINEAR_RELEASE_DB) / rate_in_samples
}

/// One step of the shared one-pole blend `c * old + (1 - c) * new`.
#[inline]
pub(crate) fn blend<F: Float>(coefficient: F, old: F, new: F) -> F {
    coefficient * old + (F::one() - coefficient) * new
}
