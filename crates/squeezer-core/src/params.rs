//! Side-chain parameter snapshots and their hand-off between threads.
//!
//! The audio thread never observes a parameter changing mid-block: the
//! control thread publishes a complete [`SideChainParams`] through
//! [`SharedParams`], and the audio thread picks it up at the start of the
//! next block with [`SharedParams::load_if_changed`].
//!
//! ```text
//! control thread                 audio thread
//! ──────────────                 ────────────
//! shared.store(&params) ──────►  if let Some(p) = shared.load_if_changed(&mut generation) {
//!                                    compressor.apply_params(&p);
//!                                }
//!                                compressor.process_block(..);
//! ```

use crate::curve::{DEFAULT_ATTACK_MS, DEFAULT_RELEASE_MS, Detector};
use crate::gain_computer::{DEFAULT_KNEE_WIDTH_DB, DEFAULT_RATIO, DEFAULT_THRESHOLD_DB};
use crate::gain_stage::GainStageKind;

/// Default detector RMS window in milliseconds.
pub const DEFAULT_RMS_WINDOW_MS: f64 = 10.0;

/// Complete set of side-chain parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideChainParams {
    /// Threshold in dB.
    pub threshold_db: f32,
    /// Compression ratio (`> 0`).
    pub ratio: f32,
    /// Knee width in dB (`>= 0`).
    pub knee_width_db: f32,
    /// Detector RMS window in ms (`<= 0` bypasses the filter).
    pub rms_window_ms: f32,
    /// Attack rate in ms.
    pub attack_ms: f32,
    /// Release rate in ms.
    pub release_ms: f32,
    /// Detector curve.
    pub detector: Detector,
    /// Gain stage model.
    pub gain_stage: GainStageKind,
}

impl Default for SideChainParams {
    fn default() -> Self {
        Self {
            threshold_db: DEFAULT_THRESHOLD_DB as f32,
            ratio: DEFAULT_RATIO as f32,
            knee_width_db: DEFAULT_KNEE_WIDTH_DB as f32,
            rms_window_ms: DEFAULT_RMS_WINDOW_MS as f32,
            attack_ms: DEFAULT_ATTACK_MS as f32,
            release_ms: DEFAULT_RELEASE_MS as f32,
            detector: Detector::default(),
            gain_stage: GainStageKind::default(),
        }
    }
}

#[cfg(feature = "std")]
pub use shared::SharedParams;

#[cfg(feature = "std")]
mod shared {
    use super::SideChainParams;
    use crate::curve::Detector;
    use crate::gain_stage::GainStageKind;
    use std::sync::atomic::{AtomicU8, AtomicU32, Ordering, fence};

    /// Single-writer, wait-free parameter mailbox.
    ///
    /// A sequence lock over atomic fields: `f32` values are stored as bit
    /// patterns, selectors as `u8`. The generation counter is odd while a
    /// store is in progress. A reader that races a store sees a torn
    /// snapshot, discards it and returns `None`; the next block retries.
    ///
    /// Only one thread may call [`store`](Self::store) at a time.
    #[derive(Debug)]
    pub struct SharedParams {
        generation: AtomicU32,
        threshold_db: AtomicU32,
        ratio: AtomicU32,
        knee_width_db: AtomicU32,
        rms_window_ms: AtomicU32,
        attack_ms: AtomicU32,
        release_ms: AtomicU32,
        detector: AtomicU8,
        gain_stage: AtomicU8,
    }

    impl SharedParams {
        /// Create a mailbox holding `params`.
        ///
        /// Readers starting with a `last_generation` of `0` receive this
        /// initial snapshot on their first load.
        pub fn new(params: &SideChainParams) -> Self {
            Self {
                generation: AtomicU32::new(2),
                threshold_db: AtomicU32::new(params.threshold_db.to_bits()),
                ratio: AtomicU32::new(params.ratio.to_bits()),
                knee_width_db: AtomicU32::new(params.knee_width_db.to_bits()),
                rms_window_ms: AtomicU32::new(params.rms_window_ms.to_bits()),
                attack_ms: AtomicU32::new(params.attack_ms.to_bits()),
                release_ms: AtomicU32::new(params.release_ms.to_bits()),
                detector: AtomicU8::new(params.detector as u8),
                gain_stage: AtomicU8::new(params.gain_stage as u8),
            }
        }

        /// Current generation (even when no store is in progress).
        pub fn generation(&self) -> u32 {
            self.generation.load(Ordering::Acquire)
        }

        /// Publish a new snapshot.
        pub fn store(&self, params: &SideChainParams) {
            let generation = self.generation.load(Ordering::Relaxed);
            debug_assert!(generation % 2 == 0, "concurrent SharedParams::store");

            self.generation
                .store(generation.wrapping_add(1), Ordering::Relaxed);
            fence(Ordering::Release);

            self.threshold_db
                .store(params.threshold_db.to_bits(), Ordering::Relaxed);
            self.ratio.store(params.ratio.to_bits(), Ordering::Relaxed);
            self.knee_width_db
                .store(params.knee_width_db.to_bits(), Ordering::Relaxed);
            self.rms_window_ms
                .store(params.rms_window_ms.to_bits(), Ordering::Relaxed);
            self.attack_ms
                .store(params.attack_ms.to_bits(), Ordering::Relaxed);
            self.release_ms
                .store(params.release_ms.to_bits(), Ordering::Relaxed);
            self.detector
                .store(params.detector as u8, Ordering::Relaxed);
            self.gain_stage
                .store(params.gain_stage as u8, Ordering::Relaxed);

            // skip 0 on wrap-around so a fresh reader always sees a change
            let mut next = generation.wrapping_add(2);
            if next == 0 {
                next = 2;
            }
            self.generation.store(next, Ordering::Release);
        }

        /// Read the snapshot if it changed since `last_generation`.
        ///
        /// Returns `None` when nothing changed or a store is in progress;
        /// `last_generation` is only updated on success.
        pub fn load_if_changed(&self, last_generation: &mut u32) -> Option<SideChainParams> {
            let before = self.generation.load(Ordering::Acquire);
            if before == *last_generation || before % 2 == 1 {
                return None;
            }

            let threshold_db = f32::from_bits(self.threshold_db.load(Ordering::Relaxed));
            let ratio = f32::from_bits(self.ratio.load(Ordering::Relaxed));
            let knee_width_db = f32::from_bits(self.knee_width_db.load(Ordering::Relaxed));
            let rms_window_ms = f32::from_bits(self.rms_window_ms.load(Ordering::Relaxed));
            let attack_ms = f32::from_bits(self.attack_ms.load(Ordering::Relaxed));
            let release_ms = f32::from_bits(self.release_ms.load(Ordering::Relaxed));
            let detector = self.detector.load(Ordering::Relaxed);
            let gain_stage = self.gain_stage.load(Ordering::Relaxed);

            fence(Ordering::Acquire);
            if self.generation.load(Ordering::Relaxed) != before {
                return None;
            }

            // selectors were written from valid enums
            let detector = Detector::try_from(detector).ok()?;
            let gain_stage = GainStageKind::try_from(gain_stage).ok()?;

            *last_generation = before;
            Some(SideChainParams {
                threshold_db,
                ratio,
                knee_width_db,
                rms_window_ms,
                attack_ms,
                release_ms,
                detector,
                gain_stage,
            })
        }
    }

    impl Default for SharedParams {
        fn default() -> Self {
            Self::new(&SideChainParams::default())
        }
    }
}
