//! Squeezer Core - real-time dynamics engine
//!
//! Turns a running detector level into a smoothed, hardware-flavoured gain
//! reduction, and provides the circular buffer that feeds look-ahead and
//! chunked analysis. Nothing on the processing path allocates, locks or
//! returns an error.
//!
//! # Signal Path
//!
//! ```text
//! level (dB) ─► GainComputer ─► RMS filter ─► DetectorCurve ─► GainStageModel ─► reduction (dB)
//! ```
//!
//! ## Gain Reduction
//!
//! - [`GainComputer`] - Static threshold/ratio/knee curve
//! - [`DetectorCurve`] - Envelope followers: [`LinearRelease`], [`SmoothBranching`], [`SmoothDecoupled`]
//! - [`GainStageModel`] - Hardware emulation: [`Fet`], [`Optical`]
//! - [`SideChain`] - Owns one of each and runs the per-sample pipeline
//! - [`Compressor`] - Multi-channel processor with stereo link, makeup gain and wet mix,
//!   feed-forward or feed-back [`Design`] and an optional external side chain
//! - [`LevelMeter`] - Peak and average meters with ballistics
//!
//! ## Buffers
//!
//! - [`BufferPosition`] - Read/write cursor arithmetic with pre-delay
//! - [`RingBuffer`] - Multi-channel storage with [`ChunkProcessor`] callbacks; its
//!   pre-delay gives a compressor look-ahead when the undelayed samples key
//!   the side chain
//!
//! ## Parameters
//!
//! - [`SideChainParams`] - Plain snapshot of all side-chain parameters
//! - [`SharedParams`] - Wait-free hand-off of snapshots to the audio thread (`std` only)
//!
//! # Numeric Type
//!
//! Every processor is generic over [`num_traits::Float`], so `f32` and `f64`
//! share one implementation.
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! squeezer-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use squeezer_core::{Detector, GainStageKind, SideChain, decibel_to_level, level_to_decibel};
//!
//! let mut side_chain = SideChain::<f32>::new(44100.0);
//! side_chain.set_threshold(-18.0);
//! side_chain.set_ratio(3.0);
//! side_chain.set_detector(Detector::Linear);
//! side_chain.set_gain_stage(GainStageKind::Optical);
//!
//! let input = 0.8_f32;
//! let reduction = side_chain.process_sample(level_to_decibel(input));
//! let output = input * decibel_to_level(-reduction);
//! assert!(output <= input);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod buffer_position;
pub mod compressor;
pub mod curve;
pub mod gain_computer;
pub mod gain_stage;
pub mod math;
pub mod meter;
pub mod params;
pub mod ring_buffer;
pub mod side_chain;

// Re-export main types at crate root
pub use buffer_position::{BlockRange, BufferPosition};
pub use compressor::{Compressor, Design};
pub use curve::{
    CompressorCurve, Detector, DetectorCurve, InvalidSelector, LinearRelease, SmoothBranching,
    SmoothDecoupled,
};
pub use gain_computer::GainComputer;
pub use gain_stage::{Fet, GainStage, GainStageKind, GainStageModel, Optical};
pub use math::{decibel_to_level, level_to_decibel};
pub use meter::LevelMeter;
#[cfg(feature = "std")]
pub use params::SharedParams;
pub use params::SideChainParams;
pub use ring_buffer::{BoxedChunkProcessor, ChunkProcessor, RingBuffer};
pub use side_chain::SideChain;
