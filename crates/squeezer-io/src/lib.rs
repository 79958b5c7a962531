//! Audio file I/O for the squeezer compressor.
//!
//! Audio is exchanged as de-interleaved channels (`Vec<Vec<f32>>`, one
//! vector per channel), which is the layout the engine's block processing
//! and ring buffer work on.
//!
//! ```rust,ignore
//! use squeezer_io::{read_wav, write_wav};
//!
//! let (channels, spec) = read_wav("input.wav")?;
//! // ... process channels ...
//! write_wav("output.wav", &channels, spec)?;
//! ```

mod wav;

pub use wav::{
    WavFormat, WavInfo, WavSpec, deinterleave, interleave, read_wav, read_wav_info, write_wav,
};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The sample data does not match the declared channel layout.
    #[error("channel mismatch: expected {expected} channels, got {found}")]
    ChannelMismatch {
        /// Channels declared in the spec.
        expected: usize,
        /// Channels actually supplied.
        found: usize,
    },

    /// Channels of one buffer have different lengths.
    #[error("channel {channel} has {found} samples, expected {expected}")]
    RaggedChannels {
        /// Index of the offending channel.
        channel: usize,
        /// Length of channel 0.
        expected: usize,
        /// Length of the offending channel.
        found: usize,
    },

    /// The requested sample format is not supported.
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
