//! WAV file reading and writing.

use crate::{Error, Result};
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.duration());
    let duration_secs = num_frames as f64 / f64::from(spec.sample_rate);

    let format = match spec.sample_format {
        SampleFormat::Float => WavFormat::IeeeFloat,
        SampleFormat::Int => WavFormat::Pcm,
    };

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        format,
    })
}

/// WAV file specification.
///
/// 32-bit files are written as IEEE float, every other depth as PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample (8, 16, 24 or 32).
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

fn check_bit_depth(format: SampleFormat, bits: u16) -> Result<()> {
    match (format, bits) {
        (SampleFormat::Float, 32) | (SampleFormat::Int, 8 | 16 | 24 | 32) => Ok(()),
        (SampleFormat::Float, bits) => Err(Error::UnsupportedFormat(format!("{bits}-bit float"))),
        (SampleFormat::Int, bits) => Err(Error::UnsupportedFormat(format!("{bits}-bit PCM"))),
    }
}

fn int_scale(bits: u16) -> f32 {
    (1_i64 << (bits - 1)) as f32
}

/// Split interleaved frames into one vector per channel.
///
/// A trailing partial frame is dropped.
pub fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    if channels == 0 {
        return Vec::new();
    }
    let frames = samples.len() / channels;
    let mut out: Vec<Vec<f32>> = (0..channels).map(|_| Vec::with_capacity(frames)).collect();
    for frame in samples.chunks_exact(channels) {
        for (channel, &sample) in out.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }
    out
}

/// Join equal-length channels into interleaved frames.
pub fn interleave<S: AsRef<[f32]>>(channels: &[S]) -> Result<Vec<f32>> {
    let Some(first) = channels.first() else {
        return Ok(Vec::new());
    };
    let frames = first.as_ref().len();
    for (channel, samples) in channels.iter().enumerate() {
        let found = samples.as_ref().len();
        if found != frames {
            return Err(Error::RaggedChannels {
                channel,
                expected: frames,
                found,
            });
        }
    }

    let mut out = Vec::with_capacity(frames * channels.len());
    for i in 0..frames {
        out.extend(channels.iter().map(|c| c.as_ref()[i]));
    }
    Ok(out)
}

/// Read a WAV file as de-interleaved `f32` channels along with its spec.
///
/// Integer samples are scaled to `[-1, 1)`.
///
/// # Example
/// ```ignore
/// let (channels, spec) = read_wav("input.wav")?;
/// println!("{} channels of {} frames", channels.len(), channels[0].len());
/// ```
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<Vec<f32>>, WavSpec)> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let hound_spec = reader.spec();
    check_bit_depth(hound_spec.sample_format, hound_spec.bits_per_sample)?;
    let spec = WavSpec::from(hound_spec);

    let samples: Vec<f32> = match hound_spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = int_scale(spec.bits_per_sample);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let channels = deinterleave(&samples, usize::from(spec.channels));
    tracing::info!(
        path = %path.display(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        frames = channels.first().map_or(0, Vec::len),
        "read WAV file"
    );
    Ok((channels, spec))
}

/// Write de-interleaved channels to a WAV file.
///
/// `channels.len()` must equal `spec.channels` and every channel must have
/// the same length. Integer formats clip to full scale.
///
/// # Example
/// ```ignore
/// let silence = vec![vec![0.0f32; 48000]; 2];
/// write_wav("output.wav", &silence, WavSpec::default())?;
/// ```
pub fn write_wav<P: AsRef<Path>, S: AsRef<[f32]>>(
    path: P,
    channels: &[S],
    spec: WavSpec,
) -> Result<()> {
    let path = path.as_ref();
    if channels.len() != usize::from(spec.channels) {
        return Err(Error::ChannelMismatch {
            expected: usize::from(spec.channels),
            found: channels.len(),
        });
    }
    let hound_spec = hound::WavSpec::from(spec);
    check_bit_depth(hound_spec.sample_format, spec.bits_per_sample)?;
    let interleaved = interleave(channels)?;

    let mut writer = WavWriter::create(path, hound_spec)?;
    if spec.bits_per_sample == 32 {
        for &sample in &interleaved {
            writer.write_sample(sample)?;
        }
    } else {
        let max_val = int_scale(spec.bits_per_sample);
        for &sample in &interleaved {
            let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            writer.write_sample(int_sample)?;
        }
    }
    writer.finalize()?;

    tracing::info!(
        path = %path.display(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        frames = interleaved.len() / channels.len().max(1),
        "wrote WAV file"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_channels(channels: usize, frames: usize, amplitude: f32) -> Vec<Vec<f32>> {
        (0..channels)
            .map(|c| {
                (0..frames)
                    .map(|i| ((i + c * 7) as f32 / 100.0).sin() * amplitude)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_roundtrip_stereo_f32() {
        let channels = test_channels(2, 1000, 1.0);
        let spec = WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &channels, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec, spec);
        assert_eq!(loaded, channels);
    }

    #[test]
    fn test_roundtrip_i16() {
        let channels = test_channels(1, 1000, 0.9);
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &channels, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec.sample_rate, 44100);
        assert_eq!(loaded[0].len(), 1000);

        // 16-bit has less precision
        for (a, b) in channels[0].iter().zip(&loaded[0]) {
            assert!((a - b).abs() < 0.001);
        }
    }

    #[test]
    fn test_roundtrip_i24_multichannel() {
        let channels = test_channels(4, 256, 0.5);
        let spec = WavSpec {
            channels: 4,
            sample_rate: 96000,
            bits_per_sample: 24,
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &channels, spec).unwrap();

        let (loaded, _) = read_wav(file.path()).unwrap();
        assert_eq!(loaded.len(), 4);
        for (original, read) in channels.iter().zip(&loaded) {
            for (a, b) in original.iter().zip(read) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_integer_write_clips() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
        };
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &[vec![2.0_f32, -2.0]], spec).unwrap();

        let (loaded, _) = read_wav(file.path()).unwrap();
        assert!(loaded[0][0] < 1.0 && loaded[0][0] > 0.999);
        assert_eq!(loaded[0][1], -1.0);
    }

    #[test]
    fn test_info_matches_written_file() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
        };
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &test_channels(2, 24000, 0.5), spec).unwrap();

        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.num_frames, 24000);
        assert_eq!(info.format, WavFormat::IeeeFloat);
        assert!((info.duration_secs - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_channel_count_must_match_spec() {
        let file = NamedTempFile::new().unwrap();
        let err = write_wav(file.path(), &test_channels(1, 10, 0.5), WavSpec::default());
        assert!(matches!(
            err,
            Err(Error::ChannelMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_ragged_channels_rejected() {
        let err = interleave(&[vec![0.0_f32; 4], vec![0.0; 3]]);
        assert!(matches!(
            err,
            Err(Error::RaggedChannels {
                channel: 1,
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn test_unsupported_depth_rejected() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 12,
        };
        let err = write_wav(file.path(), &[vec![0.0_f32; 4]], spec);
        assert!(matches!(err, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_interleave_layout() {
        let interleaved = interleave(&[vec![1.0_f32, 3.0], vec![2.0, 4.0]]).unwrap();
        assert_eq!(interleaved, vec![1.0, 2.0, 3.0, 4.0]);

        let back = deinterleave(&interleaved, 2);
        assert_eq!(back, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
        assert_eq!(deinterleave(&[1.0, 2.0, 3.0], 2), vec![vec![1.0], vec![2.0]]);
    }
}
