//! Multi-channel circular audio buffer with pre-delay and chunk callbacks.
//!
//! [`RingBuffer`] stores de-interleaved samples and delegates all cursor
//! arithmetic to [`BufferPosition`]. Writing with
//! [`add_from`](RingBuffer::add_from) invokes a [`ChunkProcessor`] every
//! time another `chunk_size` samples have been queued, counting across
//! calls. When the processor returns `true`, the chunk it was handed is
//! written back to where it came from.
//!
//! # Reads
//!
//! | Method | Range | Moves read cursor |
//! |--------|-------|-------------------|
//! | [`remove_to`](RingBuffer::remove_to) | at read cursor (delayed by pre-delay) | yes |
//! | [`remove_to_null`](RingBuffer::remove_to_null) | none | yes |
//! | [`copy_to`](RingBuffer::copy_to) | ending at write cursor (most recent) | no |
//!
//! # Memory
//!
//! Storage and the chunk scratch buffer are allocated at construction.
//! Reading, writing and chunk callbacks never allocate.
//!
//! Each channel region is fenced by one canary sample on either side; debug
//! builds check them after every write.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::buffer_position::{BlockRange, BufferPosition};
use num_traits::Float;

/// Receives each filled chunk of a [`RingBuffer`].
///
/// `chunk` holds one `Vec` of exactly `chunk_size` samples per channel.
/// Return `true` to have the (modified) chunk written back into the ring.
pub trait ChunkProcessor<T> {
    /// Process one chunk in place.
    fn process_chunk(&mut self, chunk: &mut [Vec<T>]) -> bool;
}

impl<T, P> ChunkProcessor<T> for P
where
    P: FnMut(&mut [Vec<T>]) -> bool,
{
    fn process_chunk(&mut self, chunk: &mut [Vec<T>]) -> bool {
        self(chunk)
    }
}

/// Boxed processor that can be registered on a ring buffer.
pub type BoxedChunkProcessor<T> = Box<dyn ChunkProcessor<T> + Send>;

/// Circular buffer of `channels` x (`samples` + `pre_delay`) samples.
///
/// # Example
///
/// ```rust
/// use squeezer_core::RingBuffer;
///
/// let mut ring = RingBuffer::<f32>::new(1, 8, 2, 4);
/// let input = [vec![1.0, 2.0, 3.0, 4.0]];
/// ring.add_from(&input, 0, 4);
///
/// // Output lags input by the pre-delay
/// let mut output = [vec![0.0; 4]];
/// ring.remove_to(&mut output, 0, 4);
/// assert_eq!(output[0], [0.0, 0.0, 1.0, 2.0]);
/// ```
pub struct RingBuffer<T> {
    channels: usize,
    padded_length: usize,
    data: Vec<T>,
    position: BufferPosition,
    chunk_size: usize,
    samples_to_filled_chunk: usize,
    chunk: Vec<Vec<T>>,
    processor: Option<BoxedChunkProcessor<T>>,
}

impl<T: Float> RingBuffer<T> {
    /// Allocate a zeroed buffer.
    ///
    /// # Panics
    ///
    /// Panics unless `channels > 0`, `samples > 0` and
    /// `0 < chunk_size <= samples`.
    pub fn new(channels: usize, samples: usize, pre_delay: usize, chunk_size: usize) -> Self {
        assert!(channels > 0, "ring buffer needs at least one channel");
        assert!(samples > 0, "ring buffer needs at least one sample");
        assert!(
            chunk_size > 0 && chunk_size <= samples,
            "chunk size {chunk_size} must be in 1..={samples}"
        );

        let position = BufferPosition::new(samples, pre_delay);
        let padded_length = position.total_length() + 2;

        let mut data = vec![T::zero(); channels * padded_length];
        for channel in 0..channels {
            data[channel * padded_length] = Self::canary();
            data[(channel + 1) * padded_length - 1] = Self::canary();
        }

        let mut ring = Self {
            channels,
            padded_length,
            data,
            position,
            chunk_size,
            samples_to_filled_chunk: chunk_size,
            chunk: vec![vec![T::zero(); chunk_size]; channels],
            processor: None,
        };
        ring.clear();
        ring
    }

    #[inline]
    fn canary() -> T {
        T::max_value()
    }

    #[inline]
    fn channel_offset(&self, channel: usize) -> usize {
        channel * self.padded_length + 1
    }

    /// Zero all samples and rewind the cursors and chunk counter.
    pub fn clear(&mut self) {
        self.position.reset();
        self.samples_to_filled_chunk = self.chunk_size;

        let total = self.position.total_length();
        for channel in 0..self.channels {
            let offset = self.channel_offset(channel);
            self.data[offset..offset + total].fill(T::zero());
        }

        self.check_canaries();
    }

    /// Register (or remove) the processor invoked by [`add_from`](Self::add_from).
    pub fn set_chunk_processor(&mut self, processor: Option<BoxedChunkProcessor<T>>) {
        self.processor = processor;
    }

    /// Whether a processor is registered.
    pub fn has_chunk_processor(&self) -> bool {
        self.processor.is_some()
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Usable samples per channel (excluding pre-delay).
    pub fn samples(&self) -> usize {
        self.position.samples()
    }

    /// Pre-delay in samples.
    pub fn pre_delay(&self) -> usize {
        self.position.pre_delay()
    }

    /// Samples per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Samples still missing before the next chunk callback fires.
    pub fn samples_to_filled_chunk(&self) -> usize {
        self.samples_to_filled_chunk
    }

    /// Samples queued and not yet removed.
    pub fn stored_samples(&self) -> isize {
        self.position.stored_samples()
    }

    /// Cursor state.
    pub fn position(&self) -> &BufferPosition {
        &self.position
    }

    /// Queue `count` samples from `source[channel][start..]`, running the
    /// registered chunk processor whenever a chunk fills.
    pub fn add_from<S: AsRef<[T]>>(&mut self, source: &[S], start: usize, count: usize) {
        let mut processor = self.processor.take();
        self.queue_chunked(source, start, count, processor.as_deref_mut());
        self.processor = processor;
    }

    /// Like [`add_from`](Self::add_from), but with an explicit processor
    /// instead of the registered one.
    pub fn add_from_with<S, P>(&mut self, source: &[S], start: usize, count: usize, processor: &mut P)
    where
        S: AsRef<[T]>,
        P: ChunkProcessor<T> + ?Sized,
    {
        self.queue_chunked(source, start, count, Some(processor));
    }

    /// Overwrite the `count` most recently written samples with
    /// `source[channel][start..]`. No cursor moves.
    pub fn overwrite_from<S: AsRef<[T]>>(&mut self, source: &[S], start: usize, count: usize) {
        debug_assert_eq!(source.len(), self.channels, "channel count mismatch");

        let range = self.position.look_back_from_write_position(count);
        for (channel, samples) in source.iter().enumerate() {
            let offset = self.channel_offset(channel);
            store(&mut self.data, offset, range, &samples.as_ref()[start..start + count]);
        }

        self.check_canaries();
    }

    /// Copy the `count` most recently written samples into
    /// `dest[channel][start..]`. No cursor moves.
    pub fn copy_to<D: AsMut<[T]>>(&self, dest: &mut [D], start: usize, count: usize) {
        let range = self.position.look_back_from_write_position(count);
        self.export(dest, start, count, range);
    }

    /// Dequeue `count` samples at the read cursor into `dest[channel][start..]`.
    pub fn remove_to<D: AsMut<[T]>>(&mut self, dest: &mut [D], start: usize, count: usize) {
        let range = self.position.dequeue(count);
        self.export(dest, start, count, range);
    }

    /// Advance the read cursor by `count` samples without copying.
    pub fn remove_to_null(&mut self, count: usize) {
        self.position.simulate_dequeue(count);
    }

    fn export<D: AsMut<[T]>>(&self, dest: &mut [D], start: usize, count: usize, range: BlockRange) {
        debug_assert_eq!(dest.len(), self.channels, "channel count mismatch");

        for (channel, samples) in dest.iter_mut().enumerate() {
            let offset = self.channel_offset(channel);
            load(&self.data, offset, range, &mut samples.as_mut()[start..start + count]);
        }
    }

    fn queue_chunked<S, P>(
        &mut self,
        source: &[S],
        start: usize,
        count: usize,
        mut processor: Option<&mut P>,
    ) where
        S: AsRef<[T]>,
        P: ChunkProcessor<T> + ?Sized,
    {
        debug_assert_eq!(source.len(), self.channels, "channel count mismatch");

        let padded_length = self.padded_length;
        let mut processed = 0;

        while processed < count {
            let step = (count - processed).min(self.samples_to_filled_chunk);
            let range = self.position.queue(step);

            for (channel, samples) in source.iter().enumerate() {
                let from = start + processed;
                let offset = channel * padded_length + 1;
                store(&mut self.data, offset, range, &samples.as_ref()[from..from + step]);
            }

            processed += step;
            self.samples_to_filled_chunk -= step;

            if self.samples_to_filled_chunk > 0 {
                continue;
            }
            self.samples_to_filled_chunk = self.chunk_size;

            let Some(processor) = processor.as_deref_mut() else {
                continue;
            };

            let range = self.position.look_back_from_write_position(self.chunk_size);
            for (channel, chunk) in self.chunk.iter_mut().enumerate() {
                let offset = channel * padded_length + 1;
                load(&self.data, offset, range, chunk);
            }

            if processor.process_chunk(&mut self.chunk) {
                for (channel, chunk) in self.chunk.iter_mut().enumerate() {
                    // keep the scratch shape even if the processor resized it
                    chunk.resize(self.chunk_size, T::zero());
                    let offset = channel * padded_length + 1;
                    store(&mut self.data, offset, range, chunk);
                }
            }
        }

        self.check_canaries();
    }

    #[inline]
    fn check_canaries(&self) {
        if cfg!(debug_assertions) {
            let total = self.position.total_length();
            for channel in 0..self.channels {
                let offset = self.channel_offset(channel);
                let intact = self.data[offset - 1] == Self::canary()
                    && self.data[offset + total] == Self::canary();

                if !intact {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("ring_buffer: canary overwritten on channel {channel}");
                }
                debug_assert!(intact, "ring buffer canary overwritten on channel {channel}");
            }
        }
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("channels", &self.channels)
            .field("position", &self.position)
            .field("chunk_size", &self.chunk_size)
            .field("samples_to_filled_chunk", &self.samples_to_filled_chunk)
            .field("has_processor", &self.processor.is_some())
            .finish_non_exhaustive()
    }
}

/// Copy `src` into the (up to two) blocks of `range` within one channel.
#[inline]
fn store<T: Copy>(data: &mut [T], offset: usize, range: BlockRange, src: &[T]) {
    let (first, second) = src[..range.len()].split_at(range.size_1);
    data[offset + range.start_1..][..range.size_1].copy_from_slice(first);
    data[offset + range.start_2..][..range.size_2].copy_from_slice(second);
}

/// Copy the (up to two) blocks of `range` within one channel into `dst`.
#[inline]
fn load<T: Copy>(data: &[T], offset: usize, range: BlockRange, dst: &mut [T]) {
    let (first, second) = dst[..range.len()].split_at_mut(range.size_1);
    first.copy_from_slice(&data[offset + range.start_1..][..range.size_1]);
    second.copy_from_slice(&data[offset + range.start_2..][..range.size_2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(channels: usize, len: usize, base: f32) -> Vec<Vec<f32>> {
        (0..channels)
            .map(|c| {
                (0..len)
                    .map(|i| base + (c * 1000 + i) as f32)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn round_trip_most_recent() {
        let mut ring = RingBuffer::<f32>::new(2, 100, 10, 50);
        let input = ramp(2, 30, 1.0);
        ring.add_from(&input, 0, 30);

        let mut output = vec![vec![0.0; 30]; 2];
        ring.copy_to(&mut output, 0, 30);
        assert_eq!(output, input);
        assert_eq!(ring.stored_samples(), 30);
    }

    #[test]
    fn output_is_delayed_by_pre_delay() {
        let mut ring = RingBuffer::<f64>::new(1, 16, 3, 16);
        let input = [vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]];
        ring.add_from(&input, 0, 6);

        let mut output = [vec![0.0; 6]];
        ring.remove_to(&mut output, 0, 6);
        assert_eq!(output[0], [0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn continuous_stream_through_wrap() {
        let mut ring = RingBuffer::<f32>::new(1, 7, 2, 7);
        let mut expected = vec![0.0, 0.0];
        let mut collected = Vec::new();

        for block in 0..20 {
            let input = [vec![block as f32 * 10.0, block as f32 * 10.0 + 1.0, block as f32 * 10.0 + 2.0]];
            expected.extend_from_slice(&input[0]);
            ring.add_from(&input, 0, 3);

            let mut output = [vec![0.0; 3]];
            ring.remove_to(&mut output, 0, 3);
            collected.extend_from_slice(&output[0]);
        }

        assert_eq!(collected[..], expected[..collected.len()]);
    }

    #[test]
    fn chunk_callback_cadence() {
        let mut ring = RingBuffer::<f32>::new(2, 100, 0, 50);
        let mut sizes = Vec::new();
        let mut callback = |chunk: &mut [Vec<f32>]| {
            sizes.push((chunk.len(), chunk[0].len()));
            false
        };

        let input = ramp(2, 150, 0.0);
        ring.add_from_with(&input, 0, 40, &mut callback);
        ring.add_from_with(&input, 40, 85, &mut callback);

        // 125 queued: two chunks fired, 25 samples wait for the third
        assert_eq!(ring.samples_to_filled_chunk(), 25);

        ring.add_from_with(&input, 125, 24, &mut callback);
        assert_eq!(ring.samples_to_filled_chunk(), 1);
        ring.add_from_with(&input, 149, 1, &mut callback);
        assert_eq!(ring.samples_to_filled_chunk(), 50);

        assert_eq!(sizes, [(2, 50), (2, 50), (2, 50)]);
    }

    #[test]
    fn chunk_sees_latest_samples() {
        let mut ring = RingBuffer::<f32>::new(1, 20, 5, 4);
        let mut seen = Vec::new();
        let mut callback = |chunk: &mut [Vec<f32>]| {
            seen.push(chunk[0].clone());
            false
        };

        let input = [vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]];
        ring.add_from_with(&input, 0, 9, &mut callback);

        assert_eq!(seen, [vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]]);
    }

    #[test]
    fn chunk_write_back() {
        let mut ring = RingBuffer::<f32>::new(1, 8, 0, 4);
        ring.set_chunk_processor(Some(Box::new(|chunk: &mut [Vec<f32>]| {
            for sample in chunk[0].iter_mut() {
                *sample *= -1.0;
            }
            true
        })));
        assert!(ring.has_chunk_processor());

        let input = [vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]];
        ring.add_from(&input, 0, 6);

        let mut output = [vec![0.0; 6]];
        ring.remove_to(&mut output, 0, 6);
        assert_eq!(output[0], [-1.0, -2.0, -3.0, -4.0, 5.0, 6.0]);
    }

    #[test]
    fn write_back_across_wrap() {
        let mut ring = RingBuffer::<f32>::new(1, 6, 0, 4);
        let mut double = |chunk: &mut [Vec<f32>]| {
            for sample in chunk[0].iter_mut() {
                *sample *= 2.0;
            }
            true
        };

        // fill 5, drain 5, then a chunk straddles the end of the buffer
        let input = [vec![1.0; 12]];
        ring.add_from_with(&input, 0, 5, &mut double);
        ring.remove_to_null(5);
        ring.add_from_with(&input, 5, 3, &mut double);

        let mut output = [vec![0.0; 3]];
        ring.remove_to(&mut output, 0, 3);
        assert_eq!(output[0], [2.0, 2.0, 2.0]);
    }

    #[test]
    fn overwrite_from_replaces_recent() {
        let mut ring = RingBuffer::<f64>::new(1, 10, 0, 10);
        ring.add_from(&[vec![1.0, 2.0, 3.0, 4.0]], 0, 4);
        ring.overwrite_from(&[vec![9.0, 8.0]], 0, 2);

        let mut output = [vec![0.0; 4]];
        ring.remove_to(&mut output, 0, 4);
        assert_eq!(output[0], [1.0, 2.0, 9.0, 8.0]);
    }

    #[test]
    fn remove_to_null_skips() {
        let mut ring = RingBuffer::<f32>::new(1, 10, 0, 10);
        ring.add_from(&[vec![1.0, 2.0, 3.0, 4.0]], 0, 4);
        ring.remove_to_null(2);

        let mut output = [vec![0.0; 2]];
        ring.remove_to(&mut output, 0, 2);
        assert_eq!(output[0], [3.0, 4.0]);
        assert_eq!(ring.stored_samples(), 0);
    }

    #[test]
    fn clear_zeroes_and_rewinds() {
        let mut ring = RingBuffer::<f32>::new(2, 10, 2, 5);
        ring.add_from(&ramp(2, 7, 1.0), 0, 7);
        ring.clear();

        assert_eq!(ring.stored_samples(), 0);
        assert_eq!(ring.position().write_position(), 2);

        let mut output = vec![vec![1.0; 12]; 2];
        ring.copy_to(&mut output, 0, 12);
        assert!(output.iter().flatten().all(|&s| s == 0.0));
    }

    #[test]
    fn accessors() {
        let ring = RingBuffer::<f32>::new(3, 64, 16, 32);
        assert_eq!(ring.channels(), 3);
        assert_eq!(ring.samples(), 64);
        assert_eq!(ring.pre_delay(), 16);
        assert_eq!(ring.chunk_size(), 32);
        assert_eq!(ring.position().total_length(), 80);
    }

    #[test]
    fn source_offset_is_honoured() {
        let mut ring = RingBuffer::<f32>::new(1, 10, 0, 10);
        let input = [vec![0.0, 0.0, 7.0, 8.0]];
        ring.add_from(&input, 2, 2);

        let mut output = [vec![0.0; 5]];
        ring.copy_to(&mut output, 3, 2);
        assert_eq!(output[0], [0.0, 0.0, 0.0, 7.0, 8.0]);
    }

    #[test]
    #[should_panic]
    fn zero_channels_panics() {
        let _ = RingBuffer::<f32>::new(0, 10, 0, 5);
    }

    #[test]
    #[should_panic]
    fn oversized_chunk_panics() {
        let _ = RingBuffer::<f32>::new(1, 10, 0, 11);
    }
}
