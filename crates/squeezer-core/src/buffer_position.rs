//! Cursor arithmetic for a circular buffer with pre-delay.
//!
//! [`BufferPosition`] owns no samples. It hands out [`BlockRange`]s: at most
//! two contiguous index ranges, the second one starting at index 0 after the
//! buffer wraps.
//!
//! ```text
//!  0                                          total
//!  |====== block 2 ======|.......|==== block 1 ====|
//!                                ^ start_1
//! ```
//!
//! The write cursor starts `pre_delay` samples ahead of the read cursor, so
//! everything dequeued is delayed by exactly `pre_delay` samples.
//!
//! Over- and underflow of the stored-sample count are diagnostics only: the
//! operation still returns the indices it computed.

/// Up to two contiguous index ranges covering one read or write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockRange {
    /// First index of the first block.
    pub start_1: usize,
    /// Length of the first block.
    pub size_1: usize,
    /// First index of the second block (always 0).
    pub start_2: usize,
    /// Length of the second block (0 when nothing wrapped).
    pub size_2: usize,
}

impl BlockRange {
    fn from_position(position: usize, samples: usize, total_length: usize) -> Self {
        let size_1 = samples.min(total_length - position);
        Self {
            start_1: position,
            size_1,
            start_2: 0,
            size_2: samples - size_1,
        }
    }

    /// Total number of samples covered.
    pub fn len(&self) -> usize {
        self.size_1 + self.size_2
    }

    /// True if the range covers no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the range wraps around the end of the buffer.
    pub fn wraps(&self) -> bool {
        self.size_2 > 0
    }
}

/// Read/write cursors of a circular buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferPosition {
    total_length: usize,
    pre_delay: usize,
    read_position: usize,
    write_position: usize,
    stored_samples: isize,
}

impl BufferPosition {
    /// Create cursors for `samples` usable samples plus `pre_delay`.
    ///
    /// # Panics
    ///
    /// Panics if `samples` is zero.
    pub fn new(samples: usize, pre_delay: usize) -> Self {
        assert!(samples > 0, "buffer must hold at least one sample");

        let mut position = Self {
            total_length: samples + pre_delay,
            pre_delay,
            read_position: 0,
            write_position: 0,
            stored_samples: 0,
        };
        position.reset();
        position
    }

    /// Rewind both cursors: read at 0, write at `pre_delay`.
    pub fn reset(&mut self) {
        self.read_position = 0;
        self.write_position = self.pre_delay;
        self.stored_samples = 0;
    }

    /// Usable samples (excluding pre-delay).
    pub fn samples(&self) -> usize {
        self.total_length - self.pre_delay
    }

    /// Buffer length including pre-delay.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Pre-delay in samples.
    pub fn pre_delay(&self) -> usize {
        self.pre_delay
    }

    /// Current read cursor.
    pub fn read_position(&self) -> usize {
        self.read_position
    }

    /// Current write cursor.
    pub fn write_position(&self) -> usize {
        self.write_position
    }

    /// Samples from the read cursor to the end of the buffer.
    pub fn read_position_to_wrap(&self) -> usize {
        self.total_length - self.read_position
    }

    /// Samples from the write cursor to the end of the buffer.
    pub fn write_position_to_wrap(&self) -> usize {
        self.total_length - self.write_position
    }

    /// Samples queued and not yet dequeued. Negative after an underflow.
    pub fn stored_samples(&self) -> isize {
        self.stored_samples
    }

    /// Range for writing `samples` at the write cursor, advancing it.
    pub fn queue(&mut self, samples: usize) -> BlockRange {
        let range = self.overwrite(samples);

        self.write_position = (self.write_position + samples) % self.total_length;
        self.stored_samples += samples as isize;

        if self.stored_samples > self.total_length as isize {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "buffer_position: overwriting unread data ({} stored, capacity {})",
                self.stored_samples,
                self.total_length
            );
        }

        range
    }

    /// Range for writing `samples` at the write cursor, leaving it alone.
    pub fn overwrite(&self, samples: usize) -> BlockRange {
        self.check_length(samples);
        BlockRange::from_position(self.write_position, samples, self.total_length)
    }

    /// Range for reading `samples` at the read cursor, advancing it.
    pub fn dequeue(&mut self, samples: usize) -> BlockRange {
        let range = self.copy(samples);
        self.simulate_dequeue(samples);
        range
    }

    /// Range for reading `samples` at the read cursor, leaving it alone.
    pub fn copy(&self, samples: usize) -> BlockRange {
        self.check_length(samples);
        BlockRange::from_position(self.read_position, samples, self.total_length)
    }

    /// Advance the read cursor by `samples` without reading anything.
    ///
    /// Lets a caller that consumed data by other means keep the
    /// stored-sample count honest.
    pub fn simulate_dequeue(&mut self, samples: usize) {
        self.check_length(samples);

        self.read_position = (self.read_position + samples) % self.total_length;
        self.stored_samples -= samples as isize;

        if self.stored_samples < 0 {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "buffer_position: reading undefined data ({} stored)",
                self.stored_samples
            );
        }
    }

    /// Range of the `samples` most recently written, ending at the write
    /// cursor. No cursor moves.
    pub fn look_back_from_write_position(&self, samples: usize) -> BlockRange {
        self.check_length(samples);

        let start = (self.write_position + self.total_length - samples) % self.total_length;
        BlockRange::from_position(start, samples, self.total_length)
    }

    #[inline]
    fn check_length(&self, samples: usize) {
        debug_assert!(
            samples <= self.total_length,
            "{samples} samples exceed buffer length {}",
            self.total_length
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_pre_delay_gap() {
        let position = BufferPosition::new(100, 10);
        assert_eq!(position.total_length(), 110);
        assert_eq!(position.samples(), 100);
        assert_eq!(position.read_position(), 0);
        assert_eq!(position.write_position(), 10);
        assert_eq!(position.stored_samples(), 0);
        assert_eq!(position.write_position_to_wrap(), 100);
    }

    #[test]
    fn queue_splits_at_wrap() {
        let mut position = BufferPosition::new(100, 10);
        position.queue(90);
        assert_eq!(position.write_position(), 100);

        let range = position.queue(30);
        assert_eq!(
            range,
            BlockRange {
                start_1: 100,
                size_1: 10,
                start_2: 0,
                size_2: 20
            }
        );
        assert!(range.wraps());
        assert_eq!(range.len(), 30);
        assert_eq!(position.write_position(), 20);
        assert_eq!(position.stored_samples(), 120);
    }

    #[test]
    fn overwrite_and_copy_leave_cursors_alone() {
        let mut position = BufferPosition::new(50, 0);
        position.queue(20);
        let before = position.clone();

        let write = position.overwrite(40);
        assert_eq!((write.start_1, write.size_1, write.size_2), (20, 30, 10));
        let read = position.copy(20);
        assert_eq!((read.start_1, read.size_1, read.size_2), (0, 20, 0));

        assert_eq!(position, before);
    }

    #[test]
    fn dequeue_follows_queue_after_pre_delay() {
        let mut position = BufferPosition::new(100, 10);
        position.queue(30);

        let range = position.dequeue(30);
        // read starts at 0: the first 10 samples are the pre-delay gap
        assert_eq!(range.start_1, 0);
        assert_eq!(position.read_position(), 30);
        assert_eq!(position.stored_samples(), 0);
    }

    #[test]
    fn simulate_dequeue_moves_read_only() {
        let mut position = BufferPosition::new(64, 0);
        position.queue(40);
        position.simulate_dequeue(60);
        assert_eq!(position.read_position(), 60);
        assert_eq!(position.write_position(), 40);
        assert_eq!(position.stored_samples(), -20);
    }

    #[test]
    fn look_back_ends_at_write_cursor() {
        let mut position = BufferPosition::new(100, 10);
        position.queue(30);
        let range = position.look_back_from_write_position(30);
        assert_eq!((range.start_1, range.size_1, range.size_2), (10, 30, 0));

        // wrapping backwards past index 0
        let mut position = BufferPosition::new(20, 0);
        position.queue(5);
        let range = position.look_back_from_write_position(8);
        assert_eq!(
            range,
            BlockRange {
                start_1: 17,
                size_1: 3,
                start_2: 0,
                size_2: 5
            }
        );
    }

    #[test]
    fn write_cursor_wraps_modulo_total() {
        let total = 37;
        for k in [0, 1, 5, 36] {
            let mut position = BufferPosition::new(total, 0);
            let mut remaining = total + k;
            while remaining > 0 {
                let step = remaining.min(7);
                position.queue(step);
                remaining -= step;
            }
            assert_eq!(position.write_position(), k % total);
        }
    }

    #[test]
    fn reset_rewinds() {
        let mut position = BufferPosition::new(16, 4);
        position.queue(9);
        position.dequeue(3);
        position.reset();
        assert_eq!(position, BufferPosition::new(16, 4));
    }

    #[test]
    fn zero_length_ranges() {
        let mut position = BufferPosition::new(8, 2);
        assert!(position.queue(0).is_empty());
        assert!(position.look_back_from_write_position(0).is_empty());
        assert_eq!(position.write_position(), 2);
    }

    #[test]
    #[should_panic]
    fn zero_samples_panics() {
        let _ = BufferPosition::new(0, 4);
    }
}
