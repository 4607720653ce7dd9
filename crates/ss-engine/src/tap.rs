//! Lock-free capture of rendered frames for visualization.
//!
//! One producer (the render thread) pushes every output frame; one
//! consumer (a UI thread) copies out the most recent frames on demand.
//! Neither side blocks. Samples are stored as `f32` bits in atomics, so a
//! reader racing a wrapping writer sees stale or fresh values, never torn ones.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::frame::Frame;

/// Smallest capacity chosen by [`TapBuffer::for_sample_rate`].
pub const MIN_TAP_FRAMES: usize = 2048;

/// Fixed-capacity single-producer/single-consumer frame ring.
pub struct TapBuffer {
    capacity: usize,
    /// Interleaved left/right sample bits.
    samples: Box<[AtomicU32]>,
    /// Next frame slot to write.
    write_index: AtomicUsize,
    /// Frames ever written.
    total_written: AtomicUsize,
}

impl TapBuffer {
    /// Create a buffer holding `capacity` frames (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let samples = (0..capacity * 2).map(|_| AtomicU32::new(0)).collect();
        Self {
            capacity,
            samples,
            write_index: AtomicUsize::new(0),
            total_written: AtomicUsize::new(0),
        }
    }

    /// Capacity of half a second of audio, but never less than 2048 frames.
    pub fn for_sample_rate(sample_rate: f32) -> Self {
        let half_second = (sample_rate.max(0.0) * 0.5) as usize;
        Self::new(half_second.max(MIN_TAP_FRAMES))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a frame, overwriting the oldest once full. Producer side only.
    #[inline]
    pub fn push(&self, frame: Frame) {
        let index = self.write_index.load(Ordering::Relaxed);
        self.samples[index * 2].store(frame.left.to_bits(), Ordering::Relaxed);
        self.samples[index * 2 + 1].store(frame.right.to_bits(), Ordering::Relaxed);

        let next = if index + 1 >= self.capacity { 0 } else { index + 1 };
        self.write_index.store(next, Ordering::Release);
        self.total_written.fetch_add(1, Ordering::Release);
    }

    /// Frames currently readable: everything written, up to capacity.
    pub fn available(&self) -> usize {
        self.total_written.load(Ordering::Acquire).min(self.capacity)
    }

    /// Total frames pushed since construction.
    pub fn total_written(&self) -> usize {
        self.total_written.load(Ordering::Acquire)
    }

    /// Copy up to `max_frames` of the most recent frames into `dest` in
    /// chronological order. Returns the number of frames copied, which is
    /// also bounded by `dest.len()`.
    pub fn copy_latest(&self, dest: &mut [Frame], max_frames: usize) -> usize {
        let count = max_frames.min(dest.len()).min(self.available());
        if count == 0 {
            return 0;
        }

        let write_index = self.write_index.load(Ordering::Acquire);
        let start = (write_index + self.capacity - count) % self.capacity;
        for (i, slot) in dest[..count].iter_mut().enumerate() {
            let mut frame = start + i;
            if frame >= self.capacity {
                frame -= self.capacity;
            }
            *slot = Frame {
                left: f32::from_bits(self.samples[frame * 2].load(Ordering::Relaxed)),
                right: f32::from_bits(self.samples[frame * 2 + 1].load(Ordering::Relaxed)),
            };
        }
        count
    }

    /// Allocating convenience wrapper around [`copy_latest`](Self::copy_latest).
    pub fn latest(&self, max_frames: usize) -> Vec<Frame> {
        let mut frames = vec![Frame::silence(); max_frames.min(self.capacity)];
        let copied = self.copy_latest(&mut frames, max_frames);
        frames.truncate(copied);
        frames
    }
}

impl std::fmt::Debug for TapBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapBuffer")
            .field("capacity", &self.capacity)
            .field("total_written", &self.total_written())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn frame(i: usize) -> Frame {
        Frame::new(i as f32, -(i as f32))
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        let tap = TapBuffer::new(8);
        assert_eq!(tap.available(), 0);
        assert!(tap.latest(4).is_empty());
    }

    #[test]
    fn returns_pushed_frames_in_order() {
        let tap = TapBuffer::new(8);
        for i in 0..5 {
            tap.push(frame(i));
        }
        let got = tap.latest(5);
        assert_eq!(got, (0..5).map(frame).collect::<Vec<_>>());
    }

    #[test]
    fn request_larger_than_available_is_truncated() {
        let tap = TapBuffer::new(8);
        for i in 0..3 {
            tap.push(frame(i));
        }
        assert_eq!(tap.latest(100).len(), 3);
        assert!(tap.latest(0).is_empty());
    }

    #[test]
    fn overflow_keeps_most_recent() {
        let tap = TapBuffer::new(4);
        for i in 0..10 {
            tap.push(frame(i));
        }
        assert_eq!(tap.available(), 4);
        assert_eq!(tap.total_written(), 10);
        assert_eq!(tap.latest(4), (6..10).map(frame).collect::<Vec<_>>());
        assert_eq!(tap.latest(2), vec![frame(8), frame(9)]);
    }

    #[test]
    fn copy_respects_destination_length() {
        let tap = TapBuffer::new(8);
        for i in 0..8 {
            tap.push(frame(i));
        }
        let mut dest = [Frame::silence(); 3];
        assert_eq!(tap.copy_latest(&mut dest, 10), 3);
        assert_eq!(dest, [frame(5), frame(6), frame(7)]);
    }

    #[test]
    fn capacity_follows_sample_rate() {
        assert_eq!(TapBuffer::for_sample_rate(44100.0).capacity(), 22050);
        assert_eq!(TapBuffer::for_sample_rate(2000.0).capacity(), MIN_TAP_FRAMES);
        assert_eq!(TapBuffer::new(0).capacity(), 1);
    }

    #[test]
    fn concurrent_reader_sees_published_frames() {
        let tap = Arc::new(TapBuffer::new(1024));
        let producer = {
            let tap = tap.clone();
            std::thread::spawn(move || {
                for i in 0..50_000 {
                    tap.push(Frame::mono(i as f32));
                }
            })
        };

        let mut dest = vec![Frame::silence(); 64];
        while !producer.is_finished() {
            let n = tap.copy_latest(&mut dest, 64);
            assert!(n <= 64);
            for f in &dest[..n] {
                assert!((0.0..50_000.0).contains(&f.left));
            }
        }
        producer.join().unwrap();
        let last = tap.latest(1);
        assert_eq!(last, vec![Frame::mono(49_999.0)]);
    }
}
