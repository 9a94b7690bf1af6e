//! Transport buffer
//!
//! Lock-free SPSC ring of interleaved `f32` samples between the control side
//! and the realtime callback. Wraps `ringbuf`'s heap ring with the two policies
//! the engine needs:
//!
//! - writers either enqueue a whole buffer or nothing (`BufferFull` upstream)
//! - readers never wait; a short read is padded with silence (output) and a
//!   full ring drops the newest samples (input), both counted in [`TransportStats`]

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters shared between both ends of a transport
#[derive(Debug, Default)]
pub struct TransportStats {
    underrun_samples: AtomicU64,
    overrun_samples: AtomicU64,
}

impl TransportStats {
    /// Output samples replaced by silence because the ring ran dry
    pub fn underrun_samples(&self) -> u64 {
        self.underrun_samples.load(Ordering::Relaxed)
    }

    /// Input samples dropped because the ring was full
    pub fn overrun_samples(&self) -> u64 {
        self.overrun_samples.load(Ordering::Relaxed)
    }
}

/// Producing half
pub struct TransportWriter {
    producer: HeapProd<f32>,
    stats: Arc<TransportStats>,
}

/// Consuming half
pub struct TransportReader {
    consumer: HeapCons<f32>,
    stats: Arc<TransportStats>,
}

/// Create a transport holding up to `capacity` samples (at least one)
pub fn transport(capacity: usize) -> (TransportWriter, TransportReader, Arc<TransportStats>) {
    let ring = HeapRb::<f32>::new(capacity.max(1));
    let (producer, consumer) = ring.split();
    let stats = Arc::new(TransportStats::default());

    (
        TransportWriter {
            producer,
            stats: Arc::clone(&stats),
        },
        TransportReader {
            consumer,
            stats: Arc::clone(&stats),
        },
        stats,
    )
}

impl TransportWriter {
    /// Enqueue all of `samples`, or nothing.
    ///
    /// On failure returns the free space at the time of the call.
    pub fn push_all(&mut self, samples: &[f32]) -> Result<(), usize> {
        let available = self.producer.vacant_len();
        if available < samples.len() {
            return Err(available);
        }
        self.producer.push_slice(samples);
        Ok(())
    }

    /// Enqueue as much as fits, counting the rest as overrun. Realtime-safe.
    #[inline]
    pub fn push_lossy(&mut self, samples: &[f32]) -> usize {
        let written = self.producer.push_slice(samples);
        let dropped = samples.len() - written;
        if dropped > 0 {
            self.stats
                .overrun_samples
                .fetch_add(dropped as u64, Ordering::Relaxed);
        }
        written
    }

    pub fn available_space(&self) -> usize {
        self.producer.vacant_len()
    }

    pub fn buffered(&self) -> usize {
        self.producer.occupied_len()
    }

    pub fn capacity(&self) -> usize {
        self.producer.capacity().get()
    }
}

impl TransportReader {
    /// Fill `out` from the ring, padding with silence. Realtime-safe.
    ///
    /// Returns the number of samples that came from the ring.
    #[inline]
    pub fn pop_or_silence(&mut self, out: &mut [f32]) -> usize {
        let read = self.consumer.pop_slice(out);
        if read < out.len() {
            out[read..].fill(0.0);
            self.stats
                .underrun_samples
                .fetch_add((out.len() - read) as u64, Ordering::Relaxed);
        }
        read
    }

    /// Pop up to `out.len()` samples without padding
    pub fn pop_into(&mut self, out: &mut [f32]) -> usize {
        self.consumer.pop_slice(out)
    }

    pub fn buffered(&self) -> usize {
        self.consumer.occupied_len()
    }

    pub fn capacity(&self) -> usize {
        self.consumer.capacity().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_respected() {
        let (writer, reader, _) = transport(1024);
        assert_eq!(writer.capacity(), 1024);
        assert_eq!(reader.capacity(), 1024);
        assert_eq!(writer.available_space(), 1024);
    }

    #[test]
    fn zero_capacity_still_makes_a_usable_ring() {
        let (writer, _, _) = transport(0);
        assert_eq!(writer.capacity(), 1);
    }

    #[test]
    fn push_all_is_all_or_nothing() {
        let (mut writer, reader, _) = transport(10);
        assert!(writer.push_all(&[0.5; 8]).is_ok());
        assert_eq!(writer.push_all(&[0.5; 4]), Err(2));
        assert_eq!(reader.buffered(), 8);
    }

    #[test]
    fn underrun_pads_with_silence_and_counts() {
        let (mut writer, mut reader, stats) = transport(16);
        writer.push_all(&[0.25, 0.5]).unwrap();

        let mut out = [1.0f32; 5];
        assert_eq!(reader.pop_or_silence(&mut out), 2);
        assert_eq!(out, [0.25, 0.5, 0.0, 0.0, 0.0]);
        assert_eq!(stats.underrun_samples(), 3);
    }

    #[test]
    fn lossy_push_drops_newest_and_counts() {
        let (mut writer, mut reader, stats) = transport(4);
        assert_eq!(writer.push_lossy(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), 4);
        assert_eq!(stats.overrun_samples(), 2);

        let mut out = [0.0f32; 4];
        assert_eq!(reader.pop_into(&mut out), 4);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn samples_come_out_in_order() {
        let (mut writer, mut reader, _) = transport(100);
        let input: Vec<f32> = (0..100).map(|i| i as f32 * 0.01).collect();
        writer.push_all(&input).unwrap();

        let mut output = vec![0.0f32; 50];
        assert_eq!(reader.pop_into(&mut output), 50);
        for (i, sample) in output.iter().enumerate() {
            assert!((sample - i as f32 * 0.01).abs() < 1e-6);
        }
        assert_eq!(writer.buffered(), 50);
    }
}
