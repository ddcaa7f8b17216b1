// src/acquisition/handoff.rs
//! Producer/consumer hand-off between acquisition and processing
//!
//! This bounded channel is the only concurrency boundary of the crate. Live
//! producers use [`SampleSender::send`], which never blocks: when the queue is
//! full the newest sample is dropped and counted. Replay producers (files,
//! synthetic sources) use [`SampleSender::send_blocking`] and wait instead.
//! The consumer side is a single pipeline instance.

use crate::error::{BioError, BioResult};
use crate::types::Sample;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Counters shared by both ends
#[derive(Debug, Default)]
struct HandoffStats {
    sent: AtomicU64,
    dropped: AtomicU64,
}

/// Producer end of the hand-off
#[derive(Debug, Clone)]
pub struct SampleSender {
    tx: Sender<Sample>,
    stats: Arc<HandoffStats>,
}

/// Consumer end of the hand-off
#[derive(Debug)]
pub struct SampleReceiver {
    rx: Receiver<Sample>,
    stats: Arc<HandoffStats>,
}

/// Create a bounded hand-off with room for `capacity` samples
pub fn sample_channel(capacity: usize) -> BioResult<(SampleSender, SampleReceiver)> {
    if capacity == 0 {
        return Err(BioError::configuration("handoff", "capacity must be at least 1"));
    }
    let (tx, rx) = channel::bounded(capacity);
    let stats = Arc::new(HandoffStats::default());
    Ok((
        SampleSender {
            tx,
            stats: Arc::clone(&stats),
        },
        SampleReceiver { rx, stats },
    ))
}

impl SampleSender {
    /// Queue a sample without blocking.
    ///
    /// Returns `Ok(false)` when the queue was full and the sample was dropped,
    /// `ChannelClosed` once the consumer is gone.
    pub fn send(&self, sample: Sample) -> BioResult<bool> {
        match self.tx.try_send(sample) {
            Ok(()) => {
                self.stats.sent.fetch_add(1, Ordering::Relaxed);
                Ok(true)
            }
            Err(TrySendError::Full(_)) => {
                let dropped = self.stats.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    warn!(dropped, "Hand-off queue full, dropping newest sample");
                }
                Ok(false)
            }
            Err(TrySendError::Disconnected(_)) => Err(BioError::ChannelClosed),
        }
    }

    /// Queue a sample, waiting for room
    pub fn send_blocking(&self, sample: Sample) -> BioResult<()> {
        self.tx.send(sample).map_err(|_| BioError::ChannelClosed)?;
        self.stats.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn dropped(&self) -> u64 {
        self.stats.dropped.load(Ordering::Relaxed)
    }
}

impl SampleReceiver {
    /// Block until a sample arrives; `ChannelClosed` once every producer is
    /// gone and the queue is drained
    pub fn recv(&self) -> BioResult<Sample> {
        self.rx.recv().map_err(|_| BioError::ChannelClosed)
    }

    /// Wait at most `timeout`; `Ok(None)` on timeout
    pub fn recv_timeout(&self, timeout: Duration) -> BioResult<Option<Sample>> {
        match self.rx.recv_timeout(timeout) {
            Ok(sample) => Ok(Some(sample)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(BioError::ChannelClosed),
        }
    }

    /// Non-blocking receive; `Ok(None)` when nothing is queued
    pub fn try_recv(&self) -> BioResult<Option<Sample>> {
        match self.rx.try_recv() {
            Ok(sample) => Ok(Some(sample)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(BioError::ChannelClosed),
        }
    }

    /// Iterate until the producers hang up
    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        self.rx.iter()
    }

    /// Samples currently queued
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn sent(&self) -> u64 {
        self.stats.sent.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.stats.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(sample_channel(0), Err(BioError::Configuration { .. })));
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let (tx, rx) = sample_channel(2).unwrap();
        assert!(tx.send(Sample::new(0, 0.1, 1.0)).unwrap());
        assert!(tx.send(Sample::new(1, 0.2, 1.0)).unwrap());
        assert!(!tx.send(Sample::new(2, 0.3, 1.0)).unwrap());

        assert_eq!(rx.dropped(), 1);
        assert_eq!(rx.sent(), 2);
        assert_eq!(rx.recv().unwrap().timestamp_us, 0);
        assert_eq!(rx.recv().unwrap().timestamp_us, 1);
        assert_eq!(rx.try_recv().unwrap(), None);
    }

    #[test]
    fn test_closed_channel() {
        let (tx, rx) = sample_channel(4).unwrap();
        tx.send(Sample::new(7, 0.0, 0.0)).unwrap();
        drop(tx);
        assert_eq!(rx.recv().unwrap().timestamp_us, 7);
        assert!(matches!(rx.recv(), Err(BioError::ChannelClosed)));

        let (tx, rx) = sample_channel(4).unwrap();
        drop(rx);
        assert!(matches!(tx.send(Sample::new(0, 0.0, 0.0)), Err(BioError::ChannelClosed)));
    }

    #[test]
    fn test_producer_thread_preserves_order() {
        let (tx, rx) = sample_channel(1024).unwrap();
        let producer = thread::spawn(move || {
            for i in 0..500u64 {
                while !tx.send(Sample::new(i, 0.0, 0.0)).unwrap() {
                    thread::yield_now();
                }
            }
        });

        let received: Vec<u64> = rx.iter().map(|s| s.timestamp_us).collect();
        producer.join().unwrap();
        assert_eq!(received, (0..500).collect::<Vec<_>>());
    }

    #[test]
    fn test_blocking_send_waits_for_consumer() {
        let (tx, rx) = sample_channel(1).unwrap();
        let producer = thread::spawn(move || {
            for i in 0..100u64 {
                tx.send_blocking(Sample::new(i, 0.0, 0.0)).unwrap();
            }
        });

        assert_eq!(rx.iter().count(), 100);
        producer.join().unwrap();
        assert_eq!(rx.dropped(), 0);
        assert_eq!(rx.sent(), 100);
    }

    #[test]
    fn test_recv_timeout() {
        let (_tx, rx) = sample_channel(1).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_millis(1)).unwrap(), None);
    }
}
