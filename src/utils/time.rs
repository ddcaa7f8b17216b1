// src/utils/time.rs
//! Clocks for profile timestamps and per-sample latency

use crate::config::constants::time::NANOSECONDS_PER_MICROSECOND;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" for the pipeline
pub trait TimeProvider: Send + Sync {
    fn now_nanos(&self) -> u64;

    fn now_micros(&self) -> u64 {
        self.now_nanos() / NANOSECONDS_PER_MICROSECOND
    }
}

/// Wall clock, nanoseconds since the Unix epoch
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_nanos(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64
    }
}

/// Manually stepped clock for reproducible runs
pub struct MockTimeProvider {
    nanos: AtomicU64,
}

impl MockTimeProvider {
    pub fn new(start_nanos: u64) -> Self {
        Self {
            nanos: AtomicU64::new(start_nanos),
        }
    }

    pub fn advance_micros(&self, micros: u64) {
        self.nanos
            .fetch_add(micros * NANOSECONDS_PER_MICROSECOND, Ordering::Relaxed);
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_nanos(&self) -> u64 {
        self.nanos.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_only_moves_when_stepped() {
        let clock = MockTimeProvider::new(1_500);
        assert_eq!(clock.now_micros(), 1);
        assert_eq!(clock.now_micros(), 1);
        clock.advance_micros(4);
        assert_eq!(clock.now_nanos(), 5_500);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemTimeProvider.now_micros() > 1_577_836_800_000_000);
    }
}
