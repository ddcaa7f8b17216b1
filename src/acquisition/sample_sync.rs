// src/acquisition/sample_sync.rs
//! EMG/GSR rate alignment and processing cadence

use crate::config::SamplingConfig;
use crate::types::Sample;
use serde::{Deserialize, Serialize};

/// What the pipeline should do with one incoming sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncedSample {
    pub timestamp_us: u64,
    pub emg: f32,
    /// Present only on samples that land on the GSR grid
    pub gsr: Option<f32>,
    /// A feature/classification tick is due after this sample
    pub tick_due: bool,
}

/// Synchronization statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStats {
    pub samples_processed: u64,
    pub gsr_samples_kept: u64,
    pub ticks: u64,
}

/// Maps EMG-rate samples onto the slower GSR rate and paces ticks.
///
/// Every sample carries a GSR value; only every `decimation`-th one is kept,
/// starting with the first. A tick is due after every `tick_interval` samples.
#[derive(Debug, Clone)]
pub struct SampleSynchronizer {
    decimation: usize,
    tick_interval: usize,
    emg_counter: usize,
    stats: SyncStats,
}

impl SampleSynchronizer {
    pub fn new(config: &SamplingConfig) -> Result<Self, String> {
        if config.tick_interval_samples == 0 {
            return Err("Tick interval must be greater than 0".to_string());
        }
        if config.gsr_rate_hz == 0 || config.gsr_rate_hz > config.emg_rate_hz {
            return Err(format!(
                "GSR rate {} Hz must be within (0, {}] Hz",
                config.gsr_rate_hz, config.emg_rate_hz
            ));
        }

        Ok(Self {
            decimation: config.gsr_decimation(),
            tick_interval: config.tick_interval_samples,
            emg_counter: 0,
            stats: SyncStats::default(),
        })
    }

    /// Route one sample
    pub fn process(&mut self, sample: &Sample) -> SyncedSample {
        let keep_gsr = self.emg_counter % self.decimation == 0;
        self.emg_counter += 1;
        let tick_due = self.emg_counter % self.tick_interval == 0;

        self.stats.samples_processed += 1;
        if keep_gsr {
            self.stats.gsr_samples_kept += 1;
        }
        if tick_due {
            self.stats.ticks += 1;
        }

        SyncedSample {
            timestamp_us: sample.timestamp_us,
            emg: sample.emg,
            gsr: keep_gsr.then_some(sample.gsr),
            tick_due,
        }
    }

    pub fn decimation(&self) -> usize {
        self.decimation
    }

    pub fn tick_interval(&self) -> usize {
        self.tick_interval
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn reset(&mut self) {
        self.emg_counter = 0;
        self.stats = SyncStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(emg: u32, gsr: u32, tick: usize) -> SamplingConfig {
        SamplingConfig {
            emg_rate_hz: emg,
            gsr_rate_hz: gsr,
            tick_interval_samples: tick,
        }
    }

    #[test]
    fn test_decimates_gsr() {
        let mut sync = SampleSynchronizer::new(&config(1000, 100, 50)).unwrap();
        let kept: Vec<usize> = (0..30)
            .filter(|&i| sync.process(&Sample::new(i as u64, 0.0, i as f32)).gsr.is_some())
            .collect();
        assert_eq!(kept, vec![0, 10, 20]);
        assert_eq!(sync.stats().gsr_samples_kept, 3);
    }

    #[test]
    fn test_tick_cadence() {
        let mut sync = SampleSynchronizer::new(&config(1000, 100, 50)).unwrap();
        let ticks: Vec<usize> = (0..150)
            .filter(|&i| sync.process(&Sample::new(i as u64, 0.0, 0.0)).tick_due)
            .collect();
        assert_eq!(ticks, vec![49, 99, 149]);
        assert_eq!(sync.stats().ticks, 3);
    }

    #[test]
    fn test_equal_rates_keep_every_gsr() {
        let mut sync = SampleSynchronizer::new(&config(100, 100, 1)).unwrap();
        for i in 0..5 {
            let out = sync.process(&Sample::new(i, 0.1, 2.0));
            assert_eq!(out.gsr, Some(2.0));
            assert!(out.tick_due);
        }
    }

    #[test]
    fn test_rejects_invalid_rates() {
        assert!(SampleSynchronizer::new(&config(100, 1000, 10)).is_err());
        assert!(SampleSynchronizer::new(&config(1000, 100, 0)).is_err());
    }

    #[test]
    fn test_reset_restarts_grid() {
        let mut sync = SampleSynchronizer::new(&config(1000, 100, 50)).unwrap();
        for i in 0..7 {
            sync.process(&Sample::new(i, 0.0, 0.0));
        }
        sync.reset();
        assert!(sync.process(&Sample::new(0, 0.0, 1.0)).gsr.is_some());
        assert_eq!(sync.stats().samples_processed, 1);
    }
}
