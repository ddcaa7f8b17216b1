// src/processing/quality_monitor.rs
//! Signal quality monitoring for the EMG/GSR stream

use crate::acquisition::ring_buffer::SampleWindow;
use crate::config::constants::quality::*;
use crate::config::constants::time::MICROSECONDS_PER_MILLISECOND;
use crate::config::processing_config::QualityConfig;
use crate::error::{BioError, BioResult};
use serde::{Deserialize, Serialize};

/// Quality levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLevel {
    Good,
    Fair,
    Poor,
}

impl QualityLevel {
    pub fn from_score(score: f32) -> Self {
        if score >= GOOD_QUALITY_THRESHOLD {
            QualityLevel::Good
        } else if score >= FAIR_QUALITY_THRESHOLD {
            QualityLevel::Fair
        } else {
            QualityLevel::Poor
        }
    }
}

/// Inputs for one quality check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityInput {
    pub timestamp_us: u64,
    /// EMG after normalization, in [0, 1]
    pub normalized_emg: f32,
    /// RMS of the current EMG window, if one has been computed
    pub emg_window_rms: Option<f32>,
    /// GSR before normalization, in microsiemens
    pub raw_gsr: f32,
}

/// Per-sample quality score with a rolling average
pub struct QualityMonitor {
    config: QualityConfig,
    history: SampleWindow<f32>,
    last_timestamp_us: Option<u64>,
}

impl QualityMonitor {
    /// Create quality monitor with configuration
    pub fn new(config: QualityConfig) -> BioResult<Self> {
        let history = SampleWindow::new(config.history_length)
            .map_err(|e| BioError::configuration("quality", e.to_string()))?;
        Ok(Self {
            config,
            history,
            last_timestamp_us: None,
        })
    }

    /// Score one sample in [0, 1], starting from 1 and subtracting penalties
    pub fn assess(&mut self, input: &QualityInput) -> f32 {
        let mut score = 1.0;

        let upper = self.config.saturation_threshold;
        let saturated = input.normalized_emg >= upper || input.normalized_emg <= 1.0 - upper;
        if saturated {
            score -= SATURATION_PENALTY;
        } else if input
            .emg_window_rms
            .map_or(false, |rms| rms < self.config.weak_signal_rms)
        {
            score -= WEAK_SIGNAL_PENALTY;
        }

        if input.raw_gsr.abs() > self.config.gsr_max_microsiemens || input.raw_gsr.is_nan() {
            score -= GSR_RANGE_PENALTY;
        }

        if let Some(previous) = self.last_timestamp_us {
            let gap_us = input.timestamp_us.saturating_sub(previous);
            if gap_us > self.config.max_gap_ms * MICROSECONDS_PER_MILLISECOND {
                score -= DATA_GAP_PENALTY;
            }
        }
        self.last_timestamp_us = Some(input.timestamp_us);

        let score = f32::clamp(score, 0.0, 1.0);
        self.history.push(score);
        score
    }

    /// Mean score over the rolling history, 1.0 before any sample
    pub fn average(&self) -> f32 {
        if self.history.is_empty() {
            return 1.0;
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    pub fn level(&self) -> QualityLevel {
        QualityLevel::from_score(self.average())
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.last_timestamp_us = None;
    }
}
