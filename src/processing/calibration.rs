// src/processing/calibration.rs
//! Per-user calibration: percentile bounds and persisted profiles
//!
//! A calibration run collects raw samples for a fixed duration, first at
//! rest and then during activity, and reduces them to low/high percentile
//! bounds per channel. Bounds can be saved as a JSON profile and loaded
//! again without recalibrating.

use crate::config::constants::calibration::MIN_CALIBRATION_SAMPLES;
use crate::config::CalibrationConfig;
use crate::error::{BioError, BioResult};
use crate::types::{Channel, Sample};
use crate::utils::stats::percentile_of_sorted;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Low/high reference values of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelBounds {
    pub low: f32,
    pub high: f32,
}

impl ChannelBounds {
    pub fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    pub fn span(&self) -> f32 {
        self.high - self.low
    }

    /// Span too small to divide by
    pub fn is_degenerate(&self, min_span: f32) -> bool {
        !(self.span() >= min_span)
    }
}

/// Calibrated bounds for both channels; frozen once created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub emg: ChannelBounds,
    pub gsr: ChannelBounds,
}

impl Baseline {
    pub fn new(emg: ChannelBounds, gsr: ChannelBounds) -> Self {
        Self { emg, gsr }
    }

    pub fn bounds(&self, channel: Channel) -> ChannelBounds {
        match channel {
            Channel::Emg => self.emg,
            Channel::Gsr => self.gsr,
        }
    }
}

/// Stage of a calibration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationPhase {
    /// User sits still
    Rest,
    /// User performs tasks / contractions
    Active,
    Complete,
}

/// Accumulates raw samples for one calibration run
#[derive(Debug, Clone)]
pub struct Calibrator {
    low_percentile: f32,
    high_percentile: f32,
    target_samples: usize,
    rest_samples: usize,
    emg: Vec<f32>,
    gsr: Vec<f32>,
    phase: CalibrationPhase,
}

impl Calibrator {
    /// Calibrator sized for `config.duration_secs` at `sample_rate_hz`
    pub fn new(config: &CalibrationConfig, sample_rate_hz: u32) -> BioResult<Self> {
        if !(config.duration_secs > 0.0) || sample_rate_hz == 0 {
            return Err(BioError::configuration(
                "calibration",
                "duration and sample rate must be positive",
            ));
        }
        if !(config.low_percentile < config.high_percentile) {
            return Err(BioError::configuration(
                "calibration",
                "low percentile must be below high percentile",
            ));
        }

        let target_samples = config.target_samples(sample_rate_hz);
        let rest_samples =
            ((target_samples as f32 * config.rest_fraction.clamp(0.0, 1.0)).round() as usize)
                .min(target_samples);

        Ok(Self {
            low_percentile: config.low_percentile,
            high_percentile: config.high_percentile,
            target_samples,
            rest_samples,
            emg: Vec::with_capacity(target_samples),
            gsr: Vec::with_capacity(target_samples),
            phase: if rest_samples > 0 {
                CalibrationPhase::Rest
            } else {
                CalibrationPhase::Active
            },
        })
    }

    /// Record one sample; returns true once the run is complete
    pub fn feed(&mut self, sample: &Sample) -> bool {
        if self.phase == CalibrationPhase::Complete {
            return true;
        }

        self.emg.push(sample.emg);
        self.gsr.push(sample.gsr);

        let collected = self.emg.len();
        if collected >= self.target_samples {
            self.phase = CalibrationPhase::Complete;
        } else if self.phase == CalibrationPhase::Rest && collected >= self.rest_samples {
            debug!(collected, "Calibration rest phase finished");
            self.phase = CalibrationPhase::Active;
        }
        self.phase == CalibrationPhase::Complete
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    /// Fraction of the run collected, in [0, 1]
    pub fn progress(&self) -> f32 {
        (self.emg.len() as f32 / self.target_samples as f32).min(1.0)
    }

    pub fn samples_collected(&self) -> usize {
        self.emg.len()
    }

    pub fn target_samples(&self) -> usize {
        self.target_samples
    }

    pub fn is_complete(&self) -> bool {
        self.phase == CalibrationPhase::Complete
    }

    /// Reduce what has been collected to percentile bounds.
    ///
    /// Can be called early; needs at least two finite values per channel.
    pub fn finish(&self) -> BioResult<Baseline> {
        let emg = self.channel_bounds(Channel::Emg, &self.emg)?;
        let gsr = self.channel_bounds(Channel::Gsr, &self.gsr)?;
        info!(
            samples = self.emg.len(),
            emg_low = emg.low,
            emg_high = emg.high,
            gsr_low = gsr.low,
            gsr_high = gsr.high,
            "Calibration bounds computed"
        );
        Ok(Baseline::new(emg, gsr))
    }

    fn channel_bounds(&self, channel: Channel, values: &[f32]) -> BioResult<ChannelBounds> {
        let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.len() < MIN_CALIBRATION_SAMPLES {
            return Err(BioError::InsufficientData {
                channel,
                required: MIN_CALIBRATION_SAMPLES,
                available: sorted.len(),
            });
        }
        sorted.sort_by(|a, b| a.total_cmp(b));
        Ok(ChannelBounds::new(
            percentile_of_sorted(&sorted, self.low_percentile),
            percentile_of_sorted(&sorted, self.high_percentile),
        ))
    }
}

/// Persisted calibration record for one user/session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    pub user: String,
    pub created_at_us: u64,
    pub emg_low: f32,
    pub emg_high: f32,
    pub gsr_low: f32,
    pub gsr_high: f32,
}

impl CalibrationProfile {
    pub fn from_baseline(user: impl Into<String>, baseline: &Baseline, created_at_us: u64) -> Self {
        Self {
            user: user.into(),
            created_at_us,
            emg_low: baseline.emg.low,
            emg_high: baseline.emg.high,
            gsr_low: baseline.gsr.low,
            gsr_high: baseline.gsr.high,
        }
    }

    pub fn baseline(&self) -> Baseline {
        Baseline::new(
            ChannelBounds::new(self.emg_low, self.emg_high),
            ChannelBounds::new(self.gsr_low, self.gsr_high),
        )
    }

    /// Reject bounds that cannot normalize anything
    pub fn validate(&self) -> BioResult<()> {
        for (name, low, high) in [
            ("EMG", self.emg_low, self.emg_high),
            ("GSR", self.gsr_low, self.gsr_high),
        ] {
            if !low.is_finite() || !high.is_finite() {
                return Err(BioError::Profile(format!("{} bounds must be finite", name)));
            }
            if low > high {
                return Err(BioError::Profile(format!(
                    "{} low bound {} exceeds high bound {}",
                    name, low, high
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> BioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> BioResult<Self> {
        let profile: Self = serde_json::from_str(text)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> BioResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        info!("Saved calibration profile for '{}' to {:?}", self.user, path);
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> BioResult<Self> {
        let path = path.as_ref();
        let profile = Self::from_json(&fs::read_to_string(path)?)?;
        info!("Loaded calibration profile for '{}' from {:?}", profile.user, path);
        Ok(profile)
    }
}
