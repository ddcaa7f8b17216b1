// src/processing/normalizer.rs
//! Streaming normalization of raw values into [0, 1]

use crate::config::constants::calibration::NEUTRAL_NORMALIZED_VALUE;
use crate::config::CalibrationConfig;
use crate::error::{BioError, BioResult};
use crate::processing::calibration::{Baseline, CalibrationPhase, Calibrator, ChannelBounds};
use crate::types::{Channel, Sample};
use tracing::{info, warn};

/// Lifecycle of the normalizer's baseline
#[derive(Debug, Clone)]
pub enum NormalizerState {
    Uncalibrated,
    Calibrating(Calibrator),
    Calibrated(Baseline),
}

/// Map a raw value through channel bounds.
///
/// `clamp((raw - low) / (high - low), 0, 1)`; a span below `min_span` and
/// NaN input both give the neutral midpoint.
pub fn normalize_value(raw: f32, bounds: ChannelBounds, min_span: f32) -> f32 {
    if raw.is_nan() || bounds.is_degenerate(min_span) {
        return NEUTRAL_NORMALIZED_VALUE;
    }
    ((raw - bounds.low) / bounds.span()).clamp(0.0, 1.0)
}

/// Owns one session's baseline and normalizes incoming values against it
#[derive(Debug, Clone)]
pub struct StreamingNormalizer {
    config: CalibrationConfig,
    sample_rate_hz: u32,
    state: NormalizerState,
    degenerate_warned: [bool; 2],
}

impl StreamingNormalizer {
    pub fn new(config: CalibrationConfig, sample_rate_hz: u32) -> Self {
        Self {
            config,
            sample_rate_hz,
            state: NormalizerState::Uncalibrated,
            degenerate_warned: [false; 2],
        }
    }

    /// Normalizer starting from an existing baseline
    pub fn with_baseline(config: CalibrationConfig, sample_rate_hz: u32, baseline: Baseline) -> Self {
        let mut normalizer = Self::new(config, sample_rate_hz);
        normalizer.load_baseline(baseline);
        normalizer
    }

    /// Begin a fresh calibration run, discarding any current baseline
    pub fn start_calibration(&mut self) -> BioResult<()> {
        let calibrator = Calibrator::new(&self.config, self.sample_rate_hz)?;
        info!(
            target_samples = calibrator.target_samples(),
            "Calibration started (rest phase first)"
        );
        self.state = NormalizerState::Calibrating(calibrator);
        self.degenerate_warned = [false; 2];
        Ok(())
    }

    /// Feed one raw sample to the running calibration.
    ///
    /// Returns the new baseline on the sample that completes the run.
    pub fn feed_calibration(&mut self, sample: &Sample) -> BioResult<Option<Baseline>> {
        let calibrator = match &mut self.state {
            NormalizerState::Calibrating(calibrator) => calibrator,
            _ => {
                return Err(BioError::configuration(
                    "normalizer",
                    "no calibration in progress",
                ))
            }
        };

        let previous_phase = calibrator.phase();
        if !calibrator.feed(sample) {
            if previous_phase != calibrator.phase() {
                info!("Calibration switched to active phase");
            }
            return Ok(None);
        }

        let baseline = match calibrator.finish() {
            Ok(baseline) => baseline,
            Err(e) => {
                warn!(error = %e, "Calibration failed; start a new run");
                self.state = NormalizerState::Uncalibrated;
                return Err(e);
            }
        };
        self.load_baseline(baseline);
        info!("Calibration complete");
        Ok(Some(baseline))
    }

    /// Install a baseline, e.g. from a saved profile
    pub fn load_baseline(&mut self, baseline: Baseline) {
        self.state = NormalizerState::Calibrated(baseline);
        self.degenerate_warned = [false; 2];
    }

    /// Forget the baseline and any calibration in progress
    pub fn reset(&mut self) {
        self.state = NormalizerState::Uncalibrated;
        self.degenerate_warned = [false; 2];
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        match &self.state {
            NormalizerState::Calibrated(baseline) => Some(baseline),
            _ => None,
        }
    }

    pub fn state(&self) -> &NormalizerState {
        &self.state
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self.state, NormalizerState::Calibrated(_))
    }

    pub fn is_calibrating(&self) -> bool {
        matches!(self.state, NormalizerState::Calibrating(_))
    }

    /// Progress and phase of a running calibration
    pub fn calibration_progress(&self) -> Option<(CalibrationPhase, f32)> {
        match &self.state {
            NormalizerState::Calibrating(calibrator) => {
                Some((calibrator.phase(), calibrator.progress()))
            }
            _ => None,
        }
    }

    /// Normalize one raw value; `NotCalibrated` until a baseline exists
    pub fn normalize(&mut self, raw: f32, channel: Channel) -> BioResult<f32> {
        let bounds = match &self.state {
            NormalizerState::Calibrated(baseline) => baseline.bounds(channel),
            _ => return Err(BioError::NotCalibrated),
        };

        let slot = match channel {
            Channel::Emg => 0,
            Channel::Gsr => 1,
        };
        if bounds.is_degenerate(self.config.min_span) && !self.degenerate_warned[slot] {
            warn!(
                low = bounds.low,
                high = bounds.high,
                "Degenerate {} baseline, normalizing to the midpoint",
                channel
            );
            self.degenerate_warned[slot] = true;
        }

        Ok(normalize_value(raw, bounds, self.config.min_span))
    }

    /// Normalize both channels of a sample
    pub fn normalize_sample(&mut self, sample: &Sample) -> BioResult<(f32, f32)> {
        Ok((
            self.normalize(sample.emg, Channel::Emg)?,
            self.normalize(sample.gsr, Channel::Gsr)?,
        ))
    }
}
