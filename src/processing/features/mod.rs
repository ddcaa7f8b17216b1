//! Feature extraction over normalized EMG and GSR windows
//!
//! - EMG: RMS and zero-crossing rate of the mean-centered window (time domain)
//! - EMG: median frequency relative to Nyquist (frequency domain)
//! - GSR: window mean and first-to-last slope
//!
//! The extracted vector depends only on the window contents.

pub mod frequency;
pub mod time_domain;

use crate::config::constants::features::FEATURE_DIMENSION;
use crate::config::{FeatureConfig, SamplingConfig};
use crate::error::{BioError, BioResult};
use crate::types::Channel;
use crate::utils::stats::mean;
use serde::{Deserialize, Serialize};

pub use frequency::MedianFrequencyEstimator;
pub use time_domain::{rms, zero_crossing_rate, TimeDomainExtractor, TimeDomainFeatures};

/// Features computed once per processing tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub emg_rms: f32,
    pub emg_zero_crossing_rate: f32,
    /// Median frequency divided by the Nyquist frequency
    pub emg_median_frequency: f32,
    pub gsr_mean: f32,
    /// Normalized GSR units per second
    pub gsr_slope: f32,
    pub emg_samples: usize,
    pub gsr_samples: usize,
    /// Computed over a window shorter than configured
    pub low_confidence: bool,
}

impl FeatureVector {
    /// Scalar features in the order a learned model expects
    pub fn as_array(&self) -> [f32; FEATURE_DIMENSION] {
        [
            self.emg_rms,
            self.emg_zero_crossing_rate,
            self.emg_median_frequency,
            self.gsr_mean,
            self.gsr_slope,
        ]
    }
}

/// Main feature extractor
pub struct FeatureExtractor {
    time_domain: TimeDomainExtractor,
    frequency: MedianFrequencyEstimator,
    emg_window_samples: usize,
    gsr_window_samples: usize,
    gsr_rate_hz: f32,
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig, sampling: &SamplingConfig) -> BioResult<Self> {
        if config.emg_window_samples == 0 || config.gsr_window_samples == 0 {
            return Err(BioError::configuration(
                "features",
                "window sizes must be at least 1 sample",
            ));
        }
        if sampling.gsr_rate_hz == 0 {
            return Err(BioError::configuration("features", "GSR rate must be positive"));
        }

        Ok(Self {
            time_domain: TimeDomainExtractor::new(config.zero_crossing_deadband, config.remove_dc),
            frequency: MedianFrequencyEstimator::new(config.min_spectrum_samples),
            emg_window_samples: config.emg_window_samples,
            gsr_window_samples: config.gsr_window_samples,
            gsr_rate_hz: sampling.effective_gsr_rate_hz(),
        })
    }

    /// Extract features from the current windows, oldest sample first.
    ///
    /// A window shorter than configured still yields features, flagged
    /// `low_confidence`. An empty window is an error.
    pub fn extract(&mut self, emg: &[f32], gsr: &[f32]) -> BioResult<FeatureVector> {
        if emg.is_empty() {
            return Err(BioError::InsufficientData {
                channel: Channel::Emg,
                required: self.emg_window_samples,
                available: 0,
            });
        }
        if gsr.is_empty() {
            return Err(BioError::InsufficientData {
                channel: Channel::Gsr,
                required: self.gsr_window_samples,
                available: 0,
            });
        }

        let time_domain = self.time_domain.extract(emg);
        let centered = time_domain::remove_dc(emg);
        let emg_median_frequency = self.frequency.estimate(&centered);

        Ok(FeatureVector {
            emg_rms: time_domain.rms,
            emg_zero_crossing_rate: time_domain.zero_crossing_rate,
            emg_median_frequency,
            gsr_mean: mean(gsr),
            gsr_slope: time_domain::window_slope(gsr, self.gsr_rate_hz),
            emg_samples: emg.len(),
            gsr_samples: gsr.len(),
            low_confidence: emg.len() < self.emg_window_samples
                || gsr.len() < self.gsr_window_samples,
        })
    }

    pub fn emg_window_samples(&self) -> usize {
        self.emg_window_samples
    }

    pub fn gsr_window_samples(&self) -> usize {
        self.gsr_window_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(&FeatureConfig::default(), &SamplingConfig::default()).unwrap()
    }

    #[test]
    fn test_full_windows() {
        let mut extractor = extractor();
        let emg: Vec<f32> = (0..256).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
        let gsr: Vec<f32> = (0..250).map(|i| i as f32 / 249.0).collect();
        let features = extractor.extract(&emg, &gsr).unwrap();

        assert!((features.emg_rms - 0.5).abs() < 1e-6);
        assert!((features.emg_zero_crossing_rate - 1.0).abs() < 1e-6);
        assert!(features.emg_median_frequency > 0.9);
        assert!((features.gsr_mean - 0.5).abs() < 1e-5);
        // 0 -> 1 over 249 samples at 100 Hz
        assert!((features.gsr_slope - 100.0 / 249.0).abs() < 1e-4);
        assert!(!features.low_confidence);
    }

    #[test]
    fn test_gsr_slope_uses_decimated_rate() {
        // 1000 / 300 keeps every 3rd sample, so GSR arrives at 333.3 Hz
        let sampling = SamplingConfig {
            emg_rate_hz: 1000,
            gsr_rate_hz: 300,
            ..SamplingConfig::default()
        };
        let mut extractor = FeatureExtractor::new(&FeatureConfig::default(), &sampling).unwrap();
        let step = 0.1 * 3.0 / 1000.0;
        let gsr: Vec<f32> = (0..250).map(|i| 0.2 + i as f32 * step).collect();
        let features = extractor.extract(&[0.5; 256], &gsr).unwrap();
        assert!((features.gsr_slope - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_partial_window_is_low_confidence() {
        let mut extractor = extractor();
        let features = extractor.extract(&[0.5; 20], &[0.2; 3]).unwrap();
        assert!(features.low_confidence);
        assert_eq!(features.emg_samples, 20);
        assert_eq!(features.gsr_samples, 3);
        assert_eq!(features.emg_median_frequency, 0.0);
    }

    #[test]
    fn test_empty_window_is_error() {
        let mut extractor = extractor();
        assert!(matches!(
            extractor.extract(&[], &[0.2]),
            Err(BioError::InsufficientData { channel: Channel::Emg, .. })
        ));
        assert!(matches!(
            extractor.extract(&[0.2], &[]),
            Err(BioError::InsufficientData { channel: Channel::Gsr, .. })
        ));
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let mut extractor = extractor();
        let emg: Vec<f32> = (0..256).map(|i| ((i * 37) % 100) as f32 / 100.0).collect();
        let gsr = vec![0.4; 250];
        let first = extractor.extract(&emg, &gsr).unwrap();
        let second = extractor.extract(&emg, &gsr).unwrap();
        assert_eq!(first, second);
    }
}
