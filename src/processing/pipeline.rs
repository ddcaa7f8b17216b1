// src/processing/pipeline.rs
//! Streaming state pipeline: filter, normalize, window, extract, classify

use crate::acquisition::ring_buffer::SampleWindow;
use crate::acquisition::sample_sync::SampleSynchronizer;
use crate::config::{validate_system_config, SystemConfig};
use crate::error::{BioError, BioResult};
use crate::processing::calibration::{Baseline, CalibrationPhase, CalibrationProfile};
use crate::processing::classifier::{StateClassifier, StateStatistics};
use crate::processing::features::{FeatureExtractor, FeatureVector};
use crate::processing::filters::FilterChain;
use crate::processing::normalizer::StreamingNormalizer;
use crate::processing::quality_monitor::{QualityInput, QualityLevel, QualityMonitor};
use crate::types::{Channel, Sample, StateLabel};
use crate::utils::time::{SystemTimeProvider, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// One tick of pipeline output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateReport {
    pub timestamp_us: u64,
    /// Smoothed, externally reported state
    pub state: StateLabel,
    pub confidence: f32,
    /// Classification of this tick alone
    pub raw_state: StateLabel,
    pub raw_confidence: f32,
    pub rejected: bool,
    /// Which threshold drove this tick's raw classification
    pub reason: String,
    pub features: FeatureVector,
    /// Rolling signal quality in [0, 1]
    pub quality: f32,
    pub low_confidence: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_samples_processed: u64,
    pub calibration_samples: u64,
    pub reports: u64,
    pub rejected_classifications: u64,
    pub low_confidence_reports: u64,
    pub calibrations_completed: u64,
    pub average_processing_time_us: f32,
    pub max_processing_time_us: f32,
}

/// Single-consumer processing instance owning one session's state
pub struct StatePipeline {
    config: SystemConfig,
    emg_filters: FilterChain,
    gsr_filters: FilterChain,
    normalizer: StreamingNormalizer,
    synchronizer: SampleSynchronizer,
    emg_window: SampleWindow<f32>,
    gsr_window: SampleWindow<f32>,
    feature_extractor: FeatureExtractor,
    classifier: StateClassifier,
    quality: QualityMonitor,
    time_provider: Arc<dyn TimeProvider>,
    metrics: PerformanceMetrics,
    /// Latest filtered GSR, held between GSR-rate samples
    held_gsr: Option<f32>,
    last_emg_rms: Option<f32>,
}

impl StatePipeline {
    /// Pipeline timed with the wall clock
    pub fn new(config: SystemConfig) -> BioResult<Self> {
        Self::with_time_provider(config, Arc::new(SystemTimeProvider))
    }

    pub fn with_time_provider(
        config: SystemConfig,
        time_provider: Arc<dyn TimeProvider>,
    ) -> BioResult<Self> {
        validate_system_config(&config)
            .map_err(|errors| BioError::configuration("system", errors.join("; ")))?;

        let window = |size: usize, name: &str| {
            SampleWindow::new(size).map_err(|e| BioError::configuration(name, e.to_string()))
        };

        let synchronizer = SampleSynchronizer::new(&config.sampling)
            .map_err(|reason| BioError::configuration("sampling", reason))?;

        Ok(Self {
            emg_filters: FilterChain::for_channel(Channel::Emg, &config.filters)?,
            gsr_filters: FilterChain::for_channel(Channel::Gsr, &config.filters)?,
            normalizer: StreamingNormalizer::new(
                config.calibration.clone(),
                config.sampling.emg_rate_hz,
            ),
            synchronizer,
            emg_window: window(config.features.emg_window_samples, "emg_window")?,
            gsr_window: window(config.features.gsr_window_samples, "gsr_window")?,
            feature_extractor: FeatureExtractor::new(&config.features, &config.sampling)?,
            classifier: StateClassifier::new(&config.classifier)?,
            quality: QualityMonitor::new(config.quality.clone())?,
            time_provider,
            metrics: PerformanceMetrics::default(),
            held_gsr: None,
            last_emg_rms: None,
            config,
        })
    }

    /// Process a single sample.
    ///
    /// During calibration samples feed the calibrator and nothing is
    /// reported. Once calibrated, a report is produced every tick.
    pub fn push_sample(&mut self, sample: Sample) -> BioResult<Option<StateReport>> {
        let start_time = self.time_provider.now_nanos();

        if !self.normalizer.is_calibrating() && !self.normalizer.is_calibrated() {
            return Err(BioError::NotCalibrated);
        }

        let synced = self.synchronizer.process(&sample);
        let emg = self.emg_filters.process(synced.emg);
        let fresh_gsr = synced.gsr.map(|raw| self.gsr_filters.process(raw));
        if fresh_gsr.is_some() {
            self.held_gsr = fresh_gsr;
        }
        let gsr = self.held_gsr.unwrap_or(sample.gsr);

        let report = if self.normalizer.is_calibrating() {
            self.metrics.calibration_samples += 1;
            let filtered = Sample::new(sample.timestamp_us, emg, gsr);
            if self.normalizer.feed_calibration(&filtered)?.is_some() {
                self.metrics.calibrations_completed += 1;
                self.restart_windows();
            }
            None
        } else {
            self.process_calibrated(sample, emg, fresh_gsr, synced.tick_due)?
        };

        self.update_performance_metrics(start_time);
        Ok(report)
    }

    fn process_calibrated(
        &mut self,
        sample: Sample,
        emg: f32,
        fresh_gsr: Option<f32>,
        tick_due: bool,
    ) -> BioResult<Option<StateReport>> {
        let emg_normalized = self.normalizer.normalize(emg, Channel::Emg)?;
        self.emg_window.push(emg_normalized);
        if let Some(gsr) = fresh_gsr {
            let gsr_normalized = self.normalizer.normalize(gsr, Channel::Gsr)?;
            self.gsr_window.push(gsr_normalized);
        }

        self.quality.assess(&QualityInput {
            timestamp_us: sample.timestamp_us,
            normalized_emg: emg_normalized,
            emg_window_rms: self.last_emg_rms,
            raw_gsr: sample.gsr,
        });

        if !tick_due {
            return Ok(None);
        }

        let features = match self
            .feature_extractor
            .extract(&self.emg_window.to_vec(), &self.gsr_window.to_vec())
        {
            Ok(features) => features,
            Err(BioError::InsufficientData { channel, .. }) => {
                debug!("Skipping tick, no {} samples yet", channel);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.last_emg_rms = Some(features.emg_rms);

        let output = self.classifier.update(&features, &self.normalizer)?;

        self.metrics.reports += 1;
        if output.raw.rejected {
            self.metrics.rejected_classifications += 1;
        }
        if features.low_confidence {
            self.metrics.low_confidence_reports += 1;
        }

        Ok(Some(StateReport {
            timestamp_us: sample.timestamp_us,
            state: output.smoothed.label,
            confidence: output.smoothed.confidence,
            raw_state: output.raw.label,
            raw_confidence: output.raw.confidence,
            rejected: output.raw.rejected,
            reason: output.raw.explain(),
            features,
            quality: self.quality.average(),
            low_confidence: features.low_confidence,
        }))
    }

    /// Begin a new calibration run; classification resumes when it completes
    pub fn start_calibration(&mut self) -> BioResult<()> {
        self.normalizer.start_calibration()?;
        self.restart_windows();
        Ok(())
    }

    /// Skip calibration by installing a saved profile
    pub fn load_profile(&mut self, profile: &CalibrationProfile) -> BioResult<()> {
        profile.validate()?;
        self.load_baseline(profile.baseline());
        info!("Using calibration profile for '{}'", profile.user);
        Ok(())
    }

    pub fn load_baseline(&mut self, baseline: Baseline) {
        self.normalizer.load_baseline(baseline);
        self.restart_windows();
    }

    /// Current baseline as a persistable profile
    pub fn export_profile(&self, user: &str) -> BioResult<CalibrationProfile> {
        let baseline = self.normalizer.baseline().ok_or(BioError::NotCalibrated)?;
        Ok(CalibrationProfile::from_baseline(
            user,
            baseline,
            self.time_provider.now_micros(),
        ))
    }

    /// Clear stream state (windows, filters, smoothing, statistics, metrics)
    /// while keeping the baseline
    pub fn reset(&mut self) {
        self.emg_filters.reset();
        self.gsr_filters.reset();
        self.held_gsr = None;
        self.restart_windows();
        self.classifier.reset();
        self.metrics = PerformanceMetrics::default();
    }

    fn restart_windows(&mut self) {
        self.synchronizer.reset();
        self.emg_window.clear();
        self.gsr_window.clear();
        self.quality.reset();
        self.last_emg_rms = None;
    }

    fn update_performance_metrics(&mut self, start_time: u64) {
        let processing_time_us =
            self.time_provider.now_nanos().saturating_sub(start_time) as f32 / 1000.0;
        let metrics = &mut self.metrics;
        metrics.total_samples_processed += 1;

        let n = metrics.total_samples_processed as f32;
        metrics.average_processing_time_us =
            (metrics.average_processing_time_us * (n - 1.0) + processing_time_us) / n;
        if processing_time_us > metrics.max_processing_time_us {
            metrics.max_processing_time_us = processing_time_us;
        }
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn statistics(&self) -> &StateStatistics {
        self.classifier.statistics()
    }

    pub fn current_state(&self) -> StateLabel {
        self.classifier.current_state()
    }

    pub fn quality_level(&self) -> QualityLevel {
        self.quality.level()
    }

    pub fn is_calibrated(&self) -> bool {
        self.normalizer.is_calibrated()
    }

    pub fn calibration_progress(&self) -> Option<(CalibrationPhase, f32)> {
        self.normalizer.calibration_progress()
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.normalizer.baseline()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}
