// src/config/processing_config.rs
//! Per-stage processing configuration structures

use crate::config::constants::{calibration, classifier, features, filters, quality, sampling};
use crate::types::StateLabel;
use serde::{Deserialize, Serialize};

/// Channel sample rates and processing cadence
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    pub emg_rate_hz: u32,
    pub gsr_rate_hz: u32,
    /// EMG samples between two classification ticks
    pub tick_interval_samples: usize,
}

/// Calibration phase configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CalibrationConfig {
    pub duration_secs: f32,
    /// Share of the calibration spent in the rest phase, the remainder is active
    pub rest_fraction: f32,
    pub low_percentile: f32,
    pub high_percentile: f32,
    pub min_span: f32,
}

/// Pre-normalization filter configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub emg_dc_blocker: bool,
    pub dc_blocker_pole: f32,
    /// GSR moving-average length in GSR samples, 0 or 1 disables it
    pub gsr_moving_average: usize,
}

/// Feature extraction configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    pub emg_window_samples: usize,
    pub gsr_window_samples: usize,
    pub remove_dc: bool,
    pub zero_crossing_deadband: f32,
    pub min_spectrum_samples: usize,
}

/// Which classification strategy drives the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    RuleBased,
    Learned,
}

/// Classifier configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub strategy: StrategyKind,
    pub rejection_threshold: f32,
    pub thresholds: ThresholdTable,
    pub smoothing: SmoothingConfig,
    pub model: Option<LinearModelConfig>,
}

/// Canonical threshold table for the rule-based classifier.
///
/// All values refer to normalized features: RMS of the mean-centered EMG
/// window (0..`rms_full_scale`), zero-crossing rate (0..1), GSR mean (0..1).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ThresholdTable {
    /// Largest RMS a window of values in [0, 1] can reach after DC removal
    pub rms_full_scale: f32,
    pub relaxed: RelaxedThresholds,
    pub focused: FocusedThresholds,
    pub stressed: StressedThresholds,
    pub fatigued: FatigueThresholds,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RelaxedThresholds {
    pub rms_max: f32,
    pub gsr_max: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FocusedThresholds {
    pub rms_min: f32,
    pub rms_max: f32,
    pub gsr_min: f32,
    pub gsr_max: f32,
    pub zcr_min: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct StressedThresholds {
    pub rms_min: f32,
    pub gsr_min: f32,
    pub zcr_min: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FatigueThresholds {
    /// Trailing classifications the RMS trend is fitted over
    pub trend_ticks: usize,
    /// Fewer history entries than this never yield a trend
    pub min_trend_ticks: usize,
    /// RMS decline per tick required to call fatigue
    pub min_decline: f32,
    /// Decline per tick treated as full confidence
    pub decline_full_scale: f32,
    pub zcr_max: f32,
}

/// Majority-vote smoothing configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SmoothingConfig {
    /// K: number of recent predictions that vote
    pub vote_window: usize,
    /// Votes a label needs before the reported state switches to it
    pub min_votes: usize,
}

/// Weights for the learned (softmax linear) strategy.
///
/// Feature order: emg_rms, emg_zero_crossing_rate, emg_median_frequency,
/// gsr_mean, gsr_slope.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LinearModelConfig {
    pub labels: Vec<StateLabel>,
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

/// Signal quality monitoring configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct QualityConfig {
    pub saturation_threshold: f32,
    pub weak_signal_rms: f32,
    pub gsr_max_microsiemens: f32,
    pub max_gap_ms: u64,
    pub history_length: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            emg_rate_hz: sampling::DEFAULT_EMG_RATE_HZ,
            gsr_rate_hz: sampling::DEFAULT_GSR_RATE_HZ,
            tick_interval_samples: sampling::DEFAULT_TICK_INTERVAL_SAMPLES,
        }
    }
}

impl SamplingConfig {
    /// EMG samples per retained GSR sample
    pub fn gsr_decimation(&self) -> usize {
        if self.gsr_rate_hz == 0 {
            return 1;
        }
        ((self.emg_rate_hz / self.gsr_rate_hz) as usize).max(1)
    }

    /// Rate of the GSR samples actually retained after decimation.
    ///
    /// Differs from `gsr_rate_hz` when the EMG rate is not a multiple of it.
    pub fn effective_gsr_rate_hz(&self) -> f32 {
        self.emg_rate_hz as f32 / self.gsr_decimation() as f32
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_secs: calibration::DEFAULT_DURATION_SECS,
            rest_fraction: calibration::DEFAULT_REST_FRACTION,
            low_percentile: calibration::DEFAULT_LOW_PERCENTILE,
            high_percentile: calibration::DEFAULT_HIGH_PERCENTILE,
            min_span: calibration::DEFAULT_MIN_SPAN,
        }
    }
}

impl CalibrationConfig {
    /// Number of samples a calibration run collects at the given rate
    pub fn target_samples(&self, rate_hz: u32) -> usize {
        let target = (self.duration_secs * rate_hz as f32).round() as usize;
        target.max(calibration::MIN_CALIBRATION_SAMPLES)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            emg_dc_blocker: false,
            dc_blocker_pole: filters::DEFAULT_DC_BLOCKER_POLE,
            gsr_moving_average: filters::DEFAULT_GSR_MOVING_AVERAGE,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            emg_window_samples: features::DEFAULT_EMG_WINDOW_SAMPLES,
            gsr_window_samples: features::DEFAULT_GSR_WINDOW_SAMPLES,
            remove_dc: true,
            zero_crossing_deadband: features::DEFAULT_ZERO_CROSSING_DEADBAND,
            min_spectrum_samples: features::DEFAULT_MIN_SPECTRUM_SAMPLES,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::RuleBased,
            rejection_threshold: classifier::DEFAULT_REJECTION_THRESHOLD,
            thresholds: ThresholdTable::default(),
            smoothing: SmoothingConfig::default(),
            model: None,
        }
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            rms_full_scale: 0.5,
            relaxed: RelaxedThresholds::default(),
            focused: FocusedThresholds::default(),
            stressed: StressedThresholds::default(),
            fatigued: FatigueThresholds::default(),
        }
    }
}

impl Default for RelaxedThresholds {
    fn default() -> Self {
        Self {
            rms_max: 0.08,
            gsr_max: 0.35,
        }
    }
}

impl Default for FocusedThresholds {
    fn default() -> Self {
        Self {
            rms_min: 0.08,
            rms_max: 0.25,
            gsr_min: 0.25,
            gsr_max: 0.6,
            zcr_min: 0.2,
        }
    }
}

impl Default for StressedThresholds {
    fn default() -> Self {
        Self {
            rms_min: 0.25,
            gsr_min: 0.6,
            zcr_min: 0.2,
        }
    }
}

impl Default for FatigueThresholds {
    fn default() -> Self {
        Self {
            trend_ticks: classifier::DEFAULT_TREND_TICKS,
            min_trend_ticks: classifier::DEFAULT_MIN_TREND_TICKS,
            min_decline: 0.001,
            decline_full_scale: 0.01,
            zcr_max: 0.15,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        let vote_window = classifier::DEFAULT_VOTE_WINDOW;
        Self {
            vote_window,
            min_votes: vote_window / 2 + 1,
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            saturation_threshold: quality::DEFAULT_SATURATION_THRESHOLD,
            weak_signal_rms: quality::DEFAULT_WEAK_SIGNAL_RMS,
            gsr_max_microsiemens: quality::DEFAULT_GSR_MAX_MICROSIEMENS,
            max_gap_ms: quality::DEFAULT_MAX_GAP_MS,
            history_length: quality::DEFAULT_HISTORY_LENGTH,
        }
    }
}

fn check_unit(name: &str, value: f32, errors: &mut Vec<String>) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(format!("{} must be within [0, 1], got {}", name, value));
    }
}

/// Validate sampling configuration
pub fn validate_sampling_config(config: &SamplingConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let range = sampling::MIN_SAMPLING_RATE_HZ..=sampling::MAX_SAMPLING_RATE_HZ;
    if !range.contains(&config.emg_rate_hz) {
        errors.push(format!("EMG rate {} Hz is outside {:?}", config.emg_rate_hz, range));
    }
    if !range.contains(&config.gsr_rate_hz) {
        errors.push(format!("GSR rate {} Hz is outside {:?}", config.gsr_rate_hz, range));
    }
    if config.gsr_rate_hz > config.emg_rate_hz {
        errors.push("GSR rate cannot exceed the EMG rate".to_string());
    }
    if config.tick_interval_samples == 0 {
        errors.push("Tick interval must be at least one sample".to_string());
    }
    errors
}

/// Validate calibration configuration
pub fn validate_calibration_config(config: &CalibrationConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if !(config.duration_secs > 0.0) {
        errors.push("Calibration duration must be positive".to_string());
    }
    check_unit("Rest fraction", config.rest_fraction, &mut errors);
    if !(0.0..=100.0).contains(&config.low_percentile)
        || !(0.0..=100.0).contains(&config.high_percentile)
    {
        errors.push("Calibration percentiles must be within [0, 100]".to_string());
    }
    if config.low_percentile >= config.high_percentile {
        errors.push("Low percentile must be below the high percentile".to_string());
    }
    if !(config.min_span > 0.0) {
        errors.push("Minimum span must be positive".to_string());
    }
    errors
}

/// Validate filter configuration
pub fn validate_filter_config(config: &FilterConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if !(config.dc_blocker_pole > 0.0 && config.dc_blocker_pole < 1.0) {
        errors.push("DC blocker pole must be within (0, 1)".to_string());
    }
    if config.gsr_moving_average > filters::MAX_MOVING_AVERAGE {
        errors.push(format!(
            "GSR moving average cannot exceed {} samples",
            filters::MAX_MOVING_AVERAGE
        ));
    }
    errors
}

/// Validate feature extraction configuration
pub fn validate_feature_config(config: &FeatureConfig) -> Vec<String> {
    let mut errors = Vec::new();
    for (name, size) in [
        ("EMG window", config.emg_window_samples),
        ("GSR window", config.gsr_window_samples),
    ] {
        if size < 2 {
            errors.push(format!("{} must hold at least 2 samples", name));
        }
        if size > features::MAX_WINDOW_SAMPLES {
            errors.push(format!("{} cannot exceed {} samples", name, features::MAX_WINDOW_SAMPLES));
        }
    }
    if config.zero_crossing_deadband < 0.0 {
        errors.push("Zero-crossing deadband cannot be negative".to_string());
    }
    errors
}

/// Validate classifier configuration, including the threshold table
pub fn validate_classifier_config(config: &ClassifierConfig) -> Vec<String> {
    let mut errors = Vec::new();
    check_unit("Rejection threshold", config.rejection_threshold, &mut errors);

    let t = &config.thresholds;
    if !(t.rms_full_scale > 0.0) {
        errors.push("RMS full scale must be positive".to_string());
    }
    for (name, value) in [
        ("relaxed.gsr_max", t.relaxed.gsr_max),
        ("focused.gsr_min", t.focused.gsr_min),
        ("focused.gsr_max", t.focused.gsr_max),
        ("focused.zcr_min", t.focused.zcr_min),
        ("stressed.gsr_min", t.stressed.gsr_min),
        ("stressed.zcr_min", t.stressed.zcr_min),
        ("fatigued.zcr_max", t.fatigued.zcr_max),
    ] {
        check_unit(name, value, &mut errors);
    }
    for (name, value) in [
        ("relaxed.rms_max", t.relaxed.rms_max),
        ("focused.rms_min", t.focused.rms_min),
        ("focused.rms_max", t.focused.rms_max),
        ("stressed.rms_min", t.stressed.rms_min),
    ] {
        if !(0.0..=t.rms_full_scale).contains(&value) {
            errors.push(format!("{} must be within [0, rms_full_scale], got {}", name, value));
        }
    }
    if t.focused.rms_min >= t.focused.rms_max {
        errors.push("focused.rms_min must be below focused.rms_max".to_string());
    }
    if t.focused.gsr_min >= t.focused.gsr_max {
        errors.push("focused.gsr_min must be below focused.gsr_max".to_string());
    }
    if t.fatigued.min_trend_ticks < 2 || t.fatigued.min_trend_ticks > t.fatigued.trend_ticks {
        errors.push("fatigued.min_trend_ticks must be within [2, trend_ticks]".to_string());
    }
    if !(t.fatigued.min_decline >= 0.0 && t.fatigued.decline_full_scale > t.fatigued.min_decline) {
        errors.push("fatigued.decline_full_scale must exceed a non-negative min_decline".to_string());
    }

    let s = &config.smoothing;
    if s.vote_window == 0 {
        errors.push("Smoothing vote window must be at least 1".to_string());
    } else if s.min_votes <= s.vote_window / 2 || s.min_votes > s.vote_window {
        errors.push(format!(
            "Smoothing min_votes must be a strict majority of {} and at most {}",
            s.vote_window, s.vote_window
        ));
    }

    match (&config.strategy, &config.model) {
        (StrategyKind::Learned, None) => {
            errors.push("Learned strategy requires a [classifier.model] section".to_string())
        }
        (_, Some(model)) => errors.extend(validate_linear_model(model)),
        _ => {}
    }
    errors
}

/// Validate the shape of a linear model
pub fn validate_linear_model(model: &LinearModelConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if model.labels.is_empty() {
        errors.push("Linear model needs at least one label".to_string());
    }
    if model.weights.len() != model.labels.len() || model.bias.len() != model.labels.len() {
        errors.push("Linear model needs one weight row and one bias per label".to_string());
    }
    for (i, row) in model.weights.iter().enumerate() {
        if row.len() != features::FEATURE_DIMENSION {
            errors.push(format!(
                "Linear model weight row {} has {} entries, expected {}",
                i,
                row.len(),
                features::FEATURE_DIMENSION
            ));
        }
    }
    errors
}

/// Validate quality monitoring configuration
pub fn validate_quality_config(config: &QualityConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if !(config.saturation_threshold > 0.5 && config.saturation_threshold <= 1.0) {
        errors.push("Saturation threshold must be within (0.5, 1]".to_string());
    }
    if config.weak_signal_rms < 0.0 {
        errors.push("Weak signal RMS cannot be negative".to_string());
    }
    if !(config.gsr_max_microsiemens > 0.0) {
        errors.push("GSR maximum must be positive".to_string());
    }
    if config.history_length == 0 {
        errors.push("Quality history length must be at least 1".to_string());
    }
    errors
}
