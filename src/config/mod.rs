// src/config/mod.rs
//! Configuration management for the biosignal pipeline

pub mod constants;
pub mod loader;
pub mod processing_config;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};
pub use processing_config::*;

use serde::{Deserialize, Serialize};

/// Complete system configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct SystemConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Record format written by the output sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One delimited text line per report, preceded by a header
    Delimited,
    /// One JSON object per line
    JsonLines,
}

/// Output sink configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "defaults::output_format")]
    pub format: OutputFormat,

    #[serde(default = "defaults::include_features")]
    pub include_features: bool,

    #[serde(default = "defaults::delimiter")]
    pub delimiter: char,

    #[serde(default = "defaults::handoff_capacity")]
    pub handoff_capacity: usize,
}

/// Default value providers using constants
mod defaults {
    use super::OutputFormat;
    use crate::config::constants::io;

    pub fn output_format() -> OutputFormat { OutputFormat::Delimited }
    pub fn include_features() -> bool { true }
    pub fn delimiter() -> char { io::DEFAULT_DELIMITER }
    pub fn handoff_capacity() -> usize { io::DEFAULT_HANDOFF_CAPACITY }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: defaults::output_format(),
            include_features: defaults::include_features(),
            delimiter: defaults::delimiter(),
            handoff_capacity: defaults::handoff_capacity(),
        }
    }
}

/// Validate output configuration
pub fn validate_output_config(config: &OutputConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if config.delimiter.is_alphanumeric() || config.delimiter == '.' || config.delimiter == '-' {
        errors.push(format!(
            "Delimiter '{}' would be ambiguous with numeric fields",
            config.delimiter
        ));
    }
    if config.handoff_capacity == 0 {
        errors.push("Hand-off capacity must be at least 1".to_string());
    }
    errors
}

/// Validate the whole system configuration, collecting every problem found
pub fn validate_system_config(config: &SystemConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    errors.extend(validate_sampling_config(&config.sampling));
    errors.extend(validate_calibration_config(&config.calibration));
    errors.extend(validate_filter_config(&config.filters));
    errors.extend(validate_feature_config(&config.features));
    errors.extend(validate_classifier_config(&config.classifier));
    errors.extend(validate_quality_config(&config.quality));
    errors.extend(validate_output_config(&config.output));

    if config.sampling.tick_interval_samples > config.features.emg_window_samples {
        errors.push("Tick interval longer than the EMG window skips samples".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
