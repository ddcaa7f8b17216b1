//! biosignal-core: streaming EMG + GSR state classification
//!
//! Turns a raw stream of muscle activity (EMG) and skin conductance (GSR)
//! samples into a smoothed physiological state label:
//!
//! - Per-user calibration and clamped [0, 1] normalization
//! - Sliding-window features (RMS, zero-crossing rate, median frequency, GSR level and slope)
//! - Rule-based classifier with rejection and majority-vote smoothing
//! - Signal quality scoring, line-oriented input parsing and report sinks
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use biosignal_core::{StatePipeline, SystemConfig, SyntheticSource, SimulationSettings, StateLabel};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut pipeline = StatePipeline::new(SystemConfig::default())?;
//!     let mut source = SyntheticSource::new(SimulationSettings::default(), StateLabel::Relaxed)?;
//!
//!     pipeline.start_calibration()?;
//!     for sample in source.calibration_run(30_000, 30_000) {
//!         pipeline.push_sample(sample)?;
//!     }
//!
//!     for sample in source.take(5_000) {
//!         if let Some(report) = pipeline.push_sample(sample)? {
//!             println!("{} ({:.2})", report.state, report.confidence);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod output;
pub mod processing;
pub mod simulation;
pub mod types;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{ConfigLoader, SystemConfig};
pub use error::{BioError, BioResult};
pub use output::{OutputFormat, ReportWriter};
pub use processing::{
    Baseline, CalibrationProfile, FeatureVector, QualityLevel, StatePipeline, StateReport,
    StreamingNormalizer,
};
pub use simulation::{SimulationSettings, SyntheticSource};
pub use types::{Channel, Sample, StateLabel};

pub use utils::time::{MockTimeProvider, SystemTimeProvider, TimeProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Streaming EMG + GSR physiological state classification".to_string(),
        states: StateLabel::ALL.iter().map(|label| label.to_string()).collect(),
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// State labels the classifier can report
    pub states: Vec<String>,
}
