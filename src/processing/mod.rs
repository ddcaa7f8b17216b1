// src/processing/mod.rs
//! Signal processing pipeline for EMG and GSR data

pub mod calibration;
pub mod classifier;
pub mod features;
pub mod filters;
pub mod normalizer;
pub mod pipeline;
pub mod quality_monitor;

pub use calibration::{Baseline, CalibrationPhase, CalibrationProfile, Calibrator, ChannelBounds};
pub use classifier::{
    Classification, ClassifierOutput, ClassifierStrategy, LinearModel, MajorityVoteSmoother,
    SmoothedState, StateClassifier, StateStatistics,
};
pub use features::{FeatureExtractor, FeatureVector};
pub use filters::{DcBlocker, Filter, FilterChain, MovingAverageFilter};
pub use normalizer::{normalize_value, NormalizerState, StreamingNormalizer};
pub use pipeline::{PerformanceMetrics, StatePipeline, StateReport};
pub use quality_monitor::{QualityInput, QualityLevel, QualityMonitor};
