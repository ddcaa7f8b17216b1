// src/error.rs
//! Unified error handling for the biosignal pipeline
//!
//! Only one condition is a hard failure of the core: asking for normalized
//! values or a classification before a baseline exists. Degenerate baselines,
//! short windows and rejected classifications are resolved by policy inside
//! the pipeline and never surface here.

use crate::types::Channel;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result alias used throughout the crate
pub type BioResult<T> = Result<T, BioError>;

/// Processing stages, used to tag configuration and data errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStage {
    Acquisition,
    Filtering,
    Calibration,
    Normalization,
    FeatureExtraction,
    Classification,
    Output,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessingStage::Acquisition => "acquisition",
            ProcessingStage::Filtering => "filtering",
            ProcessingStage::Calibration => "calibration",
            ProcessingStage::Normalization => "normalization",
            ProcessingStage::FeatureExtraction => "feature extraction",
            ProcessingStage::Classification => "classification",
            ProcessingStage::Output => "output",
        };
        f.write_str(name)
    }
}

/// Unified error type for the biosignal pipeline
#[derive(Debug, Error)]
pub enum BioError {
    /// Normalization or classification attempted before a baseline was established
    #[error("baseline not calibrated: run calibration or load a profile first")]
    NotCalibrated,

    /// A window held no samples at all, so no feature can be computed
    #[error("insufficient {channel} data: {available} of {required} samples available")]
    InsufficientData {
        channel: Channel,
        required: usize,
        available: usize,
    },

    /// Invalid configuration for a component
    #[error("invalid configuration for {component}: {reason}")]
    Configuration { component: String, reason: String },

    /// Malformed or out-of-range input data
    #[error("invalid data during {stage}: {reason}")]
    InvalidData {
        stage: ProcessingStage,
        reason: String,
    },

    /// Calibration profile could not be used
    #[error("calibration profile error: {0}")]
    Profile(String),

    /// Producer side of a sample hand-off went away
    #[error("sample channel closed")]
    ChannelClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BioError {
    /// Shorthand for a configuration error
    pub fn configuration(component: impl Into<String>, reason: impl Into<String>) -> Self {
        BioError::Configuration {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an invalid data error
    pub fn invalid_data(stage: ProcessingStage, reason: impl Into<String>) -> Self {
        BioError::InvalidData {
            stage,
            reason: reason.into(),
        }
    }

    /// Whether the caller can keep streaming after this error.
    ///
    /// `NotCalibrated` is a precondition violation: the caller has to calibrate
    /// or load a profile before anything else succeeds.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BioError::NotCalibrated => false,
            BioError::Configuration { .. } => false,
            BioError::ChannelClosed => false,
            BioError::InsufficientData { .. } => true,
            BioError::InvalidData { .. } => true,
            BioError::Profile(_) => true,
            BioError::Io(_) => true,
            BioError::Json(_) => true,
        }
    }

    /// Stage the error is attributed to
    pub fn stage(&self) -> ProcessingStage {
        match self {
            BioError::NotCalibrated => ProcessingStage::Normalization,
            BioError::InsufficientData { .. } => ProcessingStage::FeatureExtraction,
            BioError::Configuration { .. } => ProcessingStage::Calibration,
            BioError::InvalidData { stage, .. } => *stage,
            BioError::Profile(_) => ProcessingStage::Calibration,
            BioError::ChannelClosed => ProcessingStage::Acquisition,
            BioError::Io(_) | BioError::Json(_) => ProcessingStage::Output,
        }
    }
}
