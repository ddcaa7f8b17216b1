// src/config/constants.rs
//! System-wide configuration constants

/// Sampling constants
pub mod sampling {
    pub const DEFAULT_EMG_RATE_HZ: u32 = 1000;
    pub const DEFAULT_GSR_RATE_HZ: u32 = 100;
    pub const MIN_SAMPLING_RATE_HZ: u32 = 1;
    pub const MAX_SAMPLING_RATE_HZ: u32 = 10_000;

    /// One classification every 50 ms of EMG at the default rate
    pub const DEFAULT_TICK_INTERVAL_SAMPLES: usize = 50;
}

/// Calibration constants
pub mod calibration {
    pub const DEFAULT_DURATION_SECS: f32 = 60.0;
    pub const DEFAULT_REST_FRACTION: f32 = 0.5;
    pub const DEFAULT_LOW_PERCENTILE: f32 = 10.0;
    pub const DEFAULT_HIGH_PERCENTILE: f32 = 90.0;

    /// Spans below this are treated as a degenerate baseline
    pub const DEFAULT_MIN_SPAN: f32 = 1e-6;
    /// Output for degenerate spans and non-finite input
    pub const NEUTRAL_NORMALIZED_VALUE: f32 = 0.5;
    pub const MIN_CALIBRATION_SAMPLES: usize = 2;
}

/// Feature extraction constants
pub mod features {
    /// 256 ms of EMG at 1000 Hz
    pub const DEFAULT_EMG_WINDOW_SAMPLES: usize = 256;
    /// 2.5 s of GSR at 100 Hz
    pub const DEFAULT_GSR_WINDOW_SAMPLES: usize = 250;
    pub const DEFAULT_ZERO_CROSSING_DEADBAND: f32 = 1e-4;
    pub const DEFAULT_MIN_SPECTRUM_SAMPLES: usize = 64;
    pub const MAX_WINDOW_SAMPLES: usize = 65_536;
    /// Scalar features a learned model consumes
    pub const FEATURE_DIMENSION: usize = 5;
}

/// Classifier constants
pub mod classifier {
    pub const DEFAULT_REJECTION_THRESHOLD: f32 = 0.6;
    pub const DEFAULT_VOTE_WINDOW: usize = 5;
    pub const DEFAULT_TREND_TICKS: usize = 40;
    pub const DEFAULT_MIN_TREND_TICKS: usize = 10;

    /// Score assigned to a rule sitting exactly on its threshold boundary
    pub const BOUNDARY_SCORE: f32 = 0.5;
    /// Confidence given to the implicit Neutral votes a smoother starts with
    pub const PRIOR_VOTE_CONFIDENCE: f32 = 0.5;
}

/// Filter constants
pub mod filters {
    pub const DEFAULT_GSR_MOVING_AVERAGE: usize = 10;
    pub const DEFAULT_DC_BLOCKER_POLE: f32 = 0.995;
    pub const MAX_MOVING_AVERAGE: usize = 4096;
}

/// Signal quality constants
pub mod quality {
    pub const DEFAULT_SATURATION_THRESHOLD: f32 = 0.95;
    pub const DEFAULT_WEAK_SIGNAL_RMS: f32 = 0.01;
    pub const DEFAULT_GSR_MAX_MICROSIEMENS: f32 = 40.0;
    pub const DEFAULT_MAX_GAP_MS: u64 = 100;
    pub const DEFAULT_HISTORY_LENGTH: usize = 100;

    pub const SATURATION_PENALTY: f32 = 0.2;
    pub const WEAK_SIGNAL_PENALTY: f32 = 0.1;
    pub const GSR_RANGE_PENALTY: f32 = 0.2;
    pub const DATA_GAP_PENALTY: f32 = 0.3;

    pub const GOOD_QUALITY_THRESHOLD: f32 = 0.8;
    pub const FAIR_QUALITY_THRESHOLD: f32 = 0.5;
}

/// ADC and sensor conversion constants
pub mod conversion {
    pub const DEFAULT_ADC_REFERENCE_VOLTS: f32 = 3.3;
    pub const DEFAULT_ADC_MAX_CODE: u32 = 4095;

    /// Grove GSR v1.2 bridge: R = ((1024 + 2 * code) * 10000) / (512 - code)
    pub const GSR_BRIDGE_MIDPOINT: f32 = 512.0;
    pub const GSR_BRIDGE_OFFSET: f32 = 1024.0;
    pub const GSR_BRIDGE_RESISTOR_OHMS: f32 = 10_000.0;
    /// Grove formula expects a 10-bit code
    pub const GSR_BRIDGE_CODE_MAX: u32 = 1023;
    pub const MICROSIEMENS_PER_SIEMENS: f32 = 1_000_000.0;
}

/// Time constants
pub mod time {
    pub const MICROSECONDS_PER_SECOND: u64 = 1_000_000;
    pub const MICROSECONDS_PER_MILLISECOND: u64 = 1_000;
    pub const NANOSECONDS_PER_MICROSECOND: u64 = 1_000;
}

/// Hand-off and output constants
pub mod io {
    pub const DEFAULT_HANDOFF_CAPACITY: usize = 4096;
    pub const DEFAULT_DELIMITER: char = ',';
    /// Parse errors are logged once per this many failures
    pub const PARSE_ERROR_LOG_INTERVAL: u64 = 10;
}

/// File paths and environment
pub mod paths {
    pub const DEFAULT_CONFIG_FILE: &str = "biosignal.toml";
    pub const USER_CONFIG_DIR: &str = ".config/biosignal";
    pub const ENV_PREFIX: &str = "BIOSIG_";
    pub const ENV_PATH_SEPARATOR: &str = "__";
}
