//! Common utility functions
//!
//! - Time and timestamp management with an injectable clock
//! - Sensor code conversions (ADC volts, GSR bridge conductance)
//! - Small statistics helpers (mean, percentile, trend slope)

pub mod conversion;
pub mod stats;
pub mod time;

pub use time::{MockTimeProvider, SystemTimeProvider, TimeProvider};

pub use conversion::{
    adc_to_voltage,
    gsr_code_to_microsiemens,
    gsr_code_to_resistance,
    resistance_to_microsiemens,
    AdcSpec,
    ConversionError,
};

pub use stats::{least_squares_slope, mean, percentile};
