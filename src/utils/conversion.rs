//! Conversion utilities for raw sensor codes
//!
//! The acquisition side can deliver either physical values or raw ADC codes.
//! These helpers turn codes into the units the pipeline works in:
//! - EMG: ADC code to volts
//! - GSR: ADC code to skin resistance (Grove GSR bridge) to conductance in µS

use crate::config::constants::conversion::*;
use thiserror::Error;

/// Conversion error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Code outside the range the converter accepts
    #[error("ADC code {code} exceeds maximum {max}")]
    CodeOutOfRange { code: u32, max: u32 },

    /// Parameter that must be positive was not
    #[error("invalid parameter for {function}: {reason}")]
    InvalidParameter {
        function: &'static str,
        reason: String,
    },

    /// Bridge formula has no finite resistance at this code
    #[error("GSR bridge saturated at code {0}")]
    BridgeSaturated(u32),
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;

/// ADC front-end description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcSpec {
    pub max_code: u32,
    pub reference_volts: f32,
}

impl Default for AdcSpec {
    fn default() -> Self {
        Self {
            max_code: DEFAULT_ADC_MAX_CODE,
            reference_volts: DEFAULT_ADC_REFERENCE_VOLTS,
        }
    }
}

/// Convert an ADC code to volts
pub fn adc_to_voltage(code: u32, adc: AdcSpec) -> ConversionResult<f32> {
    if adc.max_code == 0 {
        return Err(ConversionError::InvalidParameter {
            function: "adc_to_voltage",
            reason: "ADC maximum code must be positive".to_string(),
        });
    }
    if adc.reference_volts <= 0.0 {
        return Err(ConversionError::InvalidParameter {
            function: "adc_to_voltage",
            reason: "Reference voltage must be positive".to_string(),
        });
    }
    if code > adc.max_code {
        return Err(ConversionError::CodeOutOfRange {
            code,
            max: adc.max_code,
        });
    }

    Ok(code as f32 / adc.max_code as f32 * adc.reference_volts)
}

/// Convert a 10-bit Grove GSR code to skin resistance in ohms.
///
/// `R = ((1024 + 2 * code) * 10000) / (512 - code)`; codes at or above the
/// bridge midpoint have no finite resistance.
pub fn gsr_code_to_resistance(code: u32) -> ConversionResult<f32> {
    if code > GSR_BRIDGE_CODE_MAX {
        return Err(ConversionError::CodeOutOfRange {
            code,
            max: GSR_BRIDGE_CODE_MAX,
        });
    }

    let code_f = code as f32;
    let denominator = GSR_BRIDGE_MIDPOINT - code_f;
    if denominator <= 0.0 {
        return Err(ConversionError::BridgeSaturated(code));
    }

    Ok((GSR_BRIDGE_OFFSET + 2.0 * code_f) * GSR_BRIDGE_RESISTOR_OHMS / denominator)
}

/// Convert resistance in ohms to conductance in microsiemens
pub fn resistance_to_microsiemens(ohms: f32) -> ConversionResult<f32> {
    if !(ohms > 0.0) || !ohms.is_finite() {
        return Err(ConversionError::InvalidParameter {
            function: "resistance_to_microsiemens",
            reason: format!("resistance must be positive and finite, got {}", ohms),
        });
    }
    Ok(MICROSIEMENS_PER_SIEMENS / ohms)
}

/// Raw Grove GSR code straight to conductance in microsiemens
pub fn gsr_code_to_microsiemens(code: u32) -> ConversionResult<f32> {
    resistance_to_microsiemens(gsr_code_to_resistance(code)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adc_to_voltage_full_scale() {
        let adc = AdcSpec::default();
        assert_eq!(adc_to_voltage(0, adc).unwrap(), 0.0);
        assert!((adc_to_voltage(4095, adc).unwrap() - 3.3).abs() < 1e-6);
        assert!((adc_to_voltage(2048, adc).unwrap() - 1.650_4).abs() < 1e-3);
    }

    #[test]
    fn test_adc_to_voltage_rejects_out_of_range() {
        let adc = AdcSpec::default();
        assert_eq!(
            adc_to_voltage(5000, adc),
            Err(ConversionError::CodeOutOfRange { code: 5000, max: 4095 })
        );

        let broken = AdcSpec {
            reference_volts: 0.0,
            ..Default::default()
        };
        assert!(adc_to_voltage(10, broken).is_err());
    }

    #[test]
    fn test_gsr_bridge_formula() {
        // code 0: 1024 * 10000 / 512 = 20 kOhm
        assert!((gsr_code_to_resistance(0).unwrap() - 20_000.0).abs() < 1e-2);
        // code 256: (1024 + 512) * 10000 / 256 = 60 kOhm
        assert!((gsr_code_to_resistance(256).unwrap() - 60_000.0).abs() < 1e-1);
        assert_eq!(gsr_code_to_resistance(512), Err(ConversionError::BridgeSaturated(512)));
    }

    #[test]
    fn test_resistance_to_conductance() {
        assert!((resistance_to_microsiemens(20_000.0).unwrap() - 50.0).abs() < 1e-4);
        assert!(resistance_to_microsiemens(0.0).is_err());
        assert!(resistance_to_microsiemens(f32::NAN).is_err());
    }

    #[test]
    fn test_conductance_falls_as_code_rises() {
        let low = gsr_code_to_microsiemens(100).unwrap();
        let high = gsr_code_to_microsiemens(400).unwrap();
        assert!(low > high);
    }
}
