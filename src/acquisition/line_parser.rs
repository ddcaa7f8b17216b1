// src/acquisition/line_parser.rs
//! Text record parser for acquisition streams
//!
//! A record is `emg,gsr` (or `timestamp_us,emg,gsr` when the stream carries
//! its own clock). Extra trailing fields are ignored. In raw-ADC mode both
//! values are integer codes converted to volts and microsiemens.

use crate::config::constants::{io, time};
use crate::types::Sample;
use crate::utils::conversion::{adc_to_voltage, gsr_code_to_microsiemens, AdcSpec, ConversionError};
use thiserror::Error;
use tracing::warn;

/// Why a record was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected at least {expected} fields, found {found}")]
    MissingField { expected: usize, found: usize },

    #[error("field {field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),
}

/// Parser settings
#[derive(Debug, Clone, PartialEq)]
pub struct LineParserConfig {
    pub delimiter: char,
    /// First field is a timestamp in microseconds
    pub timestamp_column: bool,
    /// Fields are ADC codes rather than physical values
    pub raw_adc: bool,
    pub adc: AdcSpec,
    /// Used to synthesize timestamps when the record has none
    pub sample_rate_hz: u32,
}

impl Default for LineParserConfig {
    fn default() -> Self {
        Self {
            delimiter: io::DEFAULT_DELIMITER,
            timestamp_column: false,
            raw_adc: false,
            adc: AdcSpec::default(),
            sample_rate_hz: crate::config::constants::sampling::DEFAULT_EMG_RATE_HZ,
        }
    }
}

/// Stateful parser counting good and bad records
#[derive(Debug, Clone)]
pub struct LineParser {
    config: LineParserConfig,
    sample_count: u64,
    error_count: u64,
}

impl LineParser {
    pub fn new(config: LineParserConfig) -> Self {
        Self {
            config,
            sample_count: 0,
            error_count: 0,
        }
    }

    /// Parse one line from the stream.
    ///
    /// Blank lines and `#` comments yield `None` without counting as errors.
    /// Malformed records yield `None`, bump the error count and are logged
    /// once every few failures.
    pub fn parse_line(&mut self, line: &str) -> Option<Sample> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        match self.parse_record(trimmed) {
            Ok(sample) => {
                self.sample_count += 1;
                Some(sample)
            }
            Err(e) => {
                self.error_count += 1;
                if self.error_count % io::PARSE_ERROR_LOG_INTERVAL == 0 {
                    warn!(errors = self.error_count, "Record parse error: {}", e);
                }
                None
            }
        }
    }

    /// Parse a record without touching the counters
    pub fn parse_record(&self, line: &str) -> Result<Sample, ParseError> {
        let fields: Vec<&str> = line.split(self.config.delimiter).map(str::trim).collect();
        let offset = usize::from(self.config.timestamp_column);
        let expected = offset + 2;
        if fields.len() < expected {
            return Err(ParseError::MissingField {
                expected,
                found: fields.len(),
            });
        }

        let timestamp_us = if self.config.timestamp_column {
            parse_field::<u64>("timestamp", fields[0])?
        } else {
            self.synthesized_timestamp()
        };

        let (emg, gsr) = if self.config.raw_adc {
            let emg_code = parse_field::<u32>("emg", fields[offset])?;
            let gsr_code = parse_field::<u32>("gsr", fields[offset + 1])?;
            (
                adc_to_voltage(emg_code, self.config.adc)?,
                gsr_code_to_microsiemens(gsr_code)?,
            )
        } else {
            (
                parse_field::<f32>("emg", fields[offset])?,
                parse_field::<f32>("gsr", fields[offset + 1])?,
            )
        };

        Ok(Sample::new(timestamp_us, emg, gsr))
    }

    fn synthesized_timestamp(&self) -> u64 {
        let rate = u64::from(self.config.sample_rate_hz.max(1));
        self.sample_count * time::MICROSECONDS_PER_SECOND / rate
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Share of rejected records in percent
    pub fn error_rate(&self) -> f32 {
        let total = self.sample_count + self.error_count;
        if total == 0 {
            return 0.0;
        }
        self.error_count as f32 / total as f32 * 100.0
    }

    pub fn reset_counters(&mut self) {
        self.sample_count = 0;
        self.error_count = 0;
    }
}

fn parse_field<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse::<T>().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
