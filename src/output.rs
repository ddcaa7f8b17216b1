// src/output.rs
//! Report sinks: delimited text or JSON lines

pub use crate::config::OutputFormat;

use crate::config::OutputConfig;
use crate::error::BioResult;
use crate::processing::pipeline::StateReport;
use std::io::Write;

const STATE_COLUMNS: [&str; 4] = ["timestamp_us", "state", "confidence", "raw_state"];
const FEATURE_COLUMNS: [&str; 5] = ["emg_rms", "zcr", "mdf", "gsr_mean", "gsr_slope"];
const TRAILING_COLUMNS: [&str; 2] = ["quality", "low_confidence"];

/// Writes one record per `StateReport`
pub struct ReportWriter<W: Write> {
    sink: W,
    format: OutputFormat,
    include_features: bool,
    delimiter: char,
    header_written: bool,
    records: u64,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W, config: &OutputConfig) -> Self {
        Self {
            sink,
            format: config.format,
            include_features: config.include_features,
            delimiter: config.delimiter,
            header_written: false,
            records: 0,
        }
    }

    pub fn header(&self) -> String {
        let mut columns: Vec<&str> = STATE_COLUMNS.to_vec();
        if self.include_features {
            columns.extend(FEATURE_COLUMNS);
        }
        columns.extend(TRAILING_COLUMNS);
        columns.join(&self.delimiter.to_string())
    }

    pub fn write_report(&mut self, report: &StateReport) -> BioResult<()> {
        match self.format {
            OutputFormat::Delimited => {
                if !self.header_written {
                    let header = self.header();
                    writeln!(self.sink, "{}", header)?;
                    self.header_written = true;
                }
                let line = self.format_delimited(report);
                writeln!(self.sink, "{}", line)?;
            }
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.sink, report)?;
                writeln!(self.sink)?;
            }
        }
        self.records += 1;
        Ok(())
    }

    fn format_delimited(&self, report: &StateReport) -> String {
        let mut fields = vec![
            report.timestamp_us.to_string(),
            report.state.to_string(),
            format!("{:.4}", report.confidence),
            report.raw_state.to_string(),
        ];
        if self.include_features {
            fields.extend(report.features.as_array().iter().map(|v| format!("{:.6}", v)));
        }
        fields.push(format!("{:.3}", report.quality));
        fields.push(report.low_confidence.to_string());
        fields.join(&self.delimiter.to_string())
    }

    pub fn records_written(&self) -> u64 {
        self.records
    }

    pub fn flush(&mut self) -> BioResult<()> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
