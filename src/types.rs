// src/types.rs
//! Core value types shared by every pipeline stage

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One acquisition instant: an EMG reading and a GSR reading.
///
/// EMG is in volts (or ADC-normalized units), GSR in microsiemens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp_us: u64,
    pub emg: f32,
    pub gsr: f32,
}

impl Sample {
    pub fn new(timestamp_us: u64, emg: f32, gsr: f32) -> Self {
        Self { timestamp_us, emg, gsr }
    }

    /// Value carried on the given channel
    pub fn value(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Emg => self.emg,
            Channel::Gsr => self.gsr,
        }
    }
}

/// Sensor channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Electromyography
    Emg,
    /// Galvanic skin response
    Gsr,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Emg, Channel::Gsr];
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Emg => write!(f, "EMG"),
            Channel::Gsr => write!(f, "GSR"),
        }
    }
}

/// Physiological state reported by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateLabel {
    Relaxed,
    Focused,
    Stressed,
    Fatigued,
    Neutral,
}

impl StateLabel {
    /// Every label, in rule precedence order with Neutral last
    pub const ALL: [StateLabel; 5] = [
        StateLabel::Relaxed,
        StateLabel::Focused,
        StateLabel::Stressed,
        StateLabel::Fatigued,
        StateLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateLabel::Relaxed => "Relaxed",
            StateLabel::Focused => "Focused",
            StateLabel::Stressed => "Stressed",
            StateLabel::Fatigued => "Fatigued",
            StateLabel::Neutral => "Neutral",
        }
    }

    /// Stable index into per-label tables
    pub fn index(&self) -> usize {
        match self {
            StateLabel::Relaxed => 0,
            StateLabel::Focused => 1,
            StateLabel::Stressed => 2,
            StateLabel::Fatigued => 3,
            StateLabel::Neutral => 4,
        }
    }
}

impl Default for StateLabel {
    fn default() -> Self {
        StateLabel::Neutral
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relaxed" => Ok(StateLabel::Relaxed),
            "focused" => Ok(StateLabel::Focused),
            "stressed" => Ok(StateLabel::Stressed),
            "fatigued" => Ok(StateLabel::Fatigued),
            "neutral" => Ok(StateLabel::Neutral),
            other => Err(format!("unknown state label: {}", other)),
        }
    }
}
