//! Signal characteristics of each simulated physiological state

use crate::types::StateLabel;
use serde::{Deserialize, Serialize};

/// Shape of the synthetic signals for one target state.
///
/// EMG levels are fractions of the source's full-scale amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateProfile {
    /// Peak EMG level of the main carrier
    pub emg_level: f32,
    /// Main EMG carrier frequency
    pub carrier_hz: f32,
    /// Optional second carrier as (level, frequency)
    pub secondary: Option<(f32, f32)>,
    /// Burst envelope frequency; bursts swing between 20% and 100% of the level
    pub burst_hz: Option<f32>,
    /// Duration of a linear amplitude ramp down to `decay_floor`
    pub decay_secs: Option<f32>,
    /// Level the envelope settles at after the ramp
    pub decay_floor: f32,
    /// Skin conductance in microsiemens
    pub gsr_microsiemens: f32,
}

impl StateProfile {
    pub fn for_state(label: StateLabel) -> Self {
        match label {
            StateLabel::Relaxed => Self {
                emg_level: 0.05,
                carrier_hz: 8.0,
                secondary: None,
                burst_hz: None,
                decay_secs: None,
                decay_floor: 1.0,
                gsr_microsiemens: 2.0,
            },
            StateLabel::Focused => Self {
                emg_level: 0.9,
                carrier_hz: 300.0,
                secondary: None,
                burst_hz: Some(1.0),
                decay_secs: None,
                decay_floor: 1.0,
                gsr_microsiemens: 5.5,
            },
            StateLabel::Stressed => Self {
                emg_level: 1.0,
                carrier_hz: 350.0,
                secondary: Some((0.25, 70.0)),
                burst_hz: None,
                decay_secs: None,
                decay_floor: 1.0,
                gsr_microsiemens: 10.0,
            },
            StateLabel::Fatigued => Self {
                emg_level: 0.95,
                carrier_hz: 10.0,
                secondary: None,
                burst_hz: None,
                decay_secs: Some(3.0),
                decay_floor: 0.2,
                gsr_microsiemens: 4.0,
            },
            StateLabel::Neutral => Self {
                emg_level: 0.15,
                carrier_hz: 40.0,
                secondary: None,
                burst_hz: None,
                decay_secs: None,
                decay_floor: 1.0,
                gsr_microsiemens: 6.5,
            },
        }
    }

    /// Amplitude multiplier `elapsed_secs` into the segment
    pub fn envelope(&self, elapsed_secs: f32) -> f32 {
        let mut envelope = 1.0;
        if let Some(burst_hz) = self.burst_hz {
            let phase = (2.0 * std::f32::consts::PI * burst_hz * elapsed_secs).sin();
            envelope *= 0.6 + 0.4 * phase;
        }
        if let Some(ramp) = self.decay_secs {
            let remaining = (1.0 - elapsed_secs / ramp).max(0.0);
            envelope *= self.decay_floor + (1.0 - self.decay_floor) * remaining;
        }
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stressed_is_strongest() {
        let stressed = StateProfile::for_state(StateLabel::Stressed);
        for label in [StateLabel::Relaxed, StateLabel::Focused, StateLabel::Fatigued] {
            let profile = StateProfile::for_state(label);
            assert!(profile.emg_level < stressed.emg_level);
            assert!(profile.gsr_microsiemens < stressed.gsr_microsiemens);
        }
    }

    #[test]
    fn test_fatigue_envelope_decays_to_floor() {
        let profile = StateProfile::for_state(StateLabel::Fatigued);
        assert_eq!(profile.envelope(0.0), 1.0);
        assert!(profile.envelope(2.0) < profile.envelope(1.0));
        assert!((profile.envelope(600.0) - profile.decay_floor).abs() < 1e-6);
    }

    #[test]
    fn test_burst_envelope_stays_positive() {
        let profile = StateProfile::for_state(StateLabel::Focused);
        for step in 0..100 {
            let envelope = profile.envelope(step as f32 * 0.01);
            assert!((0.2..=1.0).contains(&envelope));
        }
    }
}
