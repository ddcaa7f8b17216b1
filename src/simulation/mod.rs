//! Synthetic EMG/GSR source for demos, benchmarks and tests

pub mod profiles;

pub use profiles::StateProfile;

use crate::config::constants::sampling::DEFAULT_EMG_RATE_HZ;
use crate::config::constants::time::MICROSECONDS_PER_SECOND;
use crate::error::{BioError, BioResult};
use crate::types::{Sample, StateLabel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Synthetic source settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    pub emg_rate_hz: u32,
    /// Full-scale EMG amplitude in volts
    pub emg_amplitude: f32,
    /// Gaussian noise relative to the signal scale; 0 gives a deterministic stream
    pub noise_level: f32,
    pub seed: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            emg_rate_hz: DEFAULT_EMG_RATE_HZ,
            emg_amplitude: 1.0,
            noise_level: 0.05,
            seed: 42,
        }
    }
}

/// Produces samples that look like a chosen physiological state.
///
/// The stream is infinite; use it as an iterator with `take`.
pub struct SyntheticSource {
    settings: SimulationSettings,
    rng: StdRng,
    target: StateLabel,
    profile: StateProfile,
    sample_index: u64,
    segment_start: u64,
}

impl SyntheticSource {
    pub fn new(settings: SimulationSettings, target: StateLabel) -> BioResult<Self> {
        if settings.emg_rate_hz == 0 {
            return Err(BioError::configuration("simulation", "EMG rate must be positive"));
        }
        if !settings.noise_level.is_finite() || settings.noise_level < 0.0 {
            return Err(BioError::configuration(
                "simulation",
                format!("noise level must be finite and non-negative, got {}", settings.noise_level),
            ));
        }
        if !settings.emg_amplitude.is_finite() || settings.emg_amplitude <= 0.0 {
            return Err(BioError::configuration(
                "simulation",
                format!("EMG amplitude must be positive, got {}", settings.emg_amplitude),
            ));
        }

        Ok(Self {
            settings,
            rng: StdRng::seed_from_u64(settings.seed),
            target,
            profile: StateProfile::for_state(target),
            sample_index: 0,
            segment_start: 0,
        })
    }

    /// Switch to another state; envelopes restart from the current sample
    pub fn set_target(&mut self, target: StateLabel) {
        self.target = target;
        self.profile = StateProfile::for_state(target);
        self.segment_start = self.sample_index;
    }

    pub fn target(&self) -> StateLabel {
        self.target
    }

    pub fn samples_generated(&self) -> u64 {
        self.sample_index
    }

    pub fn next_sample(&mut self) -> Sample {
        let rate = self.settings.emg_rate_hz as f32;
        let t = self.sample_index as f32 / rate;
        let elapsed = (self.sample_index - self.segment_start) as f32 / rate;
        let profile = self.profile;
        let amplitude = self.settings.emg_amplitude;

        let mut emg = profile.emg_level * (2.0 * PI * profile.carrier_hz * t).sin();
        if let Some((level, frequency)) = profile.secondary {
            emg += level * (2.0 * PI * frequency * t).sin();
        }
        emg *= amplitude * profile.envelope(elapsed);

        let mut gsr = profile.gsr_microsiemens;
        if self.settings.noise_level > 0.0 {
            emg += self.gaussian() * self.settings.noise_level * amplitude * profile.emg_level;
            gsr += self.gaussian() * self.settings.noise_level;
        }

        let timestamp_us = self.sample_index * MICROSECONDS_PER_SECOND / self.settings.emg_rate_hz as u64;
        self.sample_index += 1;
        Sample::new(timestamp_us, emg, gsr.max(0.0))
    }

    /// Rest samples followed by maximal-effort samples, matching a two-phase calibration.
    /// The target is restored afterwards.
    pub fn calibration_run(&mut self, rest_samples: usize, active_samples: usize) -> Vec<Sample> {
        let previous = self.target;
        let mut samples = Vec::with_capacity(rest_samples + active_samples);

        self.set_target(StateLabel::Relaxed);
        samples.extend((0..rest_samples).map(|_| self.next_sample()));
        self.set_target(StateLabel::Stressed);
        samples.extend((0..active_samples).map(|_| self.next_sample()));

        self.set_target(previous);
        samples
    }

    fn gaussian(&mut self) -> f32 {
        // Box-Muller; u1 drawn from (0, 1] so the log stays finite
        let u1 = 1.0 - self.rng.gen::<f32>();
        let u2 = self.rng.gen::<f32>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

impl Iterator for SyntheticSource {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        Some(self.next_sample())
    }
}
