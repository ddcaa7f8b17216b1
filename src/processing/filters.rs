// src/processing/filters.rs
//! Per-sample filters applied to raw values before normalization

use crate::config::FilterConfig;
use crate::error::{BioError, BioResult};
use crate::types::Channel;
use std::collections::VecDeque;

pub trait Filter: Send {
    fn process(&mut self, input: f32) -> f32;
    fn reset(&mut self);
    fn name(&self) -> &str;
}

/// Chain of filters for one channel, applied in insertion order
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn empty() -> Self {
        Self { filters: Vec::new() }
    }

    /// Build the chain configured for `channel`
    pub fn for_channel(channel: Channel, config: &FilterConfig) -> BioResult<Self> {
        let mut filters: Vec<Box<dyn Filter>> = Vec::new();
        match channel {
            Channel::Emg => {
                if config.emg_dc_blocker {
                    filters.push(Box::new(DcBlocker::new(config.dc_blocker_pole)?));
                }
            }
            Channel::Gsr => {
                if config.gsr_moving_average > 1 {
                    filters.push(Box::new(MovingAverageFilter::new(config.gsr_moving_average)?));
                }
            }
        }
        Ok(Self { filters })
    }

    pub fn push(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(filter);
    }

    pub fn process(&mut self, input: f32) -> f32 {
        self.filters
            .iter_mut()
            .fold(input, |value, filter| filter.process(value))
    }

    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }
}

/// Boxcar average over the last `length` inputs.
///
/// Until the window fills, the average is taken over what has arrived.
/// Non-finite inputs pass through without entering the running sum.
pub struct MovingAverageFilter {
    name: String,
    length: usize,
    window: VecDeque<f32>,
    sum: f64,
}

impl MovingAverageFilter {
    pub fn new(length: usize) -> BioResult<Self> {
        if length == 0 {
            return Err(BioError::configuration(
                "moving_average",
                "window length must be at least 1",
            ));
        }
        Ok(Self {
            name: format!("MovingAverage-{}", length),
            length,
            window: VecDeque::with_capacity(length),
            sum: 0.0,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Filter for MovingAverageFilter {
    fn process(&mut self, input: f32) -> f32 {
        if !input.is_finite() {
            return input;
        }
        if self.window.len() == self.length {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest as f64;
            }
        }
        self.window.push_back(input);
        self.sum += input as f64;
        (self.sum / self.window.len() as f64) as f32
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One-pole DC blocker: `y[n] = x[n] - x[n-1] + r * y[n-1]`
pub struct DcBlocker {
    pole: f32,
    x_prev: f32,
    y_prev: f32,
    primed: bool,
}

impl DcBlocker {
    pub fn new(pole: f32) -> BioResult<Self> {
        if !(pole > 0.0 && pole < 1.0) {
            return Err(BioError::configuration(
                "dc_blocker",
                format!("pole must be within (0, 1), got {}", pole),
            ));
        }
        Ok(Self {
            pole,
            x_prev: 0.0,
            y_prev: 0.0,
            primed: false,
        })
    }
}

impl Filter for DcBlocker {
    fn process(&mut self, input: f32) -> f32 {
        if !input.is_finite() {
            return input;
        }
        // First sample seeds the state so a constant offset does not ring
        if !self.primed {
            self.x_prev = input;
            self.primed = true;
        }
        let output = input - self.x_prev + self.pole * self.y_prev;
        self.x_prev = input;
        self.y_prev = output;
        output
    }

    fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
        self.primed = false;
    }

    fn name(&self) -> &str {
        "DcBlocker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_warmup_and_steady_state() {
        let mut filter = MovingAverageFilter::new(3).unwrap();
        assert_eq!(filter.process(3.0), 3.0);
        assert_eq!(filter.process(6.0), 4.5);
        assert_eq!(filter.process(9.0), 6.0);
        assert_eq!(filter.process(12.0), 9.0);
    }

    #[test]
    fn test_moving_average_skips_nan() {
        let mut filter = MovingAverageFilter::new(2).unwrap();
        filter.process(1.0);
        assert!(filter.process(f32::NAN).is_nan());
        assert_eq!(filter.process(3.0), 2.0);
    }

    #[test]
    fn test_moving_average_rejects_zero_length() {
        assert!(MovingAverageFilter::new(0).is_err());
    }

    #[test]
    fn test_dc_blocker_removes_offset() {
        let mut filter = DcBlocker::new(0.995).unwrap();
        let mut last = 0.0;
        for _ in 0..2000 {
            last = filter.process(1.5);
        }
        assert!(last.abs() < 1e-3);
    }

    #[test]
    fn test_dc_blocker_passes_steps() {
        let mut filter = DcBlocker::new(0.9).unwrap();
        filter.process(0.0);
        assert!((filter.process(1.0) - 1.0).abs() < 1e-6);
        filter.reset();
        assert_eq!(filter.process(5.0), 0.0);
    }

    #[test]
    fn test_chain_from_config() {
        let config = FilterConfig::default();
        let emg = FilterChain::for_channel(Channel::Emg, &config).unwrap();
        assert!(emg.is_empty());

        let mut gsr = FilterChain::for_channel(Channel::Gsr, &config).unwrap();
        assert_eq!(gsr.names(), vec!["MovingAverage-10"]);
        assert_eq!(gsr.process(2.0), 2.0);

        let config = FilterConfig {
            emg_dc_blocker: true,
            gsr_moving_average: 1,
            ..Default::default()
        };
        assert_eq!(
            FilterChain::for_channel(Channel::Emg, &config).unwrap().names(),
            vec!["DcBlocker"]
        );
        assert!(FilterChain::for_channel(Channel::Gsr, &config).unwrap().is_empty());
    }
}
