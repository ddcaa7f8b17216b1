//! Frequency domain features for EMG windows

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;

/// Median frequency estimator.
///
/// The window is Hann-tapered and transformed with an FFT of the same
/// length. The DC bin is excluded. The result is the bin splitting the
/// one-sided power spectrum into equal halves, expressed as a fraction of
/// the Nyquist frequency so it lies in [0, 1].
pub struct MedianFrequencyEstimator {
    planner: FftPlanner<f32>,
    min_samples: usize,
    taper: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl MedianFrequencyEstimator {
    pub fn new(min_samples: usize) -> Self {
        Self {
            planner: FftPlanner::new(),
            min_samples: min_samples.max(4),
            taper: Vec::new(),
            buffer: Vec::new(),
        }
    }

    /// Median frequency over Nyquist; 0 for short windows or zero power
    pub fn estimate(&mut self, window: &[f32]) -> f32 {
        let n = window.len();
        if n < self.min_samples {
            return 0.0;
        }

        if self.taper.len() != n {
            self.taper = hann_window(n);
        }

        self.buffer.clear();
        self.buffer.extend(
            window
                .iter()
                .zip(&self.taper)
                .map(|(&x, &w)| Complex::new(if x.is_finite() { x * w } else { 0.0 }, 0.0)),
        );

        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut self.buffer);

        let power: Vec<f32> = self.buffer[1..=n / 2].iter().map(|c| c.norm_sqr()).collect();
        let total: f32 = power.iter().sum();
        if !(total > 0.0) {
            return 0.0;
        }

        let half = total / 2.0;
        let mut cumulative = 0.0;
        for (i, &p) in power.iter().enumerate() {
            cumulative += p;
            if cumulative >= half {
                let bin = i + 1;
                return (2.0 * bin as f32 / n as f32).min(1.0);
            }
        }
        1.0
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (size - 1) as f32).cos()))
        .collect()
}

/// Convert a Nyquist-relative frequency back to hertz
pub fn to_hertz(normalized: f32, sample_rate_hz: f32) -> f32 {
    normalized * sample_rate_hz / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_hz: f32, rate_hz: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq_hz * i as f32 / rate_hz).sin())
            .collect()
    }

    #[test]
    fn test_pure_tone_median() {
        let mut estimator = MedianFrequencyEstimator::new(64);
        let mdf = estimator.estimate(&sine(125.0, 1000.0, 256));
        // 125 Hz of a 500 Hz Nyquist
        assert!((to_hertz(mdf, 1000.0) - 125.0).abs() < 8.0);
    }

    #[test]
    fn test_higher_tone_has_higher_median() {
        let mut estimator = MedianFrequencyEstimator::new(64);
        let low = estimator.estimate(&sine(50.0, 1000.0, 256));
        let high = estimator.estimate(&sine(300.0, 1000.0, 256));
        assert!(high > low);
        assert!((0.0..=1.0).contains(&low));
        assert!((0.0..=1.0).contains(&high));
    }

    #[test]
    fn test_short_or_silent_window() {
        let mut estimator = MedianFrequencyEstimator::new(64);
        assert_eq!(estimator.estimate(&[0.3; 10]), 0.0);
        assert_eq!(estimator.estimate(&[0.0; 128]), 0.0);
    }

    #[test]
    fn test_alternating_is_nyquist() {
        let mut estimator = MedianFrequencyEstimator::new(8);
        let window: Vec<f32> = (0..64).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        assert!(estimator.estimate(&window) > 0.9);
    }
}
