//! Time domain features for EMG and GSR windows

use crate::utils::stats::mean;

/// Time domain features of one EMG window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeDomainFeatures {
    pub rms: f32,
    pub zero_crossing_rate: f32,
}

/// Time domain feature extractor
#[derive(Debug, Clone)]
pub struct TimeDomainExtractor {
    deadband: f32, // |x| at or below this has no sign
    remove_dc: bool,
}

impl TimeDomainExtractor {
    pub fn new(deadband: f32, remove_dc: bool) -> Self {
        Self {
            deadband: deadband.max(0.0),
            remove_dc,
        }
    }

    /// Extract RMS and zero-crossing rate from a window of normalized EMG
    pub fn extract(&self, window: &[f32]) -> TimeDomainFeatures {
        if self.remove_dc {
            let centered = remove_dc(window);
            TimeDomainFeatures {
                rms: rms(&centered),
                zero_crossing_rate: zero_crossing_rate(&centered, self.deadband),
            }
        } else {
            TimeDomainFeatures {
                rms: rms(window),
                zero_crossing_rate: zero_crossing_rate(window, self.deadband),
            }
        }
    }
}

/// Subtract the window mean from every sample
pub fn remove_dc(window: &[f32]) -> Vec<f32> {
    let offset = mean(window);
    window.iter().map(|&x| x - offset).collect()
}

/// Root mean square, 0 for an empty window
pub fn rms(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = window.iter().map(|&x| (x as f64) * (x as f64)).sum();
    (sum_squares / window.len() as f64).sqrt() as f32
}

/// Fraction of adjacent sample pairs whose sign differs.
///
/// Samples inside the deadband have no sign; a crossing is counted when a
/// signed sample has the opposite sign of the previous signed one. Each
/// sample closes at most one crossing, so the result stays in [0, 1].
pub fn zero_crossing_rate(window: &[f32], deadband: f32) -> f32 {
    if window.len() < 2 {
        return 0.0;
    }

    let mut crossings = 0usize;
    let mut last_sign = 0i8;
    for &x in window {
        let sign = if x > deadband {
            1
        } else if x < -deadband {
            -1
        } else {
            0
        };
        if sign != 0 {
            if last_sign != 0 && sign != last_sign {
                crossings += 1;
            }
            last_sign = sign;
        }
    }

    crossings as f32 / (window.len() - 1) as f32
}

/// Rate of change between the first and last sample in units per second
pub fn window_slope(window: &[f32], rate_hz: f32) -> f32 {
    match (window.first(), window.last()) {
        (Some(&first), Some(&last)) if window.len() >= 2 && rate_hz > 0.0 => {
            let duration_secs = (window.len() - 1) as f32 / rate_hz;
            (last - first) / duration_secs
        }
        _ => 0.0,
    }
}
