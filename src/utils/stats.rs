//! Small numeric helpers shared by calibration, features and the classifier

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Percentile with linear interpolation between closest ranks.
///
/// `percentile` is in [0, 100]. Non-finite values are ignored; returns `None`
/// when no finite value remains.
pub fn percentile(values: &[f32], percentile: f32) -> Option<f32> {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(percentile_of_sorted(&sorted, percentile))
}

/// Percentile of an already sorted, non-empty slice
pub fn percentile_of_sorted(sorted: &[f32], percentile: f32) -> f32 {
    debug_assert!(!sorted.is_empty());
    let p = percentile.clamp(0.0, 100.0) as f64 / 100.0;
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = rank - lower as f64;
    (sorted[lower] as f64 + (sorted[upper] as f64 - sorted[lower] as f64) * fraction) as f32
}

/// Least-squares slope of `values` against their index, 0 with fewer than two points
pub fn least_squares_slope<I>(values: I) -> f32
where
    I: IntoIterator<Item = f32>,
{
    let mut n = 0.0f64;
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let mut sum_xy = 0.0f64;
    let mut sum_xx = 0.0f64;

    for (i, y) in values.into_iter().enumerate() {
        let x = i as f64;
        let y = y as f64;
        n += 1.0;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if n < 2.0 || denominator == 0.0 {
        return 0.0;
    }
    ((n * sum_xy - sum_x * sum_y) / denominator) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_percentile_matches_linear_interpolation() {
        let values: Vec<f32> = (1..=10).map(|v| v as f32).collect();
        // rank = 0.1 * 9 = 0.9 -> 1 + 0.9
        assert!((percentile(&values, 10.0).unwrap() - 1.9).abs() < 1e-6);
        assert!((percentile(&values, 90.0).unwrap() - 9.1).abs() < 1e-6);
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 100.0), Some(10.0));
    }

    #[test]
    fn test_percentile_ignores_non_finite() {
        assert_eq!(percentile(&[f32::NAN, 2.0, f32::INFINITY], 50.0), Some(2.0));
        assert_eq!(percentile(&[f32::NAN], 50.0), None);
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_percentile_unsorted_input() {
        assert_eq!(percentile(&[3.0, 1.0, 2.0], 50.0), Some(2.0));
    }

    #[test]
    fn test_least_squares_slope() {
        let rising = [0.0, 1.0, 2.0, 3.0];
        assert!((least_squares_slope(rising) - 1.0).abs() < 1e-6);

        let falling = [1.0, 0.9, 0.8, 0.7, 0.6];
        assert!((least_squares_slope(falling) + 0.1).abs() < 1e-5);

        assert_eq!(least_squares_slope([5.0]), 0.0);
        assert_eq!(least_squares_slope(Vec::<f32>::new()), 0.0);
    }
}
