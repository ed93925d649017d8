//! Trailing rolling-window statistics.

/// Trailing rolling mean.
///
/// Position `i` covers `series[i + 1 - window ..= i]`, truncated at the start
/// of the series. Positions whose window holds fewer than `min_periods`
/// non-NaN values are `NaN`.
///
/// With `min_periods = 1` the first positions average whatever history exists:
/// `[10, 20, 30, 40]` with a window of 3 gives `[10, 15, 20, 30]`.
pub fn rolling_mean(series: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; series.len()];
    }
    let min_periods = min_periods.clamp(1, window);

    (0..series.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let (sum, count) = series[start..=i]
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            if count < min_periods {
                f64::NAN
            } else {
                sum / count as f64
            }
        })
        .collect()
}
