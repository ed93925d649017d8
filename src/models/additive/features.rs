//! Regressors of the additive model: time scaling, changepoint hinges and
//! Fourier terms.

use chrono::{NaiveDate, NaiveDateTime};
use std::f64::consts::PI;

/// Days since 1970-01-01, fractional.
pub fn days_since_epoch(ts: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .unwrap_or_default()
        .and_time(chrono::NaiveTime::MIN);
    ts.signed_duration_since(epoch).num_seconds() as f64 / 86_400.0
}

/// Maps days onto `[0, 1]` over the training history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    pub start: f64,
    pub span: f64,
}

impl TimeScale {
    pub fn fit(days: &[f64]) -> Self {
        let start = days.first().copied().unwrap_or(0.0);
        let end = days.last().copied().unwrap_or(start);
        let span = if end > start { end - start } else { 1.0 };
        Self { start, span }
    }

    pub fn apply(&self, days: &[f64]) -> Vec<f64> {
        days.iter().map(|d| (d - self.start) / self.span).collect()
    }
}

/// Smallest gap between consecutive observations, in days.
pub fn min_spacing(days: &[f64]) -> f64 {
    days.windows(2)
        .map(|w| w[1] - w[0])
        .fold(f64::INFINITY, f64::min)
}

/// Evenly spread changepoints over the first `range` share of the history.
///
/// Locations are taken from the observed (scaled) times; the first
/// observation is never a changepoint.
pub fn changepoints(t: &[f64], requested: usize, range: f64) -> Vec<f64> {
    let hist_size = (t.len() as f64 * range.clamp(0.0, 1.0)).floor() as usize;
    let n = requested.min(hist_size.saturating_sub(1));
    if n == 0 {
        return Vec::new();
    }

    let last = (hist_size - 1) as f64;
    (1..=n)
        .map(|i| {
            let idx = (last * i as f64 / n as f64).round() as usize;
            t[idx]
        })
        .collect()
}

/// One `max(t - s, 0)` column per changepoint `s`.
pub fn hinge_columns(t: &[f64], changepoints: &[f64]) -> Vec<Vec<f64>> {
    changepoints
        .iter()
        .map(|s| t.iter().map(|ti| (ti - s).max(0.0)).collect())
        .collect()
}

/// `sin` and `cos` columns for harmonics `1..=order` of `period` days.
pub fn fourier_columns(days: &[f64], period: f64, order: usize) -> Vec<Vec<f64>> {
    let mut columns = Vec::with_capacity(2 * order);
    for k in 1..=order {
        let omega = 2.0 * PI * k as f64 / period;
        columns.push(days.iter().map(|d| (omega * d).sin()).collect());
        columns.push(days.iter().map(|d| (omega * d).cos()).collect());
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn epoch_offset() {
        let ts = NaiveDate::from_ymd_opt(1970, 1, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_relative_eq!(days_since_epoch(&ts), 1.5);
    }

    #[test]
    fn time_scale_maps_history_to_unit_interval() {
        let scale = TimeScale::fit(&[10.0, 20.0, 30.0]);
        assert_eq!(scale.apply(&[10.0, 20.0, 30.0, 40.0]), vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(TimeScale::fit(&[5.0]).span, 1.0);
    }

    #[test]
    fn changepoints_stay_in_range() {
        let t: Vec<f64> = (0..36).map(|i| i as f64 / 35.0).collect();
        let cps = changepoints(&t, 25, 0.8);
        assert_eq!(cps.len(), 25);
        assert!(cps[0] > 0.0);
        assert!(*cps.last().unwrap() <= t[27]);
        assert!(cps.windows(2).all(|w| w[0] <= w[1]));

        // short histories get fewer changepoints
        assert_eq!(changepoints(&t[..5], 25, 0.8).len(), 3);
        assert!(changepoints(&t[..1], 25, 0.8).is_empty());
    }

    #[test]
    fn hinge_is_zero_before_changepoint() {
        let cols = hinge_columns(&[0.0, 0.5, 1.0], &[0.5]);
        assert_eq!(cols, vec![vec![0.0, 0.0, 0.5]]);
    }

    #[test]
    fn fourier_terms_repeat_each_period() {
        let cols = fourier_columns(&[0.0, 7.0, 3.5], 7.0, 2);
        assert_eq!(cols.len(), 4);
        assert_relative_eq!(cols[0][1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(cols[1][1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(cols[1][2], -1.0, epsilon = 1e-12);
    }
}
