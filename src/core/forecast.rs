//! Forecast result structure for holding predictions.

use crate::error::{Result, SalesError};
use chrono::NaiveDateTime;

/// A forecast result containing point predictions and optional intervals.
///
/// Models produce values only; callers attach the future timestamps with
/// [`Forecast::with_timestamps`] once they know the calendar of the horizon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    timestamps: Vec<NaiveDateTime>,
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            ..Self::default()
        }
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(values: Vec<f64>, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            timestamps: Vec::new(),
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Attach one timestamp per forecast step.
    pub fn with_timestamps(mut self, timestamps: Vec<NaiveDateTime>) -> Result<Self> {
        if timestamps.len() != self.point.len() {
            return Err(SalesError::DimensionMismatch {
                expected: self.point.len(),
                got: timestamps.len(),
            });
        }
        self.timestamps = timestamps;
        Ok(self)
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn values(&self) -> &[f64] {
        &self.point
    }

    /// Timestamps of each step (empty until attached).
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Iterate over `(timestamp, value)` pairs; empty if no timestamps are attached.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.point.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn month_start(month: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, month, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn forecast_empty_state() {
        let forecast = Forecast::new();
        assert!(forecast.is_empty());
        assert_eq!(forecast.horizon(), 0);
        assert!(!forecast.has_intervals());
    }

    #[test]
    fn forecast_from_values_with_intervals() {
        let forecast =
            Forecast::from_values_with_intervals(vec![2.0, 3.0], vec![1.0, 2.0], vec![3.0, 4.0]);

        assert_eq!(forecast.values(), &[2.0, 3.0]);
        assert_eq!(forecast.lower().unwrap(), &[1.0, 2.0]);
        assert_eq!(forecast.upper().unwrap(), &[3.0, 4.0]);
        assert!(forecast.has_intervals());
    }

    #[test]
    fn timestamps_must_match_horizon() {
        let forecast = Forecast::from_values(vec![1.0, 2.0]);
        assert!(forecast.clone().with_timestamps(vec![month_start(1)]).is_err());

        let dated = forecast
            .with_timestamps(vec![month_start(1), month_start(2)])
            .unwrap();
        let pairs: Vec<_> = dated.iter().collect();
        assert_eq!(pairs, vec![(month_start(1), 1.0), (month_start(2), 2.0)]);
    }
}
