//! Simple moving average forecaster.

use crate::core::{Forecast, TimeSeries};
use crate::error::{Result, SalesError};
use crate::models::Forecaster;
use crate::transform::rolling_mean;
use crate::utils::stats::quantile_normal;

/// Flat forecast at the mean of the last `window` observations.
///
/// A history shorter than `window` is averaged as a whole.
///
/// In-sample fits are the trailing mean of the preceding `window` values, so
/// the first fitted value is `NaN`.
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    window: usize,
    level: Option<f64>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
}

impl SimpleMovingAverage {
    /// Create a moving average over `window` observations.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            level: None,
            fitted: None,
            residuals: None,
            sigma2: None,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Level the forecast is held at.
    pub fn level(&self) -> Option<f64> {
        self.level
    }
}

impl Default for SimpleMovingAverage {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Forecaster for SimpleMovingAverage {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if self.window == 0 {
            return Err(SalesError::InvalidParameter(
                "window must be positive".to_string(),
            ));
        }
        let values = series.values();
        if values.is_empty() {
            return Err(SalesError::EmptyData);
        }

        let n = values.len();
        let tail = &values[n.saturating_sub(self.window)..];
        self.level = Some(tail.iter().sum::<f64>() / tail.len() as f64);

        // fit at t is the rolling mean ending at t - 1
        let rolled = rolling_mean(values, self.window, 1);
        let fitted: Vec<f64> = std::iter::once(f64::NAN)
            .chain(rolled[..n - 1].iter().copied())
            .collect();
        let residuals: Vec<f64> = values
            .iter()
            .zip(&fitted)
            .map(|(y, f)| y - f)
            .collect();

        let valid: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
        self.sigma2 = if valid.is_empty() {
            None
        } else {
            Some(valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64)
        };
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let level = self.level.ok_or(SalesError::FitRequired)?;
        Ok(Forecast::from_values(vec![level; horizon]))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let forecast = self.predict(horizon)?;
        let Some(sigma2) = self.sigma2 else {
            return Ok(forecast);
        };

        let z = quantile_normal((1.0 + level) / 2.0);
        let (lower, upper): (Vec<f64>, Vec<f64>) = forecast
            .values()
            .iter()
            .enumerate()
            .map(|(h, point)| {
                let half = z * (sigma2 * (h + 1) as f64).sqrt();
                (point - half, point + half)
            })
            .unzip();

        Ok(Forecast::from_values_with_intervals(
            forecast.values().to_vec(),
            lower,
            upper,
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::month_starts_after;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(values: Vec<f64>) -> TimeSeries {
        let origin = NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TimeSeries::univariate(month_starts_after(origin, values.len()), values).unwrap()
    }

    #[test]
    fn flat_projection_of_last_window() {
        let mut model = SimpleMovingAverage::new(3);
        model.fit(&series(vec![5.0, 10.0, 20.0, 30.0, 40.0])).unwrap();

        let forecast = model.predict(6).unwrap();
        assert_eq!(forecast.horizon(), 6);
        for v in forecast.values() {
            assert_relative_eq!(*v, 30.0);
        }
    }

    #[test]
    fn fitted_values_lag_one_step() {
        let mut model = SimpleMovingAverage::new(3);
        model.fit(&series(vec![10.0, 20.0, 30.0, 40.0])).unwrap();

        let fitted = model.fitted_values().unwrap();
        assert!(fitted[0].is_nan());
        assert_eq!(&fitted[1..], &[10.0, 15.0, 20.0]);
        assert_relative_eq!(model.residuals().unwrap()[3], 20.0);
    }

    #[test]
    fn intervals_surround_level() {
        let mut model = SimpleMovingAverage::default();
        model
            .fit(&series(vec![10.0, 12.0, 9.0, 11.0, 13.0, 10.0]))
            .unwrap();
        let forecast = model.predict_with_intervals(4, 0.8).unwrap();
        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        assert!(lower[0] < forecast.values()[0] && forecast.values()[0] < upper[0]);
        assert!(upper[3] - lower[3] > upper[0] - lower[0]);
    }

    #[test]
    fn short_history_averages_what_exists() {
        let mut model = SimpleMovingAverage::new(3);
        model.fit(&series(vec![10.0, 20.0])).unwrap();
        assert_eq!(model.level(), Some(15.0));
        assert_eq!(model.predict(6).unwrap().values(), &[15.0; 6]);
        assert_eq!(&model.fitted_values().unwrap()[1..], &[10.0]);

        model.fit(&series(vec![7.0])).unwrap();
        assert_eq!(model.level(), Some(7.0));
        assert!(model.fitted_values().unwrap()[0].is_nan());
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            SimpleMovingAverage::new(3).fit(&series(vec![])),
            Err(SalesError::EmptyData)
        ));
        assert!(SimpleMovingAverage::new(0).fit(&series(vec![1.0])).is_err());
        assert!(matches!(
            SimpleMovingAverage::new(3).predict(2),
            Err(SalesError::FitRequired)
        ));
    }
}
