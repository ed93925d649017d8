//! Forecaster trait defining the common interface for all models.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for all forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate point predictions for the next `horizon` steps.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with intervals covering `level` (e.g. `0.95`).
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let _ = level;
        self.predict(horizon)
    }

    /// In-sample one-step predictions.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use pharma_sales::models::{BoxedForecaster, Forecaster};
/// use pharma_sales::models::baseline::SimpleMovingAverage;
///
/// let model: BoxedForecaster = Box::new(SimpleMovingAverage::new(3));
/// assert_eq!(model.name(), "SMA");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;
