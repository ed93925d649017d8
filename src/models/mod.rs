//! Forecasting models.

mod traits;

pub mod additive;
pub mod arima;
pub mod baseline;

pub use additive::{AdditiveConfig, AdditiveForecast, AdditiveModel, DatedSeries};
pub use arima::{Arima, ArimaOrder};
pub use baseline::SimpleMovingAverage;
pub use traits::{BoxedForecaster, Forecaster};
