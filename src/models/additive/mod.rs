//! Additive trend + seasonality model with changepoints.
//!
//! Takes a two-column `(ds, y)` history and predicts any set of dates,
//! reporting the trend and each seasonal component next to `yhat` and its
//! interval.

mod config;
mod features;
mod model;

pub use config::{AdditiveConfig, FutureFrequency, Seasonality, Toggle};
pub use model::{future_dates, AdditiveForecast, AdditiveModel, DatedSeries, ForecastRow};
