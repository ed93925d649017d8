//! Core data structures: univariate sales series, forecasts and calendar helpers.

pub mod calendar;
mod forecast;
mod time_series;

pub use calendar::{Granularity, Season};
pub use forecast::Forecast;
pub use time_series::TimeSeries;
