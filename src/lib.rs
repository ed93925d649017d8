//! # pharma-sales
//!
//! Exploratory analysis and forecasting of pharmaceutical sales time series.
//!
//! Loads hourly, daily, weekly and monthly sales exports with one column per
//! ATC drug category, cleans them, aggregates them by calendar keys, renders
//! charts, and forecasts monthly total sales with ARIMA, an additive
//! trend-plus-seasonality model, and a moving-average projection.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod data;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod plot;
pub mod transform;
pub mod utils;

pub use error::{Result, SalesError};

pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::core::{Forecast, Granularity, TimeSeries};
    pub use crate::data::{SalesFrame, DRUG_COLUMNS, TOTAL_SALES};
    pub use crate::error::{Result, SalesError};
    pub use crate::models::Forecaster;
    pub use crate::utils::{calculate_metrics, quantile_normal, AccuracyMetrics};
}
