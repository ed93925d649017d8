//! Pipeline configuration.

use crate::error::Result;
use crate::models::ArimaOrder;
use crate::plot::{ChartFormat, ChartWriter};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory by the binary.
pub const CONFIG_FILE: &str = "pharma-sales.json";

/// Paths and parameters shared by the pipelines.
///
/// Every field has a default, so a JSON file only needs the fields it
/// overrides:
///
/// ```
/// use pharma_sales::config::PipelineConfig;
///
/// let config = PipelineConfig::from_json(r#"{ "test_size": 6 }"#).unwrap();
/// assert_eq!(config.test_size, 6);
/// assert_eq!(config.future_periods, 24);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the four granularity exports.
    pub data_dir: PathBuf,
    /// Raw daily export consumed by preprocessing.
    pub raw_daily_path: PathBuf,
    /// Directory for charts.
    pub output_dir: PathBuf,
    /// Written by preprocessing, read by visualization.
    pub processed_path: PathBuf,
    pub chart_format: ChartFormat,
    /// `(width, height)` in pixels.
    pub chart_size: (u32, u32),
    /// Rows with `|z| > outlier_threshold` are dropped.
    pub outlier_threshold: f64,
    /// Months held out for ARIMA accuracy.
    pub test_size: usize,
    /// `(p, d, q)`
    pub arima_order: (usize, usize, usize),
    /// Months forecast by the additive model.
    pub future_periods: usize,
    pub rolling_window: usize,
    pub projection_months: usize,
    /// Seed for forecast interval simulation.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            raw_daily_path: PathBuf::from("data/salesdaily.csv"),
            output_dir: PathBuf::from("output"),
            processed_path: PathBuf::from("output/salesdaily_processed.csv"),
            chart_format: ChartFormat::Png,
            chart_size: (1200, 600),
            outlier_threshold: 3.0,
            test_size: 12,
            arima_order: (2, 1, 2),
            future_periods: 24,
            rolling_window: 3,
            projection_months: 6,
            seed: None,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Point every path at `dir`: inputs under `dir/data`, outputs under `dir/output`.
    pub fn with_root(mut self, dir: &Path) -> Self {
        self.data_dir = dir.join("data");
        self.raw_daily_path = self.data_dir.join("salesdaily.csv");
        self.output_dir = dir.join("output");
        self.processed_path = self.output_dir.join("salesdaily_processed.csv");
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_raw_daily_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw_daily_path = path.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_processed_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.processed_path = path.into();
        self
    }

    pub fn with_chart_format(mut self, format: ChartFormat) -> Self {
        self.chart_format = format;
        self
    }

    pub fn with_outlier_threshold(mut self, threshold: f64) -> Self {
        self.outlier_threshold = threshold;
        self
    }

    pub fn with_test_size(mut self, test_size: usize) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_arima_order(mut self, p: usize, d: usize, q: usize) -> Self {
        self.arima_order = (p, d, q);
        self
    }

    pub fn with_future_periods(mut self, periods: usize) -> Self {
        self.future_periods = periods;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn arima_order(&self) -> ArimaOrder {
        ArimaOrder::from(self.arima_order)
    }

    /// Chart writer targeting `output_dir`.
    pub fn chart_writer(&self) -> ChartWriter {
        ChartWriter::new(&self.output_dir, self.chart_format)
            .with_size(self.chart_size.0, self.chart_size.1)
    }
}
