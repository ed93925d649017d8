//! Raw daily export to the cleaned file consumed by visualization.

use crate::config::PipelineConfig;
use crate::core::Granularity;
use crate::data::{clean, load_sales, write_sales, ImputationReport, SalesFrame};
use crate::error::Result;
use log::info;
use std::fs;
use std::path::PathBuf;

/// `datum` format of the processed file.
pub const PROCESSED_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct PreprocessingReport {
    /// `(rows, columns)` of the raw export.
    pub raw_shape: (usize, usize),
    pub imputation: ImputationReport,
    /// Rows dropped by the z-score filter.
    pub outliers: usize,
    /// Rows kept and written.
    pub processed: SalesFrame,
    pub output_path: PathBuf,
}

/// Clean `config.raw_daily_path` and write `config.processed_path`.
pub fn run(config: &PipelineConfig) -> Result<PreprocessingReport> {
    let raw = load_sales(&config.raw_daily_path, Granularity::Daily)?;
    let raw_shape = (raw.height(), raw.width());
    info!("Dataset Shape: ({}, {})", raw_shape.0, raw_shape.1);
    log_columns(&raw);

    let cleaned = clean(raw, config.outlier_threshold)?;
    let outliers = cleaned.outliers.flagged.height();
    let processed = cleaned.outliers.retained;
    info!(
        "Processed Dataset Shape: ({}, {})",
        processed.height(),
        processed.width()
    );
    info!("Sample rows:\n{}", processed.head(5));

    if let Some(parent) = config.processed_path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_sales(&processed, &config.processed_path)?;

    Ok(PreprocessingReport {
        raw_shape,
        imputation: cleaned.imputation,
        outliers,
        processed,
        output_path: config.processed_path.clone(),
    })
}

fn log_columns(frame: &SalesFrame) {
    info!("Column Info:");
    for column in frame.columns() {
        info!(
            "  {:<16} {:<8} {} non-null",
            column.name().as_str(),
            column.dtype().to_string(),
            column.len() - column.null_count()
        );
    }
}
