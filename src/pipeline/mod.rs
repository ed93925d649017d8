//! End-to-end pipelines driven by [`PipelineConfig`](crate::config::PipelineConfig).
//!
//! Each pipeline runs top to bottom once. Charts are rendered only when a
//! [`ChartWriter`] is passed; reports carry the computed numbers either way.
//! Preprocessing and visualization are coupled only through
//! `PipelineConfig::processed_path`.

pub mod analysis;
pub mod forecasting;
pub mod preprocessing;
pub mod visualization;

use crate::error::Result;
use crate::plot::{Chart, ChartWriter};
use log::debug;

pub use analysis::AnalysisReport;
pub use forecasting::{ArimaReport, ForecastReport};
pub use preprocessing::PreprocessingReport;
pub use visualization::VisualizationReport;

fn render<C: Chart>(charts: Option<&ChartWriter>, chart: &C) -> Result<()> {
    match charts {
        Some(writer) => {
            writer.write(chart)?;
        }
        None => debug!("skipping chart {}", chart.name()),
    }
    Ok(())
}
