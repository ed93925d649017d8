//! Charts rendered with `plotters`.
//!
//! Every chart is a plain value describing what to draw; [`ChartWriter`]
//! renders it to a PNG or SVG file named after the chart. Charts are
//! write-only artifacts.

mod axis;
mod bar;
mod boxplot;
mod components;
mod heatmap;
mod histogram;
mod line;
mod writer;

use crate::error::Result;
use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend};

pub use axis::{date_to_axis, palette};
pub use bar::BarChart;
pub use boxplot::{BoxPlot, BoxStats};
pub use components::ComponentsChart;
pub use heatmap::{coolwarm, Heatmap};
pub use histogram::{bin_counts, gaussian_kde, scott_bandwidth, Bins, Histogram};
pub use line::{dash_segments, Band, LineChart, LineStyle, Series};
pub use writer::{ChartFormat, ChartWriter};

/// Something that can draw itself into a plotting area.
pub trait Chart {
    /// File stem of the rendered chart.
    fn name(&self) -> &str;

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()>;
}
