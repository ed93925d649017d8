//! Box-and-whisker plots per category.

use super::axis::{category_label, category_range, padded_range, palette, FONT};
use super::Chart;
use crate::error::{Result, SalesError};
use crate::utils::stats::{finite, quantile};
use plotters::coord::Shift;
use plotters::prelude::*;

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest value within `q1 - 1.5 * IQR`.
    pub whisker_low: f64,
    /// Largest value within `q3 + 1.5 * IQR`.
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// Summarise the finite values; `None` when there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let values = finite(values);
        if values.is_empty() {
            return None;
        }
        let q1 = quantile(&values, 0.25);
        let median = quantile(&values, 0.5);
        let q3 = quantile(&values, 0.75);
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = || values.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
        Some(Self {
            q1,
            median,
            q3,
            whisker_low: inside().fold(f64::INFINITY, f64::min),
            whisker_high: inside().fold(f64::NEG_INFINITY, f64::max),
            outliers: values
                .iter()
                .copied()
                .filter(|v| *v < lo_fence || *v > hi_fence)
                .collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct BoxPlot {
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub groups: Vec<Vec<f64>>,
}

impl BoxPlot {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        categories: Vec<String>,
        groups: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if categories.len() != groups.len() {
            return Err(SalesError::DimensionMismatch {
                expected: categories.len(),
                got: groups.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            categories,
            groups,
        })
    }

    pub fn with_labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = x.into();
        self.y_label = y.into();
        self
    }
}

impl Chart for BoxPlot {
    fn name(&self) -> &str {
        &self.name
    }

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let n = self.categories.len();
        let stats: Vec<Option<BoxStats>> =
            self.groups.iter().map(|g| BoxStats::from_values(g)).collect();
        let y_range = padded_range(self.groups.iter().flatten().copied(), 0.05);

        let mut chart = ChartBuilder::on(area)
            .caption(&self.title, (FONT, 24))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(category_range(n), y_range)?;

        let label = |x: &f64| category_label(&self.categories, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n.max(1))
            .x_label_formatter(&label)
            .x_desc(&self.x_label)
            .y_desc(&self.y_label)
            .draw()?;

        let half = 0.3;
        for (i, s) in stats.iter().enumerate() {
            let Some(s) = s else { continue };
            let x = i as f64;
            let color = palette(i);
            let line = BLACK.stroke_width(1);

            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - half, s.q1), (x + half, s.q3)],
                color.mix(0.7).filled(),
            )))?;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - half, s.q1), (x + half, s.q3)],
                line,
            )))?;
            chart.draw_series(
                [
                    vec![(x - half, s.median), (x + half, s.median)],
                    vec![(x, s.q3), (x, s.whisker_high)],
                    vec![(x, s.q1), (x, s.whisker_low)],
                    vec![(x - half / 2.0, s.whisker_high), (x + half / 2.0, s.whisker_high)],
                    vec![(x - half / 2.0, s.whisker_low), (x + half / 2.0, s.whisker_low)],
                ]
                .into_iter()
                .map(|path| PathElement::new(path, line)),
            )?;
            chart.draw_series(
                s.outliers
                    .iter()
                    .map(|v| Circle::new((x, *v), 3, BLACK.stroke_width(1))),
            )?;
        }
        Ok(())
    }
}
