//! Line charts with optional markers, dashes and interval bands.

use super::axis::{date_label, date_to_axis, padded_range, palette, FONT};
use super::Chart;
use crate::error::{Result, SalesError};
use chrono::NaiveDateTime;
use plotters::coord::Shift;
use plotters::prelude::*;

/// How a series is stroked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Markers,
}

/// One named polyline.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub style: LineStyle,
    /// Palette index; defaults to the series position.
    pub color: Option<usize>,
}

impl Series {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
            style: LineStyle::Solid,
            color: None,
        }
    }

    /// Series over a date axis.
    pub fn dated(label: impl Into<String>, dates: &[NaiveDateTime], values: &[f64]) -> Self {
        let points = dates
            .iter()
            .zip(values)
            .map(|(d, v)| (date_to_axis(d), *v))
            .collect();
        Self::new(label, points)
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_color(mut self, color: usize) -> Self {
        self.color = Some(color);
        self
    }
}

/// Shaded region between two curves sharing x values.
#[derive(Debug, Clone)]
pub struct Band {
    pub label: String,
    /// `(x, lower, upper)`
    pub points: Vec<(f64, f64, f64)>,
    pub color: usize,
}

impl Band {
    pub fn dated(
        label: impl Into<String>,
        dates: &[NaiveDateTime],
        lower: &[f64],
        upper: &[f64],
        color: usize,
    ) -> Result<Self> {
        if lower.len() != dates.len() || upper.len() != dates.len() {
            return Err(SalesError::DimensionMismatch {
                expected: dates.len(),
                got: lower.len().min(upper.len()),
            });
        }
        Ok(Self {
            label: label.into(),
            points: dates
                .iter()
                .zip(lower.iter().zip(upper))
                .map(|(d, (l, u))| (date_to_axis(d), *l, *u))
                .collect(),
            color,
        })
    }

    /// Closed outline: lower curve forwards, upper curve backwards.
    pub fn outline(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|(x, l, _)| (*x, *l))
            .chain(self.points.iter().rev().map(|(x, _, u)| (*x, *u)))
            .collect()
    }
}

/// Split a polyline into dashes: each segment is cut into `pieces` parts and
/// every other part is kept.
pub fn dash_segments(points: &[(f64, f64)], pieces: usize) -> Vec<[(f64, f64); 2]> {
    let pieces = pieces.max(1);
    let mut out = Vec::new();
    for w in points.windows(2) {
        let (x0, y0) = w[0];
        let (dx, dy) = (w[1].0 - x0, w[1].1 - y0);
        let at = |k: usize| {
            let f = k as f64 / pieces as f64;
            (x0 + f * dx, y0 + f * dy)
        };
        for k in (0..pieces).step_by(2) {
            out.push([at(k), at(k + 1)]);
        }
    }
    out
}

/// One or more series on a shared x axis.
#[derive(Debug, Clone)]
pub struct LineChart {
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    pub bands: Vec<Band>,
    /// Format x ticks as `YYYY-MM`.
    pub date_axis: bool,
}

impl LineChart {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            series: Vec::new(),
            bands: Vec::new(),
            date_axis: false,
        }
    }

    pub fn with_labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = x.into();
        self.y_label = y.into();
        self
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_band(mut self, band: Band) -> Self {
        self.bands.push(band);
        self
    }

    pub fn with_date_axis(mut self) -> Self {
        self.date_axis = true;
        self
    }

    fn ranges(&self) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
        let xs = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.0))
            .chain(self.bands.iter().flat_map(|b| b.points.iter().map(|p| p.0)));
        let ys = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.1))
            .chain(
                self.bands
                    .iter()
                    .flat_map(|b| b.points.iter().flat_map(|p| [p.1, p.2])),
            );
        (padded_range(xs, 0.01), padded_range(ys, 0.05))
    }

    /// Draw into an area; shared with multi-panel charts.
    pub(crate) fn draw_on<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        caption_size: u32,
    ) -> Result<()> {
        let (x_range, y_range) = self.ranges();

        let mut chart = ChartBuilder::on(area)
            .caption(&self.title, (FONT, caption_size))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(&self.x_label).y_desc(&self.y_label);
        if self.date_axis {
            mesh.x_label_formatter(&date_label);
        }
        mesh.draw()?;

        for band in &self.bands {
            let color = palette(band.color);
            chart
                .draw_series(std::iter::once(Polygon::new(
                    band.outline(),
                    color.mix(0.2).filled(),
                )))?
                .label(band.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.2).filled()));
        }

        for (i, series) in self.series.iter().enumerate() {
            let color = palette(series.color.unwrap_or(i));
            let style = color.stroke_width(2);
            let drawn = match series.style {
                LineStyle::Solid => {
                    chart.draw_series(LineSeries::new(series.points.iter().copied(), style))?
                }
                LineStyle::Markers => chart.draw_series(
                    LineSeries::new(series.points.iter().copied(), style)
                        .point_size(3),
                )?,
                LineStyle::Dashed => chart.draw_series(
                    dash_segments(&series.points, 6)
                        .into_iter()
                        .map(|seg| PathElement::new(seg.to_vec(), style)),
                )?,
            };
            drawn
                .label(series.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }
}

impl Chart for LineChart {
    fn name(&self) -> &str {
        &self.name
    }

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        self.draw_on(area, 24)
    }
}
