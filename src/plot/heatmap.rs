//! Annotated heatmap for correlation matrices.

use super::axis::{category_label, FONT};
use super::Chart;
use crate::error::{Result, SalesError};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// Anchors of the blue-white-red diverging map at -1, 0 and 1.
const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

/// Diverging colour for `value` in `[-1, 1]`; out-of-range values are clamped
/// and `NaN` maps to the neutral colour.
pub fn coolwarm(value: f64) -> RGBColor {
    let v = if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) };
    let (from, to, t) = if v < 0.0 {
        (NEUTRAL, COOL, -v)
    } else {
        (NEUTRAL, WARM, v)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

#[derive(Debug, Clone)]
pub struct Heatmap {
    pub name: String,
    pub title: String,
    pub labels: Vec<String>,
    /// Row-major square matrix.
    pub values: Vec<Vec<f64>>,
}

impl Heatmap {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        labels: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let k = labels.len();
        if values.len() != k {
            return Err(SalesError::DimensionMismatch {
                expected: k,
                got: values.len(),
            });
        }
        if let Some(row) = values.iter().find(|r| r.len() != k) {
            return Err(SalesError::DimensionMismatch {
                expected: k,
                got: row.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            title: title.into(),
            labels,
            values,
        })
    }
}

impl Chart for Heatmap {
    fn name(&self) -> &str {
        &self.name
    }

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let k = self.labels.len();
        let extent = k.max(1) as f64;

        let mut chart = ChartBuilder::on(area)
            .caption(&self.title, (FONT, 24))
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(0.0..extent, 0.0..extent)?;

        // row 0 is drawn at the top
        let x_label = |x: &f64| category_label(&self.labels, x - 0.5);
        let y_label = |y: &f64| category_label(&self.labels, extent - 0.5 - y);
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(2 * k + 1)
            .y_labels(2 * k + 1)
            .x_label_formatter(&x_label)
            .y_label_formatter(&y_label)
            .draw()?;

        let text = TextStyle::from((FONT, 14).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        for (i, row) in self.values.iter().enumerate() {
            let y = extent - 1.0 - i as f64;
            for (j, v) in row.iter().enumerate() {
                let x = j as f64;
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(x, y), (x + 1.0, y + 1.0)],
                    coolwarm(*v).filled(),
                )))?;
                chart.draw_series(std::iter::once(Text::new(
                    format!("{v:.2}"),
                    (x + 0.5, y + 0.5),
                    text.clone(),
                )))?;
            }
        }
        Ok(())
    }
}
