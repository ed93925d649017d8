//! Vertical bar chart over named categories.

use super::axis::{category_label, category_range, padded_range, palette, FONT};
use super::Chart;
use crate::error::{Result, SalesError};
use plotters::coord::Shift;
use plotters::prelude::*;

#[derive(Debug, Clone)]
pub struct BarChart {
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

impl BarChart {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        categories: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if categories.len() != values.len() {
            return Err(SalesError::DimensionMismatch {
                expected: categories.len(),
                got: values.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            categories,
            values,
        })
    }

    pub fn with_labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = x.into();
        self.y_label = y.into();
        self
    }

    /// Value axis always includes zero.
    fn value_range(&self) -> std::ops::Range<f64> {
        let r = padded_range(self.values.iter().copied().chain([0.0]), 0.05);
        let has_negative = self.values.iter().any(|v| *v < 0.0);
        let has_positive = self.values.iter().any(|v| *v > 0.0);
        let start = if has_negative { r.start } else { 0.0 };
        let end = if has_positive || !has_negative { r.end } else { 0.0 };
        start..end
    }
}

impl Chart for BarChart {
    fn name(&self) -> &str {
        &self.name
    }

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let n = self.categories.len();
        let mut chart = ChartBuilder::on(area)
            .caption(&self.title, (FONT, 24))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(category_range(n), self.value_range())?;

        let label = |x: &f64| category_label(&self.categories, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n.max(1))
            .x_label_formatter(&label)
            .x_desc(&self.x_label)
            .y_desc(&self.y_label)
            .draw()?;

        let fill = palette(0);
        chart.draw_series(self.values.iter().enumerate().map(|(i, v)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], fill.filled())
        }))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_lengths() {
        assert!(BarChart::new("b", "b", vec!["a".into()], vec![]).is_err());
    }

    #[test]
    fn value_range_includes_zero() {
        let chart = BarChart::new("b", "b", vec!["a".into(), "b".into()], vec![5.0, 10.0]).unwrap();
        let r = chart.value_range();
        assert_eq!(r.start, 0.0);
        assert!(r.end > 10.0);

        let negative = BarChart::new("b", "b", vec!["a".into()], vec![-3.0]).unwrap();
        assert!(negative.value_range().start < -3.0);
        assert_eq!(negative.value_range().end, 0.0);
    }
}
