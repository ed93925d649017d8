//! Stacked component panels (trend, seasonality, ...).

use super::line::{LineChart, Series};
use super::Chart;
use crate::error::{Result, SalesError};
use chrono::NaiveDateTime;
use plotters::coord::Shift;
use plotters::prelude::*;

#[derive(Debug, Clone)]
pub struct ComponentsChart {
    pub name: String,
    pub dates: Vec<NaiveDateTime>,
    /// `(component name, values)` drawn top to bottom.
    pub panels: Vec<(String, Vec<f64>)>,
}

impl ComponentsChart {
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDateTime>) -> Self {
        Self {
            name: name.into(),
            dates,
            panels: Vec::new(),
        }
    }

    pub fn with_panel(mut self, label: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.dates.len() {
            return Err(SalesError::DimensionMismatch {
                expected: self.dates.len(),
                got: values.len(),
            });
        }
        self.panels.push((label.into(), values));
        Ok(self)
    }

    fn panel_chart(&self, index: usize) -> LineChart {
        let (label, values) = &self.panels[index];
        LineChart::new(&self.name, label.as_str())
            .with_labels("ds", label.as_str())
            .with_series(Series::dated(label.as_str(), &self.dates, values).with_color(index))
            .with_date_axis()
    }
}

impl Chart for ComponentsChart {
    fn name(&self) -> &str {
        &self.name
    }

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        if self.panels.is_empty() {
            return Err(SalesError::EmptyData);
        }
        let areas = area.split_evenly((self.panels.len(), 1));
        for (i, panel) in areas.iter().enumerate() {
            self.panel_chart(i).draw_on(panel, 18)?;
        }
        Ok(())
    }
}
