//! Histogram with an optional kernel density overlay.

use super::axis::{padded_range, palette, FONT};
use super::Chart;
use crate::error::{Result, SalesError};
use crate::utils::stats::{finite, std_dev};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;

/// Equal-width bins over the data range.
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    /// `counts.len() + 1` edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Bins {
    pub fn width(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            (Some(lo), Some(hi)) if !self.counts.is_empty() => (hi - lo) / self.counts.len() as f64,
            _ => 0.0,
        }
    }
}

/// Count finite values into `bins` equal-width bins.
///
/// The last bin is closed on the right so the maximum is counted.
pub fn bin_counts(values: &[f64], bins: usize) -> Result<Bins> {
    let values = finite(values);
    if values.is_empty() {
        return Err(SalesError::EmptyData);
    }
    if bins == 0 {
        return Err(SalesError::InvalidParameter("bins must be positive".into()));
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi <= lo {
        hi = lo + 1.0;
    }
    let width = (hi - lo) / bins as f64;

    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Ok(Bins { edges, counts })
}

/// Scott's rule bandwidth, `sigma * n^(-1/5)`.
pub fn scott_bandwidth(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let sd = std_dev(values);
    if sd.is_finite() && sd > 0.0 {
        sd * n.powf(-0.2)
    } else {
        1.0
    }
}

/// Gaussian kernel density estimate evaluated at `grid`.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Vec<f64> {
    let values = finite(values);
    if values.is_empty() {
        return vec![0.0; grid.len()];
    }
    let h = scott_bandwidth(&values);
    let norm = 1.0 / (values.len() as f64 * h * (2.0 * PI).sqrt());

    grid.iter()
        .map(|x| {
            norm * values
                .iter()
                .map(|v| (-0.5 * ((x - v) / h).powi(2)).exp())
                .sum::<f64>()
        })
        .collect()
}

/// Distribution of one numeric column.
#[derive(Debug, Clone)]
pub struct Histogram {
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub values: Vec<f64>,
    pub bins: usize,
    pub kde: bool,
}

impl Histogram {
    pub fn new(name: impl Into<String>, title: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            x_label: String::new(),
            values,
            bins: 30,
            kde: true,
        }
    }

    pub fn with_x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn with_kde(mut self, kde: bool) -> Self {
        self.kde = kde;
        self
    }
}

impl Chart for Histogram {
    fn name(&self) -> &str {
        &self.name
    }

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let bins = bin_counts(&self.values, self.bins)?;
        let n = bins.counts.iter().sum::<usize>() as f64;
        let width = bins.width();

        // density rescaled to the count axis
        let grid: Vec<f64> = {
            let lo = bins.edges[0];
            let hi = bins.edges[bins.edges.len() - 1];
            (0..=200).map(|i| lo + (hi - lo) * i as f64 / 200.0).collect()
        };
        let curve: Vec<(f64, f64)> = if self.kde {
            grid.iter()
                .zip(gaussian_kde(&self.values, &grid))
                .map(|(x, d)| (*x, d * n * width))
                .collect()
        } else {
            Vec::new()
        };

        let y_max = bins
            .counts
            .iter()
            .map(|c| *c as f64)
            .chain(curve.iter().map(|p| p.1))
            .fold(1.0, f64::max);
        let x_range = padded_range(bins.edges.iter().copied(), 0.02);

        let mut chart = ChartBuilder::on(area)
            .caption(&self.title, (FONT, 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, 0.0..y_max * 1.05)?;
        chart
            .configure_mesh()
            .x_desc(&self.x_label)
            .y_desc("Count")
            .draw()?;

        let fill = palette(0);
        chart.draw_series(bins.counts.iter().enumerate().map(|(i, c)| {
            Rectangle::new(
                [(bins.edges[i], 0.0), (bins.edges[i + 1], *c as f64)],
                fill.mix(0.6).filled(),
            )
        }))?;
        if !curve.is_empty() {
            chart.draw_series(LineSeries::new(curve, palette(3).stroke_width(2)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bins_cover_every_value() {
        let bins = bin_counts(&[0.0, 1.0, 2.0, 3.0, 4.0, f64::NAN], 4).unwrap();
        assert_eq!(bins.counts, vec![1, 1, 1, 2]);
        assert_eq!(bins.edges.len(), 5);
        assert_relative_eq!(bins.width(), 1.0);
    }

    #[test]
    fn constant_values_get_a_unit_range() {
        let bins = bin_counts(&[5.0, 5.0], 2).unwrap();
        assert_eq!(bins.counts, vec![2, 0]);
        assert!(bin_counts(&[], 3).is_err());
        assert!(bin_counts(&[1.0], 0).is_err());
    }

    #[test]
    fn kde_integrates_to_one() {
        let values: Vec<f64> = (0..50).map(|i| (i as f64 * 0.37).sin() * 10.0).collect();
        let grid: Vec<f64> = (0..=2000).map(|i| -40.0 + 80.0 * i as f64 / 2000.0).collect();
        let density = gaussian_kde(&values, &grid);
        let step = grid[1] - grid[0];
        let area: f64 = density.iter().sum::<f64>() * step;
        assert_relative_eq!(area, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn scott_bandwidth_shrinks_with_n() {
        let small: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let large: Vec<f64> = (0..1000).map(|i| (i % 10) as f64).collect();
        assert!(scott_bandwidth(&large) < scott_bandwidth(&small));
        assert_eq!(scott_bandwidth(&[1.0, 1.0]), 1.0);
    }
}
