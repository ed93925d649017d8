//! Z-score outlier detection.
//!
//! Scores are computed against the mean and sample standard deviation of the
//! entire series, not a rolling window.

use crate::utils::stats::{mean, std_dev};

/// Result of outlier detection.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierResult {
    /// Indices of detected outliers, ascending.
    pub outlier_indices: Vec<usize>,
    /// Signed z-score of every point.
    pub scores: Vec<f64>,
    /// Threshold on `|z|` used for detection.
    pub threshold: f64,
}

impl OutlierResult {
    /// Get the number of outliers detected.
    pub fn outlier_count(&self) -> usize {
        self.outlier_indices.len()
    }

    /// Check if a specific index is an outlier.
    pub fn is_outlier(&self, index: usize) -> bool {
        self.outlier_indices.binary_search(&index).is_ok()
    }

    /// Mask with `true` for every flagged point.
    pub fn mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.scores.len()];
        for &i in &self.outlier_indices {
            mask[i] = true;
        }
        mask
    }

    /// Get outlier percentage.
    pub fn outlier_percentage(&self) -> f64 {
        if self.scores.is_empty() {
            0.0
        } else {
            100.0 * self.outlier_indices.len() as f64 / self.scores.len() as f64
        }
    }
}

/// Configuration for outlier detection.
#[derive(Debug, Clone)]
pub struct OutlierConfig {
    /// Points with `|z|` strictly above this value are flagged.
    pub threshold: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self { threshold: 3.0 }
    }
}

impl OutlierConfig {
    pub fn z_score(threshold: f64) -> Self {
        Self { threshold }
    }
}

/// Signed z-scores of a series.
///
/// Series shorter than two points, or with a standard deviation below
/// `1e-10`, score zero everywhere.
pub fn z_scores(series: &[f64]) -> Vec<f64> {
    let n = series.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let m = mean(series);
    let sd = std_dev(series);
    if !sd.is_finite() || sd < 1e-10 {
        return vec![0.0; n];
    }

    series.iter().map(|x| (x - m) / sd).collect()
}

/// Flag points whose absolute z-score exceeds the configured threshold.
pub fn detect_outliers(series: &[f64], config: &OutlierConfig) -> OutlierResult {
    let scores = z_scores(series);

    let outlier_indices: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, &score)| score.abs() > config.threshold)
        .map(|(i, _)| i)
        .collect();

    OutlierResult {
        outlier_indices,
        scores,
        threshold: config.threshold,
    }
}
