//! Accuracy metrics for comparing forecasts with held-out observations.

use crate::error::{Result, SalesError};

/// Hold-out accuracy of a forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (None if zeros in actual)
    pub mape: Option<f64>,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

/// Calculate accuracy metrics between actual and predicted values.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(SalesError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(SalesError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let n = actual.len() as f64;
    let pairs = || actual.iter().zip(predicted.iter());

    let mae = pairs().map(|(a, p)| (a - p).abs()).sum::<f64>() / n;
    let rmse = (pairs().map(|(a, p)| (a - p).powi(2)).sum::<f64>() / n).sqrt();

    let mape = if actual.contains(&0.0) {
        None
    } else {
        Some(100.0 * pairs().map(|(a, p)| ((a - p) / a).abs()).sum::<f64>() / n)
    };

    let smape = 100.0
        * pairs()
            .map(|(a, p)| {
                let denom = a.abs() + p.abs();
                if denom == 0.0 {
                    0.0
                } else {
                    2.0 * (a - p).abs() / denom
                }
            })
            .sum::<f64>()
        / n;

    Ok(AccuracyMetrics {
        mae,
        rmse,
        mape,
        smape,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfect_forecast() {
        let m = calculate_metrics(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(m.mae, 0.0);
        assert_relative_eq!(m.rmse, 0.0);
        assert_relative_eq!(m.mape.unwrap(), 0.0);
        assert_relative_eq!(m.smape, 0.0);
    }

    #[test]
    fn known_errors() {
        let m = calculate_metrics(&[100.0, 200.0], &[110.0, 180.0]).unwrap();
        assert_relative_eq!(m.mae, 15.0);
        assert_relative_eq!(m.rmse, (250.0_f64).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(m.mape.unwrap(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn mape_undefined_with_zero_actuals() {
        let m = calculate_metrics(&[0.0, 2.0], &[1.0, 2.0]).unwrap();
        assert!(m.mape.is_none());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            calculate_metrics(&[], &[]),
            Err(SalesError::EmptyData)
        ));
        assert!(calculate_metrics(&[1.0], &[1.0, 2.0]).is_err());
    }
}
