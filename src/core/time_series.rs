//! TimeSeries data structure for a single ordered sales column.

use crate::error::{Result, SalesError};
use chrono::NaiveDateTime;

/// A univariate time series with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
    label: Option<String>,
}

impl TimeSeries {
    /// Create a univariate series, validating ordering and lengths.
    pub fn univariate(timestamps: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self> {
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(SalesError::Timestamp(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        if values.len() != timestamps.len() {
            return Err(SalesError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        Ok(Self {
            timestamps,
            values,
            label: None,
        })
    }

    /// Attach a display label (usually the source column name).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Last observed timestamp, if any.
    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }

    /// Iterate over `(timestamp, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// Extract observations in `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(SalesError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(SalesError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            label: self.label.clone(),
        })
    }

    /// Split off the last `test_size` observations as a hold-out set.
    ///
    /// Returns `(train, test)`. The training part must keep at least one
    /// observation.
    pub fn train_test_split(&self, test_size: usize) -> Result<(TimeSeries, TimeSeries)> {
        if test_size >= self.len() {
            return Err(SalesError::InsufficientData {
                needed: test_size + 1,
                got: self.len(),
            });
        }
        let cut = self.len() - test_size;
        Ok((self.slice(0, cut)?, self.slice(cut, self.len())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_timestamps(n: usize) -> Vec<NaiveDateTime> {
        let base = NaiveDate::from_ymd_opt(2017, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    #[test]
    fn univariate_rejects_unordered_timestamps() {
        let mut ts = make_timestamps(3);
        ts.swap(0, 2);
        let err = TimeSeries::univariate(ts, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, SalesError::Timestamp(_)));
    }

    #[test]
    fn univariate_rejects_duplicate_timestamps() {
        let mut ts = make_timestamps(3);
        ts[1] = ts[0];
        assert!(TimeSeries::univariate(ts, vec![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn univariate_rejects_length_mismatch() {
        let err = TimeSeries::univariate(make_timestamps(3), vec![1.0]).unwrap_err();
        assert!(matches!(
            err,
            SalesError::DimensionMismatch {
                expected: 3,
                got: 1
            }
        ));
    }

    #[test]
    fn train_test_split_keeps_order() {
        let values: Vec<f64> = (0..36).map(|i| i as f64).collect();
        let series = TimeSeries::univariate(make_timestamps(36), values)
            .unwrap()
            .with_label("total_sales");

        let (train, test) = series.train_test_split(12).unwrap();
        assert_eq!(train.len(), 24);
        assert_eq!(test.len(), 12);
        assert_eq!(test.values()[0], 24.0);
        assert_eq!(train.last_timestamp().unwrap() + Duration::days(1), test.timestamps()[0]);
        assert_eq!(test.label(), Some("total_sales"));
    }

    #[test]
    fn train_test_split_needs_training_data() {
        let series = TimeSeries::univariate(make_timestamps(12), vec![1.0; 12]).unwrap();
        assert!(matches!(
            series.train_test_split(12),
            Err(SalesError::InsufficientData { needed: 13, got: 12 })
        ));
    }

    #[test]
    fn slice_bounds_are_checked() {
        let series = TimeSeries::univariate(make_timestamps(5), vec![1.0; 5]).unwrap();
        assert!(series.slice(3, 2).is_err());
        assert!(series.slice(0, 6).is_err());
        assert_eq!(series.slice(1, 4).unwrap().len(), 3);
    }
}
