//! Error types for the pharma-sales crate.

use thiserror::Error;

/// Result type alias for analysis and forecasting operations.
pub type Result<T> = std::result::Result<T, SalesError>;

/// Errors that can occur while loading, cleaning, charting or forecasting.
#[derive(Error, Debug)]
pub enum SalesError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    Timestamp(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// A required column is absent from a table.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// A column exists but holds the wrong kind of values.
    #[error("column {name} is not {expected}")]
    ColumnType { name: String, expected: &'static str },

    /// A date cell did not match the expected format.
    #[error("row {row}: cannot parse date {value:?} with format {format:?}")]
    DateParse {
        row: usize,
        value: String,
        format: String,
    },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Chart rendering failed.
    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Table operation failed.
    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for SalesError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        SalesError::Render(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = SalesError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = SalesError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = SalesError::MissingColumn("N02BE".to_string());
        assert_eq!(err.to_string(), "missing column: N02BE");

        let err = SalesError::DateParse {
            row: 3,
            value: "13/45/2017".to_string(),
            format: "%m/%d/%Y".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "row 3: cannot parse date \"13/45/2017\" with format \"%m/%d/%Y\""
        );

        let err = SalesError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "salesdaily.csv");
        let err: SalesError = io.into();
        assert!(matches!(err, SalesError::Io(_)));
    }
}
