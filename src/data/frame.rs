//! Sales table backed by a polars `DataFrame`.

use crate::error::{Result, SalesError};
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use std::fmt;

/// Name of the timestamp column in every sales export.
pub const DATE_COLUMN: &str = "datum";

/// ATC drug categories carried by every sales export, in file order.
pub const DRUG_COLUMNS: [&str; 8] = [
    "M01AB", "M01AE", "N02BA", "N02BE", "N05B", "N05C", "R03", "R06",
];

/// Derived column holding the sum of the drug columns.
pub const TOTAL_SALES: &str = "Total_Sales";

/// Derived column holding the z-score of total sales.
pub const Z_SCORE: &str = "z_score_sales";

/// Physical unit of the `datum` column.
pub const DATE_UNIT: TimeUnit = TimeUnit::Microseconds;

/// A table of sales records keyed by the `datum` timestamp.
///
/// `datum` is always the first column, a `Datetime` sorted ascending with no
/// duplicates. The timestamps are also kept decoded so that callers can
/// slice them without touching the frame. Other columns keep their insertion
/// order, so written files match the source export followed by derived
/// columns.
#[derive(Debug, Clone)]
pub struct SalesFrame {
    data: DataFrame,
    timestamps: Vec<NaiveDateTime>,
}

impl SalesFrame {
    /// Create a frame with only the timestamp column.
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Result<Self> {
        Self::from_columns(timestamps, Vec::new())
    }

    /// Build a frame from timestamps and named columns.
    pub fn from_columns(timestamps: Vec<NaiveDateTime>, columns: Vec<Column>) -> Result<Self> {
        let mut all = Vec::with_capacity(columns.len() + 1);
        all.push(datetime_column(DATE_COLUMN, &timestamps)?);
        for column in columns {
            if column.len() != timestamps.len() {
                return Err(SalesError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: column.len(),
                });
            }
            all.push(column);
        }
        Self::from_dataframe(DataFrame::new(all)?)
    }

    /// Wrap a `DataFrame` holding a `datum` datetime column.
    ///
    /// Rows are sorted by timestamp; duplicate or null timestamps are rejected.
    pub fn from_dataframe(data: DataFrame) -> Result<Self> {
        let datum = data
            .column(DATE_COLUMN)
            .map_err(|_| SalesError::MissingColumn(DATE_COLUMN.to_string()))?;
        if !matches!(datum.dtype(), DataType::Datetime(_, _)) {
            return Err(SalesError::ColumnType {
                name: DATE_COLUMN.to_string(),
                expected: "datetime",
            });
        }

        let mut order = vec![DATE_COLUMN.to_string()];
        order.extend(
            data.get_column_names_str()
                .into_iter()
                .filter(|name| *name != DATE_COLUMN)
                .map(str::to_string),
        );
        let data = data
            .select(order)?
            .sort([DATE_COLUMN], SortMultipleOptions::default())?;

        let timestamps = decode_timestamps(data.column(DATE_COLUMN)?)?;
        if let Some(w) = timestamps.windows(2).find(|w| w[0] == w[1]) {
            return Err(SalesError::Timestamp(format!("duplicate timestamp {}", w[0])));
        }
        Ok(Self { data, timestamps })
    }

    /// The underlying table, `datum` included.
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn into_data(self) -> DataFrame {
        self.data
    }

    pub fn lazy(&self) -> LazyFrame {
        self.data.clone().lazy()
    }

    /// Number of records.
    pub fn height(&self) -> usize {
        self.data.height()
    }

    /// Number of columns including `datum`.
    pub fn width(&self) -> usize {
        self.data.width()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Column names in order, excluding `datum`.
    pub fn column_names(&self) -> Vec<String> {
        self.columns().map(|c| c.name().to_string()).collect()
    }

    /// Names of the numeric columns, in order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns()
            .filter(|c| is_numeric(c.dtype()))
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Columns in order, excluding `datum`.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.data
            .get_columns()
            .iter()
            .filter(|c| c.name().as_str() != DATE_COLUMN)
    }

    pub fn has_column(&self, name: &str) -> bool {
        name != DATE_COLUMN && self.data.column(name).is_ok()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        if name == DATE_COLUMN {
            return Err(SalesError::ColumnType {
                name: name.to_string(),
                expected: "a value column",
            });
        }
        self.data
            .column(name)
            .map_err(|_| SalesError::MissingColumn(name.to_string()))
    }

    /// Missing cells in a column.
    pub fn null_count(&self, name: &str) -> Result<usize> {
        Ok(self.column(name)?.null_count())
    }

    /// Numeric column as `f64` cells, `None` marking a missing cell.
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.column(name)?;
        if !is_numeric(column.dtype()) {
            return Err(SalesError::ColumnType {
                name: name.to_string(),
                expected: "numeric",
            });
        }
        let values = column.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().collect())
    }

    /// Numeric column with missing cells as `NaN`.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self
            .numeric(name)?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    /// Text column, `None` marking a missing cell.
    pub fn categorical(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.column(name)?;
        if column.dtype() != &DataType::String {
            return Err(SalesError::ColumnType {
                name: name.to_string(),
                expected: "categorical",
            });
        }
        Ok(column
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    /// Insert or replace a column, keeping the position of an existing one.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if column.len() != self.height() {
            return Err(SalesError::DimensionMismatch {
                expected: self.height(),
                got: column.len(),
            });
        }
        if column.name().as_str() == DATE_COLUMN {
            return Err(SalesError::InvalidParameter(format!(
                "{DATE_COLUMN} cannot be replaced"
            )));
        }
        self.data.with_column(column)?;
        Ok(())
    }

    /// Evaluate row-wise expressions and insert their outputs as columns.
    pub fn with_columns(&mut self, exprs: &[Expr]) -> Result<()> {
        let data = self.lazy().with_columns(exprs).collect()?;
        if data.height() != self.height() {
            return Err(SalesError::DimensionMismatch {
                expected: self.height(),
                got: data.height(),
            });
        }
        self.data = data;
        Ok(())
    }

    /// Keep rows where `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> Result<SalesFrame> {
        if mask.len() != self.height() {
            return Err(SalesError::DimensionMismatch {
                expected: self.height(),
                got: mask.len(),
            });
        }
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        Self::from_dataframe(self.data.filter(&mask)?)
    }

    /// Rows with `start <= datum <= end`.
    pub fn between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<SalesFrame> {
        let data = self
            .lazy()
            .filter(
                col(DATE_COLUMN)
                    .gt_eq(lit(start))
                    .and(col(DATE_COLUMN).lt_eq(lit(end))),
            )
            .collect()?;
        Self::from_dataframe(data)
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> SalesFrame {
        let n = n.min(self.height());
        SalesFrame {
            data: self.data.head(Some(n)),
            timestamps: self.timestamps[..n].to_vec(),
        }
    }
}

impl PartialEq for SalesFrame {
    fn eq(&self, other: &Self) -> bool {
        self.data.equals_missing(&other.data)
    }
}

impl fmt::Display for SalesFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

/// Build a `Datetime` column from naive timestamps.
pub fn datetime_column(name: &str, timestamps: &[NaiveDateTime]) -> Result<Column> {
    let micros: Vec<i64> = timestamps
        .iter()
        .map(|t| t.and_utc().timestamp_micros())
        .collect();
    Ok(Column::new(name.into(), micros).cast(&DataType::Datetime(DATE_UNIT, None))?)
}

/// Decode a `Datetime` column. Null cells are an error.
pub fn decode_timestamps(column: &Column) -> Result<Vec<NaiveDateTime>> {
    let micros = column
        .cast(&DataType::Datetime(DATE_UNIT, None))?
        .cast(&DataType::Int64)?;
    micros
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.and_then(DateTime::from_timestamp_micros)
                .map(|t| t.naive_utc())
                .ok_or_else(|| SalesError::Timestamp(format!("missing timestamp at row {}", row + 1)))
        })
        .collect()
}
