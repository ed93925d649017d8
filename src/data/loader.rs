//! CSV loading and writing for sales exports.

use crate::core::Granularity;
use crate::data::frame::{SalesFrame, DATE_COLUMN, DATE_UNIT};
use crate::error::{Result, SalesError};
use chrono::NaiveTime;
use log::{debug, info};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::Path;

/// Cell contents treated as missing values.
const MISSING_MARKERS: [&str; 6] = ["NA", "N/A", "NaN", "nan", "null", "NULL"];

const WHITESPACE: &str = " \t\r\n";

/// All four granularities of one sales dataset.
#[derive(Debug, Clone)]
pub struct SalesData {
    pub hourly: SalesFrame,
    pub daily: SalesFrame,
    pub weekly: SalesFrame,
    pub monthly: SalesFrame,
}

impl SalesData {
    pub fn get(&self, granularity: Granularity) -> &SalesFrame {
        match granularity {
            Granularity::Hourly => &self.hourly,
            Granularity::Daily => &self.daily,
            Granularity::Weekly => &self.weekly,
            Granularity::Monthly => &self.monthly,
        }
    }
}

/// Load every granularity from `data_dir` using the conventional file names.
pub fn load_all(data_dir: &Path) -> Result<SalesData> {
    let load = |g: Granularity| -> Result<SalesFrame> {
        let frame = load_sales(&data_dir.join(g.file_name()), g)?;
        info!("{g} -> Rows: {}, Columns: {}", frame.height(), frame.width());
        Ok(frame)
    };

    Ok(SalesData {
        hourly: load(Granularity::Hourly)?,
        daily: load(Granularity::Daily)?,
        weekly: load(Granularity::Weekly)?,
        monthly: load(Granularity::Monthly)?,
    })
}

/// Load a sales export, parsing `datum` with the granularity's format.
pub fn load_sales(path: &Path, granularity: Granularity) -> Result<SalesFrame> {
    load_sales_with_format(path, granularity.date_format())
}

/// Load a sales export, parsing `datum` with an explicit format.
///
/// Rows are sorted by timestamp; duplicate timestamps are rejected.
pub fn load_sales_with_format(path: &Path, date_format: &str) -> Result<SalesFrame> {
    debug!("loading {} (datum format {date_format})", path.display());
    let bytes = fs::read(path)?;
    read_sales(&bytes, date_format)
}

/// Read a sales export from CSV bytes.
///
/// Every column is read as text and trimmed. `datum` is parsed with the
/// single `date_format`; any other column whose present cells all parse as
/// numbers becomes `Float64`, the rest stay text.
pub fn read_sales(bytes: &[u8], date_format: &str) -> Result<SalesFrame> {
    let null_values = MISSING_MARKERS.iter().map(|m| (*m).into()).collect();
    let mut raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default().with_null_values(Some(NullValues::AllColumns(null_values))),
        )
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()?;

    let trimmed: Vec<String> = raw
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    raw.set_column_names(trimmed.as_slice())?;
    if raw.column(DATE_COLUMN).is_err() {
        return Err(SalesError::MissingColumn(DATE_COLUMN.to_string()));
    }

    let strip: Vec<Expr> = trimmed
        .iter()
        .map(|name| col(name.as_str()).str().strip_chars(lit(WHITESPACE)))
        .collect();
    let text = raw.lazy().with_columns(strip).collect()?;

    let mut parsed = parse_dates(&text, date_format)?;
    for name in trimmed.iter().filter(|n| n.as_str() != DATE_COLUMN) {
        let column = parsed.column(name)?;
        if let Ok(numeric) = column.strict_cast(&DataType::Float64) {
            parsed.with_column(numeric)?;
        }
    }

    SalesFrame::from_dataframe(parsed)
}

/// Replace the text `datum` column with parsed timestamps.
///
/// Date-only formats map to midnight. The first unparseable cell is reported
/// with its 1-based data row.
fn parse_dates(text: &DataFrame, date_format: &str) -> Result<DataFrame> {
    let parsed = text
        .clone()
        .lazy()
        .with_column(col(DATE_COLUMN).str().to_datetime(
            Some(DATE_UNIT),
            None,
            StrptimeOptions {
                format: Some(date_format.into()),
                strict: false,
                ..Default::default()
            },
            lit("raise"),
        ))
        .collect()?;

    let raw = text.column(DATE_COLUMN)?.str()?;
    let failed = parsed
        .column(DATE_COLUMN)?
        .as_materialized_series()
        .is_null()
        .into_iter()
        .position(|missing| missing == Some(true));
    if let Some(row) = failed {
        return Err(SalesError::DateParse {
            row: row + 1,
            value: raw.get(row).unwrap_or_default().to_string(),
            format: date_format.to_string(),
        });
    }
    Ok(parsed)
}

/// Write a frame as CSV with `datum` first.
///
/// Timestamps are written as `%Y-%m-%d` when every row falls on midnight.
pub fn write_sales(frame: &SalesFrame, path: &Path) -> Result<()> {
    let date_only = frame.timestamps().iter().all(|ts| ts.time() == NaiveTime::MIN);
    let format = if date_only {
        "%Y-%m-%d"
    } else {
        "%Y-%m-%d %H:%M:%S"
    };

    let mut data = frame.data().clone();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_datetime_format(Some(format.to_string()))
        .finish(&mut data)?;

    info!(
        "wrote {} rows x {} columns to {}",
        frame.height(),
        frame.width(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY: &str = "\
datum,M01AB,M01AE,N02BA,N02BE,N05B,N05C,R03,R06,Year,Month,Hour,Weekday Name
1/3/2014,1,2,3,4,5,6,7,8,2014,1,248,Friday
1/2/2014,0,3.67,3.4,32.4,7,0,0,2,2014,1,248,Thursday
1/4/2014,,2,3,4,5,6,7,8,2014,1,248,
";

    #[test]
    fn reads_and_sorts_daily_export() {
        let frame = read_sales(DAILY.as_bytes(), Granularity::Daily.date_format()).unwrap();
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.width(), 13);

        let ts = frame.timestamps();
        assert!(ts[0] < ts[1] && ts[1] < ts[2]);
        assert_eq!(frame.numeric("N02BE").unwrap()[0], Some(32.4));
    }

    #[test]
    fn infers_column_kinds_and_missing_cells() {
        let frame = read_sales(DAILY.as_bytes(), "%m/%d/%Y").unwrap();
        assert_eq!(frame.column("M01AB").unwrap().dtype(), &DataType::Float64);
        assert_eq!(frame.column("Weekday Name").unwrap().dtype(), &DataType::String);
        assert_eq!(frame.null_count("M01AB").unwrap(), 1);
        assert_eq!(frame.null_count("Weekday Name").unwrap(), 1);
        assert_eq!(frame.numeric_values("Hour").unwrap(), vec![248.0; 3]);
    }

    #[test]
    fn missing_markers_and_padding_are_cleaned() {
        let csv = "datum , N02BE,Weekday Name\n2014-01-31, 4 ,Friday\n2014-02-28,NA, Friday\n";
        let frame = read_sales(csv.as_bytes(), "%Y-%m-%d").unwrap();
        assert_eq!(frame.numeric("N02BE").unwrap(), vec![Some(4.0), None]);
        assert_eq!(
            frame.categorical("Weekday Name").unwrap()[1].as_deref(),
            Some("Friday")
        );
    }

    #[test]
    fn hourly_format_keeps_time() {
        let csv = "datum,N02BE\n1/2/2014 08:00,1\n1/2/2014 09:00,2\n";
        let frame = read_sales(csv.as_bytes(), Granularity::Hourly.date_format()).unwrap();
        assert_eq!(frame.timestamps()[1].format("%H:%M").to_string(), "09:00");
    }

    #[test]
    fn wrong_format_is_a_parse_error() {
        let csv = "datum,N02BE\n2014-01-31,1\n";
        let err = read_sales(csv.as_bytes(), Granularity::Daily.date_format()).unwrap_err();
        match err {
            SalesError::DateParse { row, value, .. } => {
                assert_eq!(row, 1);
                assert_eq!(value, "2014-01-31");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_datum_column_is_reported() {
        let csv = "date,N02BE\n2014-01-31,1\n";
        let err = read_sales(csv.as_bytes(), "%Y-%m-%d").unwrap_err();
        assert!(matches!(err, SalesError::MissingColumn(_)));
    }

    #[test]
    fn duplicate_timestamps_are_rejected() {
        let csv = "datum,N02BE\n2014-01-31,1\n2014-01-31,2\n";
        let err = read_sales(csv.as_bytes(), "%Y-%m-%d").unwrap_err();
        assert!(matches!(err, SalesError::Timestamp(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_sales(Path::new("/nonexistent/salesmonthly.csv"), Granularity::Monthly)
            .unwrap_err();
        assert!(matches!(err, SalesError::Io(_)));
    }

    #[test]
    fn write_then_read_preserves_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let frame = read_sales(DAILY.as_bytes(), "%m/%d/%Y").unwrap();

        write_sales(&frame, &path).unwrap();
        let back = load_sales_with_format(&path, "%Y-%m-%d").unwrap();

        assert_eq!(back.timestamps(), frame.timestamps());
        assert_eq!(back.column_names(), frame.column_names());
        assert_eq!(back.null_count("M01AB").unwrap(), 1);
        assert_eq!(back.numeric("N02BE").unwrap(), frame.numeric("N02BE").unwrap());
    }
}
