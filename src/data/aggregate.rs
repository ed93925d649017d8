//! Group-by aggregation, descriptive statistics and correlations.

use crate::core::calendar::{month_start, weekday_name, WEEKDAYS};
use crate::core::{Season, TimeSeries};
use crate::data::frame::SalesFrame;
use crate::error::{Result, SalesError};
use crate::utils::stats::{correlation, finite, mean, quantile, std_dev};
use chrono::{Datelike, NaiveDateTime};
use polars::prelude::*;
use std::fmt;

const KEY: &str = "key";
const VALUE: &str = "value";
const COUNT: &str = "count";

/// Calendar key rows are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Year,
    Month,
    Weekday,
    Season,
    YearMonth,
}

/// Reduction applied to each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Sum,
}

impl Statistic {
    fn expr(self, column: &str) -> Expr {
        match self {
            Statistic::Mean => col(column).mean(),
            Statistic::Sum => col(column).sum(),
        }
    }
}

/// Value of a group key. Ordering follows chart order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GroupLabel {
    Year(i32),
    Month(u32),
    /// Days from Monday (0) to Sunday (6).
    Weekday(u32),
    Season(Season),
    YearMonth(i32, u32),
}

impl GroupLabel {
    fn of(key: GroupKey, ts: &NaiveDateTime) -> GroupLabel {
        match key {
            GroupKey::Year => GroupLabel::Year(ts.year()),
            GroupKey::Month => GroupLabel::Month(ts.month()),
            GroupKey::Weekday => GroupLabel::Weekday(ts.weekday().num_days_from_monday()),
            GroupKey::Season => {
                GroupLabel::Season(Season::from_month(ts.month()).unwrap_or(Season::Winter))
            }
            GroupKey::YearMonth => GroupLabel::YearMonth(ts.year(), ts.month()),
        }
    }

    /// Integer code that sorts in label order.
    fn code(&self) -> i64 {
        match *self {
            GroupLabel::Year(y) => y as i64,
            GroupLabel::Month(m) | GroupLabel::Weekday(m) => m as i64,
            GroupLabel::Season(s) => Season::ALL.iter().position(|x| *x == s).unwrap_or(0) as i64,
            GroupLabel::YearMonth(y, m) => y as i64 * 12 + (m as i64 - 1),
        }
    }

    fn from_code(key: GroupKey, code: i64) -> Option<GroupLabel> {
        Some(match key {
            GroupKey::Year => GroupLabel::Year(i32::try_from(code).ok()?),
            GroupKey::Month => GroupLabel::Month(u32::try_from(code).ok()?),
            GroupKey::Weekday => GroupLabel::Weekday(u32::try_from(code).ok()?),
            GroupKey::Season => GroupLabel::Season(*Season::ALL.get(usize::try_from(code).ok()?)?),
            GroupKey::YearMonth => GroupLabel::YearMonth(
                i32::try_from(code.div_euclid(12)).ok()?,
                code.rem_euclid(12) as u32 + 1,
            ),
        })
    }
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLabel::Year(y) => write!(f, "{y}"),
            GroupLabel::Month(m) => write!(f, "{m}"),
            GroupLabel::Weekday(d) => f.write_str(weekday_name(WEEKDAYS[*d as usize % 7])),
            GroupLabel::Season(s) => f.write_str(s.label()),
            GroupLabel::YearMonth(y, m) => write!(f, "{y}-{m:02}"),
        }
    }
}

/// One aggregated group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub label: GroupLabel,
    pub value: f64,
    /// Rows with a present value in the group.
    pub count: usize,
}

/// Aggregate a numeric column by a calendar key.
///
/// Missing cells are skipped. Groups without present values are omitted;
/// the result is ordered by key.
pub fn aggregate(
    frame: &SalesFrame,
    column: &str,
    key: GroupKey,
    statistic: Statistic,
) -> Result<Vec<GroupSummary>> {
    let codes: Vec<i64> = frame
        .timestamps()
        .iter()
        .map(|ts| GroupLabel::of(key, ts).code())
        .collect();
    let table = DataFrame::new(vec![
        Column::new(KEY.into(), codes),
        Column::new(VALUE.into(), frame.numeric(column)?),
    ])?;

    let grouped = table
        .lazy()
        .filter(col(VALUE).is_not_null())
        .group_by([col(KEY)])
        .agg([
            statistic.expr(VALUE).alias(VALUE),
            len().cast(DataType::Int64).alias(COUNT),
        ])
        .sort([KEY], SortMultipleOptions::default())
        .collect()?;

    let keys = grouped.column(KEY)?.i64()?;
    let values = grouped.column(VALUE)?.f64()?;
    let counts = grouped.column(COUNT)?.i64()?;

    keys.into_iter()
        .zip(values.into_iter())
        .zip(counts.into_iter())
        .map(|((code, value), count)| {
            let label = code
                .and_then(|c| GroupLabel::from_code(key, c))
                .ok_or_else(|| SalesError::ComputationError(format!("bad group key {code:?}")))?;
            Ok(GroupSummary {
                label,
                value: value.unwrap_or(f64::NAN),
                count: count.unwrap_or(0) as usize,
            })
        })
        .collect()
}

/// Descriptive statistics of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "count={} mean={:.3} std={:.3} min={:.3} 25%={:.3} 50%={:.3} 75%={:.3} max={:.3}",
            self.count,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max
        )
    }
}

/// Summarise the non-NaN values of a slice.
pub fn describe(values: &[f64]) -> Result<Summary> {
    let values = finite(values);
    if values.is_empty() {
        return Err(SalesError::EmptyData);
    }

    Ok(Summary {
        count: values.len(),
        mean: mean(&values),
        std: std_dev(&values),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

/// Describe every numeric column of a frame, in column order.
///
/// Columns without any present value are skipped.
pub fn describe_frame(frame: &SalesFrame) -> Result<Vec<(String, Summary)>> {
    let mut summaries = Vec::new();
    for name in frame.numeric_column_names() {
        match describe(&frame.numeric_values(&name)?) {
            Ok(summary) => summaries.push((name, summary)),
            Err(SalesError::EmptyData) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(summaries)
}

/// Square matrix of Pearson correlations between named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major, `labels.len()` squared entries.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == row)?;
        let j = self.labels.iter().position(|l| l == col)?;
        Some(self.values[i][j])
    }
}

/// Present cells of two columns on the rows where both are present.
fn complete_pairs(frame: &SalesFrame, a: &str, b: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let pairs = frame
        .lazy()
        .select([
            col(a).cast(DataType::Float64).alias("x"),
            col(b).cast(DataType::Float64).alias("y"),
        ])
        .filter(col("x").is_not_null().and(col("y").is_not_null()))
        .collect()?;
    let x = pairs.column("x")?.f64()?.into_no_null_iter().collect();
    let y = pairs.column("y")?.f64()?.into_no_null_iter().collect();
    Ok((x, y))
}

/// Pairwise correlations over rows where both cells are present.
pub fn correlation_matrix(frame: &SalesFrame, columns: &[&str]) -> Result<CorrelationMatrix> {
    for &name in columns {
        frame.numeric(name)?;
    }

    let k = columns.len();
    let mut values = vec![vec![f64::NAN; k]; k];
    for i in 0..k {
        let present = frame.height() - frame.null_count(columns[i])?;
        values[i][i] = if present >= 2 { 1.0 } else { f64::NAN };
        for j in (i + 1)..k {
            let (x, y) = complete_pairs(frame, columns[i], columns[j])?;
            let r = correlation(&x, &y);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        labels: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

/// Sum a column per calendar month, stamped at the first day of the month.
pub fn monthly_totals(frame: &SalesFrame, column: &str) -> Result<TimeSeries> {
    let groups = aggregate(frame, column, GroupKey::YearMonth, Statistic::Sum)?;

    let mut timestamps = Vec::with_capacity(groups.len());
    let mut values = Vec::with_capacity(groups.len());
    for group in groups {
        let GroupLabel::YearMonth(year, month) = group.label else {
            continue;
        };
        let ts = month_start(year, month).ok_or_else(|| {
            SalesError::Timestamp(format!("invalid month {year}-{month}"))
        })?;
        timestamps.push(ts);
        values.push(group.value);
    }

    Ok(TimeSeries::univariate(timestamps, values)?.with_label(column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::midnight;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn frame(dates: &[(i32, u32, u32)], values: &[Option<f64>]) -> SalesFrame {
        let ts = dates
            .iter()
            .map(|&(y, m, d)| midnight(NaiveDate::from_ymd_opt(y, m, d).unwrap()))
            .collect();
        SalesFrame::from_columns(ts, vec![Column::new("Total_Sales".into(), values)]).unwrap()
    }

    #[test]
    fn mean_by_year_skips_missing() {
        let f = frame(
            &[(2014, 1, 1), (2014, 6, 1), (2015, 1, 1), (2016, 1, 1)],
            &[Some(2.0), Some(4.0), Some(10.0), None],
        );
        let groups = aggregate(&f, "Total_Sales", GroupKey::Year, Statistic::Mean).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, GroupLabel::Year(2014));
        assert_relative_eq!(groups[0].value, 3.0);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn weekday_groups_start_on_monday() {
        // 2017-01-01 is a Sunday, 2017-01-02 a Monday
        let f = frame(&[(2017, 1, 1), (2017, 1, 2)], &[Some(1.0), Some(2.0)]);
        let groups = aggregate(&f, "Total_Sales", GroupKey::Weekday, Statistic::Sum).unwrap();
        assert_eq!(groups[0].label.to_string(), "Monday");
        assert_eq!(groups[1].label.to_string(), "Sunday");
    }

    #[test]
    fn season_groups_follow_chart_order() {
        let f = frame(
            &[(2017, 1, 1), (2017, 4, 1), (2017, 7, 1), (2017, 10, 1), (2017, 12, 1)],
            &[Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)],
        );
        let groups = aggregate(&f, "Total_Sales", GroupKey::Season, Statistic::Sum).unwrap();
        let labels: Vec<String> = groups.iter().map(|g| g.label.to_string()).collect();
        assert_eq!(labels, ["Winter", "Spring", "Summer", "Fall"]);
        assert_relative_eq!(groups[0].value, 6.0);
    }

    #[test]
    fn year_month_groups_cross_years_in_order() {
        let f = frame(
            &[(2016, 12, 5), (2017, 1, 3), (2016, 12, 20)],
            &[Some(1.0), Some(4.0), Some(2.0)],
        );
        let groups = aggregate(&f, "Total_Sales", GroupKey::YearMonth, Statistic::Sum).unwrap();
        assert_eq!(groups[0].label, GroupLabel::YearMonth(2016, 12));
        assert_relative_eq!(groups[0].value, 3.0);
        assert_eq!(groups[1].label, GroupLabel::YearMonth(2017, 1));
    }

    #[test]
    fn describe_reports_quartiles() {
        let s = describe(&[4.0, 1.0, 3.0, 2.0, f64::NAN]).unwrap();
        assert_eq!(s.count, 4);
        assert_relative_eq!(s.mean, 2.5);
        assert_relative_eq!(s.q25, 1.75);
        assert_relative_eq!(s.median, 2.5);
        assert_relative_eq!(s.q75, 3.25);
        assert_relative_eq!(s.min, 1.0);
        assert_relative_eq!(s.max, 4.0);
        assert!(describe(&[f64::NAN]).is_err());
    }

    #[test]
    fn describe_frame_covers_numeric_columns_only() {
        let ts: Vec<_> = (1..=3)
            .map(|d| midnight(NaiveDate::from_ymd_opt(2017, 1, d).unwrap()))
            .collect();
        let f = SalesFrame::from_columns(
            ts,
            vec![
                Column::new("R03".into(), &[1.0, 2.0, 3.0]),
                Column::new("Weekday".into(), &["Sunday", "Monday", "Tuesday"]),
                Column::new("Hour".into(), &[None::<f64>, None, None]),
                Column::new("Year".into(), &[2017i32, 2017, 2017]),
            ],
        )
        .unwrap();

        let described = describe_frame(&f).unwrap();
        let names: Vec<&str> = described.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["R03", "Year"]);
        assert_relative_eq!(described[1].1.mean, 2017.0);
    }

    #[test]
    fn correlation_matrix_is_symmetric() {
        let ts: Vec<_> = (1..=4)
            .map(|d| midnight(NaiveDate::from_ymd_opt(2017, 1, d).unwrap()))
            .collect();
        let f = SalesFrame::from_columns(
            ts,
            vec![
                Column::new("a".into(), &[1.0, 2.0, 3.0, 4.0]),
                Column::new("b".into(), &[2.0, 4.0, 6.0, 8.1]),
                Column::new("c".into(), &[4.0, 3.0, 2.0, 1.0]),
            ],
        )
        .unwrap();

        let m = correlation_matrix(&f, &["a", "b", "c"]).unwrap();
        assert_relative_eq!(m.get("a", "a").unwrap(), 1.0);
        assert_relative_eq!(m.get("a", "c").unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(m.get("a", "b"), m.get("b", "a"));
        assert!(m.get("a", "z").is_none());
    }

    #[test]
    fn correlation_uses_rows_where_both_are_present() {
        let ts: Vec<_> = (1..=4)
            .map(|d| midnight(NaiveDate::from_ymd_opt(2017, 1, d).unwrap()))
            .collect();
        let f = SalesFrame::from_columns(
            ts,
            vec![
                Column::new("a".into(), &[Some(1.0), Some(2.0), Some(3.0), Some(100.0)]),
                Column::new("b".into(), &[Some(1.0), Some(2.0), Some(3.0), None]),
            ],
        )
        .unwrap();
        let m = correlation_matrix(&f, &["a", "b"]).unwrap();
        assert_relative_eq!(m.get("a", "b").unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn monthly_totals_sum_each_month() {
        let f = frame(
            &[(2017, 1, 1), (2017, 1, 15), (2017, 2, 3), (2017, 4, 30)],
            &[Some(1.0), Some(2.0), Some(5.0), Some(7.0)],
        );
        let series = monthly_totals(&f, "Total_Sales").unwrap();
        assert_eq!(series.values(), &[3.0, 5.0, 7.0]);
        assert_eq!(
            series.timestamps()[2],
            midnight(NaiveDate::from_ymd_opt(2017, 4, 1).unwrap())
        );
        assert_eq!(series.label(), Some("Total_Sales"));
    }
}
