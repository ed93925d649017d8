//! Cleaning of raw sales tables: imputation, derived columns and outliers.

use crate::data::frame::{SalesFrame, DATE_COLUMN, DRUG_COLUMNS, TOTAL_SALES, Z_SCORE};
use crate::detection::{detect_outliers, OutlierConfig};
use crate::error::Result;
use crate::utils::stats::{finite, mean};
use log::{debug, info, warn};
use polars::prelude::*;

const COUNT: &str = "count";

/// What imputation found and did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImputationReport {
    /// Missing-cell count per column before imputation, in column order.
    pub missing_before: Vec<(String, usize)>,
    /// Columns left with missing cells because they held no values at all.
    pub unfilled: Vec<String>,
}

impl ImputationReport {
    pub fn total_missing(&self) -> usize {
        self.missing_before.iter().map(|(_, n)| n).sum()
    }
}

/// Rows split by the z-score threshold on total sales.
#[derive(Debug, Clone)]
pub struct OutlierSplit {
    /// Rows with `|z| > threshold`.
    pub flagged: SalesFrame,
    /// Rows with `|z| <= threshold`.
    pub retained: SalesFrame,
    pub threshold: f64,
}

/// Output of [`clean`].
#[derive(Debug, Clone)]
pub struct CleanedSales {
    /// Every row, with derived columns and `z_score_sales`.
    pub full: SalesFrame,
    pub imputation: ImputationReport,
    pub outliers: OutlierSplit,
}

/// Fill missing cells in place.
///
/// Numeric columns take the mean of their present values. Text columns
/// take their most frequent value; ties go to the lexicographically smallest.
pub fn impute_missing(frame: &mut SalesFrame) -> Result<ImputationReport> {
    let mut report = ImputationReport::default();
    let mut fills = Vec::new();

    for column in frame.columns() {
        let name = column.name().as_str();
        let missing = column.null_count();
        report.missing_before.push((name.to_string(), missing));
        if missing == 0 {
            continue;
        }

        if column.dtype() == &DataType::String {
            let Some(fill) = mode(frame, name)? else {
                report.unfilled.push(name.to_string());
                continue;
            };
            debug!("{name}: filling {missing} cells with mode {fill:?}");
            fills.push(col(name).fill_null(lit(fill)));
        } else {
            let Some(fill) = column.as_materialized_series().mean() else {
                report.unfilled.push(name.to_string());
                continue;
            };
            debug!("{name}: filling {missing} cells with mean {fill:.4}");
            fills.push(col(name).cast(DataType::Float64).fill_null(lit(fill)));
        }
    }

    if !fills.is_empty() {
        frame.with_columns(&fills)?;
    }
    if !report.unfilled.is_empty() {
        warn!("columns without any values: {:?}", report.unfilled);
    }
    Ok(report)
}

/// Most frequent present value of a text column; ties resolve to the
/// smallest value.
pub fn mode(frame: &SalesFrame, name: &str) -> Result<Option<String>> {
    let counts = frame
        .lazy()
        .select([col(name)])
        .filter(col(name).is_not_null())
        .group_by([col(name)])
        .agg([len().alias(COUNT)])
        .sort(
            [COUNT, name],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(1)
        .collect()?;

    Ok(counts.column(name)?.str()?.get(0).map(str::to_string))
}

/// Add `Year`, `Month`, `Day`, `Weekday` and `Quarter` from `datum`.
///
/// Existing columns with these names are overwritten.
pub fn add_calendar_fields(frame: &mut SalesFrame) -> Result<()> {
    let datum = || col(DATE_COLUMN).dt();
    frame.with_columns(&[
        datum().year().alias("Year"),
        datum().month().alias("Month"),
        datum().day().alias("Day"),
        datum().strftime("%A").alias("Weekday"),
        datum().quarter().alias("Quarter"),
    ])
}

/// Row-wise sum of the drug columns, missing cells counting as zero.
fn total_expr() -> Expr {
    DRUG_COLUMNS
        .iter()
        .map(|drug| col(*drug).cast(DataType::Float64).fill_null(lit(0.0)))
        .reduce(|acc, next| acc + next)
        .unwrap_or_else(|| lit(0.0))
}

fn require_drug_columns(frame: &SalesFrame) -> Result<()> {
    for drug in DRUG_COLUMNS {
        frame.column(drug)?;
    }
    Ok(())
}

/// Sum of the drug columns per row. Missing cells count as zero.
pub fn total_sales(frame: &SalesFrame) -> Result<Vec<f64>> {
    require_drug_columns(frame)?;
    let totals = frame
        .lazy()
        .select([total_expr().alias(TOTAL_SALES)])
        .collect()?;
    Ok(totals
        .column(TOTAL_SALES)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect())
}

/// Add (or recompute) the `Total_Sales` column.
pub fn add_total_sales(frame: &mut SalesFrame) -> Result<()> {
    require_drug_columns(frame)?;
    frame.with_columns(&[total_expr().alias(TOTAL_SALES)])
}

/// Add `<DRUG>_Share` columns: each drug's fraction of total sales.
///
/// A row with zero total sales gets a share of `0.0` for every drug.
pub fn add_share_columns(frame: &mut SalesFrame) -> Result<()> {
    require_drug_columns(frame)?;
    let shares: Vec<Expr> = DRUG_COLUMNS
        .iter()
        .map(|drug| {
            when(total_expr().eq(lit(0.0)))
                .then(lit(0.0))
                .otherwise(col(*drug).cast(DataType::Float64) / total_expr())
                .alias(format!("{drug}_Share"))
        })
        .collect();
    frame.with_columns(&shares)
}

/// Score total sales against the whole column and split the rows.
///
/// Adds `z_score_sales` to `frame`. Both returned frames carry that column.
pub fn flag_outliers(frame: &mut SalesFrame, threshold: f64) -> Result<OutlierSplit> {
    if !frame.has_column(TOTAL_SALES) {
        add_total_sales(frame)?;
    }
    let totals = frame.numeric_values(TOTAL_SALES)?;
    let result = detect_outliers(&totals, &OutlierConfig::z_score(threshold));

    frame.set_column(Column::new(Z_SCORE.into(), result.scores.as_slice()))?;

    let mask = result.mask();
    let keep: Vec<bool> = mask.iter().map(|flagged| !flagged).collect();
    info!(
        "Outliers detected (|z|>{threshold}): {} of {}",
        result.outlier_count(),
        totals.len()
    );

    Ok(OutlierSplit {
        flagged: frame.filter(&mask)?,
        retained: frame.filter(&keep)?,
        threshold,
    })
}

/// Run the full cleaning chain on a raw table.
pub fn clean(mut frame: SalesFrame, outlier_threshold: f64) -> Result<CleanedSales> {
    let imputation = impute_missing(&mut frame)?;
    info!(
        "imputed {} missing cells across {} columns",
        imputation.total_missing(),
        imputation
            .missing_before
            .iter()
            .filter(|(_, n)| *n > 0)
            .count()
    );

    add_calendar_fields(&mut frame)?;
    add_total_sales(&mut frame)?;
    add_share_columns(&mut frame)?;
    let outliers = flag_outliers(&mut frame, outlier_threshold)?;

    let totals = finite(&frame.numeric_values(TOTAL_SALES)?);
    debug!("mean total sales {:.3}", mean(&totals));

    Ok(CleanedSales {
        full: frame,
        imputation,
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::midnight;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    fn days(n: usize) -> Vec<NaiveDateTime> {
        let base = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        (0..n)
            .map(|i| midnight(base + chrono::Duration::days(i as i64)))
            .collect()
    }

    fn drug_frame(rows: &[[f64; 8]]) -> SalesFrame {
        let columns = DRUG_COLUMNS
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let values: Vec<f64> = rows.iter().map(|r| r[j]).collect();
                Column::new((*name).into(), values)
            })
            .collect();
        SalesFrame::from_columns(days(rows.len()), columns).unwrap()
    }

    #[test]
    fn numeric_imputation_uses_mean() {
        let mut frame = SalesFrame::from_columns(
            days(4),
            vec![Column::new("R03".into(), &[Some(1.0), None, Some(5.0), None])],
        )
        .unwrap();

        let report = impute_missing(&mut frame).unwrap();
        assert_eq!(report.missing_before, vec![("R03".to_string(), 2)]);
        assert_eq!(frame.numeric_values("R03").unwrap(), vec![1.0, 3.0, 5.0, 3.0]);
    }

    #[test]
    fn categorical_imputation_uses_mode_with_sorted_tie_break() {
        let values = [
            Some("Tuesday"),
            Some("Monday"),
            None,
            Some("Tuesday"),
            Some("Monday"),
        ];
        let mut frame = SalesFrame::from_columns(
            days(5),
            vec![Column::new("Weekday Name".into(), &values)],
        )
        .unwrap();
        assert_eq!(
            mode(&frame, "Weekday Name").unwrap().as_deref(),
            Some("Monday")
        );

        impute_missing(&mut frame).unwrap();
        assert_eq!(
            frame.categorical("Weekday Name").unwrap()[2].as_deref(),
            Some("Monday")
        );
    }

    #[test]
    fn mode_prefers_the_most_frequent_value() {
        let frame = SalesFrame::from_columns(
            days(4),
            vec![Column::new("W".into(), &["b", "c", "c", "a"])],
        )
        .unwrap();
        assert_eq!(mode(&frame, "W").unwrap().as_deref(), Some("c"));
    }

    #[test]
    fn all_missing_column_is_reported() {
        let mut frame = SalesFrame::from_columns(
            days(2),
            vec![Column::new("Hour".into(), &[None::<f64>, None])],
        )
        .unwrap();
        let report = impute_missing(&mut frame).unwrap();
        assert_eq!(report.unfilled, vec!["Hour".to_string()]);
        assert_eq!(frame.null_count("Hour").unwrap(), 2);
    }

    #[test]
    fn calendar_fields_follow_datum() {
        let mut frame = SalesFrame::new(days(2)).unwrap();
        add_calendar_fields(&mut frame).unwrap();
        // 2017-01-01 was a Sunday
        assert_eq!(
            frame.categorical("Weekday").unwrap()[0].as_deref(),
            Some("Sunday")
        );
        assert_eq!(frame.numeric_values("Day").unwrap(), vec![1.0, 2.0]);
        assert_eq!(frame.numeric_values("Quarter").unwrap(), vec![1.0, 1.0]);
        assert_eq!(frame.numeric_values("Year").unwrap(), vec![2017.0, 2017.0]);
        assert_eq!(frame.numeric_values("Month").unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn total_and_shares() {
        let mut frame = drug_frame(&[
            [1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0],
            [0.0; 8],
        ]);
        add_total_sales(&mut frame).unwrap();
        add_share_columns(&mut frame).unwrap();

        assert_eq!(frame.numeric_values(TOTAL_SALES).unwrap(), vec![10.0, 0.0]);
        assert_relative_eq!(frame.numeric_values("N02BE_Share").unwrap()[0], 0.4);
        assert_eq!(frame.numeric_values("N02BE_Share").unwrap()[1], 0.0);

        let share_sum: f64 = DRUG_COLUMNS
            .iter()
            .map(|d| frame.numeric_values(&format!("{d}_Share")).unwrap()[0])
            .sum();
        assert_relative_eq!(share_sum, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn total_requires_every_drug() {
        let frame = SalesFrame::new(days(1)).unwrap();
        assert!(matches!(
            total_sales(&frame),
            Err(crate::SalesError::MissingColumn(_))
        ));
    }

    #[test]
    fn outlier_split_covers_every_row() {
        let mut rows = vec![[1.0; 8]; 40];
        rows[7] = [50.0; 8];
        let mut frame = drug_frame(&rows);

        let split = flag_outliers(&mut frame, 3.0).unwrap();
        assert_eq!(split.flagged.height(), 1);
        assert_eq!(split.retained.height(), 39);
        assert_eq!(split.flagged.timestamps()[0], frame.timestamps()[7]);
        assert!(split.retained.has_column(Z_SCORE));
    }

    #[test]
    fn clean_leaves_no_missing_cells() {
        let mut frame = drug_frame(&[[1.0; 8], [2.0; 8], [3.0; 8]]);
        frame
            .set_column(Column::new("R06".into(), &[Some(1.0), None, Some(3.0)]))
            .unwrap();
        frame
            .set_column(Column::new(
                "Weekday Name".into(),
                &[None, Some("Monday"), None],
            ))
            .unwrap();

        let cleaned = clean(frame, 3.0).unwrap();
        assert!(cleaned.full.columns().all(|c| c.null_count() == 0));
        assert_eq!(cleaned.imputation.total_missing(), 3);
        assert_eq!(
            cleaned.full.numeric_values(TOTAL_SALES).unwrap(),
            vec![8.0, 16.0, 24.0]
        );
    }
}
