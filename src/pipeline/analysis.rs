//! Overview of the four granularities with monthly and daily drug charts.

use super::render;
use crate::config::PipelineConfig;
use crate::core::calendar::midnight;
use crate::core::Granularity;
use crate::data::{
    add_calendar_fields, add_total_sales, aggregate, describe_frame, load_all, GroupKey,
    GroupSummary, SalesData, SalesFrame, Statistic, Summary, DRUG_COLUMNS, TOTAL_SALES,
};
use crate::error::{Result, SalesError};
use crate::plot::{BarChart, ChartWriter, LineChart, Series};
use chrono::NaiveDate;
use log::info;

/// Start and end (inclusive) of the daily close-up.
const DAILY_WINDOW: ((i32, u32, u32), (i32, u32, u32)) = ((2017, 1, 1), (2017, 2, 1));

/// What the analysis pipeline computed.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// `(granularity, rows, columns)`
    pub shapes: Vec<(Granularity, usize, usize)>,
    /// Mean of each drug per year on the monthly data.
    pub yearly_means: Vec<(String, Vec<GroupSummary>)>,
    /// Descriptive statistics of every numeric monthly column, calendar
    /// fields included.
    pub monthly_summary: Vec<(String, Summary)>,
    /// Rows of the daily data inside the close-up window.
    pub daily_window_rows: usize,
    /// Mean monthly total per calendar month.
    pub mean_total_by_month: Vec<GroupSummary>,
}

/// Load every granularity from `config.data_dir` and analyse it.
pub fn run(config: &PipelineConfig, charts: Option<&ChartWriter>) -> Result<AnalysisReport> {
    info!("running analysis on {}", config.data_dir.display());
    let data = load_all(&config.data_dir)?;
    analyze(&data, charts)
}

/// Analyse already loaded data.
pub fn analyze(data: &SalesData, charts: Option<&ChartWriter>) -> Result<AnalysisReport> {
    let shapes = Granularity::ALL
        .iter()
        .map(|&g| {
            let frame = data.get(g);
            info!("Sample Data ({g}):\n{}", frame.head(2));
            (g, frame.height(), frame.width())
        })
        .collect();

    let mut monthly = data.monthly.clone();
    add_calendar_fields(&mut monthly)?;

    let mut yearly_means = Vec::with_capacity(DRUG_COLUMNS.len());
    for drug in DRUG_COLUMNS {
        let groups = aggregate(&monthly, drug, GroupKey::Year, Statistic::Mean)?;
        render(charts, &yearly_bar(drug, &groups)?)?;
        yearly_means.push((drug.to_string(), groups));
    }

    let monthly_summary = describe_frame(&monthly)?;
    info!("Monthly Data Statistics:");
    for (name, summary) in &monthly_summary {
        info!("  {name:<8} {summary}");
    }

    for drug in DRUG_COLUMNS {
        render(charts, &drug_line(&monthly, drug, "monthly")?)?;
    }

    let daily = daily_window(&data.daily)?;
    for drug in DRUG_COLUMNS {
        render(charts, &drug_line(&daily, drug, "daily")?)?;
    }

    add_total_sales(&mut monthly)?;
    let mean_total_by_month = aggregate(&monthly, TOTAL_SALES, GroupKey::Month, Statistic::Mean)?;
    let (categories, values) = split_groups(&mean_total_by_month);
    let chart = BarChart::new(
        "average_total_sales_by_month",
        "Average Total Sales of Drugs by Month",
        categories,
        values,
    )?
    .with_labels("Month", "Total Sales");
    render(charts, &chart)?;

    Ok(AnalysisReport {
        shapes,
        yearly_means,
        monthly_summary,
        daily_window_rows: daily.height(),
        mean_total_by_month,
    })
}

/// Daily rows from 2017-01-01 through 2017-02-01.
pub fn daily_window(daily: &SalesFrame) -> Result<SalesFrame> {
    let day = |(y, m, d): (i32, u32, u32)| {
        NaiveDate::from_ymd_opt(y, m, d)
            .map(midnight)
            .ok_or_else(|| SalesError::Timestamp(format!("invalid date {y}-{m}-{d}")))
    };
    daily.between(day(DAILY_WINDOW.0)?, day(DAILY_WINDOW.1)?)
}

fn split_groups(groups: &[GroupSummary]) -> (Vec<String>, Vec<f64>) {
    groups.iter().map(|g| (g.label.to_string(), g.value)).unzip()
}

fn yearly_bar(drug: &str, groups: &[GroupSummary]) -> Result<BarChart> {
    let (categories, values) = split_groups(groups);
    Ok(BarChart::new(
        format!("yearly_sales_{drug}"),
        format!("Yearly Sales of {drug}"),
        categories,
        values,
    )?
    .with_labels("Year", "Sales"))
}

fn drug_line(frame: &SalesFrame, drug: &str, prefix: &str) -> Result<LineChart> {
    let values = frame.numeric_values(drug)?;
    Ok(LineChart::new(
        format!("{prefix}_sales_{drug}"),
        format!("Monthly Sales of Drug: {drug}"),
    )
    .with_labels("datum", "Sales")
    .with_series(Series::dated(drug, frame.timestamps(), &values))
    .with_date_axis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;

    fn daily_frame() -> SalesFrame {
        let ts: Vec<_> = (0..60)
            .map(|i| midnight(NaiveDate::from_ymd_opt(2016, 12, 15).unwrap()) + chrono::Duration::days(i))
            .collect();
        let n = ts.len();
        let columns = DRUG_COLUMNS
            .iter()
            .map(|d| Column::new((*d).into(), (0..n).map(|i| i as f64).collect::<Vec<_>>()))
            .collect();
        SalesFrame::from_columns(ts, columns).unwrap()
    }

    #[test]
    fn daily_window_is_inclusive() {
        let window = daily_window(&daily_frame()).unwrap();
        // 31 days of January plus February 1st
        assert_eq!(window.height(), 32);
        assert_eq!(
            window.timestamps()[0],
            midnight(NaiveDate::from_ymd_opt(2017, 1, 1).unwrap())
        );
    }

    #[test]
    fn drug_line_is_named_after_granularity() {
        let chart = drug_line(&daily_frame(), "N02BE", "daily").unwrap();
        assert_eq!(chart.name, "daily_sales_N02BE");
        assert_eq!(chart.series[0].points.len(), 60);
        assert!(drug_line(&daily_frame(), "X99", "daily").is_err());
    }

    #[test]
    fn monthly_summary_covers_every_numeric_column() {
        let frame = daily_frame();
        let data = SalesData {
            hourly: frame.clone(),
            daily: frame.clone(),
            weekly: frame.clone(),
            monthly: frame,
        };
        let report = analyze(&data, None).unwrap();
        let names: Vec<&str> = report
            .monthly_summary
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(&names[..8], &DRUG_COLUMNS[..]);
        assert_eq!(&names[8..], ["Year", "Month", "Day", "Quarter"]);
        assert!(!names.contains(&"Weekday"));
    }
}
