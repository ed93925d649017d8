//! Charts of the processed daily data plus a rolling-average projection.

use super::preprocessing::PROCESSED_DATE_FORMAT;
use super::render;
use crate::config::PipelineConfig;
use crate::core::calendar::{month_starts_after, weekday_name, WEEKDAYS};
use crate::core::{Forecast, TimeSeries};
use crate::data::{
    aggregate, correlation_matrix, load_sales_with_format, monthly_totals, CorrelationMatrix,
    GroupKey, GroupLabel, GroupSummary, SalesFrame, Statistic, DRUG_COLUMNS, TOTAL_SALES,
};
use crate::error::{Result, SalesError};
use crate::models::{Forecaster, SimpleMovingAverage};
use crate::plot::{
    BarChart, BoxPlot, ChartWriter, Heatmap, Histogram, LineChart, LineStyle, Series,
};
use crate::transform::rolling_mean;
use crate::utils::stats::{finite, mean};
use chrono::Datelike;
use log::info;
use std::collections::BTreeMap;

/// What the visualization pipeline computed.
#[derive(Debug, Clone)]
pub struct VisualizationReport {
    /// Mean of each drug column.
    pub drug_means: Vec<(String, f64)>,
    /// `Total_Sales` grouped Monday..Sunday.
    pub weekday_totals: Vec<Vec<f64>>,
    pub correlations: CorrelationMatrix,
    pub season_means: Vec<GroupSummary>,
    /// `Total_Sales` summed per calendar month.
    pub monthly: TimeSeries,
    /// Trailing rolling mean of `monthly`.
    pub rolling: Vec<f64>,
    /// Flat projection at the mean of the last months, stamped at month starts.
    pub projection: Forecast,
}

/// Read `config.processed_path` and chart it.
pub fn run(config: &PipelineConfig, charts: Option<&ChartWriter>) -> Result<VisualizationReport> {
    info!("visualizing {}", config.processed_path.display());
    let frame = load_sales_with_format(&config.processed_path, PROCESSED_DATE_FORMAT)?;
    visualize(&frame, config, charts)
}

/// Chart an already cleaned frame holding the drug and `Total_Sales` columns.
pub fn visualize(
    frame: &SalesFrame,
    config: &PipelineConfig,
    charts: Option<&ChartWriter>,
) -> Result<VisualizationReport> {
    let totals = frame.numeric_values(TOTAL_SALES)?;

    let histogram = Histogram::new(
        "total_sales_distribution",
        "Distribution of Daily Total Sales",
        totals.clone(),
    )
    .with_x_label("Total Sales");
    render(charts, &histogram)?;

    render(charts, &monthly_trend(frame)?)?;

    let drug_means: Vec<(String, f64)> = DRUG_COLUMNS
        .iter()
        .map(|&d| Ok((d.to_string(), mean(&finite(&frame.numeric_values(d)?)))))
        .collect::<Result<_>>()?;
    let (drugs, means): (Vec<String>, Vec<f64>) = drug_means.iter().cloned().unzip();
    let chart = BarChart::new(
        "average_sales_by_drug",
        "Average Sales by Drug Category",
        drugs,
        means,
    )?
    .with_labels("Drug", "Average Daily Sales");
    render(charts, &chart)?;

    let weekday_totals = weekday_groups(frame, &totals);
    let chart = BoxPlot::new(
        "sales_by_weekday",
        "Sales Distribution by Weekday",
        WEEKDAYS.iter().map(|d| weekday_name(*d).to_string()).collect(),
        weekday_totals.clone(),
    )?
    .with_labels("Weekday", "Total Sales");
    render(charts, &chart)?;

    let mut columns: Vec<&str> = DRUG_COLUMNS.to_vec();
    columns.push(TOTAL_SALES);
    let correlations = correlation_matrix(frame, &columns)?;
    let chart = Heatmap::new(
        "correlation_heatmap",
        "Correlation Heatmap of Drug Categories and Total Sales",
        correlations.labels.clone(),
        correlations.values.clone(),
    )?;
    render(charts, &chart)?;

    let season_means = aggregate(frame, TOTAL_SALES, GroupKey::Season, Statistic::Mean)?;
    let (seasons, values): (Vec<String>, Vec<f64>) = season_means
        .iter()
        .map(|g| (g.label.to_string(), g.value))
        .unzip();
    let chart = BarChart::new(
        "average_sales_by_season",
        "Average Sales by Season",
        seasons,
        values,
    )?
    .with_labels("Season", "Total Sales");
    render(charts, &chart)?;

    let monthly = monthly_totals(frame, TOTAL_SALES)?;
    let rolling = rolling_mean(monthly.values(), config.rolling_window, 1);
    let chart = LineChart::new("monthly_rolling_average", "Monthly Sales with Rolling Average")
        .with_labels("Date", "Total Sales")
        .with_series(
            Series::dated("Actual Sales", monthly.timestamps(), monthly.values())
                .with_style(LineStyle::Markers),
        )
        .with_series(
            Series::dated(
                format!("{}-Month Rolling Avg", config.rolling_window),
                monthly.timestamps(),
                &rolling,
            )
            .with_style(LineStyle::Dashed)
            .with_color(3),
        )
        .with_date_axis();
    render(charts, &chart)?;

    let projection = project(&monthly, config.rolling_window, config.projection_months)?;
    info!(
        "projecting {} months at {:.2}",
        projection.horizon(),
        projection.values().first().copied().unwrap_or(f64::NAN)
    );
    let chart = LineChart::new(
        "sales_projection",
        "Sales Forecast (Simple Moving Avg Projection)",
    )
    .with_labels("Date", "Total Sales")
    .with_series(
        Series::dated("Historical Sales", monthly.timestamps(), monthly.values())
            .with_style(LineStyle::Markers),
    )
    .with_series(
        Series::dated(
            format!("Forecast (Next {} Months)", config.projection_months),
            projection.timestamps(),
            projection.values(),
        )
        .with_style(LineStyle::Dashed)
        .with_color(3),
    )
    .with_date_axis();
    render(charts, &chart)?;

    Ok(VisualizationReport {
        drug_means,
        weekday_totals,
        correlations,
        season_means,
        monthly,
        rolling,
        projection,
    })
}

/// Flat forecast of `months` month starts at the mean of the last `window` values.
pub fn project(monthly: &TimeSeries, window: usize, months: usize) -> Result<Forecast> {
    let last = monthly.last_timestamp().ok_or(SalesError::EmptyData)?;
    let mut model = SimpleMovingAverage::new(window);
    model.fit(monthly)?;
    model
        .predict(months)?
        .with_timestamps(month_starts_after(last, months))
}

/// One line per year over calendar months, from monthly sums of `Total_Sales`.
fn monthly_trend(frame: &SalesFrame) -> Result<LineChart> {
    let sums = aggregate(frame, TOTAL_SALES, GroupKey::YearMonth, Statistic::Sum)?;

    let mut by_year: BTreeMap<i32, Vec<(f64, f64)>> = BTreeMap::new();
    for group in sums {
        if let GroupLabel::YearMonth(year, month) = group.label {
            by_year
                .entry(year)
                .or_default()
                .push((month as f64, group.value));
        }
    }

    let chart = LineChart::new("monthly_sales_trend", "Monthly Total Sales Trend")
        .with_labels("Month", "Total Sales");
    Ok(by_year.into_iter().fold(chart, |chart, (year, points)| {
        chart.with_series(Series::new(year.to_string(), points).with_style(LineStyle::Markers))
    }))
}

fn weekday_groups(frame: &SalesFrame, values: &[f64]) -> Vec<Vec<f64>> {
    let mut groups = vec![Vec::new(); WEEKDAYS.len()];
    for (ts, v) in frame.timestamps().iter().zip(values) {
        if v.is_finite() {
            groups[ts.weekday().num_days_from_monday() as usize].push(*v);
        }
    }
    groups
}
