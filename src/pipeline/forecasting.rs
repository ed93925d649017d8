//! ARIMA hold-out forecast and additive seasonal forecast of monthly totals.

use super::render;
use crate::config::PipelineConfig;
use crate::core::{Forecast, Granularity, TimeSeries};
use crate::data::{add_total_sales, load_sales, SalesFrame, TOTAL_SALES};
use crate::error::Result;
use crate::models::additive::Toggle;
use crate::models::{
    AdditiveConfig, AdditiveForecast, AdditiveModel, Arima, DatedSeries, Forecaster,
};
use crate::plot::{Band, ChartWriter, ComponentsChart, LineChart, LineStyle, Series};
use crate::utils::{calculate_metrics, AccuracyMetrics};
use log::info;

/// ARIMA fitted on all but the last `test_size` months.
#[derive(Debug, Clone)]
pub struct ArimaReport {
    pub model: String,
    pub train: TimeSeries,
    pub test: TimeSeries,
    /// One point per test month, stamped with the test timestamps.
    pub forecast: Forecast,
    pub accuracy: AccuracyMetrics,
}

#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub total_sales: TimeSeries,
    pub arima: ArimaReport,
    /// History plus `future_periods` month ends.
    pub additive: AdditiveForecast,
}

/// Forecast total sales of the monthly export in `config.data_dir`.
pub fn run(config: &PipelineConfig, charts: Option<&ChartWriter>) -> Result<ForecastReport> {
    let path = config.data_dir.join(Granularity::Monthly.file_name());
    let monthly = load_sales(&path, Granularity::Monthly)?;
    forecast(&monthly, config, charts)
}

/// Forecast total sales of an already loaded monthly frame.
pub fn forecast(
    monthly: &SalesFrame,
    config: &PipelineConfig,
    charts: Option<&ChartWriter>,
) -> Result<ForecastReport> {
    let totals = with_totals(monthly)?;
    let total_sales = TimeSeries::univariate(
        totals.timestamps().to_vec(),
        totals.numeric_values(TOTAL_SALES)?,
    )?
    .with_label(TOTAL_SALES);

    info!("Running ARIMA Forecasting...");
    let arima = arima_holdout(&total_sales, config)?;
    render(charts, &arima_chart(&arima))?;

    info!("Running Prophet-style Forecasting...");
    let history = DatedSeries::from_frame(&totals, TOTAL_SALES)?;
    let additive = additive_forecast(&history, config)?;
    render(charts, &additive_chart(&total_sales, &additive)?)?;
    let components = ComponentsChart::new("additive_components", additive.ds())
        .with_panel("trend", additive.trend())?
        .with_panel("yearly", additive.yearly())?;
    render(charts, &components)?;

    Ok(ForecastReport {
        total_sales,
        arima,
        additive,
    })
}

/// Sum of the drug columns per month as a series labelled `Total_Sales`.
pub fn total_sales_series(monthly: &SalesFrame) -> Result<TimeSeries> {
    let frame = with_totals(monthly)?;
    Ok(TimeSeries::univariate(
        frame.timestamps().to_vec(),
        frame.numeric_values(TOTAL_SALES)?,
    )?
    .with_label(TOTAL_SALES))
}

fn with_totals(monthly: &SalesFrame) -> Result<SalesFrame> {
    let mut frame = monthly.clone();
    add_total_sales(&mut frame)?;
    Ok(frame)
}

/// Fit ARIMA on the training part and forecast the held-out months.
pub fn arima_holdout(series: &TimeSeries, config: &PipelineConfig) -> Result<ArimaReport> {
    let (train, test) = series.train_test_split(config.test_size)?;

    let mut model = Arima::with_order(config.arima_order());
    model.fit(&train)?;
    let forecast = model
        .predict(test.len())?
        .with_timestamps(test.timestamps().to_vec())?;

    let accuracy = calculate_metrics(test.values(), forecast.values())?;
    match accuracy.mape {
        Some(mape) => info!(
            "{} hold-out: MAE={:.3} RMSE={:.3} MAPE={:.2}%",
            model.name(),
            accuracy.mae,
            accuracy.rmse,
            mape
        ),
        None => info!(
            "{} hold-out: MAE={:.3} RMSE={:.3}",
            model.name(),
            accuracy.mae,
            accuracy.rmse
        ),
    }

    Ok(ArimaReport {
        model: model.name().to_string(),
        train,
        test,
        forecast,
        accuracy,
    })
}

/// Fit the additive model with yearly seasonality and predict history plus
/// `config.future_periods` month ends.
pub fn additive_forecast(
    history: &DatedSeries,
    config: &PipelineConfig,
) -> Result<AdditiveForecast> {
    let mut additive_config = AdditiveConfig::new()
        .with_yearly(Toggle::On)
        .with_daily(Toggle::Off);
    if let Some(seed) = config.seed {
        additive_config = additive_config.with_seed(seed);
    }

    let mut model = AdditiveModel::new(additive_config);
    model.fit_dated(history)?;
    let dates = model.make_future_dates(config.future_periods)?;
    let forecast = model.predict(&dates)?;
    info!(
        "additive model: {} rows, seasonalities {:?}",
        forecast.len(),
        forecast.active
    );
    Ok(forecast)
}

fn arima_chart(report: &ArimaReport) -> LineChart {
    LineChart::new("arima_forecast", "ARIMA Forecast of Total Sales")
        .with_labels("Date", "Sales")
        .with_series(Series::dated(
            "Train",
            report.train.timestamps(),
            report.train.values(),
        ))
        .with_series(Series::dated(
            "Test",
            report.test.timestamps(),
            report.test.values(),
        ))
        .with_series(Series::dated(
            "ARIMA Forecast",
            report.forecast.timestamps(),
            report.forecast.values(),
        ))
        .with_date_axis()
}

fn additive_chart(history: &TimeSeries, forecast: &AdditiveForecast) -> Result<LineChart> {
    let ds = forecast.ds();
    let lower: Vec<f64> = forecast.rows.iter().map(|r| r.yhat_lower).collect();
    let upper: Vec<f64> = forecast.rows.iter().map(|r| r.yhat_upper).collect();

    Ok(
        LineChart::new("additive_forecast", "Prophet-style Forecast of Total Sales")
            .with_labels("ds", "y")
            .with_band(Band::dated("uncertainty", &ds, &lower, &upper, 0)?)
            .with_series(
                Series::dated("observed", history.timestamps(), history.values())
                    .with_style(LineStyle::Markers)
                    .with_color(7),
            )
            .with_series(Series::dated("yhat", &ds, &forecast.yhat()).with_color(0))
            .with_date_axis(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::month_start;
    use crate::data::DRUG_COLUMNS;
    use polars::prelude::Column;

    fn monthly_frame(months: usize) -> SalesFrame {
        let ts: Vec<_> = (0..months)
            .map(|i| month_start(2014 + (i / 12) as i32, (i % 12) as u32 + 1).unwrap())
            .collect();
        let columns = DRUG_COLUMNS
            .iter()
            .enumerate()
            .map(|(k, d)| {
                let values: Vec<f64> = (0..months)
                    .map(|i| {
                        let season = (i as f64 * std::f64::consts::TAU / 12.0).sin();
                        50.0 + k as f64 * 5.0 + i as f64 * 0.5 + 8.0 * season
                    })
                    .collect();
                Column::new((*d).into(), values)
            })
            .collect();
        SalesFrame::from_columns(ts, columns).unwrap()
    }

    #[test]
    fn total_series_sums_drugs() {
        let series = total_sales_series(&monthly_frame(3)).unwrap();
        assert_eq!(series.label(), Some(TOTAL_SALES));
        // 8 * 50 + 5 * (0 + ... + 7)
        assert!((series.values()[0] - 540.0).abs() < 1e-9);
    }

    #[test]
    fn additive_history_comes_from_frame_totals() {
        let frame = monthly_frame(36);
        let history = DatedSeries::from_frame(&with_totals(&frame).unwrap(), TOTAL_SALES).unwrap();
        let series = total_sales_series(&frame).unwrap();
        assert_eq!(history.ds(), series.timestamps());
        assert_eq!(history.y(), series.values());

        let config = PipelineConfig::default().with_future_periods(6).with_seed(1);
        let forecast = additive_forecast(&history, &config).unwrap();
        assert_eq!(forecast.len(), 36 + 6);
        assert_eq!(&forecast.ds()[..36], history.ds());
    }

    #[test]
    fn forecasts_have_expected_lengths() {
        let config = PipelineConfig::default().with_seed(3);
        let report = forecast(&monthly_frame(36), &config, None).unwrap();

        assert_eq!(report.arima.train.len(), 24);
        assert_eq!(report.arima.forecast.horizon(), 12);
        assert_eq!(
            report.arima.forecast.timestamps(),
            report.arima.test.timestamps()
        );
        assert_eq!(report.arima.model, "ARIMA(2,1,2)");
        assert!(report.arima.accuracy.mae.is_finite());

        assert_eq!(report.additive.len(), 36 + 24);
        assert_eq!(report.additive.active, vec!["yearly"]);
    }

    #[test]
    fn short_history_is_rejected() {
        let config = PipelineConfig::default();
        assert!(forecast(&monthly_frame(12), &config, None).is_err());
    }
}
