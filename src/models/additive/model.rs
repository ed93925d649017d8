//! Additive trend + seasonality model.
//!
//! `y(t) = g(t) + s_yearly(t) + s_weekly(t) + s_daily(t) + e(t)`
//!
//! The trend `g` is piecewise linear with potential changepoints in the
//! first part of the history; seasonal terms are Fourier series. All
//! coefficients are estimated jointly by penalised least squares on `y`
//! scaled by its maximum absolute value. Intervals come from simulating
//! future trend changes and observation noise.

use super::config::{AdditiveConfig, FutureFrequency, Seasonality};
use super::features::{
    changepoints, days_since_epoch, fourier_columns, hinge_columns, min_spacing, TimeScale,
};
use crate::core::calendar::{month_ends_after, month_starts_after};
use crate::core::{Forecast, TimeSeries};
use crate::data::SalesFrame;
use crate::error::{Result, SalesError};
use crate::models::Forecaster;
use crate::utils::ols::ridge_fit;
use crate::utils::stats::quantile;
use chrono::{Duration, NaiveDateTime};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

/// Lower bound on the noise variance (in scaled units) used to size penalties.
const MIN_NOISE_VARIANCE: f64 = 1e-4;

/// Two-column `(ds, y)` training input.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedSeries {
    ds: Vec<NaiveDateTime>,
    y: Vec<f64>,
}

impl DatedSeries {
    pub fn new(ds: Vec<NaiveDateTime>, y: Vec<f64>) -> Result<Self> {
        if ds.len() != y.len() {
            return Err(SalesError::DimensionMismatch {
                expected: ds.len(),
                got: y.len(),
            });
        }
        if ds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SalesError::Timestamp(
                "ds must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { ds, y })
    }

    /// Take `ds` from the frame timestamps and `y` from a numeric column.
    pub fn from_frame(frame: &SalesFrame, column: &str) -> Result<Self> {
        Self::new(frame.timestamps().to_vec(), frame.numeric_values(column)?)
    }

    pub fn ds(&self) -> &[NaiveDateTime] {
        &self.ds
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.ds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ds.is_empty()
    }
}

impl From<&TimeSeries> for DatedSeries {
    fn from(series: &TimeSeries) -> Self {
        Self {
            ds: series.timestamps().to_vec(),
            y: series.values().to_vec(),
        }
    }
}

/// One predicted date with its components.
///
/// Components of inactive seasonalities are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub ds: NaiveDateTime,
    pub trend: f64,
    pub yearly: f64,
    pub weekly: f64,
    pub daily: f64,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Output of [`AdditiveModel::predict`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdditiveForecast {
    pub rows: Vec<ForecastRow>,
    /// Names of the seasonalities that were fitted.
    pub active: Vec<&'static str>,
}

impl AdditiveForecast {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ds(&self) -> Vec<NaiveDateTime> {
        self.rows.iter().map(|r| r.ds).collect()
    }

    pub fn yhat(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.yhat).collect()
    }

    pub fn trend(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.trend).collect()
    }

    pub fn yearly(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.yearly).collect()
    }

    /// Point forecast with intervals and timestamps.
    pub fn to_forecast(&self) -> Forecast {
        Forecast::from_values_with_intervals(
            self.yhat(),
            self.rows.iter().map(|r| r.yhat_lower).collect(),
            self.rows.iter().map(|r| r.yhat_upper).collect(),
        )
        .with_timestamps(self.ds())
        .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
struct FittedState {
    history: DatedSeries,
    y_scale: f64,
    time_scale: TimeScale,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    intercept: f64,
    slope: f64,
    deltas: Vec<f64>,
    /// Fourier coefficients per active seasonality.
    seasonal: Vec<Vec<f64>>,
    sigma_obs: f64,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
}

/// Scaled trend and seasonal components at a set of dates.
struct Components {
    t: Vec<f64>,
    trend: Vec<f64>,
    /// Aligned with `FittedState::seasonalities`.
    seasonal: Vec<Vec<f64>>,
}

impl FittedState {
    fn components(&self, dates: &[NaiveDateTime]) -> Components {
        let days: Vec<f64> = dates.iter().map(days_since_epoch).collect();
        let t = self.time_scale.apply(&days);

        let mut trend: Vec<f64> = t.iter().map(|ti| self.intercept + self.slope * ti).collect();
        for (column, delta) in hinge_columns(&t, &self.changepoints).iter().zip(&self.deltas) {
            for (g, x) in trend.iter_mut().zip(column) {
                *g += delta * x;
            }
        }

        let seasonal = self
            .seasonalities
            .iter()
            .zip(&self.seasonal)
            .map(|(s, beta)| {
                let mut values = vec![0.0; days.len()];
                for (column, b) in fourier_columns(&days, s.period, s.fourier_order)
                    .iter()
                    .zip(beta)
                {
                    for (v, x) in values.iter_mut().zip(column) {
                        *v += b * x;
                    }
                }
                values
            })
            .collect();

        Components { t, trend, seasonal }
    }
}

/// Additive trend + seasonality forecaster.
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    config: AdditiveConfig,
    state: Option<FittedState>,
}

impl AdditiveModel {
    pub fn new(config: AdditiveConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn config(&self) -> &AdditiveConfig {
        &self.config
    }

    /// Trend changepoints in training time units (`0..=1`).
    pub fn changepoints(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.changepoints.as_slice())
    }

    /// Fit to a `(ds, y)` history.
    pub fn fit_dated(&mut self, history: &DatedSeries) -> Result<()> {
        let n = history.len();
        if n < 2 {
            return Err(SalesError::InsufficientData { needed: 2, got: n });
        }
        if history.y.iter().any(|v| !v.is_finite()) {
            return Err(SalesError::InvalidParameter(
                "y contains missing or non-finite values".to_string(),
            ));
        }

        let y_scale = match history.y.iter().fold(0.0_f64, |m, v| m.max(v.abs())) {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        let y: Vec<f64> = history.y.iter().map(|v| v / y_scale).collect();

        let days: Vec<f64> = history.ds.iter().map(days_since_epoch).collect();
        let time_scale = TimeScale::fit(&days);
        let t = time_scale.apply(&days);
        let spacing = min_spacing(&days);

        let seasonalities: Vec<Seasonality> = self
            .config
            .seasonalities()
            .into_iter()
            .filter(|s| s.is_active(time_scale.span, spacing))
            .copied()
            .collect();
        let cps = changepoints(&t, self.config.n_changepoints, self.config.changepoint_range);

        let mut fourier = Vec::new();
        for s in &seasonalities {
            fourier.extend(fourier_columns(&days, s.period, s.fourier_order));
        }
        let hinges = hinge_columns(&t, &cps);

        // Noise level of a changepoint-free fit sizes the penalties.
        let base: Vec<Vec<f64>> = [vec![1.0; n], t.clone()]
            .into_iter()
            .chain(fourier.iter().cloned())
            .collect();
        let seasonal_weight = 1.0 / self.config.seasonality_prior_scale.powi(2);
        let mut base_penalties = vec![0.0, 0.0];
        base_penalties.extend(std::iter::repeat(seasonal_weight).take(fourier.len()));
        let base_rss = ridge_fit(&base, &y, &base_penalties)?.rss;
        let noise = (base_rss / n as f64).max(MIN_NOISE_VARIANCE);

        let mut columns = vec![vec![1.0; n], t];
        columns.extend(hinges);
        columns.extend(fourier);

        let mut penalties = vec![0.0, 0.0];
        penalties.extend(
            std::iter::repeat(noise / self.config.changepoint_prior_scale.powi(2)).take(cps.len()),
        );
        penalties.extend(
            std::iter::repeat(noise / self.config.seasonality_prior_scale.powi(2))
                .take(columns.len() - penalties.len()),
        );

        let fit = ridge_fit(&columns, &y, &penalties)?;
        let beta = &fit.coefficients;
        let mut offset = 2 + cps.len();
        let mut seasonal = Vec::with_capacity(seasonalities.len());
        for s in &seasonalities {
            seasonal.push(beta[offset..offset + 2 * s.fourier_order].to_vec());
            offset += 2 * s.fourier_order;
        }

        let fitted_scaled = fit.predict(&columns)?;
        let fitted: Vec<f64> = fitted_scaled.iter().map(|v| v * y_scale).collect();
        let residuals = history.y.iter().zip(&fitted).map(|(a, f)| a - f).collect();

        debug!(
            "additive fit: {} rows, {} changepoints, seasonalities {:?}, rss {:.6}",
            n,
            cps.len(),
            seasonalities.iter().map(|s| s.name).collect::<Vec<_>>(),
            fit.rss
        );

        self.state = Some(FittedState {
            history: history.clone(),
            y_scale,
            time_scale,
            deltas: beta[2..2 + cps.len()].to_vec(),
            changepoints: cps,
            seasonalities,
            intercept: beta[0],
            slope: beta[1],
            seasonal,
            sigma_obs: (fit.rss / n as f64).sqrt(),
            fitted,
            residuals,
        });
        Ok(())
    }

    /// History dates followed by `periods` future dates at the configured frequency.
    pub fn make_future_dates(&self, periods: usize) -> Result<Vec<NaiveDateTime>> {
        let state = self.state.as_ref().ok_or(SalesError::FitRequired)?;
        let mut dates = state.history.ds.clone();
        dates.extend(self.future_only(periods)?);
        Ok(dates)
    }

    fn future_only(&self, periods: usize) -> Result<Vec<NaiveDateTime>> {
        let state = self.state.as_ref().ok_or(SalesError::FitRequired)?;
        let last = *state.history.ds.last().ok_or(SalesError::EmptyData)?;
        Ok(future_dates(last, periods, self.config.future_frequency))
    }

    /// Predict every date with components and an interval of the configured width.
    pub fn predict(&self, dates: &[NaiveDateTime]) -> Result<AdditiveForecast> {
        self.predict_with_width(dates, self.config.interval_width)
    }

    fn predict_with_width(&self, dates: &[NaiveDateTime], width: f64) -> Result<AdditiveForecast> {
        let state = self.state.as_ref().ok_or(SalesError::FitRequired)?;
        if !(0.0..1.0).contains(&width) {
            return Err(SalesError::InvalidParameter(format!(
                "interval width must be in [0, 1), got {width}"
            )));
        }

        let parts = state.components(dates);
        let yhat: Vec<f64> = (0..dates.len())
            .map(|i| parts.trend[i] + parts.seasonal.iter().map(|s| s[i]).sum::<f64>())
            .collect();
        let (lower, upper) = self.simulate_interval(state, &parts.t, &yhat, width)?;

        let scale = state.y_scale;
        let component = |name: &str, i: usize| {
            state
                .seasonalities
                .iter()
                .position(|s| s.name == name)
                .map(|k| parts.seasonal[k][i] * scale)
                .unwrap_or(0.0)
        };

        let rows = dates
            .iter()
            .enumerate()
            .map(|(i, &ds)| ForecastRow {
                ds,
                trend: parts.trend[i] * scale,
                yearly: component("yearly", i),
                weekly: component("weekly", i),
                daily: component("daily", i),
                yhat: yhat[i] * scale,
                yhat_lower: lower[i] * scale,
                yhat_upper: upper[i] * scale,
            })
            .collect();

        Ok(AdditiveForecast {
            rows,
            active: state.seasonalities.iter().map(|s| s.name).collect(),
        })
    }

    /// Interval bounds on the scaled axis.
    ///
    /// Beyond the history, each step may start a new trend change with
    /// probability proportional to the historical changepoint density; its
    /// size is Laplace with the mean absolute fitted change as scale.
    fn simulate_interval(
        &self,
        state: &FittedState,
        t: &[f64],
        yhat: &[f64],
        width: f64,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let samples = self.config.uncertainty_samples;
        if samples == 0 {
            return Ok((yhat.to_vec(), yhat.to_vec()));
        }

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let noise = Normal::new(0.0, state.sigma_obs.max(1e-12))
            .map_err(|e| SalesError::ComputationError(e.to_string()))?;

        let rate = state.changepoints.len() as f64;
        let laplace_scale = if state.deltas.is_empty() {
            1e-8
        } else {
            state.deltas.iter().map(|d| d.abs()).sum::<f64>() / state.deltas.len() as f64 + 1e-8
        };

        let mut draws = vec![Vec::with_capacity(samples); t.len()];
        for _ in 0..samples {
            let mut new_changes: Vec<(f64, f64)> = Vec::new();
            let mut previous = 1.0;
            for (i, &ti) in t.iter().enumerate() {
                if ti > 1.0 {
                    let p = (rate * (ti - previous)).clamp(0.0, 1.0);
                    if rng.gen::<f64>() < p {
                        new_changes.push((previous, sample_laplace(&mut rng, laplace_scale)));
                    }
                    previous = ti;
                }
                let drift: f64 = new_changes
                    .iter()
                    .map(|(s, delta)| delta * (ti - s).max(0.0))
                    .sum();
                draws[i].push(yhat[i] + drift + rng.sample(&noise));
            }
        }

        let lo = (1.0 - width) / 2.0;
        let hi = (1.0 + width) / 2.0;
        Ok(draws
            .iter()
            .map(|d| (quantile(d, lo), quantile(d, hi)))
            .unzip())
    }
}

impl Default for AdditiveModel {
    fn default() -> Self {
        Self::new(AdditiveConfig::default())
    }
}

/// `periods` dates strictly after `last`.
pub fn future_dates(
    last: NaiveDateTime,
    periods: usize,
    frequency: FutureFrequency,
) -> Vec<NaiveDateTime> {
    match frequency {
        FutureFrequency::MonthEnd => month_ends_after(last, periods),
        FutureFrequency::MonthStart => month_starts_after(last, periods),
        FutureFrequency::Daily => (1..=periods as i64).map(|d| last + Duration::days(d)).collect(),
    }
}

/// Zero-centred Laplace draw by inverting the CDF.
fn sample_laplace<R: Rng>(rng: &mut R, scale: f64) -> f64 {
    let u: f64 = rng.gen_range(-0.5..0.5);
    -scale * u.signum() * (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE).ln()
}

impl Forecaster for AdditiveModel {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.fit_dated(&DatedSeries::from(series))
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.predict_with_intervals(horizon, self.config.interval_width)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let dates = self.future_only(horizon)?;
        Ok(self.predict_with_width(&dates, level)?.to_forecast())
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.residuals.as_slice())
    }

    fn name(&self) -> &str {
        "Additive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::month_start;
    use crate::models::additive::config::Toggle;
    use approx::assert_relative_eq;

    fn monthly_sales(n: usize) -> DatedSeries {
        let ds = month_starts_after(month_start(2013, 12).unwrap(), n);
        let y = (0..n)
            .map(|i| {
                let t = i as f64;
                1200.0 + 6.0 * t + 150.0 * (2.0 * std::f64::consts::PI * t / 12.0).cos()
            })
            .collect();
        DatedSeries::new(ds, y).unwrap()
    }

    fn model() -> AdditiveModel {
        AdditiveModel::new(
            AdditiveConfig::new()
                .with_yearly(Toggle::On)
                .with_daily(Toggle::Off)
                .with_uncertainty_samples(300)
                .with_seed(7),
        )
    }

    #[test]
    fn predicts_history_plus_future() {
        let history = monthly_sales(36);
        let mut m = model();
        m.fit_dated(&history).unwrap();

        let dates = m.make_future_dates(24).unwrap();
        assert_eq!(dates.len(), 60);
        let forecast = m.predict(&dates).unwrap();
        assert_eq!(forecast.len(), 60);
        assert_eq!(forecast.active, vec!["yearly"]);

        // history ends 2016-12-01; the first future date is that month's end
        assert_eq!(
            forecast.rows[36].ds,
            month_ends_after(history.ds()[35], 1)[0]
        );
        for row in &forecast.rows {
            assert!(row.yhat.is_finite());
            assert!(row.yhat_lower <= row.yhat + 1e-9);
            assert!(row.yhat_upper >= row.yhat - 1e-9);
            assert_eq!(row.weekly, 0.0);
            assert_eq!(row.daily, 0.0);
            assert_relative_eq!(row.yhat, row.trend + row.yearly, epsilon = 1e-6);
        }
    }

    #[test]
    fn fits_trend_and_season() {
        let history = monthly_sales(48);
        let mut m = model();
        m.fit_dated(&history).unwrap();

        let fitted = m.fitted_values().unwrap();
        let mae = history
            .y()
            .iter()
            .zip(fitted)
            .map(|(a, f)| (a - f).abs())
            .sum::<f64>()
            / history.len() as f64;
        assert!(mae < 0.03 * 1200.0, "mae {mae}");
    }

    #[test]
    fn seeded_intervals_are_reproducible() {
        let history = monthly_sales(36);
        let mut a = model();
        let mut b = model();
        a.fit_dated(&history).unwrap();
        b.fit_dated(&history).unwrap();

        let dates = a.make_future_dates(6).unwrap();
        assert_eq!(a.predict(&dates).unwrap(), b.predict(&dates).unwrap());
    }

    #[test]
    fn future_interval_widens() {
        let history = monthly_sales(36);
        let mut m = AdditiveModel::new(AdditiveConfig::new().with_seed(11));
        m.fit_dated(&history).unwrap();
        let forecast = m.predict(&m.make_future_dates(24).unwrap()).unwrap();

        let width = |r: &ForecastRow| r.yhat_upper - r.yhat_lower;
        assert!(width(&forecast.rows[59]) >= width(&forecast.rows[36]) * 0.8);
    }

    #[test]
    fn auto_seasonality_skips_weekly_on_monthly_data() {
        let config = AdditiveConfig::new()
            .with_seed(1)
            .with_uncertainty_samples(50);
        let mut m = AdditiveModel::new(config);
        m.fit_dated(&monthly_sales(36)).unwrap();
        let forecast = m.predict(&m.make_future_dates(1).unwrap()).unwrap();
        assert_eq!(forecast.active, vec!["yearly"]);
    }

    #[test]
    fn forecaster_interface_returns_future_only() {
        let history = monthly_sales(36);
        let ts = TimeSeries::univariate(history.ds().to_vec(), history.y().to_vec()).unwrap();
        let mut m = model();
        m.fit(&ts).unwrap();

        let forecast = Forecaster::predict(&m, 24).unwrap();
        assert_eq!(forecast.horizon(), 24);
        assert!(forecast.has_intervals());
        assert_eq!(forecast.timestamps().len(), 24);
        assert!(forecast.timestamps()[0] > *history.ds().last().unwrap());
    }

    #[test]
    fn rejects_bad_history() {
        let mut m = model();
        let one = DatedSeries::new(vec![month_start(2017, 1).unwrap()], vec![1.0]).unwrap();
        assert!(matches!(
            m.fit_dated(&one),
            Err(SalesError::InsufficientData { needed: 2, got: 1 })
        ));
        assert!(matches!(m.make_future_dates(3), Err(SalesError::FitRequired)));

        let ds = month_starts_after(month_start(2016, 12).unwrap(), 3);
        let gap = DatedSeries::new(ds, vec![1.0, f64::NAN, 2.0]).unwrap();
        assert!(m.fit_dated(&gap).is_err());
    }

    #[test]
    fn daily_future_dates() {
        let last = month_start(2019, 12).unwrap();
        let dates = future_dates(last, 2, FutureFrequency::Daily);
        assert_eq!(dates[1], last + Duration::days(2));
    }
}
