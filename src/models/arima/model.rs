//! ARIMA(p, d, q) with a fixed order, fitted by conditional sum of squares.

use crate::core::{Forecast, TimeSeries};
use crate::error::{Result, SalesError};
use crate::models::arima::diff::{difference, integrate};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean, quantile_normal};
use log::debug;

/// Model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOrder {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// AR + MA coefficients plus the intercept.
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }

    /// Shortest history the model can be fitted on.
    pub fn min_observations(&self) -> usize {
        self.d + self.p.max(self.q) + 2
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(2, 1, 2)
    }
}

impl From<(usize, usize, usize)> for ArimaOrder {
    fn from((p, d, q): (usize, usize, usize)) -> Self {
        Self::new(p, d, q)
    }
}

/// Estimated state of a fitted model.
#[derive(Debug, Clone)]
struct FittedState {
    history: Vec<f64>,
    differenced: Vec<f64>,
    /// One-step fits on the differenced scale; `NaN` before the first full lag window.
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    sigma2: f64,
    aic: f64,
}

/// Autoregressive integrated moving-average model.
///
/// The order is fixed at construction; there is no order search.
#[derive(Debug, Clone)]
pub struct Arima {
    order: ArimaOrder,
    name: String,
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    state: Option<FittedState>,
}

impl Arima {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::with_order(ArimaOrder::new(p, d, q))
    }

    pub fn with_order(order: ArimaOrder) -> Self {
        Self {
            order,
            name: format!("ARIMA({},{},{})", order.p, order.d, order.q),
            intercept: 0.0,
            ar: Vec::new(),
            ma: Vec::new(),
            state: None,
        }
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    /// Mean of the differenced series.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Innovation variance estimated from the residuals.
    pub fn sigma2(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.sigma2)
    }

    pub fn aic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.aic)
    }

    /// Run the ARMA recursion over `w`, returning one-step predictions and errors.
    fn recursion(w: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let n = w.len();
        let start = ar.len().max(ma.len());
        let mut predictions = vec![f64::NAN; n];
        let mut errors = vec![0.0; n];

        for t in start..n {
            let ar_part: f64 = ar
                .iter()
                .enumerate()
                .map(|(i, phi)| phi * (w[t - 1 - i] - intercept))
                .sum();
            let ma_part: f64 = ma
                .iter()
                .enumerate()
                .map(|(i, theta)| theta * errors[t - 1 - i])
                .sum();
            predictions[t] = intercept + ar_part + ma_part;
            errors[t] = w[t] - predictions[t];
        }
        (predictions, errors)
    }

    fn css(w: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> f64 {
        let (_, errors) = Self::recursion(w, intercept, ar, ma);
        let css: f64 = errors.iter().map(|e| e * e).sum();
        if css.is_finite() {
            css
        } else {
            f64::MAX
        }
    }

    /// Split an optimiser point into intercept, AR and MA parts.
    fn unpack(&self, params: &[f64]) -> (f64, Vec<f64>, Vec<f64>) {
        let p = self.order.p;
        (
            params[0],
            params[1..1 + p].to_vec(),
            params[1 + p..].to_vec(),
        )
    }

    fn estimate(&mut self, w: &[f64]) {
        let (p, q) = (self.order.p, self.order.q);
        let level = mean(w);

        if p == 0 && q == 0 {
            self.intercept = level;
            self.ar.clear();
            self.ma.clear();
            return;
        }

        let mut initial = Vec::with_capacity(self.order.num_params());
        initial.push(level);
        initial.extend((0..p).map(|i| 0.1 / (i + 1) as f64));
        initial.extend((0..q).map(|i| 0.1 / (i + 1) as f64));

        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-0.99, 0.99)).take(p + q));

        let result = nelder_mead(
            |params| {
                let (c, ar, ma) = self.unpack(params);
                Self::css(w, c, &ar, &ma)
            },
            &initial,
            Some(&bounds),
            NelderMeadConfig {
                max_iter: 2000,
                ..Default::default()
            },
        );
        debug!(
            "{}: css={:.4} after {} iterations (converged: {})",
            self.name, result.optimal_value, result.iterations, result.converged
        );

        let (c, ar, ma) = self.unpack(&result.optimal_point);
        self.intercept = c;
        self.ar = ar;
        self.ma = ma;
    }

    /// Psi weights of the integrated process, used for interval widths.
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        // AR polynomial multiplied by (1 - B)^d
        let mut phi = vec![1.0];
        phi.extend(self.ar.iter().map(|a| -a));
        for _ in 0..self.order.d {
            let mut next = vec![0.0; phi.len() + 1];
            for (i, c) in phi.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c;
            }
            phi = next;
        }

        let mut psi = vec![1.0; horizon];
        for j in 1..horizon {
            let theta = self.ma.get(j - 1).copied().unwrap_or(0.0);
            let ar_part: f64 = (1..phi.len().min(j + 1)).map(|i| -phi[i] * psi[j - i]).sum();
            psi[j] = theta + ar_part;
        }
        psi
    }
}

impl Default for Arima {
    fn default() -> Self {
        Self::with_order(ArimaOrder::default())
    }
}

impl Forecaster for Arima {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let needed = self.order.min_observations();
        if values.len() < needed {
            return Err(SalesError::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SalesError::InvalidParameter(
                "series contains non-finite values".to_string(),
            ));
        }

        let w = difference(values, self.order.d);
        self.estimate(&w);

        let (fitted, residuals) = Self::recursion(&w, self.intercept, &self.ar, &self.ma);
        let start = self.order.p.max(self.order.q);
        let effective = &residuals[start..];
        let n_eff = effective.len() as f64;
        let sigma2 = effective.iter().map(|r| r * r).sum::<f64>() / n_eff;
        let log_lik = -0.5 * n_eff * (1.0 + sigma2.max(1e-300).ln() + (2.0 * std::f64::consts::PI).ln());

        self.state = Some(FittedState {
            history: values.to_vec(),
            differenced: w,
            fitted,
            residuals,
            sigma2,
            aic: -2.0 * log_lik + 2.0 * self.order.num_params() as f64,
        });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(SalesError::FitRequired)?;
        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let mut w = state.differenced.clone();
        let mut errors = state.residuals.clone();
        for _ in 0..horizon {
            let t = w.len();
            let ar_part: f64 = self
                .ar
                .iter()
                .enumerate()
                .filter(|(i, _)| t > *i)
                .map(|(i, phi)| phi * (w[t - 1 - i] - self.intercept))
                .sum();
            let ma_part: f64 = self
                .ma
                .iter()
                .enumerate()
                .filter(|(i, _)| t > *i)
                .map(|(i, theta)| theta * errors[t - 1 - i])
                .sum();
            w.push(self.intercept + ar_part + ma_part);
            // future shocks have expectation zero
            errors.push(0.0);
        }

        let future = &w[state.differenced.len()..];
        Ok(Forecast::from_values(integrate(
            future,
            &state.history,
            self.order.d,
        )))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(0.0..1.0).contains(&level) {
            return Err(SalesError::InvalidParameter(format!(
                "interval level must be in [0, 1), got {level}"
            )));
        }
        let forecast = self.predict(horizon)?;
        let sigma2 = self.sigma2().unwrap_or(0.0);
        if horizon == 0 {
            return Ok(forecast);
        }

        let z = quantile_normal((1.0 + level) / 2.0);
        let mut cumulative = 0.0;
        let (lower, upper): (Vec<f64>, Vec<f64>) = self
            .psi_weights(horizon)
            .iter()
            .zip(forecast.values())
            .map(|(psi, point)| {
                cumulative += psi * psi;
                let half = z * (sigma2 * cumulative).sqrt();
                (point - half, point + half)
            })
            .unzip();

        Ok(Forecast::from_values_with_intervals(
            forecast.values().to_vec(),
            lower,
            upper,
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.residuals.as_slice())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
