//! Settings of the additive trend + seasonality model.

/// Whether a seasonal component is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Toggle {
    /// Decide from the span and spacing of the history.
    #[default]
    Auto,
    On,
    Off,
}

/// Calendar used for generated future dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FutureFrequency {
    /// Last day of each month.
    #[default]
    MonthEnd,
    /// First day of each month.
    MonthStart,
    Daily,
}

/// A periodic component expressed as a Fourier series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    /// Period in days.
    pub period: f64,
    pub fourier_order: usize,
    pub toggle: Toggle,
}

impl Seasonality {
    pub fn yearly() -> Self {
        Self {
            name: "yearly",
            period: 365.25,
            fourier_order: 10,
            toggle: Toggle::Auto,
        }
    }

    pub fn weekly() -> Self {
        Self {
            name: "weekly",
            period: 7.0,
            fourier_order: 3,
            toggle: Toggle::Auto,
        }
    }

    pub fn daily() -> Self {
        Self {
            name: "daily",
            period: 1.0,
            fourier_order: 4,
            toggle: Toggle::Auto,
        }
    }

    /// Resolve `Auto` against a history spanning `span_days` with the
    /// smallest gap between observations `min_spacing_days`.
    pub fn is_active(&self, span_days: f64, min_spacing_days: f64) -> bool {
        match self.toggle {
            Toggle::On => true,
            Toggle::Off => false,
            // at least two full cycles, sampled more finely than one cycle
            Toggle::Auto => span_days >= 2.0 * self.period && min_spacing_days < self.period,
        }
    }
}

/// Configuration of [`AdditiveModel`](super::AdditiveModel).
#[derive(Debug, Clone, PartialEq)]
pub struct AdditiveConfig {
    pub yearly: Seasonality,
    pub weekly: Seasonality,
    pub daily: Seasonality,
    /// Potential trend changepoints; capped by the history length.
    pub n_changepoints: usize,
    /// Share of history where changepoints may be placed.
    pub changepoint_range: f64,
    /// Prior scale of changepoint rate adjustments.
    pub changepoint_prior_scale: f64,
    /// Prior scale of Fourier coefficients.
    pub seasonality_prior_scale: f64,
    /// Coverage of `yhat_lower..yhat_upper`.
    pub interval_width: f64,
    /// Simulated trajectories behind the interval.
    pub uncertainty_samples: usize,
    pub seed: Option<u64>,
    pub future_frequency: FutureFrequency,
}

impl Default for AdditiveConfig {
    fn default() -> Self {
        Self {
            yearly: Seasonality::yearly(),
            weekly: Seasonality::weekly(),
            daily: Seasonality::daily(),
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: None,
            future_frequency: FutureFrequency::MonthEnd,
        }
    }
}

impl AdditiveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_yearly(mut self, toggle: Toggle) -> Self {
        self.yearly.toggle = toggle;
        self
    }

    pub fn with_weekly(mut self, toggle: Toggle) -> Self {
        self.weekly.toggle = toggle;
        self
    }

    pub fn with_daily(mut self, toggle: Toggle) -> Self {
        self.daily.toggle = toggle;
        self
    }

    pub fn with_changepoints(mut self, n_changepoints: usize) -> Self {
        self.n_changepoints = n_changepoints;
        self
    }

    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    pub fn with_uncertainty_samples(mut self, samples: usize) -> Self {
        self.uncertainty_samples = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_future_frequency(mut self, frequency: FutureFrequency) -> Self {
        self.future_frequency = frequency;
        self
    }

    pub fn seasonalities(&self) -> [&Seasonality; 3] {
        [&self.yearly, &self.weekly, &self.daily]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_rules() {
        let yearly = Seasonality::yearly();
        // four years of monthly data
        assert!(yearly.is_active(4.0 * 365.0, 28.0));
        assert!(!yearly.is_active(400.0, 28.0));

        let weekly = Seasonality::weekly();
        assert!(!weekly.is_active(4.0 * 365.0, 28.0));
        assert!(weekly.is_active(60.0, 1.0));

        let daily = Seasonality::daily();
        assert!(!daily.is_active(60.0, 1.0));
        assert!(daily.is_active(60.0, 1.0 / 24.0));
    }

    #[test]
    fn explicit_toggles_override_auto() {
        let config = AdditiveConfig::new()
            .with_yearly(Toggle::On)
            .with_daily(Toggle::Off);
        assert!(config.yearly.is_active(10.0, 30.0));
        assert!(!config.daily.is_active(60.0, 1.0 / 24.0));
        assert_eq!(config.n_changepoints, 25);
        assert_eq!(config.seasonalities().len(), 3);
    }
}
