//! Derivative-free minimisation used for parameter estimation.

use std::cmp::Ordering;

/// Outcome of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at `optimal_point`.
    pub optimal_value: f64,
    pub iterations: usize,
    /// True when the simplex spread fell below the tolerance.
    pub converged: bool,
}

/// Nelder-Mead settings.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    /// Stop once the spread of objective values (or of the vertices) is below this.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrink coefficient.
    pub sigma: f64,
    /// Relative size of the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Box constraints applied by clamping every candidate point.
#[derive(Debug, Clone, Copy)]
struct Bounds<'a>(Option<&'a [(f64, f64)]>);

impl Bounds<'_> {
    fn clamp(&self, mut point: Vec<f64>) -> Vec<f64> {
        if let Some(bounds) = self.0 {
            for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
                *x = x.clamp(lo, hi);
            }
        }
        point
    }
}

/// `from + t * (to - from)`, the single move every simplex step is built on.
fn lerp(from: &[f64], to: &[f64], t: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(f, v)| f + t * (v - f)).collect()
}

/// Minimise `objective` starting from `initial`.
///
/// # Example
/// ```
/// use pharma_sales::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] + 1.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let bounds = Bounds(bounds);
    let cmp = |a: &f64, b: &f64| a.partial_cmp(b).unwrap_or(Ordering::Equal);

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    let start = bounds.clamp(initial.to_vec());
    simplex.push((start.clone(), objective(&start)));
    for i in 0..n {
        let mut vertex = start.clone();
        vertex[i] += if vertex[i].abs() > 1e-10 {
            config.initial_step * vertex[i].abs()
        } else {
            config.initial_step
        };
        let vertex = bounds.clamp(vertex);
        let value = objective(&vertex);
        simplex.push((vertex, value));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| cmp(&a.1, &b.1));

        let best = simplex[0].1;
        let second_worst = simplex[n - 1].1;
        let worst = simplex[n].1;

        let mut centroid = vec![0.0; n];
        for (vertex, _) in &simplex[..n] {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v / n as f64;
            }
        }

        let spread = simplex
            .iter()
            .map(|(v, _)| {
                v.iter()
                    .zip(&centroid)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0, f64::max);
        if worst - best < config.tolerance || spread < config.tolerance {
            converged = true;
            break;
        }

        let reflected = bounds.clamp(lerp(&centroid, &simplex[n].0, -config.alpha));
        let reflected_value = objective(&reflected);

        if reflected_value < best {
            let expanded = bounds.clamp(lerp(&centroid, &reflected, config.gamma));
            let expanded_value = objective(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }

        if reflected_value < second_worst {
            simplex[n] = (reflected, reflected_value);
            continue;
        }

        // Contract towards the better of the reflected and worst points.
        let (toward, toward_value) = if reflected_value < worst {
            (&reflected, reflected_value)
        } else {
            (&simplex[n].0, worst)
        };
        let contracted = bounds.clamp(lerp(&centroid, toward, config.rho));
        let contracted_value = objective(&contracted);
        if contracted_value < toward_value {
            simplex[n] = (contracted, contracted_value);
            continue;
        }

        let anchor = simplex[0].0.clone();
        for (vertex, value) in simplex.iter_mut().skip(1) {
            *vertex = bounds.clamp(lerp(&anchor, vertex, config.sigma));
            *value = objective(vertex);
        }
    }

    let (optimal_point, optimal_value) = simplex
        .into_iter()
        .min_by(|a, b| cmp(&a.1, &b.1))
        .unwrap_or_else(|| (initial.to_vec(), f64::NAN));

    NelderMeadResult {
        optimal_point,
        optimal_value,
        iterations,
        converged,
    }
}
