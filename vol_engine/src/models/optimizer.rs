/// models/optimizer.rs — Derivative-free minimisation (Nelder-Mead simplex)
///
/// ─────────────────────────────────────────────────────────────────────────
/// ALGORITHM (Nelder & Mead 1965, standard coefficients)
/// ─────────────────────────────────────────────────────────────────────────
///
///   Keep k+1 vertices sorted by f.  x̄ = centroid of the best k.
///
///   reflect      x_r = x̄ + ρ(x̄ − x_worst)          ρ = 1
///   expand       x_e = x̄ + χ(x_r − x̄)              χ = 2
///   contract out x_c = x̄ + γ(x_r − x̄)              γ = 0.5
///   contract in  x_c = x̄ − γ(x̄ − x_worst)
///   shrink       x_i = x_best + σ(x_i − x_best)     σ = 0.5
///
///   Stop when  max_i |x_i − x_best|∞ ≤ x_tol  and  max_i |f_i − f_best| ≤ f_tol.
///
/// Infeasible points should return a large finite penalty so the simplex
/// retreats from constraint boundaries.
/// ─────────────────────────────────────────────────────────────────────────
use tracing::trace;

use crate::error::{EngineError, Result};

/// Scalar objective to minimise.
pub trait Objective {
    fn eval(&self, x: &[f64]) -> f64;
}

impl<F: Fn(&[f64]) -> f64> Objective for F {
    fn eval(&self, x: &[f64]) -> f64 {
        self(x)
    }
}

#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    pub x_tol:    f64,
    pub f_tol:    f64,
    /// Relative perturbation used to build the initial simplex.
    pub step:     f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self { max_iter: 5_000, x_tol: 1e-8, f_tol: 1e-9, step: 0.05 }
    }
}

#[derive(Debug, Clone)]
pub struct Minimum {
    pub x:          Vec<f64>,
    pub value:      f64,
    pub iterations: usize,
    pub converged:  bool,
}

pub fn nelder_mead<O: Objective>(obj: &O, x0: &[f64], cfg: &NelderMeadConfig) -> Result<Minimum> {
    let k = x0.len();
    if k == 0 {
        return Err(EngineError::Optimization("empty starting point".into()));
    }
    let f0 = obj.eval(x0);
    if !f0.is_finite() {
        return Err(EngineError::Optimization(format!(
            "objective is not finite at the starting point {x0:?}"
        )));
    }

    // ── Initial simplex ──────────────────────────────────────────────────
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(k + 1);
    simplex.push((x0.to_vec(), f0));
    for i in 0..k {
        let mut v = x0.to_vec();
        v[i] = if v[i] != 0.0 { v[i] * (1.0 + cfg.step) } else { 0.00025 };
        let fv = obj.eval(&v);
        simplex.push((v, fv));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < cfg.max_iter {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (best_x, best_f) = (&simplex[0].0, simplex[0].1);
        let x_spread = simplex[1..]
            .iter()
            .flat_map(|(v, _)| v.iter().zip(best_x).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        let f_spread = simplex[1..].iter().map(|(_, f)| (f - best_f).abs()).fold(0.0, f64::max);
        if x_spread <= cfg.x_tol && f_spread <= cfg.f_tol {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..k)
            .map(|j| simplex[..k].iter().map(|(v, _)| v[j]).sum::<f64>() / k as f64)
            .collect();
        let worst = simplex[k].clone();
        let along = |t: f64| -> Vec<f64> {
            centroid.iter().zip(&worst.0).map(|(c, w)| c + t * (c - w)).collect()
        };

        let xr = along(1.0);
        let fr = obj.eval(&xr);

        if fr < simplex[0].1 {
            let xe = along(2.0);
            let fe = obj.eval(&xe);
            simplex[k] = if fe < fr { (xe, fe) } else { (xr, fr) };
            continue;
        }
        if fr < simplex[k - 1].1 {
            simplex[k] = (xr, fr);
            continue;
        }

        let (xc, fc) = if fr < worst.1 {
            let xc = along(0.5);
            let fc = obj.eval(&xc);
            (xc, fc)
        } else {
            let xc = along(-0.5);
            let fc = obj.eval(&xc);
            (xc, fc)
        };
        if fc < fr.min(worst.1) {
            simplex[k] = (xc, fc);
            continue;
        }

        // Shrink toward the best vertex.
        let best = simplex[0].0.clone();
        for (v, fv) in simplex.iter_mut().skip(1) {
            for (vj, bj) in v.iter_mut().zip(&best) {
                *vj = bj + 0.5 * (*vj - bj);
            }
            *fv = obj.eval(v);
        }
        trace!("nelder-mead shrink at iteration {iterations}");
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (x, value) = simplex.swap_remove(0);
    Ok(Minimum { x, value, iterations, converged })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimises_quadratic_bowl() {
        let f = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2);
        let m = nelder_mead(&f, &[0.0, 0.0], &NelderMeadConfig::default()).unwrap();
        assert!(m.converged);
        assert!((m.x[0] - 3.0).abs() < 1e-4);
        assert!((m.x[1] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn minimises_rosenbrock() {
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let cfg = NelderMeadConfig { max_iter: 20_000, ..Default::default() };
        let m = nelder_mead(&f, &[-1.2, 1.0], &cfg).unwrap();
        assert!((m.x[0] - 1.0).abs() < 1e-3, "{:?}", m.x);
        assert!((m.x[1] - 1.0).abs() < 1e-3, "{:?}", m.x);
    }

    #[test]
    fn penalty_keeps_search_feasible() {
        // min (x − 2)² subject to x ≤ 1
        let f = |x: &[f64]| if x[0] > 1.0 { 1e30 } else { (x[0] - 2.0).powi(2) };
        let m = nelder_mead(&f, &[0.0], &NelderMeadConfig::default()).unwrap();
        assert!(m.x[0] <= 1.0);
        assert!((m.x[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn infeasible_start_is_an_error() {
        let f = |_: &[f64]| f64::INFINITY;
        assert!(nelder_mead(&f, &[1.0], &NelderMeadConfig::default()).is_err());
    }

    #[test]
    fn iteration_cap_reports_non_convergence() {
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let cfg = NelderMeadConfig { max_iter: 3, ..Default::default() };
        let m = nelder_mead(&f, &[-1.2, 1.0], &cfg).unwrap();
        assert!(!m.converged);
        assert_eq!(m.iterations, 3);
    }
}
