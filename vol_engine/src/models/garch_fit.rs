/// models/garch_fit.rs — GARCH(1,1) maximum-likelihood estimation
///
/// ─────────────────────────────────────────────────────────────────────────
/// ESTIMATION
/// ─────────────────────────────────────────────────────────────────────────
///
///   θ = (ω, α, β),   θ̂ = argmax ℓ(θ)   (Gaussian quasi-likelihood)
///
///   Conditioning: fit on y = s·r with s = 1/std(r), then map back
///       ω = ω_y / s²,   ℓ_r = ℓ_y + n·ln s
///
///   Start: grid α ∈ {.01,.05,.10,.20} × (α+β) ∈ {.50,.70,.90,.98},
///          ω by variance targeting ω = Var(y)·(1 − α − β).
///
///   Search: Nelder-Mead on −ℓ, infeasible θ penalised.
///
/// INFERENCE
///   H  = ∂²(−ℓ)/∂θ∂θᵀ              (central differences)
///   S  = [∂ℓ_t/∂θ]  (n × 3 scores)  (central differences)
///   classic:  Cov = H⁻¹
///   robust:   Cov = H⁻¹ (SᵀS) H⁻¹  (Bollerslev-Wooldridge)
///   t = θ̂/se,  p = 2·(1 − Φ(|t|)),  95% CI = θ̂ ± 1.959964·se
///
///   AIC = −2ℓ + 2k,  BIC = −2ℓ + k·ln n,  k = 3
/// ─────────────────────────────────────────────────────────────────────────
use chrono::{DateTime, Utc};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::garch::{backcast, loglik, loglik_terms, variance_path, Garch11};
use super::optimizer::{nelder_mead, NelderMeadConfig};
use crate::diagnostics::normal_cdf;
use crate::error::{require_finite, require_len, EngineError, Result};
use crate::metrics::std_dev;

const PENALTY: f64 = 1e30;
const Z_975: f64 = 1.959_963_984_540_054;
const N_PARAMS: usize = 3;
const PARAM_NAMES: [&str; N_PARAMS] = ["omega", "alpha[1]", "beta[1]"];
const MIN_OBS: usize = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CovarianceType {
    #[default]
    Robust,
    Classic,
}

impl std::str::FromStr for CovarianceType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "robust" => Ok(Self::Robust),
            "classic" => Ok(Self::Classic),
            other => Err(EngineError::InvalidInput(format!(
                "unknown covariance estimator '{other}' (robust|classic)"
            ))),
        }
    }
}

impl std::fmt::Display for CovarianceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Robust => "robust",
            Self::Classic => "classic",
        })
    }
}

#[derive(Debug, Clone)]
pub struct GarchFitConfig {
    pub cov_type:      CovarianceType,
    pub optimizer:     NelderMeadConfig,
    pub bars_per_year: f64,
    /// Name shown as "Dep. Variable" in the summary.
    pub dep_variable:  String,
}

impl Default for GarchFitConfig {
    fn default() -> Self {
        Self {
            cov_type:      CovarianceType::Robust,
            optimizer:     NelderMeadConfig::default(),
            bars_per_year: 1_764.0,
            dep_variable:  "Close".into(),
        }
    }
}

/// One row of the coefficient table.
#[derive(Debug, Clone, Serialize)]
pub struct ParamEstimate {
    pub name:     String,
    pub coef:     f64,
    pub std_err:  f64,
    pub t_value:  f64,
    pub p_value:  f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GarchFit {
    /// Fitted model, conditioned on the full sample (σ²_T, ε_T).
    pub model:                  Garch11,
    pub params:                 Vec<ParamEstimate>,
    pub cov_type:               CovarianceType,
    pub log_likelihood:         f64,
    pub aic:                    f64,
    pub bic:                    f64,
    pub nobs:                   usize,
    pub conditional_volatility: Vec<f64>,
    pub std_resid:              Vec<f64>,
    pub converged:              bool,
    pub iterations:             usize,
    pub dep_variable:           String,
    pub fitted_at:              DateTime<Utc>,
}

impl GarchFit {
    pub fn param(&self, name: &str) -> Option<&ParamEstimate> {
        self.params.iter().find(|p| p.name == name)
    }
}

impl Garch11 {
    /// Fit a zero-mean GARCH(1,1) to `returns` by Gaussian MLE.
    pub fn fit(returns: &[f64], cfg: &GarchFitConfig) -> Result<GarchFit> {
        require_len(returns, MIN_OBS)?;
        require_finite(returns, "GARCH returns")?;

        let sd = std_dev(returns);
        if !(sd > 0.0) {
            return Err(EngineError::InvalidInput("returns have zero variance".into()));
        }
        let scale = 1.0 / sd;
        let y: Vec<f64> = returns.iter().map(|r| r * scale).collect();
        let bc = backcast(&y);
        let n = y.len();

        let neg_ll = |theta: &[f64]| -> f64 {
            let (omega, alpha, beta) = (theta[0], theta[1], theta[2]);
            if !(omega > 0.0 && alpha >= 0.0 && beta >= 0.0 && alpha + beta < 1.0) {
                return PENALTY;
            }
            let ll = loglik(&y, &variance_path(&y, omega, alpha, beta, bc));
            if ll.is_finite() { -ll } else { PENALTY }
        };

        // ── Starting values ─────────────────────────────────────────────
        let var_y = y.iter().map(|v| v * v).sum::<f64>() / n as f64;
        let mut start = [var_y * 0.1, 0.05, 0.85];
        let mut start_f = neg_ll(&start[..]);
        for alpha in [0.01, 0.05, 0.10, 0.20] {
            for persistence in [0.50, 0.70, 0.90, 0.98] {
                let beta = persistence - alpha;
                if beta <= 0.0 {
                    continue;
                }
                let cand = [var_y * (1.0 - persistence), alpha, beta];
                let f = neg_ll(&cand[..]);
                if f < start_f {
                    start = cand;
                    start_f = f;
                }
            }
        }
        debug!("GARCH start: ω={:.4e} α={:.3} β={:.3} −ℓ={start_f:.3}", start[0], start[1], start[2]);

        // ── Nelder-Mead ─────────────────────────────────────────────────
        let min = nelder_mead(&neg_ll, &start, &cfg.optimizer)?;
        if min.value >= PENALTY {
            return Err(EngineError::Optimization("no feasible GARCH parameters found".into()));
        }
        if !min.converged {
            warn!(
                "GARCH optimizer stopped after {} iterations without meeting tolerance",
                min.iterations
            );
        }
        let theta = min.x.clone();

        // ── Covariance (scaled space) ───────────────────────────────────
        let cov_y = covariance(&y, bc, &theta, cfg.cov_type);

        // Map ω back to return units: ω_r = ω_y / s².
        let jac = DVector::from_column_slice(&[1.0 / (scale * scale), 1.0, 1.0]);
        let coefs = [theta[0] / (scale * scale), theta[1], theta[2]];
        let params: Vec<ParamEstimate> = (0..N_PARAMS)
            .map(|i| {
                let var = cov_y[(i, i)] * jac[i] * jac[i];
                // a NaN variance stays NaN
                let std_err = if var.is_nan() { f64::NAN } else { var.max(0.0).sqrt() };
                estimate(PARAM_NAMES[i], coefs[i], std_err)
            })
            .collect();

        // ── Outputs in return units ─────────────────────────────────────
        let sigma2_y = variance_path(&y, theta[0], theta[1], theta[2], bc);
        let log_likelihood = loglik(&y, &sigma2_y) + n as f64 * scale.ln();
        let conditional_volatility: Vec<f64> = sigma2_y.iter().map(|s2| s2.sqrt() / scale).collect();
        let std_resid: Vec<f64> = returns
            .iter()
            .zip(&conditional_volatility)
            .map(|(r, v)| r / v)
            .collect();

        let k = N_PARAMS as f64;
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * (n as f64).ln();

        let mut model = Garch11::new(coefs[0], coefs[1], coefs[2], cfg.bars_per_year)?;
        model.condition_on(returns);

        info!(
            "GARCH(1,1) fitted: ω={:.4e} α={:.4} β={:.4} ℓ={:.2} ({} iterations)",
            coefs[0], coefs[1], coefs[2], log_likelihood, min.iterations
        );

        Ok(GarchFit {
            model,
            params,
            cov_type: cfg.cov_type,
            log_likelihood,
            aic,
            bic,
            nobs: n,
            conditional_volatility,
            std_resid,
            converged: min.converged,
            iterations: min.iterations,
            dep_variable: cfg.dep_variable.clone(),
            fitted_at: Utc::now(),
        })
    }
}

fn estimate(name: &str, coef: f64, std_err: f64) -> ParamEstimate {
    let t_value = coef / std_err;
    ParamEstimate {
        name: name.to_owned(),
        coef,
        std_err,
        t_value,
        p_value: 2.0 * (1.0 - normal_cdf(t_value.abs())),
        ci_lower: coef - Z_975 * std_err,
        ci_upper: coef + Z_975 * std_err,
    }
}

/// Finite-difference step for parameter `v`.
fn step(v: f64) -> f64 {
    1e-5 * v.abs().max(1e-3)
}

fn covariance(y: &[f64], bc: f64, theta: &[f64], cov_type: CovarianceType) -> DMatrix<f64> {
    let nll = |t: &[f64]| -> f64 { -loglik(y, &variance_path(y, t[0], t[1], t[2], bc)) };
    let h: Vec<f64> = theta.iter().map(|v| step(*v)).collect();

    // ── Hessian of −ℓ ───────────────────────────────────────────────────
    let mut hess = DMatrix::<f64>::zeros(N_PARAMS, N_PARAMS);
    for i in 0..N_PARAMS {
        for j in i..N_PARAMS {
            let probe = |si: f64, sj: f64| {
                let mut t = theta.to_vec();
                t[i] += si * h[i];
                t[j] += sj * h[j];
                nll(&t[..])
            };
            let v = (probe(1.0, 1.0) - probe(1.0, -1.0) - probe(-1.0, 1.0) + probe(-1.0, -1.0))
                / (4.0 * h[i] * h[j]);
            hess[(i, j)] = v;
            hess[(j, i)] = v;
        }
    }
    let Some(hess_inv) = invert_hessian(hess) else {
        warn!("GARCH Hessian is singular; standard errors are reported as NaN");
        return DMatrix::from_element(N_PARAMS, N_PARAMS, f64::NAN);
    };

    if cov_type == CovarianceType::Classic {
        return hess_inv;
    }

    // ── Outer product of per-observation scores ─────────────────────────
    let n = y.len();
    let mut scores = DMatrix::<f64>::zeros(n, N_PARAMS);
    for i in 0..N_PARAMS {
        let terms_at = |sign: f64| {
            let mut t = theta.to_vec();
            t[i] += sign * h[i];
            loglik_terms(y, &variance_path(y, t[0], t[1], t[2], bc))
        };
        let (up, down) = (terms_at(1.0), terms_at(-1.0));
        for t in 0..n {
            scores[(t, i)] = (up[t] - down[t]) / (2.0 * h[i]);
        }
    }
    let opg = scores.transpose() * &scores;
    &hess_inv * opg * &hess_inv
}

/// Inverse of −ℓ's Hessian, `None` when a parameter is not identified.
fn invert_hessian(hess: DMatrix<f64>) -> Option<DMatrix<f64>> {
    if hess.iter().any(|v| !v.is_finite()) {
        return None;
    }
    hess.try_inverse().filter(|inv| inv.iter().all(|v| v.is_finite()))
}

// ── Summary rendering ─────────────────────────────────────────────────────

const WIDTH: usize = 78;

fn header_row(f: &mut std::fmt::Formatter<'_>, lk: &str, lv: &str, rk: &str, rv: &str) -> std::fmt::Result {
    let half = WIDTH / 2;
    let left = format!("{lk}{lv:>w$}", w = half - 1 - lk.len());
    let right = if rk.is_empty() {
        String::new()
    } else {
        format!("{rk}{rv:>w$}", w = half - rk.len())
    };
    writeln!(f, "{left:<w$} {right}", w = half - 1)
}

fn sci_or_fixed(v: f64) -> String {
    if v != 0.0 && v.abs() < 1e-2 {
        format!("{v:.4e}")
    } else {
        format!("{v:.4}")
    }
}

impl std::fmt::Display for GarchFit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:^WIDTH$}", "Zero Mean - GARCH Model Results")?;
        writeln!(f, "{}", "=".repeat(WIDTH))?;
        header_row(f, "Dep. Variable:", &self.dep_variable, "R-squared:", "0.000")?;
        header_row(f, "Mean Model:", "Zero Mean", "Adj. R-squared:", &format!("{:.3}", 1.0 / self.nobs as f64))?;
        header_row(f, "Vol Model:", "GARCH", "Log-Likelihood:", &format!("{:.3}", self.log_likelihood))?;
        header_row(f, "Distribution:", "Normal", "AIC:", &format!("{:.3}", self.aic))?;
        header_row(f, "Method:", "Maximum Likelihood", "BIC:", &format!("{:.3}", self.bic))?;
        header_row(f, "", "", "No. Observations:", &self.nobs.to_string())?;
        header_row(
            f,
            "Date:",
            &self.fitted_at.format("%a, %b %d %Y").to_string(),
            "Df Residuals:",
            &self.nobs.to_string(),
        )?;
        header_row(f, "Time:", &self.fitted_at.format("%H:%M:%S").to_string(), "Df Model:", "0")?;

        writeln!(f, "{:^WIDTH$}", "Volatility Model")?;
        writeln!(f, "{}", "=".repeat(WIDTH))?;
        writeln!(
            f,
            "{:<10}{:>12}{:>12}{:>9}{:>12}   {:^20}",
            "", "coef", "std err", "t", "P>|t|", "95.0% Conf. Int."
        )?;
        writeln!(f, "{}", "-".repeat(WIDTH))?;
        for p in &self.params {
            writeln!(
                f,
                "{:<10}{:>12}{:>12}{:>9.3}{:>12.3e}   [{},{}]",
                p.name,
                sci_or_fixed(p.coef),
                sci_or_fixed(p.std_err),
                p.t_value,
                p.p_value,
                sci_or_fixed(p.ci_lower),
                sci_or_fixed(p.ci_upper),
            )?;
        }
        writeln!(f, "{}", "=".repeat(WIDTH))?;
        writeln!(f)?;
        write!(f, "Covariance estimator: {}", self.cov_type)?;
        if !self.converged {
            write!(f, "\nWARNING: optimizer did not converge ({} iterations)", self.iterations)?;
        }
        Ok(())
    }
}
