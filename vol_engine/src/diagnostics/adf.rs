/// diagnostics/adf.rs — Augmented Dickey-Fuller unit-root test (constant only)
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
///   Δy_t = c + γ·y_{t−1} + Σ_{j=1}^{p} φ_j·Δy_{t−j} + u_t
///
///   H0: γ = 0 (unit root)      H1: γ < 0 (stationary)
///   τ = γ̂ / se(γ̂)
///
/// Lag selection (AIC):
///   p_max = min( ⌈12·(n/100)^{1/4}⌉ , n/2 − 2 )
///   For p = 0 … p_max fit on the common sample of n − 1 − p_max rows,
///   choose p* = argmin AIC, then refit on the n − 1 − p* available rows.
///
/// p-value — MacKinnon (1994) response surface, one variable, constant:
///   τ > 2.74   → 1
///   τ < −18.83 → 0
///   τ ≤ −1.61  → Φ(2.1659 + 1.4412·τ + 0.038269·τ²)
///   otherwise  → Φ(1.7339 + 0.93202·τ − 0.12745·τ² − 0.010368·τ³)
///
/// Critical values — MacKinnon (2010):
///   cv(T) = b0 + b1/T + b2/T² + b3/T³,  T = regression nobs
/// ─────────────────────────────────────────────────────────────────────────
use serde::Serialize;
use tracing::debug;

use super::normal_cdf;
use crate::error::{require_finite, EngineError, Result};
use crate::regression::{design_matrix, ols, OlsFit};

const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// (label, [b0, b1, b2, b3])
const CRIT_2010: [(&str, [f64; 4]); 3] = [
    ("1%",  [-3.43035, -6.5393, -16.786, -79.433]),
    ("5%",  [-2.86154, -2.8903, -4.234, -40.040]),
    ("10%", [-2.56677, -1.5384, -2.809, 0.0]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdfLag {
    /// AIC search over 0..=max (default max when `None`).
    Aic(Option<usize>),
    Fixed(usize),
}

impl Default for AdfLag {
    fn default() -> Self {
        AdfLag::Aic(None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdfResult {
    pub statistic:       f64,
    pub p_value:         f64,
    pub used_lag:        usize,
    pub nobs:            usize,
    pub critical_values: Vec<(String, f64)>,
    /// Best AIC from the lag search, if one was run.
    pub ic_best:         Option<f64>,
}

impl AdfResult {
    pub fn is_stationary(&self, level: f64) -> bool {
        self.p_value < level
    }
}

impl std::fmt::Display for AdfResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ADF Statistic: {:.6}", self.statistic)?;
        writeln!(f, "p-value: {:.6}", self.p_value)?;
        writeln!(f, "Lags used: {}  Observations: {}", self.used_lag, self.nobs)?;
        let cvs: Vec<String> = self
            .critical_values
            .iter()
            .map(|(k, v)| format!("'{k}': {v:.6}"))
            .collect();
        write!(f, "Critical Values: {{{}}}", cvs.join(", "))
    }
}

/// Default lag ceiling: ⌈12·(n/100)^{1/4}⌉ bounded by n/2 − 2.
pub fn default_max_lag(n: usize) -> usize {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    schwert.min((n / 2).saturating_sub(2))
}

pub fn adf_test(data: &[f64], lag: AdfLag) -> Result<AdfResult> {
    require_finite(data, "ADF input")?;
    let n = data.len();
    if n < 8 {
        return Err(EngineError::InsufficientData { needed: 8, got: n });
    }
    let ceiling = (n / 2).saturating_sub(2);

    let (used_lag, ic_best) = match lag {
        AdfLag::Fixed(p) => {
            check_lag(p, ceiling)?;
            (p, None)
        }
        AdfLag::Aic(max) => {
            let max_lag = max.unwrap_or_else(|| default_max_lag(n));
            check_lag(max_lag, ceiling)?;
            let (p, aic) = select_lag_aic(data, max_lag)?;
            (p, Some(aic))
        }
    };

    let fit = adf_regression(data, used_lag, used_lag)?;
    let statistic = fit.t_value(1);
    let nobs = fit.nobs;
    debug!("ADF: lag={used_lag} nobs={nobs} tau={statistic:.4}");

    Ok(AdfResult {
        statistic,
        p_value: mackinnon_p(statistic),
        used_lag,
        nobs,
        critical_values: mackinnon_crit(nobs),
        ic_best,
    })
}

fn check_lag(p: usize, ceiling: usize) -> Result<()> {
    if p > ceiling {
        return Err(EngineError::InvalidInput(format!(
            "ADF lag {p} exceeds the maximum {ceiling} for this sample"
        )));
    }
    Ok(())
}

/// Fit every lag on the common `max_lag` sample and return (p*, AIC(p*)).
/// Ties resolve to the smaller lag.
fn select_lag_aic(data: &[f64], max_lag: usize) -> Result<(usize, f64)> {
    let mut best = (0, f64::INFINITY);
    for p in 0..=max_lag {
        let aic = adf_regression(data, max_lag, p)?.aic();
        if aic < best.1 {
            best = (p, aic);
        }
    }
    Ok(best)
}

/// Build and fit the ADF regression.
///
/// Rows are t = `trim` … n−2 in difference index (Δy_t = y_{t+1} − y_t);
/// columns are `[1, y_t, Δy_{t−1} … Δy_{t−p}]`.
fn adf_regression(data: &[f64], trim: usize, p: usize) -> Result<OlsFit> {
    let diff: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();
    let rows = diff.len() - trim;
    let k = 2 + p;

    let mut x = Vec::with_capacity(rows * k);
    for t in trim..diff.len() {
        x.push(1.0);
        x.push(data[t]);
        x.extend((1..=p).map(|j| diff[t - j]));
    }
    ols(&diff[trim..], &design_matrix(rows, k, &x))
}

/// MacKinnon (1994) approximate p-value for τ (constant, one variable).
pub fn mackinnon_p(tau: f64) -> f64 {
    if tau > TAU_MAX {
        return 1.0;
    }
    if tau < TAU_MIN {
        return 0.0;
    }
    let coefs: &[f64] = if tau <= TAU_STAR { &SMALL_P } else { &LARGE_P };
    normal_cdf(polyval(coefs, tau))
}

/// MacKinnon (2010) finite-sample critical values at 1%, 5%, 10%.
pub fn mackinnon_crit(nobs: usize) -> Vec<(String, f64)> {
    let inv = 1.0 / nobs as f64;
    CRIT_2010
        .iter()
        .map(|(label, b)| (label.to_string(), polyval(b, inv)))
        .collect()
}

/// Σ c_i · x^i  (coefficients in increasing order of power).
fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}
