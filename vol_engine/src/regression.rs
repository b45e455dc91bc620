/// regression.rs — Ordinary least squares
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
///   y = X·b + u,   X is n × k
///
///   b̂      = (XᵀX)⁻¹ Xᵀy
///   SSR    = Σ û²,   σ̂² = SSR / (n − k)
///   se(b̂_j) = √( σ̂² · [(XᵀX)⁻¹]_jj )
///
///   Gaussian log-likelihood (concentrated):
///     ℓ = −n/2 · ( ln 2π + ln(SSR/n) + 1 )
///   AIC = −2ℓ + 2k
///
///   Centered R² (X contains a constant):
///     R² = 1 − SSR / Σ(y − ȳ)²
///   F    = (R² / (k − 1)) / ((1 − R²) / (n − k))
/// ─────────────────────────────────────────────────────────────────────────
use nalgebra::{DMatrix, DVector};

use crate::error::{EngineError, Result};

#[derive(Debug, Clone)]
pub struct OlsFit {
    pub params:     DVector<f64>,
    pub std_errors: DVector<f64>,
    pub nobs:       usize,
    pub k:          usize,
    pub ssr:        f64,
    pub r_squared:  f64,
    pub llf:        f64,
}

impl OlsFit {
    pub fn t_value(&self, j: usize) -> f64 {
        self.params[j] / self.std_errors[j]
    }

    pub fn aic(&self) -> f64 {
        -2.0 * self.llf + 2.0 * self.k as f64
    }

    /// Overall F statistic with (k − 1, n − k) degrees of freedom.
    pub fn f_statistic(&self) -> f64 {
        let df_model = (self.k - 1) as f64;
        let df_resid = (self.nobs - self.k) as f64;
        (self.r_squared / df_model) / ((1.0 - self.r_squared) / df_resid)
    }

    pub fn df_resid(&self) -> usize {
        self.nobs - self.k
    }
}

/// Fit `y` on the columns of `x`.  `x` must contain a constant column for
/// `r_squared` / `f_statistic` to carry their usual meaning.
pub fn ols(y: &[f64], x: &DMatrix<f64>) -> Result<OlsFit> {
    let (n, k) = x.shape();
    if y.len() != n {
        return Err(EngineError::InvalidInput(format!(
            "OLS: y has {} rows, X has {n}",
            y.len()
        )));
    }
    if n <= k {
        return Err(EngineError::InsufficientData { needed: k + 1, got: n });
    }

    let y_vec = DVector::from_column_slice(y);

    // Unit-norm columns: the rank cutoff is then relative, whatever the
    // units of each regressor (squared hourly returns sit near 1e-8).
    let norms: Vec<f64> = (0..k).map(|j| x.column(j).norm()).collect();
    if norms.iter().any(|d| !(d.is_finite() && *d > 0.0)) {
        return Err(EngineError::Singular("OLS normal equations"));
    }
    let d_inv = DMatrix::from_diagonal(&DVector::from_iterator(k, norms.iter().map(|d| 1.0 / d)));
    let xs = x * &d_inv;
    let xtx_s = xs.transpose() * &xs;
    if xtx_s.rank(1e-12) < k {
        return Err(EngineError::Singular("OLS normal equations"));
    }
    let xtx_s_inv = xtx_s.try_inverse().ok_or(EngineError::Singular("OLS normal equations"))?;

    // (XᵀX)⁻¹ = D⁻¹ (XsᵀXs)⁻¹ D⁻¹,  b̂ = D⁻¹ b̂s
    let xtx_inv = &d_inv * xtx_s_inv * &d_inv;
    let params = &xtx_inv * (x.transpose() * &y_vec);

    let resid = &y_vec - x * &params;
    let ssr = resid.dot(&resid);
    let sigma2 = ssr / (n - k) as f64;
    let std_errors = DVector::from_iterator(k, (0..k).map(|j| (sigma2 * xtx_inv[(j, j)]).sqrt()));

    let y_mean = y_vec.mean();
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if tss > 0.0 { 1.0 - ssr / tss } else { 0.0 };

    let nf = n as f64;
    let llf = -0.5 * nf * ((2.0 * std::f64::consts::PI).ln() + (ssr / nf).ln() + 1.0);

    Ok(OlsFit { params, std_errors, nobs: n, k, ssr, r_squared, llf })
}

/// Row-major design matrix builder used by the diagnostics.
pub(crate) fn design_matrix(rows: usize, cols: usize, data: &[f64]) -> DMatrix<f64> {
    DMatrix::from_row_slice(rows, cols, data)
}
