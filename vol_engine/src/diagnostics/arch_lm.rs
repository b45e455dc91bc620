/// diagnostics/arch_lm.rs — Engle's ARCH-LM test
///
/// ─────────────────────────────────────────────────────────────────────────
/// Auxiliary regression on squared residuals (no demeaning):
///
///   e²_t = c + γ_1·e²_{t−1} + … + γ_L·e²_{t−L} + u_t,   t = L … n−1
///
///   LM = nobs · R²   ~ χ²_L     under H0: γ_1 = … = γ_L = 0
///   F  = (R²/L) / ((1 − R²)/(nobs − L − 1))  ~ F(L, nobs − L − 1)
///
/// nobs = n − L  (rows of the auxiliary regression).
/// ─────────────────────────────────────────────────────────────────────────
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use super::chi2_sf;
use crate::error::{require_finite, EngineError, Result};
use crate::regression::{design_matrix, ols};

#[derive(Debug, Clone, Serialize)]
pub struct ArchLmResult {
    pub lags:       usize,
    pub lm_stat:    f64,
    pub lm_pvalue:  f64,
    pub f_stat:     f64,
    pub f_pvalue:   f64,
    pub nobs:       usize,
}

impl std::fmt::Display for ArchLmResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Engle's ARCH-LM Test (lag={}):", self.lags)?;
        writeln!(f, "LM Statistic: {:.4}", self.lm_stat)?;
        writeln!(f, "p-value: {:.6}", self.lm_pvalue)?;
        write!(f, "F Statistic: {:.4} (p-value: {:.6})", self.f_stat, self.f_pvalue)
    }
}

pub fn arch_lm_test(resid: &[f64], lags: usize) -> Result<ArchLmResult> {
    if lags == 0 {
        return Err(EngineError::InvalidInput("ARCH-LM needs at least one lag".into()));
    }
    require_finite(resid, "ARCH-LM residuals")?;
    let n = resid.len();
    // Need more rows than the L + 1 regressors.
    if n < 2 * lags + 2 {
        return Err(EngineError::InsufficientData { needed: 2 * lags + 2, got: n });
    }

    let sq: Vec<f64> = resid.iter().map(|e| e * e).collect();
    let nobs = n - lags;
    let k = lags + 1;

    let mut x = Vec::with_capacity(nobs * k);
    for t in lags..n {
        x.push(1.0);
        x.extend((1..=lags).map(|j| sq[t - j]));
    }
    let fit = ols(&sq[lags..], &design_matrix(nobs, k, &x))?;

    let lm_stat = nobs as f64 * fit.r_squared;
    let lm_pvalue = chi2_sf(lm_stat, lags as f64);

    let f_stat = fit.f_statistic();
    let f_pvalue = FisherSnedecor::new(lags as f64, fit.df_resid() as f64)
        .map(|d| 1.0 - d.cdf(f_stat))
        .unwrap_or(f64::NAN);

    Ok(ArchLmResult { lags, lm_stat, lm_pvalue, f_stat, f_pvalue, nobs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{normal_noise, simulate_garch};

    #[test]
    fn volatility_clustering_is_detected() {
        let r = simulate_garch(3_000, 1e-6, 0.15, 0.80, 7);
        let res = arch_lm_test(&r, 12).unwrap();
        assert_eq!(res.nobs, 3_000 - 12);
        assert!(res.lm_pvalue < 1e-4, "{res}");
        assert!(res.f_pvalue < 1e-4);
    }

    #[test]
    fn homoskedastic_noise_passes() {
        let e = normal_noise(3_000, 11);
        let res = arch_lm_test(&e, 12).unwrap();
        assert!(res.lm_pvalue > 0.001, "{res}");
    }

    #[test]
    fn lm_equals_nobs_times_r_squared() {
        let e = normal_noise(400, 3);
        let res = arch_lm_test(&e, 4).unwrap();
        assert!(res.lm_stat >= 0.0);
        assert!(res.lm_stat < res.nobs as f64);
    }

    #[test]
    fn statistic_does_not_depend_on_return_units() {
        let e = normal_noise(1_750, 21);
        let base = arch_lm_test(&e, 12).unwrap();
        for scale in [1e-2, 5e-4, 2e-4, 1e-4] {
            let scaled: Vec<f64> = e.iter().map(|v| v * scale).collect();
            let res = arch_lm_test(&scaled, 12).unwrap();
            assert!(
                (res.lm_stat - base.lm_stat).abs() < 1e-6 * base.lm_stat.max(1.0),
                "scale {scale}: {} vs {}",
                res.lm_stat,
                base.lm_stat
            );
        }
    }

    #[test]
    fn short_series_is_rejected() {
        assert!(arch_lm_test(&[0.1; 10], 12).is_err());
        assert!(arch_lm_test(&[0.1; 10], 0).is_err());
    }
}
