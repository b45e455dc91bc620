/// diagnostics/ljung_box.rs — Ljung-Box portmanteau test
///
///   Q(L) = n(n + 2) · Σ_{k=1}^{L} ρ_k² / (n − k)
///   H0: ρ_1 = … = ρ_L = 0,   Q(L) ~ χ²_L
///
/// Applied to GARCH standardized residuals (mean dynamics) and to their
/// squares (remaining ARCH effects).
use serde::Serialize;

use super::{acf::acf, chi2_sf};
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct LjungBoxRow {
    pub lag:       usize,
    pub lb_stat:   f64,
    pub lb_pvalue: f64,
}

/// One Ljung-Box table, one row per requested lag.
#[derive(Debug, Clone, Serialize)]
pub struct LjungBoxResult {
    pub rows: Vec<LjungBoxRow>,
    pub nobs: usize,
}

impl LjungBoxResult {
    /// True when no row rejects H0 at `level`.
    pub fn is_white_noise(&self, level: f64) -> bool {
        self.rows.iter().all(|r| r.lb_pvalue >= level)
    }
}

impl std::fmt::Display for LjungBoxResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>6}{:>14}{:>14}", "", "lb_stat", "lb_pvalue")?;
        for r in &self.rows {
            write!(f, "\n{:>6}{:>14.6}{:>14.6}", r.lag, r.lb_stat, r.lb_pvalue)?;
        }
        Ok(())
    }
}

pub fn ljung_box(data: &[f64], lags: &[usize]) -> Result<LjungBoxResult> {
    let n = data.len();
    let max_lag = lags.iter().copied().max().ok_or_else(|| {
        EngineError::InvalidInput("Ljung-Box needs at least one lag".into())
    })?;
    if lags.contains(&0) {
        return Err(EngineError::InvalidInput("Ljung-Box lags must be ≥ 1".into()));
    }
    if max_lag >= n {
        return Err(EngineError::InsufficientData { needed: max_lag + 1, got: n });
    }

    let rho = acf(data, max_lag)?;
    let nf = n as f64;

    // Running Σ ρ_k²/(n−k), read off at each requested lag.
    let mut cumulative = Vec::with_capacity(max_lag + 1);
    let mut acc = 0.0;
    cumulative.push(0.0);
    for (k, r) in rho.iter().enumerate().skip(1) {
        acc += r * r / (nf - k as f64);
        cumulative.push(acc);
    }

    let rows = lags
        .iter()
        .map(|&lag| {
            let q = nf * (nf + 2.0) * cumulative[lag];
            LjungBoxRow { lag, lb_stat: q, lb_pvalue: chi2_sf(q, lag as f64) }
        })
        .collect();

    Ok(LjungBoxResult { rows, nobs: n })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::uniform_noise;

    #[test]
    fn white_noise_is_not_rejected() {
        let lb = ljung_box(&uniform_noise(2_000, 42), &[10, 20]).unwrap();
        assert_eq!(lb.rows.len(), 2);
        assert!(lb.is_white_noise(0.001), "{lb}");
    }

    #[test]
    fn persistent_series_is_rejected() {
        let data: Vec<f64> = (0..500).map(|i| ((i as f64) * 0.05).sin()).collect();
        let lb = ljung_box(&data, &[10]).unwrap();
        assert!(lb.rows[0].lb_stat > 1_000.0);
        assert!(lb.rows[0].lb_pvalue < 1e-6);
    }

    #[test]
    fn q_matches_hand_computation() {
        // x = [1,2,3,4] → ρ_1 = 0.25; Q(1) = 4·6·0.0625/3 = 0.5
        let lb = ljung_box(&[1.0, 2.0, 3.0, 4.0], &[1]).unwrap();
        assert!((lb.rows[0].lb_stat - 0.5).abs() < 1e-12);
    }

    #[test]
    fn lag_beyond_sample_is_rejected() {
        assert!(ljung_box(&[1.0, 2.0, 3.0], &[5]).is_err());
        assert!(ljung_box(&[1.0, 2.0, 3.0], &[]).is_err());
    }
}
