/// diagnostics/acf.rs — Sample autocorrelation with Bartlett bands
///
///   ρ_k = Σ_{t=0}^{n−k−1} (x_t − x̄)(x_{t+k} − x̄)  /  Σ_t (x_t − x̄)²
///
/// Bartlett variance under H0 (MA(k−1) beyond lag k−1):
///   Var(ρ_1) = 1/n
///   Var(ρ_k) = (1 + 2 Σ_{j=1}^{k−1} ρ_j²) / n
///   band_k   = z_{1−α/2} · √Var(ρ_k)
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{require_finite, require_len, EngineError, Result};
use crate::metrics::mean;

/// Autocorrelations for lags `0..=max_lag`.  `ρ_0 = 1`.
pub fn acf(data: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    require_len(data, 2)?;
    require_finite(data, "acf input")?;

    let n = data.len();
    let max_lag = max_lag.min(n - 1);
    let m = mean(data);
    let centred: Vec<f64> = data.iter().map(|x| x - m).collect();
    let denom: f64 = centred.iter().map(|x| x * x).sum();
    if denom == 0.0 {
        return Err(EngineError::InvalidInput("acf of a constant series is undefined".into()));
    }

    Ok((0..=max_lag)
        .map(|k| {
            centred[k..]
                .iter()
                .zip(&centred[..n - k])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / denom
        })
        .collect())
}

/// ACF values plus the half-width of the confidence band at each lag.
#[derive(Debug, Clone, Serialize)]
pub struct AcfBands {
    pub values: Vec<f64>,
    /// Half-width of the (1 − α) band around zero; `bands[0] = 0`.
    pub bands:  Vec<f64>,
    pub alpha:  f64,
    pub nobs:   usize,
}

impl AcfBands {
    /// Lags (≥ 1) whose autocorrelation lies outside the band.
    pub fn significant_lags(&self) -> Vec<usize> {
        (1..self.values.len())
            .filter(|&k| self.values[k].abs() > self.bands[k])
            .collect()
    }
}

pub fn acf_with_bands(data: &[f64], max_lag: usize, alpha: f64) -> Result<AcfBands> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(EngineError::InvalidInput(format!("alpha must be in (0,1), got {alpha}")));
    }
    let values = acf(data, max_lag)?;
    let n = data.len() as f64;
    let z = Normal::new(0.0, 1.0)
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?
        .inverse_cdf(1.0 - alpha / 2.0);

    let mut bands = Vec::with_capacity(values.len());
    let mut cum = 0.0;
    for k in 0..values.len() {
        if k == 0 {
            bands.push(0.0);
            continue;
        }
        let var = (1.0 + 2.0 * cum) / n;
        bands.push(z * var.sqrt());
        cum += values[k] * values[k];
    }

    Ok(AcfBands { values, bands, alpha, nobs: data.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternating_series_has_negative_lag_one() {
        let data: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let r = acf(&data, 2).unwrap();
        assert!((r[0] - 1.0).abs() < 1e-12);
        // 99 products of −1 over 100 squares
        assert!((r[1] + 0.99).abs() < 1e-12);
        assert!((r[2] - 0.98).abs() < 1e-12);
    }

    #[test]
    fn known_small_example() {
        // x = [1,2,3,4], x̄ = 2.5, centred = [−1.5,−0.5,0.5,1.5], Σ² = 5
        // lag1: (−1.5·−0.5)+(−0.5·0.5)+(0.5·1.5) = 1.25 → 0.25
        let r = acf(&[1.0, 2.0, 3.0, 4.0], 1).unwrap();
        assert!((r[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn bartlett_bands_widen_with_lag() {
        let data: Vec<f64> = (0..400).map(|i| ((i as f64) * 0.3).sin()).collect();
        let b = acf_with_bands(&data, 10, 0.05).unwrap();
        assert_eq!(b.bands[0], 0.0);
        assert!((b.bands[1] - 1.959_964 / 20.0).abs() < 1e-5);
        assert!(b.bands.windows(2).skip(1).all(|w| w[1] >= w[0]));
        assert!(b.significant_lags().contains(&1));
    }

    #[test]
    fn constant_series_is_rejected() {
        assert!(acf(&[1.0; 10], 3).is_err());
    }
}
