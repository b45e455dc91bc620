// models/garch.rs — GARCH(1,1) Volatility Model
//
// ─────────────────────────────────────────────────────────────────────────
// MATHEMATICAL SPECIFICATION
// ─────────────────────────────────────────────────────────────────────────
//
// GARCH(1,1): Bollerslev (1986), zero conditional mean
//
//   Return innovation:  ε_t = r_t
//   Conditional variance update:
//
//       σ²_t = ω  +  α · ε²_{t-1}  +  β · σ²_{t-1}
//
//   Constraints (positivity + covariance stationarity):
//     ω > 0,  α ≥ 0,  β ≥ 0,  α + β < 1
//
//   Pre-sample start (backcast, τ = min(75, n)):
//       b     = Σ_{i<τ} w_i · ε²_i,    w_i ∝ 0.94^i,  Σ w_i = 1
//       σ²_0  = ω + (α + β) · b
//
//   Gaussian log-likelihood:
//       ℓ = −½ Σ_t [ ln 2π + ln σ²_t + ε²_t / σ²_t ]
//
//   Long-run (unconditional) variance:
//       σ²_∞ = ω / (1 − α − β)
//
//   Multi-step forecast (h-step ahead from the end of the sample):
//       σ²_{T+1} = ω + α · ε²_T + β · σ²_T
//       σ²_{T+h} = σ²_∞ + (α+β)^(h-1) · (σ²_{T+1} − σ²_∞)
//
//   Half-life of a variance shock (bars):
//       h½ = ln(0.5) / ln(α + β)
//
//   Annualised volatility (from per-bar σ²):
//       σ_annual = √(σ² · bars_per_year)
//
//   Regime classification on annualised one-step volatility:
//     - LOW:    σ_annual < low
//     - NORMAL: low ≤ σ_annual < high
//     - HIGH:   σ_annual ≥ high
// ─────────────────────────────────────────────────────────────────────────
use serde::Serialize;

use crate::error::{EngineError, Result};

const LN_2PI: f64 = 1.837_877_066_409_345_3;
const BACKCAST_DECAY: f64 = 0.94;
const BACKCAST_WINDOW: usize = 75;
/// Floor applied inside the recursion so ln σ² stays finite.
const MIN_VARIANCE: f64 = 1e-300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VolRegime {
    Low,
    Normal,
    High,
}

impl std::fmt::Display for VolRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VolRegime::Low => "LOW",
            VolRegime::Normal => "NORMAL",
            VolRegime::High => "HIGH",
        };
        f.write_str(s)
    }
}

/// Annualised-volatility thresholds for `VolRegime`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RegimeThresholds {
    pub low:  f64,
    pub high: f64,
}

impl Default for RegimeThresholds {
    /// Large-cap equity: < 15% calm, ≥ 30% stressed.
    fn default() -> Self {
        Self { low: 0.15, high: 0.30 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Garch11 {
    /// ω: variance intercept
    pub omega: f64,
    /// α: ARCH (shock) coefficient
    pub alpha: f64,
    /// β: GARCH (persistence) coefficient
    pub beta: f64,
    /// Current conditional variance estimate σ²_t
    pub sigma2: f64,
    /// Previous return innovation ε_{t-1}
    pub prev_epsilon: f64,
    /// Annualisation factor (number of bars per year)
    /// E.g. US equity 1h bars → 7 · 252 = 1_764
    pub bars_per_year: f64,
}

impl Garch11 {
    /// Construct GARCH(1,1) with given parameters.
    /// Initial σ² is set to the long-run variance σ²_∞ = ω/(1-α-β).
    pub fn new(omega: f64, alpha: f64, beta: f64, bars_per_year: f64) -> Result<Self> {
        check_params(omega, alpha, beta)?;
        let longrun_var = omega / (1.0 - alpha - beta);
        Ok(Self {
            omega,
            alpha,
            beta,
            sigma2: longrun_var,
            prev_epsilon: 0.0,
            bars_per_year,
        })
    }

    /// Feed a new return observation and update σ²_t.
    ///
    /// Formula:  σ²_t = ω + α·ε²_{t-1} + β·σ²_{t-1}
    pub fn update(&mut self, r: f64) {
        // Update variance BEFORE storing the new epsilon (use t-1 values)
        self.sigma2 = (self.omega
            + self.alpha * self.prev_epsilon.powi(2)
            + self.beta * self.sigma2)
            .max(MIN_VARIANCE);
        self.prev_epsilon = r;
    }

    /// Run the filter over `resid` from the backcast, ending on σ²_T and ε_T
    /// (the last point of [`variance_path`]).
    pub fn condition_on(&mut self, resid: &[f64]) {
        if resid.is_empty() {
            return;
        }
        let bc = backcast(resid);
        self.sigma2 = bc;
        self.prev_epsilon = bc.sqrt();
        for &e in resid {
            self.update(e);
        }
    }

    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// σ²_∞ = ω / (1 − α − β)
    pub fn longrun_variance(&self) -> f64 {
        self.omega / (1.0 - self.persistence())
    }

    /// Bars for a variance shock to decay by half.
    pub fn half_life(&self) -> Option<f64> {
        let p = self.persistence();
        (p > 0.0 && p < 1.0).then(|| 0.5f64.ln() / p.ln())
    }

    /// σ_annual = √(σ² · bars_per_year)
    pub fn annualise(&self, variance: f64) -> f64 {
        (variance * self.bars_per_year).sqrt()
    }

    /// One-step-ahead variance σ²_{t+1} from the current state.
    pub fn next_variance(&self) -> f64 {
        self.omega + self.alpha * self.prev_epsilon.powi(2) + self.beta * self.sigma2
    }

    /// h-step ahead variance forecast (h ≥ 1).
    ///
    /// σ²_{t+h} = σ²_∞ + (α+β)^(h−1) · (σ²_{t+1} − σ²_∞)
    pub fn forecast_variance(&self, h: usize) -> f64 {
        let h = h.max(1);
        let longrun = self.longrun_variance();
        longrun + self.persistence().powi(h as i32 - 1) * (self.next_variance() - longrun)
    }

    /// Forecast path for horizons 1..=h.
    pub fn forecast_path(&self, h: usize) -> Vec<f64> {
        (1..=h).map(|step| self.forecast_variance(step)).collect()
    }

    /// Classify the one-step-ahead volatility regime.
    pub fn regime(&self, thresholds: RegimeThresholds) -> VolRegime {
        let sa = self.annualise(self.next_variance());
        if sa < thresholds.low {
            VolRegime::Low
        } else if sa < thresholds.high {
            VolRegime::Normal
        } else {
            VolRegime::High
        }
    }
}

fn check_params(omega: f64, alpha: f64, beta: f64) -> Result<()> {
    if !(omega > 0.0 && alpha >= 0.0 && beta >= 0.0) || !(omega.is_finite() && alpha.is_finite() && beta.is_finite()) {
        return Err(EngineError::InvalidInput(format!(
            "GARCH requires ω>0, α≥0, β≥0; got ω={omega}, α={alpha}, β={beta}"
        )));
    }
    if alpha + beta >= 1.0 {
        return Err(EngineError::InvalidInput(format!(
            "GARCH covariance-stationarity requires α+β < 1, got α={alpha}, β={beta}"
        )));
    }
    Ok(())
}

/// Exponentially weighted pre-sample variance from the first 75 residuals.
pub fn backcast(resid: &[f64]) -> f64 {
    let tau = resid.len().min(BACKCAST_WINDOW);
    if tau == 0 {
        return 0.0;
    }
    let mut w = 1.0;
    let (mut num, mut den) = (0.0, 0.0);
    for e in &resid[..tau] {
        num += w * e * e;
        den += w;
        w *= BACKCAST_DECAY;
    }
    num / den
}

/// Conditional variance path σ²_0 … σ²_{n−1} for the given parameters.
///
/// No constraint checks: used both for feasible fits and for finite-difference
/// probes that may step marginally outside the admissible region.
pub fn variance_path(resid: &[f64], omega: f64, alpha: f64, beta: f64, backcast: f64) -> Vec<f64> {
    let mut sigma2 = Vec::with_capacity(resid.len());
    let mut prev_s2 = backcast;
    let mut prev_e2 = backcast;
    for e in resid {
        let s2 = (omega + alpha * prev_e2 + beta * prev_s2).max(MIN_VARIANCE);
        sigma2.push(s2);
        prev_s2 = s2;
        prev_e2 = e * e;
    }
    sigma2
}

/// Per-observation Gaussian log-likelihood contributions ℓ_t.
pub fn loglik_terms(resid: &[f64], sigma2: &[f64]) -> Vec<f64> {
    resid
        .iter()
        .zip(sigma2)
        .map(|(e, s2)| -0.5 * (LN_2PI + s2.ln() + e * e / s2))
        .collect()
}

pub fn loglik(resid: &[f64], sigma2: &[f64]) -> f64 {
    loglik_terms(resid, sigma2).iter().sum()
}
