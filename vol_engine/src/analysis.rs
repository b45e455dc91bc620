/// analysis.rs — Volatility analysis pipeline
///
/// Runs the fixed sequence of steps over a price series and collects every
/// result for printing, plotting and persistence.
///
/// ARCHITECTURE
/// ┌─────────────────────────────────────────────────────┐
/// │  PriceSeries (hourly closes)                        │
/// │        │                                            │
/// │        ▼                                            │
/// │  log_returns()  →  describe()                       │
/// │        │                                            │
/// │   ┌────┴──────────────── PRE-FIT ──────────┐        │
/// │   │  adf_test(r)                           │        │
/// │   │  acf_with_bands(r², 40)                │        │
/// │   │  arch_lm_test(r, 12)                   │        │
/// │   └────────────────────────────────────────┘        │
/// │        │                                            │
/// │  Garch11::fit(r)  →  σ_t, z_t = r_t/σ_t             │
/// │        │                                            │
/// │   ┌────┴──────────────── POST-FIT ─────────┐        │
/// │   │  ljung_box(z,  [10, 20])               │        │
/// │   │  ljung_box(z², [10, 20])               │        │
/// │   └────────────────────────────────────────┘        │
/// │        │                                            │
/// │  VolOutlook (persistence, half-life, forecasts)     │
/// └─────────────────────────────────────────────────────┘
use serde::Serialize;
use tracing::{info, warn};

use crate::data::{PriceSeries, ReturnSeries};
use crate::diagnostics::{
    acf_with_bands, adf_test, arch_lm_test, ljung_box, AcfBands, AdfLag, AdfResult, ArchLmResult,
    LjungBoxResult,
};
use crate::error::Result;
use crate::metrics::{describe, Describe};
use crate::models::{CovarianceType, Garch11, GarchFit, GarchFitConfig, RegimeThresholds, VolRegime};

/// Run parameters for one analysis pass.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub adf_lag:          AdfLag,
    pub acf_lags:         usize,
    pub arch_lm_lags:     usize,
    pub ljung_box_lags:   Vec<usize>,
    pub cov_type:         CovarianceType,
    pub bars_per_year:    f64,
    pub forecast_horizon: usize,
    pub regime:           RegimeThresholds,
    /// Significance level used for the plain-language verdicts.
    pub significance:     f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            adf_lag:          AdfLag::default(),
            acf_lags:         40,
            arch_lm_lags:     12,
            ljung_box_lags:   vec![10, 20],
            cov_type:         CovarianceType::Robust,
            bars_per_year:    1_764.0,
            forecast_horizon: 24,
            regime:           RegimeThresholds::default(),
            significance:     0.05,
        }
    }
}

/// Forward-looking summary derived from the fitted model.
#[derive(Debug, Clone, Serialize)]
pub struct VolOutlook {
    pub persistence:           f64,
    pub half_life_bars:        Option<f64>,
    pub longrun_vol_bar:       f64,
    pub longrun_vol_annual:    f64,
    pub next_vol_bar:          f64,
    pub next_vol_annual:       f64,
    /// Annualised volatility for horizons 1..=h.
    pub forecast_vol_annual:   Vec<f64>,
    pub regime:                VolRegime,
}

impl VolOutlook {
    pub fn from_model(model: &Garch11, horizon: usize, thresholds: RegimeThresholds) -> Self {
        let longrun = model.longrun_variance();
        let next = model.next_variance();
        Self {
            persistence:         model.persistence(),
            half_life_bars:      model.half_life(),
            longrun_vol_bar:     longrun.sqrt(),
            longrun_vol_annual:  model.annualise(longrun),
            next_vol_bar:        next.sqrt(),
            next_vol_annual:     model.annualise(next),
            forecast_vol_annual: model
                .forecast_path(horizon)
                .into_iter()
                .map(|v| model.annualise(v))
                .collect(),
            regime:              model.regime(thresholds),
        }
    }
}

impl std::fmt::Display for VolOutlook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  Persistence (α+β)   : {:.4}", self.persistence)?;
        match self.half_life_bars {
            Some(hl) => writeln!(f, "  Shock half-life     : {hl:.1} bars")?,
            None => writeln!(f, "  Shock half-life     : n/a")?,
        }
        writeln!(
            f,
            "  Long-run volatility : {:.4}% per bar  ({:.2}% annualised)",
            self.longrun_vol_bar * 100.0,
            self.longrun_vol_annual * 100.0
        )?;
        writeln!(
            f,
            "  Next-bar volatility : {:.4}% per bar  ({:.2}% annualised)",
            self.next_vol_bar * 100.0,
            self.next_vol_annual * 100.0
        )?;
        if let Some(last) = self.forecast_vol_annual.last() {
            writeln!(
                f,
                "  {}-bar forecast      : {:.2}% annualised",
                self.forecast_vol_annual.len(),
                last * 100.0
            )?;
        }
        write!(f, "  Volatility regime   : {}", self.regime)
    }
}

/// Everything produced by one run.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub symbol:         String,
    pub returns:        ReturnSeries,
    pub describe:       Describe,
    pub adf:            AdfResult,
    pub acf_squared:    AcfBands,
    pub arch_lm:        ArchLmResult,
    pub fit:            GarchFit,
    pub lb_resid:       LjungBoxResult,
    pub lb_sq_resid:    LjungBoxResult,
    pub outlook:        VolOutlook,
    pub significance:   f64,
}

pub fn run_analysis(prices: &PriceSeries, cfg: &AnalysisConfig) -> Result<Analysis> {
    let returns = prices.log_returns();
    info!("{} hourly log returns: {} observations", prices.symbol, returns.len());
    let describe = describe(&prices.symbol, &returns.values)?;

    // ── Pre-fit diagnostics ───────────────────────────────────────────────
    let adf = adf_test(&returns.values, cfg.adf_lag)?;
    if !adf.is_stationary(cfg.significance) {
        warn!("ADF does not reject a unit root (p = {:.4}); GARCH fit may be unreliable", adf.p_value);
    }
    let acf_squared = acf_with_bands(&returns.squared(), cfg.acf_lags, 0.05)?;
    let arch_lm = arch_lm_test(&returns.values, cfg.arch_lm_lags)?;
    info!(
        "Pre-fit: ADF τ={:.3} (p={:.4})  ARCH-LM={:.2} (p={:.4})",
        adf.statistic, adf.p_value, arch_lm.lm_stat, arch_lm.lm_pvalue
    );

    // ── GARCH(1,1) ────────────────────────────────────────────────────────
    let fit_cfg = GarchFitConfig {
        cov_type: cfg.cov_type,
        bars_per_year: cfg.bars_per_year,
        dep_variable: prices.symbol.clone(),
        ..Default::default()
    };
    let fit = Garch11::fit(&returns.values, &fit_cfg)?;

    // ── Post-fit diagnostics ──────────────────────────────────────────────
    let z = &fit.std_resid;
    let z_sq: Vec<f64> = z.iter().map(|v| v * v).collect();
    let lb_resid = ljung_box(z, &cfg.ljung_box_lags)?;
    let lb_sq_resid = ljung_box(&z_sq, &cfg.ljung_box_lags)?;
    if !lb_sq_resid.is_white_noise(cfg.significance) {
        warn!("Squared standardized residuals still autocorrelated: volatility dynamics not fully captured");
    }

    let outlook = VolOutlook::from_model(&fit.model, cfg.forecast_horizon, cfg.regime);

    Ok(Analysis {
        symbol: prices.symbol.clone(),
        returns,
        describe,
        adf,
        acf_squared,
        arch_lm,
        fit,
        lb_resid,
        lb_sq_resid,
        outlook,
        significance: cfg.significance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{garch_prices, synthetic_prices};

    #[test]
    fn end_to_end_on_simulated_prices() {
        let prices = synthetic_prices(2_000);
        let a = run_analysis(&prices, &AnalysisConfig::default()).unwrap();

        assert_eq!(a.returns.len(), 2_000);
        assert_eq!(a.describe.count, 2_000);
        assert!(a.adf.is_stationary(0.01));
        assert_eq!(a.acf_squared.values.len(), 41);
        assert!(a.arch_lm.lm_pvalue < 0.01);
        assert_eq!(a.lb_resid.rows.len(), 2);
        assert_eq!(a.lb_sq_resid.rows[1].lag, 20);
        assert_eq!(a.outlook.forecast_vol_annual.len(), 24);
        assert!(a.outlook.persistence < 1.0);
    }

    #[test]
    fn low_volatility_path_runs() {
        // ω = 1e-8 puts hourly σ near 4.5e-4, roughly 2% a year
        let a = run_analysis(&garch_prices(2_000, 1e-8, 12), &AnalysisConfig::default()).unwrap();
        assert!(a.describe.std < 1e-3);
        assert!(a.arch_lm.lm_stat.is_finite());
        assert_eq!(a.fit.params.len(), 3);
    }

    #[test]
    fn outlook_matches_model() {
        let g = Garch11::new(1e-6, 0.1, 0.8, 1_764.0).unwrap();
        let o = VolOutlook::from_model(&g, 5, RegimeThresholds::default());
        assert!((o.persistence - 0.9).abs() < 1e-12);
        assert!((o.longrun_vol_bar - 1e-5f64.sqrt()).abs() < 1e-12);
        assert_eq!(o.forecast_vol_annual.len(), 5);
        assert!(o.to_string().contains("Volatility regime"));
    }
}
