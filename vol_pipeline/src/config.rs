/// config.rs — Pipeline configuration loaded from .env
///
/// Every key has a default matching the WMT hourly run, so an empty
/// environment reproduces it.  Command-line flags override these values
/// in `main.rs`; everything downstream borrows &AppConfig.
use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;

use vol_engine::models::{CovarianceType, RegimeThresholds};
use vol_engine::AnalysisConfig;

pub const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    // ── Data source ──────────────────────────────────────────────────
    pub symbol:         String,
    /// First calendar day requested (inclusive)
    pub start_date:     NaiveDate,
    /// Last calendar day requested (exclusive)
    pub end_date:       NaiveDate,
    pub interval:       String,
    pub yahoo_base_url: String,
    pub http_timeout_secs: u64,

    // ── Output ───────────────────────────────────────────────────────
    pub output_dir:  PathBuf,
    pub plot_width:  u32,
    pub plot_height: u32,

    // ── Diagnostics ──────────────────────────────────────────────────
    pub acf_lags:       usize,
    pub arch_lm_lags:   usize,
    pub ljung_box_lags: Vec<usize>,

    // ── Volatility model ─────────────────────────────────────────────
    /// 252 sessions × 7 hourly bars
    pub bars_per_year:    f64,
    pub forecast_horizon: usize,
    /// Annualised σ below this is the "low" regime
    pub vol_regime_low:   f64,
    /// Annualised σ above this is the "high" regime
    pub vol_regime_high:  f64,
}

impl AppConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // ignore missing .env
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.  `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let cfg = Self {
            symbol:            text("SYMBOL", "WMT").trim().to_uppercase(),
            start_date:        parse_env(&lookup, "START_DATE", default_date(2025, 2, 10)?)?,
            end_date:          parse_env(&lookup, "END_DATE", default_date(2026, 2, 10)?)?,
            interval:          text("INTERVAL", "1h"),
            yahoo_base_url:    text("YAHOO_BASE_URL", DEFAULT_YAHOO_URL),
            http_timeout_secs: parse_env(&lookup, "HTTP_TIMEOUT_SECS", 30u64)?,

            output_dir:  PathBuf::from(text("OUTPUT_DIR", ".")),
            plot_width:  parse_env(&lookup, "PLOT_WIDTH", 3_600u32)?,
            plot_height: parse_env(&lookup, "PLOT_HEIGHT", 1_800u32)?,

            acf_lags:       parse_env(&lookup, "ACF_LAGS", 40usize)?,
            arch_lm_lags:   parse_env(&lookup, "ARCH_LM_LAGS", 12usize)?,
            ljung_box_lags: parse_lags("LJUNG_BOX_LAGS", &text("LJUNG_BOX_LAGS", "10,20"))?,

            bars_per_year:    parse_env(&lookup, "BARS_PER_YEAR", 1_764.0)?,
            forecast_horizon: parse_env(&lookup, "FORECAST_HORIZON", 24usize)?,
            vol_regime_low:   parse_env(&lookup, "VOL_REGIME_LOW", 0.15)?,
            vol_regime_high:  parse_env(&lookup, "VOL_REGIME_HIGH", 0.30)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject combinations no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            bail!("SYMBOL must not be empty");
        }
        if self.start_date >= self.end_date {
            bail!("START_DATE {} must be before END_DATE {}", self.start_date, self.end_date);
        }
        if self.acf_lags == 0 || self.arch_lm_lags == 0 {
            bail!("ACF_LAGS and ARCH_LM_LAGS must be positive");
        }
        if !(self.bars_per_year > 0.0) {
            bail!("BARS_PER_YEAR must be positive, got {}", self.bars_per_year);
        }
        if !(self.vol_regime_low > 0.0 && self.vol_regime_low < self.vol_regime_high) {
            bail!(
                "VOL_REGIME_LOW ({}) must be positive and below VOL_REGIME_HIGH ({})",
                self.vol_regime_low,
                self.vol_regime_high
            );
        }
        if self.plot_width == 0 || self.plot_height == 0 {
            bail!("PLOT_WIDTH and PLOT_HEIGHT must be positive");
        }
        Ok(())
    }

    pub fn analysis_config(&self, cov_type: CovarianceType) -> AnalysisConfig {
        AnalysisConfig {
            acf_lags: self.acf_lags,
            arch_lm_lags: self.arch_lm_lags,
            ljung_box_lags: self.ljung_box_lags.clone(),
            cov_type,
            bars_per_year: self.bars_per_year,
            forecast_horizon: self.forecast_horizon,
            regime: RegimeThresholds { low: self.vol_regime_low, high: self.vol_regime_high },
            ..Default::default()
        }
    }

    // ── Output paths ─────────────────────────────────────────────────

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_data.csv", self.symbol.to_lowercase()))
    }

    pub fn acf_plot_path(&self) -> PathBuf {
        self.output_dir.join(format!("ACF_Squared_Returns_{}.png", self.symbol))
    }

    pub fn volatility_plot_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_Conditional_Volatility.png", self.symbol))
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join("garch_full_results.txt")
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join("garch_results.json")
    }
}

fn default_date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| anyhow::anyhow!("invalid date {y}-{m}-{d}"))
}

fn parse_env<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Config key {key}: {e}")),
        None => Ok(default),
    }
}

/// Comma-separated positive lags, e.g. "10,20".
pub fn parse_lags(key: &str, raw: &str) -> Result<Vec<usize>> {
    let lags = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|e| anyhow::anyhow!("Config key {key}: '{s}': {e}"))
        })
        .collect::<Result<Vec<_>>>()?;
    if lags.is_empty() || lags.contains(&0) {
        bail!("Config key {key}: expected positive lags, got '{raw}'");
    }
    Ok(lags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_reproduce_the_wmt_run() {
        let cfg = from_map(&[]).unwrap();
        assert_eq!(cfg.symbol, "WMT");
        assert_eq!(cfg.start_date.to_string(), "2025-02-10");
        assert_eq!(cfg.end_date.to_string(), "2026-02-10");
        assert_eq!(cfg.interval, "1h");
        assert_eq!(cfg.acf_lags, 40);
        assert_eq!(cfg.arch_lm_lags, 12);
        assert_eq!(cfg.ljung_box_lags, vec![10, 20]);
        assert_eq!(cfg.bars_per_year, 1_764.0);
        assert_eq!((cfg.plot_width, cfg.plot_height), (3_600, 1_800));
        assert_eq!(cfg.csv_path(), PathBuf::from("./wmt_data.csv"));
        assert_eq!(cfg.acf_plot_path(), PathBuf::from("./ACF_Squared_Returns_WMT.png"));
        assert_eq!(cfg.volatility_plot_path(), PathBuf::from("./WMT_Conditional_Volatility.png"));
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = from_map(&[
            ("SYMBOL", " aapl "),
            ("LJUNG_BOX_LAGS", "5, 15 ,25"),
            ("VOL_REGIME_HIGH", "0.5"),
            ("OUTPUT_DIR", "out"),
        ])
        .unwrap();
        assert_eq!(cfg.symbol, "AAPL");
        assert_eq!(cfg.ljung_box_lags, vec![5, 15, 25]);
        assert_eq!(cfg.vol_regime_high, 0.5);
        assert_eq!(cfg.results_path(), PathBuf::from("out/garch_full_results.txt"));

        let a = cfg.analysis_config(CovarianceType::Classic);
        assert_eq!(a.ljung_box_lags, vec![5, 15, 25]);
        assert_eq!(a.cov_type, CovarianceType::Classic);
        assert_eq!(a.regime.high, 0.5);
    }

    #[test]
    fn bad_values_name_the_key() {
        let err = from_map(&[("ACF_LAGS", "forty")]).unwrap_err();
        assert!(err.to_string().contains("ACF_LAGS"));

        let err = from_map(&[("LJUNG_BOX_LAGS", "10,0")]).unwrap_err();
        assert!(err.to_string().contains("LJUNG_BOX_LAGS"));
    }

    #[test]
    fn inconsistent_values_are_rejected() {
        assert!(from_map(&[("START_DATE", "2026-03-01")]).is_err());
        assert!(from_map(&[("VOL_REGIME_LOW", "0.4")]).is_err());
    }
}
