/// cli.rs — Command-line flags shared by both binaries
///
/// Every flag is optional; an absent flag leaves the .env / default value.
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;

use crate::config::AppConfig;

#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Ticker symbol (env SYMBOL, default WMT)
    #[arg(long)]
    pub symbol: Option<String>,

    /// First day to download, YYYY-MM-DD (env START_DATE)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Day after the last one to download, YYYY-MM-DD (env END_DATE)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Bar interval understood by the chart API (env INTERVAL, default 1h)
    #[arg(long)]
    pub interval: Option<String>,

    /// Directory for the CSV, charts and result files (env OUTPUT_DIR)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl SourceArgs {
    /// Overlay the flags on `cfg` and re-check it.
    pub fn apply(&self, cfg: &mut AppConfig) -> Result<()> {
        if let Some(symbol) = &self.symbol {
            cfg.symbol = symbol.trim().to_uppercase();
        }
        if let Some(start) = self.start {
            cfg.start_date = start;
        }
        if let Some(end) = self.end {
            cfg.end_date = end;
        }
        if let Some(interval) = &self.interval {
            cfg.interval = interval.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        cfg.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut cfg = AppConfig::from_lookup(|_| None).unwrap();
        let args = SourceArgs {
            symbol: Some("tgt".into()),
            start: NaiveDate::from_ymd_opt(2025, 6, 1),
            output_dir: Some(PathBuf::from("runs")),
            ..Default::default()
        };
        args.apply(&mut cfg).unwrap();
        assert_eq!(cfg.symbol, "TGT");
        assert_eq!(cfg.start_date.to_string(), "2025-06-01");
        assert_eq!(cfg.end_date.to_string(), "2026-02-10");
        assert_eq!(cfg.csv_path(), PathBuf::from("runs/tgt_data.csv"));
    }

    #[test]
    fn reversed_window_is_rejected() {
        let mut cfg = AppConfig::from_lookup(|_| None).unwrap();
        let args = SourceArgs { end: NaiveDate::from_ymd_opt(2024, 1, 1), ..Default::default() };
        assert!(args.apply(&mut cfg).is_err());
    }
}
