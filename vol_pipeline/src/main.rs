/// main.rs — GARCH(1,1) volatility analysis entry point
///
/// Runs the full pipeline for one symbol:
///   1. Load config from .env, overlay CLI flags
///   2. Download hourly bars (or load a saved CSV with --input) and save CSV
///   3. Pre-fit diagnostics: ADF, ACF of r², ARCH-LM
///   4. Fit zero-mean Gaussian GARCH(1,1)
///   5. Post-fit diagnostics: Ljung-Box on z and z²
///   6. Write results text and JSON, then charts
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vol_engine::models::CovarianceType;
use vol_engine::report::console_report;
use vol_engine::{run_analysis, PriceSeries};
use vol_pipeline::{load_csv, save_csv, write_outputs, AppConfig, SourceArgs, YahooClient};

#[derive(Debug, Parser)]
#[command(name = "garch_analysis", about = "Hourly log-return diagnostics and GARCH(1,1) fit")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// Analyse a previously saved CSV instead of downloading
    #[arg(long)]
    input: Option<PathBuf>,

    /// Parameter covariance estimator
    #[arg(long, default_value_t = CovarianceType::Robust)]
    cov: CovarianceType,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("╔══════════════════════════════════════════════╗");
    info!("║      VOLATILITY ANALYSIS  —  GARCH(1,1)      ║");
    info!("║  ADF + ARCH-LM + Ljung-Box diagnostics       ║");
    info!("╚══════════════════════════════════════════════╝");

    // ── Config ───────────────────────────────────────────────────────────
    let mut cfg = AppConfig::from_env()?;
    cli.source.apply(&mut cfg)?;
    info!(
        "Config: symbol={} window={}..{} interval={} cov={} output={}",
        cfg.symbol, cfg.start_date, cfg.end_date, cfg.interval, cli.cov,
        cfg.output_dir.display()
    );

    // ── Data ─────────────────────────────────────────────────────────────
    let prices = match &cli.input {
        Some(path) => load_csv(path, &cfg.symbol)?,
        None => {
            let client = YahooClient::new(&cfg.yahoo_base_url, cfg.http_timeout_secs)?;
            let bars = client
                .fetch_bars(&cfg.symbol, cfg.start_date, cfg.end_date, &cfg.interval)
                .await?;
            save_csv(&bars, &cfg.csv_path())?;
            PriceSeries::new(cfg.symbol.clone(), bars)?
        }
    };
    info!(
        "Loaded {} bars  ({} → {})",
        prices.len(),
        prices.first_timestamp(),
        prices.last_timestamp()
    );

    // ── Analysis ─────────────────────────────────────────────────────────
    let analysis = run_analysis(&prices, &cfg.analysis_config(cli.cov))?;
    println!("{}", console_report(&analysis));

    // ── Results, then charts ─────────────────────────────────────────────
    write_outputs(&analysis, &cfg)?;

    info!("Done.");
    Ok(())
}
