/// fetch_data.rs — Download hourly bars and save them as CSV
///
/// Same source and file layout as `garch_analysis`, without the analysis.
/// A saved file can be analysed later with `garch_analysis --input <csv>`.
use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vol_pipeline::{save_csv, AppConfig, SourceArgs, YahooClient};

#[derive(Debug, Parser)]
#[command(name = "fetch_data", about = "Download price bars to CSV")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = AppConfig::from_env()?;
    cli.source.apply(&mut cfg)?;

    info!("Target symbol: {}", cfg.symbol);
    info!("Base URL: {}", cfg.yahoo_base_url);

    let client = YahooClient::new(&cfg.yahoo_base_url, cfg.http_timeout_secs)?;
    let bars = client
        .fetch_bars(&cfg.symbol, cfg.start_date, cfg.end_date, &cfg.interval)
        .await?;
    save_csv(&bars, &cfg.csv_path())?;
    Ok(())
}
