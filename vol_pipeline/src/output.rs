/// output.rs — Files written at the end of a run
///
///   garch_full_results.txt        model summary + post-fit Ljung-Box tables
///   garch_results.json            every computed quantity, machine readable
///   ACF_Squared_Returns_<SYM>.png
///   <SYM>_Conditional_Volatility.png
///
/// Results go to disk before any chart is drawn; a drawing failure leaves
/// them in place.
use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use vol_engine::report::full_results;
use vol_engine::Analysis;

use crate::config::AppConfig;
use crate::plots::{plot_acf, plot_volatility, PlotSize};

pub fn write_outputs(analysis: &Analysis, cfg: &AppConfig) -> Result<()> {
    write_results(analysis, cfg)?;
    write_charts(analysis, cfg)
}

pub fn write_results(analysis: &Analysis, cfg: &AppConfig) -> Result<()> {
    fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("creating {}", cfg.output_dir.display()))?;

    let txt = cfg.results_path();
    fs::write(&txt, full_results(analysis)).with_context(|| format!("writing {}", txt.display()))?;
    info!("Results written to {}", txt.display());

    let json = cfg.json_path();
    let body = serde_json::to_string_pretty(analysis).context("serialising analysis")?;
    fs::write(&json, body).with_context(|| format!("writing {}", json.display()))?;
    info!("JSON results written to {}", json.display());
    Ok(())
}

pub fn write_charts(analysis: &Analysis, cfg: &AppConfig) -> Result<()> {
    let size = PlotSize { width: cfg.plot_width, height: cfg.plot_height };

    let acf_path = cfg.acf_plot_path();
    plot_acf(
        &analysis.acf_squared,
        &format!("ACF of Squared Log Returns ({})", cfg.symbol),
        &acf_path,
        size,
    )
    .with_context(|| format!("drawing {}", acf_path.display()))?;
    info!("ACF chart saved to {}", acf_path.display());

    let vol_path = cfg.volatility_plot_path();
    plot_volatility(
        &analysis.returns.timestamps,
        &analysis.fit.conditional_volatility,
        &format!("{} Conditional Volatility - GARCH(1,1)", cfg.symbol),
        &vol_path,
        size,
    )
    .with_context(|| format!("drawing {}", vol_path.display()))?;
    info!("Volatility chart saved to {}", vol_path.display());
    Ok(())
}
