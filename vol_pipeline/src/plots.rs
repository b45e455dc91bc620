//! PNG charts for the volatility pipeline
//!
//! Two charts are produced with the [`plotters`] bitmap backend:
//! the autocorrelation of squared returns with its confidence band, and the
//! fitted conditional volatility over time.  Both render headless.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use plotters::prelude::*;
use thiserror::Error;

use vol_engine::diagnostics::AcfBands;

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

/// Pixel size of an output image.
#[derive(Debug, Clone, Copy)]
pub struct PlotSize {
    pub width:  u32,
    pub height: u32,
}

impl PlotSize {
    /// Font sizes follow the image height so large renders stay legible.
    fn font(&self, divisor: u32) -> u32 {
        (self.height / divisor).max(10)
    }
}

impl Default for PlotSize {
    fn default() -> Self {
        Self { width: 3_600, height: 1_800 }
    }
}

/// Stem chart of the ACF at lags 0..=k with the shaded (1 − α) band.
pub fn plot_acf(acf: &AcfBands, title: &str, output_path: &Path, size: PlotSize) -> Result<()> {
    if acf.values.len() < 2 {
        return Err(PlotError::InvalidData("ACF needs at least one lag".to_string()));
    }
    let max_lag = (acf.values.len() - 1) as f64;

    let y_lo = acf
        .values
        .iter()
        .copied()
        .chain(acf.bands.iter().map(|b| -b))
        .fold(-0.1_f64, f64::min)
        * 1.1;
    let y_hi = 1.1;

    let root = BitMapBackend::new(output_path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", size.font(18)))
        .margin(size.font(30))
        .x_label_area_size(size.font(12))
        .y_label_area_size(size.font(9))
        .build_cartesian_2d(-0.5..max_lag + 0.5, y_lo..y_hi)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Lag")
        .y_desc("Autocorrelation")
        .label_style(("sans-serif", size.font(40)))
        .x_label_formatter(&|x| format!("{:.0}", x))
        .y_label_formatter(&|y| format!("{:.2}", y))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    // Confidence band around zero, lags 1..=k
    let upper: Vec<(f64, f64)> = (1..acf.bands.len()).map(|k| (k as f64, acf.bands[k])).collect();
    let lower: Vec<(f64, f64)> = upper.iter().rev().map(|&(x, b)| (x, -b)).collect();
    let band: Vec<(f64, f64)> = upper.into_iter().chain(lower).collect();
    chart
        .draw_series(std::iter::once(Polygon::new(band, BLUE.mix(0.15).filled())))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(-0.5, 0.0), (max_lag + 0.5, 0.0)],
            BLACK.stroke_width(1),
        )))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let stroke = (size.height / 600).max(1);
    chart
        .draw_series(acf.values.iter().enumerate().map(|(k, &v)| {
            PathElement::new(vec![(k as f64, 0.0), (k as f64, v)], BLUE.stroke_width(stroke))
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    chart
        .draw_series(
            acf.values
                .iter()
                .enumerate()
                .map(|(k, &v)| Circle::new((k as f64, v), stroke * 4, BLUE.filled())),
        )
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present().map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// Line chart of conditional volatility, x axis labelled with bar dates.
pub fn plot_volatility(
    timestamps: &[DateTime<FixedOffset>],
    volatility: &[f64],
    title: &str,
    output_path: &Path,
    size: PlotSize,
) -> Result<()> {
    if volatility.is_empty() {
        return Err(PlotError::InvalidData("volatility series is empty".to_string()));
    }
    if timestamps.len() != volatility.len() {
        return Err(PlotError::InvalidData(format!(
            "{} timestamps for {} volatility values",
            timestamps.len(),
            volatility.len()
        )));
    }
    if volatility.iter().any(|v| !v.is_finite()) {
        return Err(PlotError::InvalidData("volatility contains non-finite values".to_string()));
    }

    let n = volatility.len();
    let v_max = volatility.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let v_min = volatility.iter().copied().fold(f64::INFINITY, f64::min);
    let pad = ((v_max - v_min) * 0.05).max(v_max.abs() * 1e-3).max(f64::MIN_POSITIVE);

    let root = BitMapBackend::new(output_path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", size.font(18)))
        .margin(size.font(30))
        .x_label_area_size(size.font(12))
        .y_label_area_size(size.font(7))
        .build_cartesian_2d(0.0..(n - 1).max(1) as f64, (v_min - pad).max(0.0)..v_max + pad)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    // Bar index → calendar date of that bar
    let date_label = |x: &f64| -> String {
        let i = (x.round().max(0.0) as usize).min(n - 1);
        timestamps[i].format("%Y-%m-%d").to_string()
    };

    chart
        .configure_mesh()
        .x_labels(8)
        .y_desc("Volatility")
        .label_style(("sans-serif", size.font(40)))
        .x_label_formatter(&date_label)
        .y_label_formatter(&|y| format!("{:.4}", y))
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.3))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(
            volatility.iter().enumerate().map(|(i, &v)| (i as f64, v)),
            BLUE.stroke_width((size.height / 900).max(1)),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present().map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    // Rendering itself needs system fonts; these cover the input checks that
    // run before any drawing.

    #[test]
    fn acf_without_lags_is_rejected() {
        let acf = AcfBands { values: vec![1.0], bands: vec![0.0], alpha: 0.05, nobs: 10 };
        let dir = tempfile::tempdir().unwrap();
        let err = plot_acf(&acf, "t", &dir.path().join("a.png"), PlotSize::default()).unwrap_err();
        assert!(matches!(err, PlotError::InvalidData(_)));
    }

    #[test]
    fn volatility_length_mismatch_is_rejected() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let t0 = tz.with_ymd_and_hms(2025, 2, 10, 14, 30, 0).unwrap();
        let ts: Vec<_> = (0..3).map(|i| t0 + Duration::hours(i)).collect();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.png");

        let err = plot_volatility(&ts, &[0.01, 0.02], "t", &path, PlotSize::default()).unwrap_err();
        assert!(matches!(err, PlotError::InvalidData(_)));

        let err = plot_volatility(&ts, &[0.01, f64::NAN, 0.02], "t", &path, PlotSize::default())
            .unwrap_err();
        assert!(matches!(err, PlotError::InvalidData(_)));
    }

    #[test]
    fn font_scales_with_height() {
        let s = PlotSize { width: 3_600, height: 1_800 };
        assert_eq!(s.font(18), 100);
        assert_eq!(PlotSize { width: 100, height: 50 }.font(18), 10);
    }
}
