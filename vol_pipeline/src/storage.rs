/// storage.rs — CSV persistence of downloaded bars
///
/// Layout (one row per bar, exchange-local timestamps):
///   Datetime,Open,High,Low,Close,Volume
///   2025-02-10 09:30:00-05:00,98.1,98.6,97.95,98.41,2451300.0
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::DateTime;
use polars::prelude::*;
use tracing::info;

use vol_engine::{PriceBar, PriceSeries};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

pub fn bars_to_frame(bars: &[PriceBar]) -> Result<DataFrame> {
    let df = df!(
        "Datetime" => bars.iter()
            .map(|b| b.timestamp.format(DATETIME_FORMAT).to_string())
            .collect::<Vec<_>>(),
        "Open"   => bars.iter().map(|b| b.open).collect::<Vec<_>>(),
        "High"   => bars.iter().map(|b| b.high).collect::<Vec<_>>(),
        "Low"    => bars.iter().map(|b| b.low).collect::<Vec<_>>(),
        "Close"  => bars.iter().map(|b| b.close).collect::<Vec<_>>(),
        "Volume" => bars.iter().map(|b| b.volume).collect::<Vec<_>>(),
    )?;
    Ok(df)
}

pub fn save_csv(bars: &[PriceBar], path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut df = bars_to_frame(bars)?;
    let mut file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    info!("Saved {} rows to {}", df.height(), path.display());
    Ok(())
}

pub fn frame_to_bars(df: &DataFrame) -> Result<Vec<PriceBar>> {
    let datetimes = df.column("Datetime")?.str()?;
    let float = |name: &str| -> Result<Column> {
        Ok(df.column(name)?.cast(&DataType::Float64)?)
    };
    let (opens, highs, lows, closes, volumes) =
        (float("Open")?, float("High")?, float("Low")?, float("Close")?, float("Volume")?);
    let (opens, highs, lows, closes, volumes) =
        (opens.f64()?, highs.f64()?, lows.f64()?, closes.f64()?, volumes.f64()?);

    let mut bars = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let raw = datetimes.get(i).with_context(|| format!("row {i}: missing Datetime"))?;
        let timestamp = DateTime::parse_from_str(raw, DATETIME_FORMAT)
            .with_context(|| format!("row {i}: bad Datetime '{raw}'"))?;
        // Missing prices become NaN; PriceSeries::new drops rows whose close is unusable.
        bars.push(PriceBar {
            timestamp,
            open:   opens.get(i).unwrap_or(f64::NAN),
            high:   highs.get(i).unwrap_or(f64::NAN),
            low:    lows.get(i).unwrap_or(f64::NAN),
            close:  closes.get(i).unwrap_or(f64::NAN),
            volume: volumes.get(i).unwrap_or(0.0),
        });
    }
    Ok(bars)
}

/// Load a previously saved CSV as a validated series.
pub fn load_csv(path: &Path, symbol: &str) -> Result<PriceSeries> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("reading {}", path.display()))?;
    let bars = frame_to_bars(&df)?;
    info!("Loaded {} rows from {}", bars.len(), path.display());
    Ok(PriceSeries::new(symbol, bars)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn sample_bars() -> Vec<PriceBar> {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let t0 = tz.with_ymd_and_hms(2025, 2, 10, 9, 30, 0).unwrap();
        (0..5)
            .map(|i| {
                let close = 98.0 + i as f64 * 0.25;
                PriceBar {
                    timestamp: t0 + Duration::hours(i),
                    open:   close - 0.1,
                    high:   close + 0.2,
                    low:    close - 0.3,
                    close,
                    volume: 1_000.0 * (i + 1) as f64,
                }
            })
            .collect()
    }

    #[test]
    fn csv_round_trip_preserves_bars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wmt_data.csv");
        let bars = sample_bars();

        save_csv(&bars, &path).unwrap();
        let header = fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("Datetime,Open,High,Low,Close,Volume"));
        assert!(header.contains("2025-02-10 09:30:00-05:00"));

        let series = load_csv(&path, "WMT").unwrap();
        assert_eq!(series.len(), bars.len());
        for (a, b) in series.bars().iter().zip(&bars) {
            assert_eq!(a.timestamp, b.timestamp);
            assert!((a.close - b.close).abs() < 1e-12);
            assert!((a.volume - b.volume).abs() < 1e-9);
        }
    }

    #[test]
    fn frame_has_expected_columns() {
        let df = bars_to_frame(&sample_bars()).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["Datetime", "Open", "High", "Low", "Close", "Volume"]);
        assert_eq!(df.height(), 5);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_csv(&dir.path().join("absent.csv"), "WMT").is_err());
    }
}
