/// data.rs — Price bars and log-return series
///
/// ─────────────────────────────────────────────────────────────────────────
/// INVARIANTS
/// ─────────────────────────────────────────────────────────────────────────
///
///   PriceSeries:
///     - timestamps strictly increasing (sorted; duplicates keep the last bar)
///     - every close finite and > 0 (null / zero rows are dropped)
///     - at least 2 bars (one return)
///
///   Log return (bar t, t ≥ 1):
///       r_t = ln(C_t / C_{t−1})
///
///   The first bar has no predecessor and yields no return, so
///   len(returns) = len(bars) − 1.
/// ─────────────────────────────────────────────────────────────────────────
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};

/// One OHLCV bar.  Open/high/low/volume may be NaN when the vendor omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<FixedOffset>,
    pub open:      f64,
    pub high:      f64,
    pub low:       f64,
    pub close:     f64,
    pub volume:    f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    pub symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Normalise raw vendor bars into a series that honours the invariants above.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Result<Self> {
        let raw = bars.len();
        bars.retain(|b| b.close.is_finite() && b.close > 0.0);
        let dropped = raw - bars.len();
        if dropped > 0 {
            warn!("Dropped {dropped} bars with missing or non-positive close");
        }

        // Stable sort keeps vendor order among equal timestamps, so the
        // reverse-dedup below retains the last occurrence.
        bars.sort_by_key(|b| b.timestamp);
        bars.reverse();
        bars.dedup_by_key(|b| b.timestamp);
        bars.reverse();
        let dupes = raw - dropped - bars.len();
        if dupes > 0 {
            debug!("Removed {dupes} duplicate timestamps");
        }

        if bars.len() < 2 {
            return Err(EngineError::InsufficientData { needed: 2, got: bars.len() });
        }
        Ok(Self { symbol: symbol.into(), bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first_timestamp(&self) -> DateTime<FixedOffset> {
        self.bars[0].timestamp
    }

    pub fn last_timestamp(&self) -> DateTime<FixedOffset> {
        self.bars[self.bars.len() - 1].timestamp
    }

    /// ln(C_t / C_{t−1}) for every consecutive pair of bars.
    pub fn log_returns(&self) -> ReturnSeries {
        let (timestamps, values) = self
            .bars
            .windows(2)
            .map(|w| (w[1].timestamp, (w[1].close / w[0].close).ln()))
            .unzip();
        ReturnSeries { name: format!("{} log return", self.symbol), timestamps, values }
    }
}

/// Time-indexed return series.  `values[i]` is realised at `timestamps[i]`.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnSeries {
    pub name:       String,
    pub timestamps: Vec<DateTime<FixedOffset>>,
    pub values:     Vec<f64>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Element-wise square, used for the ARCH-effect ACF.
    pub fn squared(&self) -> Vec<f64> {
        self.values.iter().map(|r| r * r).collect()
    }
}

#[cfg(test)]
pub(crate) fn bar_at(hour: u32, close: f64) -> PriceBar {
    use chrono::TimeZone;
    let tz = FixedOffset::west_opt(5 * 3600).unwrap();
    PriceBar {
        timestamp: tz.with_ymd_and_hms(2025, 2, 10, hour, 30, 0).unwrap(),
        open:   close,
        high:   close,
        low:    close,
        close,
        volume: 1_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_returns_drop_first_bar() {
        let s = PriceSeries::new("WMT", vec![bar_at(9, 100.0), bar_at(10, 110.0), bar_at(11, 99.0)])
            .unwrap();
        let r = s.log_returns();
        assert_eq!(r.len(), 2);
        assert!((r.values[0] - (1.1f64).ln()).abs() < 1e-12);
        assert!((r.values[1] - (99.0f64 / 110.0).ln()).abs() < 1e-12);
        assert_eq!(r.timestamps[0], s.bars()[1].timestamp);
    }

    #[test]
    fn unsorted_and_duplicate_bars_are_normalised() {
        let s = PriceSeries::new(
            "WMT",
            vec![bar_at(11, 3.0), bar_at(9, 1.0), bar_at(10, 2.0), bar_at(10, 2.5)],
        )
        .unwrap();
        let closes = s.closes();
        assert_eq!(closes, vec![1.0, 2.5, 3.0]);
        assert!(s.bars().windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn null_closes_are_dropped() {
        let s = PriceSeries::new(
            "WMT",
            vec![bar_at(9, 1.0), bar_at(10, f64::NAN), bar_at(11, 0.0), bar_at(12, 2.0)],
        )
        .unwrap();
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn single_bar_is_rejected() {
        let err = PriceSeries::new("WMT", vec![bar_at(9, 1.0)]).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData { needed: 2, got: 1 }));
    }
}
