/// metrics.rs — Descriptive statistics
///
/// ─────────────────────────────────────────────────────────────────────────
/// DEFINITIONS
/// ─────────────────────────────────────────────────────────────────────────
///
///   mean   x̄ = Σ x_i / n
///   std    s  = √( Σ (x_i − x̄)² / (n − 1) )          (sample, ddof = 1)
///
///   Quantile q ∈ [0, 1], linear interpolation on sorted x_(0) ≤ … ≤ x_(n−1):
///       h = q · (n − 1)
///       Q(q) = x_(⌊h⌋) + (h − ⌊h⌋) · (x_(⌊h⌋+1) − x_(⌊h⌋))
/// ─────────────────────────────────────────────────────────────────────────
use serde::Serialize;

use crate::error::{require_finite, require_len, Result};

/// Summary table of a numeric series (count, moments, five-number summary).
#[derive(Debug, Clone, Serialize)]
pub struct Describe {
    pub name:  String,
    pub count: usize,
    pub mean:  f64,
    pub std:   f64,
    pub min:   f64,
    pub q25:   f64,
    pub q50:   f64,
    pub q75:   f64,
    pub max:   f64,
}

impl std::fmt::Display for Describe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:<8}{:>16}", "", self.name)?;
        writeln!(f, "{:<8}{:>16.6}", "count", self.count as f64)?;
        writeln!(f, "{:<8}{:>16.6}", "mean", self.mean)?;
        writeln!(f, "{:<8}{:>16.6}", "std", self.std)?;
        writeln!(f, "{:<8}{:>16.6}", "min", self.min)?;
        writeln!(f, "{:<8}{:>16.6}", "25%", self.q25)?;
        writeln!(f, "{:<8}{:>16.6}", "50%", self.q50)?;
        writeln!(f, "{:<8}{:>16.6}", "75%", self.q75)?;
        write!(f, "{:<8}{:>16.6}", "max", self.max)
    }
}

/// Compute the `Describe` table for `data`.
pub fn describe(name: &str, data: &[f64]) -> Result<Describe> {
    require_len(data, 1)?;
    require_finite(data, name)?;

    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    Ok(Describe {
        name:  name.to_owned(),
        count: data.len(),
        mean:  mean(data),
        std:   std_dev(data),
        min:   sorted[0],
        q25:   quantile_sorted(&sorted, 0.25),
        q50:   quantile_sorted(&sorted, 0.50),
        q75:   quantile_sorted(&sorted, 0.75),
        max:   sorted[sorted.len() - 1],
    })
}

// ── Statistical helpers ───────────────────────────────────────────────────

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample variance (ddof = 1).  NaN for fewer than 2 points.
pub fn variance(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return f64::NAN;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64
}

pub fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Linear-interpolated quantile of an already sorted slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let h = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = h.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_small_series() {
        let d = describe("x", &[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(d.count, 4);
        assert!((d.mean - 2.5).abs() < 1e-12);
        // Σ(x−2.5)² = 5 → 5/3
        assert!((d.std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(d.min, 1.0);
        assert!((d.q25 - 1.75).abs() < 1e-12);
        assert!((d.q50 - 2.5).abs() < 1e-12);
        assert!((d.q75 - 3.25).abs() < 1e-12);
        assert_eq!(d.max, 4.0);
    }

    #[test]
    fn describe_rejects_nan() {
        assert!(describe("x", &[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn describe_renders_all_rows() {
        let text = describe("ret", &[0.1, -0.1, 0.2]).unwrap().to_string();
        for row in ["count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
            assert!(text.contains(row), "missing {row}");
        }
    }
}
