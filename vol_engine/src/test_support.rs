//! Seeded random series for unit tests.
use chrono::{Duration, FixedOffset, TimeZone};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, StandardNormal};

use crate::data::{PriceBar, PriceSeries};

/// Centred uniform draws on [−0.5, 0.5).
pub(crate) fn uniform_noise(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen::<f64>() - 0.5).collect()
}

pub(crate) fn normal_noise(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)).collect()
}

/// Simulate a zero-mean GARCH(1,1) path started at the long-run variance.
pub(crate) fn simulate_garch(n: usize, omega: f64, alpha: f64, beta: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let shock = Normal::new(0.0, 1.0).unwrap();
    let mut sigma2 = omega / (1.0 - alpha - beta);
    let mut prev_eps: f64 = 0.0;
    (0..n)
        .map(|t| {
            if t > 0 {
                sigma2 = omega + alpha * prev_eps * prev_eps + beta * sigma2;
            }
            prev_eps = sigma2.sqrt() * shock.sample(&mut rng);
            prev_eps
        })
        .collect()
}

/// Hourly price path whose log returns follow a simulated GARCH(1,1).
pub(crate) fn synthetic_prices(n: usize) -> PriceSeries {
    garch_prices(n, 2e-6, 31)
}

/// As [`synthetic_prices`] with a chosen ω (α = 0.10, β = 0.85).
pub(crate) fn garch_prices(n: usize, omega: f64, seed: u64) -> PriceSeries {
    let tz = FixedOffset::west_opt(5 * 3600).unwrap();
    let t0 = tz.with_ymd_and_hms(2025, 2, 10, 9, 30, 0).unwrap();
    let bar = |i: usize, close: f64| PriceBar {
        timestamp: t0 + Duration::hours(i as i64),
        open: close,
        high: close,
        low: close,
        close,
        volume: 0.0,
    };

    let mut close = 100.0;
    let mut bars = vec![bar(0, close)];
    for (i, r) in simulate_garch(n, omega, 0.10, 0.85, seed).iter().enumerate() {
        close *= r.exp();
        bars.push(bar(i + 1, close));
    }
    PriceSeries::new("SIM", bars).unwrap()
}
