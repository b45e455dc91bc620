/// diagnostics.rs — Pre-fit and post-fit time-series tests
///
///   pre-fit:   ADF (stationarity), ACF of r², ARCH-LM (heteroskedasticity)
///   post-fit:  Ljung-Box on z_t and z_t² (standardized residuals)
pub mod acf;
pub mod adf;
pub mod arch_lm;
pub mod ljung_box;

pub use acf::{acf, acf_with_bands, AcfBands};
pub use adf::{adf_test, AdfLag, AdfResult};
pub use arch_lm::{arch_lm_test, ArchLmResult};
pub use ljung_box::{ljung_box, LjungBoxResult, LjungBoxRow};

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Upper tail P(χ²_df > x).
pub(crate) fn chi2_sf(x: f64, df: f64) -> f64 {
    match ChiSquared::new(df) {
        Ok(chi2) => 1.0 - chi2.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Standard normal Φ(x).
pub(crate) fn normal_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(n) => n.cdf(x),
        Err(_) => f64::NAN,
    }
}
