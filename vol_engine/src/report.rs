/// report.rs — Text rendering of an `Analysis`
///
/// Two renderings share the same building blocks:
///   console_report()  everything printed while the pipeline runs
///   full_results()    the persisted results file (summary + post-fit tables)
use std::fmt::Write;

use crate::analysis::Analysis;

const RULE_WIDTH: usize = 80;

pub fn banner(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("{rule}\n{title}\n{rule}")
}

fn verdict(p: f64, level: f64, reject: &str, keep: &str) -> String {
    if p < level {
        format!("→ reject H0 at {:.0}%: {reject}", level * 100.0)
    } else {
        format!("→ fail to reject H0 at {:.0}%: {keep}", level * 100.0)
    }
}

pub fn console_report(a: &Analysis) -> String {
    let mut out = String::new();
    let lvl = a.significance;

    // `write!` into a String cannot fail.
    let _ = writeln!(out, "{} Hourly Log Returns: {} observations", a.symbol, a.returns.len());
    let _ = writeln!(out, "{}", a.describe);

    let _ = writeln!(out, "\n{}", banner("PRE-FIT DIAGNOSTICS"));
    let _ = writeln!(out, "{}", a.adf);
    let _ = writeln!(out, "{}", verdict(a.adf.p_value, lvl, "returns are stationary", "unit root not ruled out"));

    let sig = a.acf_squared.significant_lags();
    let _ = writeln!(
        out,
        "\nACF of squared returns: {} of {} lags outside the 95% band",
        sig.len(),
        a.acf_squared.values.len().saturating_sub(1)
    );

    let _ = writeln!(out, "\n{}", a.arch_lm);
    let _ = writeln!(out, "{}", verdict(a.arch_lm.lm_pvalue, lvl, "ARCH effects present", "no ARCH effects detected"));

    let _ = writeln!(out, "\n{}", banner(&format!("{} GARCH(1,1) RESULTS", a.symbol)));
    let _ = writeln!(out, "{}", a.fit);

    let _ = writeln!(out, "\n{}", banner("POST-FIT DIAGNOSTICS"));
    let _ = writeln!(out, "Ljung-Box Test - Standardized Residuals:\n{}", a.lb_resid);
    let _ = writeln!(out, "\nLjung-Box Test - Squared Standardized Residuals:\n{}", a.lb_sq_resid);
    let remaining = if a.lb_sq_resid.is_white_noise(lvl) {
        "→ no remaining ARCH structure in z²"
    } else {
        "→ remaining ARCH structure in z²; consider a richer volatility model"
    };
    let _ = writeln!(out, "{remaining}");

    let _ = writeln!(out, "\n{}", banner("VOLATILITY OUTLOOK"));
    let _ = write!(out, "{}", a.outlook);
    out
}

/// Contents of the persisted results file.
pub fn full_results(a: &Analysis) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}", a.fit);
    let _ = write!(out, "\n\n=== POST-FIT DIAGNOSTICS ===\n");
    let _ = write!(out, "Ljung-Box (std_resid):\n{}\n\n", a.lb_resid);
    let _ = write!(out, "Ljung-Box (std_resid²):\n{}", a.lb_sq_resid);
    let _ = write!(out, "\n\n=== VOLATILITY OUTLOOK ===\n{}\n", a.outlook);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{run_analysis, AnalysisConfig};
    use crate::test_support::synthetic_prices;

    #[test]
    fn banner_layout() {
        let b = banner("X");
        let lines: Vec<&str> = b.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), RULE_WIDTH);
        assert_eq!(lines[1], "X");
    }

    #[test]
    fn verdict_wording() {
        assert!(verdict(0.01, 0.05, "yes", "no").contains("reject H0 at 5%: yes"));
        assert!(verdict(0.20, 0.05, "yes", "no").contains("fail to reject"));
    }

    #[test]
    fn results_file_sections_in_order() {
        let a = run_analysis(&synthetic_prices(1_200), &AnalysisConfig::default()).unwrap();
        let text = full_results(&a);
        let summary = text.find("Zero Mean - GARCH Model Results").unwrap();
        let post = text.find("=== POST-FIT DIAGNOSTICS ===").unwrap();
        let lb = text.find("Ljung-Box (std_resid):").unwrap();
        let lb_sq = text.find("Ljung-Box (std_resid²):").unwrap();
        assert!(summary < post && post < lb && lb < lb_sq);
        assert!(text.contains("lb_pvalue"));
    }

    #[test]
    fn console_report_has_every_banner() {
        let a = run_analysis(&synthetic_prices(1_200), &AnalysisConfig::default()).unwrap();
        let text = console_report(&a);
        for needle in ["PRE-FIT DIAGNOSTICS", "ADF Statistic", "ARCH-LM", "SIM GARCH(1,1) RESULTS", "POST-FIT DIAGNOSTICS", "VOLATILITY OUTLOOK"] {
            assert!(text.contains(needle), "missing {needle}");
        }
    }
}
