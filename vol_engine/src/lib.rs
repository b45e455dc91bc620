pub mod analysis;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod metrics;
pub mod models;
pub mod regression;
pub mod report;

#[cfg(test)]
mod test_support;

pub use analysis::{run_analysis, Analysis, AnalysisConfig, VolOutlook};
pub use data::{PriceBar, PriceSeries, ReturnSeries};
pub use error::{EngineError, Result};
pub use models::*;
