pub mod garch;
pub mod garch_fit;
pub mod optimizer;

pub use garch::{Garch11, RegimeThresholds, VolRegime};
pub use garch_fit::{CovarianceType, GarchFit, GarchFitConfig, ParamEstimate};
pub use optimizer::{nelder_mead, NelderMeadConfig, Objective};
