/// lib.rs — I/O side of the volatility pipeline
///
/// The statistics live in `vol_engine`; this crate fetches prices, stores
/// them, draws the charts and writes the result files.

pub mod cli;
pub mod config;
pub mod output;
pub mod plots;
pub mod storage;
pub mod yahoo;

pub use cli::SourceArgs;
pub use config::AppConfig;
pub use output::{write_charts, write_outputs, write_results};
pub use plots::{plot_acf, plot_volatility, PlotError, PlotSize};
pub use storage::{load_csv, save_csv};
pub use yahoo::YahooClient;
