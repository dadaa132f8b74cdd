//! Command-line entry point

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::output::OutputFormat;

pub mod error;
pub mod run;

pub use error::CliError;

/// Default number of runs per invocation
pub const DEFAULT_RUNS: u32 = 3;

/// WellData API poller and timing reporter
#[derive(Parser, Debug, Clone)]
#[command(name = "welldata-poller")]
#[command(about = "Poll the WellData API and report per-call timings", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file; a template is written here if it does not exist
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Number of consecutive runs, one report each (range: 1-1000)
    #[arg(long, default_value_t = DEFAULT_RUNS, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub runs: u32,

    /// Report format (xlsx or csv)
    #[arg(long, default_value = "xlsx")]
    pub format: OutputFormat,

    /// Directory receiving the reports
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Seconds to wait before retrying a failed data call
    #[arg(long, default_value_t = 20)]
    pub retry_delay_secs: u64,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}
