//! CLI error types and conversions

use crate::config::ConfigError;
use crate::fetcher::FetcherError;
use crate::output::OutputError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),
}

impl CliError {
    /// Whether the error stops every remaining run
    ///
    /// A report that cannot be written only loses that run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CliError::OutputError(_))
    }
}
