//! Repeated poll-and-report runs

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use super::{Cli, CliError};
use crate::config::Config;
use crate::fetcher::retry::RetryPolicy;
use crate::fetcher::welldata::WellDataFetcher;
use crate::fetcher::WellDataSource;
use crate::output::{report_path, writer_for, Report, ReportWriter};
use crate::pipeline::RunPipeline;

/// Create progress bar with style
fn create_progress_bar(counter: u32, runs: u32) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Run {counter}/{runs}"));
    pb
}

impl Cli {
    /// Load the configuration and execute every run against the live API
    ///
    /// # Errors
    /// Configuration problems and token failures.
    pub async fn execute(&self) -> Result<Vec<PathBuf>, CliError> {
        let config = Config::load_or_template(&self.config)?;

        let policy = RetryPolicy::data().with_delay(Duration::from_secs(self.retry_delay_secs));
        let fetcher = WellDataFetcher::from_config(&config.server)?.with_data_retry(policy);

        self.execute_with(&fetcher, &config).await
    }

    /// Execute every run against `source`
    ///
    /// Returns the reports that were written. A run whose report cannot be
    /// written is logged and the next run still starts.
    pub async fn execute_with(
        &self,
        source: &dyn WellDataSource,
        config: &Config,
    ) -> Result<Vec<PathBuf>, CliError> {
        let writer = writer_for(self.format);
        let mut written = Vec::new();

        for counter in 1..=self.runs {
            info!("Starting run {}/{} against {}", counter, self.runs, source.base_url());

            match self.run_once(counter, source, config, writer.as_ref()).await {
                Ok(path) => {
                    info!("Run {} report written to {}", counter, path.display());
                    written.push(path);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => error!("Run {} report lost: {}", counter, e),
            }
        }

        Ok(written)
    }

    async fn run_once(
        &self,
        counter: u32,
        source: &dyn WellDataSource,
        config: &Config,
        writer: &dyn ReportWriter,
    ) -> Result<PathBuf, CliError> {
        let mut pipeline = RunPipeline::new(source, config);
        if !self.quiet {
            pipeline = pipeline.with_progress(create_progress_bar(counter, self.runs));
        }
        let results = pipeline.run().await?;

        let report = Report::from_results(&results);
        let path = report_path(&self.output_dir, counter, results.historic_interval, self.format);
        writer.write_report(&report, &path)?;
        Ok(path)
    }
}
