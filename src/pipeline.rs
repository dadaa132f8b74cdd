//! Run orchestration
//!
//! One run is: token → job listing → for each job {job by id → attributes →
//! time requests}. Calls are strictly sequential. Only the token exchange can
//! fail the run; every later failure is logged and the affected job (or the
//! affected request) is skipped.

use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{Config, DownloadConfig};
use crate::fetcher::jobs::{JobFilter, JobQuery};
use crate::fetcher::pagination::{collect_jobs, MAX_PAGES};
use crate::fetcher::{FetcherError, FetcherResult, Token, WellDataSource};
use crate::request::{build_time_request, TimeRequestKind, TimeWindow};
use crate::timing::{PhaseTimer, TimingLog, ALL_JOBS_SUBJECT, TOKEN_SUBJECT};
use crate::{select_attributes, Attribute, Job, JobAttribute, Phase};

/// Attribute with data, tagged with its job
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRow {
    /// Owning job
    pub job_id: String,
    /// Attribute as described by the server
    pub attribute: JobAttribute,
}

/// Time-series answer, tagged with its job and request
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDataRow {
    /// Owning job
    pub job_id: String,
    /// Request that produced it
    pub kind: TimeRequestKind,
    /// Raw JSON answer
    pub data: Value,
}

/// Everything one run accumulated
#[derive(Debug, Clone)]
pub struct RunResults {
    /// Jobs fetched by id
    pub jobs: Vec<Job>,
    /// Selected attributes
    pub attributes: Vec<AttributeRow>,
    /// Time-series answers
    pub time_data: Vec<TimeDataRow>,
    /// Phase timings and slow-call issues
    pub timing: TimingLog,
    /// Total reported by the listing, when available
    pub total_jobs: Option<u64>,
    /// Jobs returned by the listing after filtering
    pub listed_jobs: usize,
    /// Jobs whose pipeline stopped early
    pub skipped_jobs: Vec<String>,
    /// Time requests issued for each job
    pub time_requests: Vec<TimeRequestKind>,
    /// Historical interval, used in the report name
    pub historic_interval: f64,
}

impl RunResults {
    fn new(config: &Config, timing: TimingLog) -> Self {
        Self {
            jobs: Vec::new(),
            attributes: Vec::new(),
            time_data: Vec::new(),
            timing,
            total_jobs: None,
            listed_jobs: 0,
            skipped_jobs: Vec::new(),
            time_requests: config.download.time_requests.clone(),
            historic_interval: config.download.historic_interval,
        }
    }

    /// Answers of one request kind, in job order
    pub fn time_data_of(&self, kind: TimeRequestKind) -> impl Iterator<Item = &TimeDataRow> {
        self.time_data.iter().filter(move |row| row.kind == kind)
    }
}

fn listing_query(download: &DownloadConfig) -> JobQuery {
    let mut query = JobQuery::new(download.job_status, download.page_size).with_total(true);
    match download.start_dates() {
        Ok((min, max)) => query = query.with_start_dates(min, max),
        Err(e) => warn!("Start date bounds ignored: {}", e),
    }
    match download.end_dates() {
        Ok((min, max)) => query = query.with_end_dates(min, max),
        Err(e) => warn!("End date bounds ignored: {}", e),
    }
    query
}

fn timing_phase(kind: TimeRequestKind) -> Phase {
    match kind {
        TimeRequestKind::Historical => Phase::HistoricalPull,
        TimeRequestKind::Current => Phase::CurrentPull,
        TimeRequestKind::Events => Phase::EventPull,
    }
}

/// Sequential fetch pipeline for one run
pub struct RunPipeline<'a> {
    source: &'a dyn WellDataSource,
    config: &'a Config,
    now: DateTime<Utc>,
    slow_threshold: Option<Duration>,
    progress: Option<ProgressBar>,
}

impl<'a> RunPipeline<'a> {
    /// Pipeline over `source` with `config`, windowed from the current time
    pub fn new(source: &'a dyn WellDataSource, config: &'a Config) -> Self {
        Self {
            source,
            config,
            now: Utc::now(),
            slow_threshold: None,
            progress: None,
        }
    }

    /// Anchor the time window at `now`
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Override the slow-call threshold
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    /// Advance `progress` once per job
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Execute the run
    ///
    /// # Errors
    /// Token failures, and a job listing that never stops paging.
    pub async fn run(self) -> FetcherResult<RunResults> {
        let timing = match self.slow_threshold {
            Some(t) => TimingLog::with_threshold(t),
            None => TimingLog::new(),
        };
        let mut results = RunResults::new(self.config, timing);

        let timer = PhaseTimer::start(Phase::Token);
        let token = self.source.authenticate().await;
        timer.finish(&mut results.timing, TOKEN_SUBJECT);
        let token = token.map_err(|e| {
            error!("Could not obtain a token from {}: {}", self.source.base_url(), e);
            e
        })?;

        let download = &self.config.download;
        let query = listing_query(download);
        let filter = JobFilter::from_config(download);

        let timer = PhaseTimer::start(Phase::AllJobs);
        let listing = collect_jobs(self.source, &token, query, &filter, MAX_PAGES).await;
        timer.finish(&mut results.timing, ALL_JOBS_SUBJECT);
        let listing = listing?;

        info!(
            "Listed {} jobs ({} before filtering, server total {:?})",
            listing.jobs.len(),
            listing.unfiltered,
            listing.total
        );
        results.total_jobs = listing.total;
        results.listed_jobs = listing.jobs.len();

        if let Some(pb) = &self.progress {
            pb.set_length(listing.jobs.len() as u64);
        }

        for job in &listing.jobs {
            if let Some(pb) = &self.progress {
                pb.set_message(job.id.clone());
            }

            let timer = PhaseTimer::start(Phase::TotalProcess);
            if let Err(e) = self.process_job(&token, &job.id, &mut results).await {
                error!("Job {} skipped: {}", job.id, e);
                results.skipped_jobs.push(job.id.clone());
            }
            timer.finish(&mut results.timing, job.id.clone());

            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = &self.progress {
            pb.finish_with_message("done");
        }

        info!(
            "Run finished: {} jobs, {} attributes, {} time answers, {} skipped, {} slow calls",
            results.jobs.len(),
            results.attributes.len(),
            results.time_data.len(),
            results.skipped_jobs.len(),
            results.timing.issues().len()
        );

        Ok(results)
    }

    async fn process_job(
        &self,
        token: &Token,
        job_id: &str,
        results: &mut RunResults,
    ) -> Result<(), FetcherError> {
        let download = &self.config.download;

        let timer = PhaseTimer::start(Phase::JobById);
        let job = self.source.get_job(token, job_id).await;
        timer.finish(&mut results.timing, job_id);
        results.jobs.push(job?);

        let timer = PhaseTimer::start(Phase::Attributes);
        let attributes = self.source.get_attributes(token, job_id).await;
        timer.finish(&mut results.timing, job_id);
        let attributes = attributes?;

        let selected = select_attributes(&attributes, &download.filter_list);
        let requested: Vec<Attribute> = selected.iter().map(|a| Attribute::last(a.id.clone())).collect();
        results
            .attributes
            .extend(selected.into_iter().map(|attribute| AttributeRow {
                job_id: job_id.to_string(),
                attribute,
            }));

        if requested.is_empty() {
            info!("Job {} has no attributes with data, skipping time requests", job_id);
            return Ok(());
        }

        let Some(window) = TimeWindow::hours_back(self.now, download.from_hours, download.to_hours) else {
            warn!(
                "Job {}: window {}h..{}h before {} is out of range, skipping time requests",
                job_id, download.from_hours, download.to_hours, self.now
            );
            return Ok(());
        };

        for &kind in &download.time_requests {
            let Some(request) = build_time_request(
                kind,
                &requested,
                &window,
                download.historic_interval,
                download.current_frequency,
                download.current_interval,
            ) else {
                continue;
            };

            let timer = PhaseTimer::start(timing_phase(kind));
            let answer = self.source.fetch_time_data(token, job_id, &request).await;
            timer.finish(&mut results.timing, job_id);

            match answer {
                Ok(data) => results.time_data.push(TimeDataRow {
                    job_id: job_id.to_string(),
                    kind,
                    data,
                }),
                Err(e) => warn!("No {} data for job {}: {}", kind, job_id, e),
            }
        }

        Ok(())
    }
}
