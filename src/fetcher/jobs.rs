//! Job listing query and the contractor/operator/rig output filter

use chrono::NaiveDateTime;

use crate::config::DownloadConfig;
use crate::{Job, JobStatus};

/// Sort direction for the job listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Parameters substituted into the job listing template
#[derive(Debug, Clone, PartialEq)]
pub struct JobQuery {
    /// Status filter
    pub status: JobStatus,
    /// Earliest start date
    pub start_date_min: Option<NaiveDateTime>,
    /// Latest start date
    pub start_date_max: Option<NaiveDateTime>,
    /// Earliest end date
    pub end_date_min: Option<NaiveDateTime>,
    /// Latest end date
    pub end_date_max: Option<NaiveDateTime>,
    /// Ask the server to include capabilities
    pub include_capabilities: bool,
    /// Sort field
    pub sort: String,
    /// Sort direction
    pub sort_order: SortOrder,
    /// Page size
    pub take: u32,
    /// Jobs to skip
    pub skip: u32,
    /// Ask the server for the total count
    pub total: bool,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            status: JobStatus::ActiveJobs,
            start_date_min: None,
            start_date_max: None,
            end_date_min: None,
            end_date_max: None,
            include_capabilities: false,
            sort: "id".to_string(),
            sort_order: SortOrder::Asc,
            take: 1,
            skip: 0,
            total: false,
        }
    }
}

impl JobQuery {
    /// First page of jobs with `status`, `take` at a time
    pub fn new(status: JobStatus, take: u32) -> Self {
        Self {
            status,
            take,
            ..Self::default()
        }
    }

    /// Request the total count
    pub fn with_total(mut self, total: bool) -> Self {
        self.total = total;
        self
    }

    /// Restrict job start dates
    pub fn with_start_dates(mut self, min: Option<NaiveDateTime>, max: Option<NaiveDateTime>) -> Self {
        self.start_date_min = min;
        self.start_date_max = max;
        self
    }

    /// Restrict job end dates
    pub fn with_end_dates(mut self, min: Option<NaiveDateTime>, max: Option<NaiveDateTime>) -> Self {
        self.end_date_min = min;
        self.end_date_max = max;
        self
    }

    /// The following page: `skip` advanced by `take`
    pub fn next_page(&self) -> Self {
        Self {
            skip: self.skip + self.take,
            ..self.clone()
        }
    }
}

/// Output filter applied to listed jobs
///
/// Every filter that is set must match; with none set every job is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    /// Required contractor (first asset owner)
    pub contractor: Option<String>,
    /// Required operator (first site owner)
    pub operator: Option<String>,
    /// Required rig (first asset name)
    pub rig: Option<String>,
}

impl JobFilter {
    /// Filter from the `[download]` table; blank strings mean unset
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self {
            contractor: config.contractor().map(str::to_string),
            operator: config.operator().map(str::to_string),
            rig: config.rig().map(str::to_string),
        }
    }

    /// No filter set
    pub fn is_empty(&self) -> bool {
        self.contractor.is_none() && self.operator.is_none() && self.rig.is_none()
    }

    /// Whether `job` passes every filter that is set
    pub fn matches(&self, job: &Job) -> bool {
        fn check(wanted: &Option<String>, actual: &Option<String>) -> bool {
            match wanted {
                Some(w) => actual.as_deref() == Some(w.as_str()),
                None => true,
            }
        }

        check(&self.contractor, &job.contractor)
            && check(&self.operator, &job.operator)
            && check(&self.rig, &job.rig_name)
    }

    /// Keep matching jobs, preserving order
    pub fn apply(&self, jobs: Vec<Job>) -> Vec<Job> {
        if self.is_empty() {
            return jobs;
        }
        jobs.into_iter().filter(|j| self.matches(j)).collect()
    }
}
