//! # WellData Poller Library
//!
//! A client for the WellData REST API that collects job listings, attribute
//! metadata and time-series data, measures how long every call takes, and
//! exports the results as a multi-sheet report.
//!
//! ## Features
//!
//! - **Token exchange**: application id + basic auth exchanged for an API token
//! - **Job listing**: placeholder-based URL templates with status/date/owner filters
//! - **Attributes**: per-job attribute discovery, narrowed to channels with data
//! - **Time data**: historical, current and event requests posted per job
//! - **Retry and degrade**: one retry after a fixed wait, then skip and continue
//! - **Reports**: XLSX workbook or a directory of CSV files, one sheet per sequence
//!
//! ## Quick Start
//!
//! ```no_run
//! use welldata_poller::config::Config;
//! use welldata_poller::fetcher::welldata::WellDataFetcher;
//! use welldata_poller::pipeline::RunPipeline;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("welldata.toml")?;
//! let fetcher = WellDataFetcher::from_config(&config.server)?;
//!
//! let report = RunPipeline::new(&fetcher, &config).run().await?;
//! println!("collected {} jobs", report.jobs.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - TOML configuration loading and template generation
//! - [`fetcher`] - HTTP client, URL templates and the WellData endpoints
//! - [`request`] - Time-series request payloads
//! - [`timing`] - Phase timing samples and slow-call detection
//! - [`pipeline`] - Token → jobs → per-job attributes and time data
//! - [`output`] - Report sheets and the XLSX/CSV writers
//! - [`cli`] - Command-line entry point

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Configuration file loading
pub mod config;

/// WellData API access
pub mod fetcher;

/// Report writers
pub mod output;

/// Run orchestration
pub mod pipeline;

/// Time-series request payloads
pub mod request;

/// Phase timing
pub mod timing;

pub use request::TimeRequest;
pub use timing::{Phase, TimingLog, TimingSample};

/// Job status filter accepted by the job listing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum JobStatus {
    /// Every job regardless of state
    AllJobs,
    /// Jobs that are still running
    #[default]
    ActiveJobs,
    /// Jobs that have finished
    EndedJobs,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::AllJobs => "AllJobs",
            JobStatus::ActiveJobs => "ActiveJobs",
            JobStatus::EndedJobs => "EndedJobs",
        };
        write!(f, "{s}")
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AllJobs" => Ok(JobStatus::AllJobs),
            "ActiveJobs" => Ok(JobStatus::ActiveJobs),
            "EndedJobs" => Ok(JobStatus::EndedJobs),
            _ => Err(format!(
                "Invalid job status: {s}. Valid options: AllJobs, ActiveJobs, EndedJobs"
            )),
        }
    }
}

/// A job (one unit of well/rig work) as reported by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(from = "JobWire")]
pub struct Job {
    /// Job identifier (e.g., "net_176376")
    pub id: String,
    /// Well name
    pub name: Option<String>,
    /// Drilling contractor (owner of the first asset)
    pub contractor: Option<String>,
    /// Rig name (name of the first asset)
    pub rig_name: Option<String>,
    /// Operator (owner of the first site)
    pub operator: Option<String>,
    /// Job start date as sent by the server
    pub start_date: Option<String>,
    /// First date with recorded data
    pub first_data_date: Option<String>,
    /// Last date with recorded data
    pub last_data_date: Option<String>,
    /// Operator-assigned job number
    pub job_number: Option<String>,
}

/// Server-side job shape; asset and site owners live in nested lists
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobWire {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    first_data_date: Option<String>,
    #[serde(default)]
    last_data_date: Option<String>,
    #[serde(default)]
    job_number: Option<serde_json::Value>,
    #[serde(default)]
    asset_info_list: Vec<InfoEntry>,
    #[serde(default)]
    site_info_list: Vec<InfoEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct InfoEntry {
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<JobWire> for Job {
    fn from(wire: JobWire) -> Self {
        let asset = wire.asset_info_list.into_iter().next().unwrap_or_default();
        let site = wire.site_info_list.into_iter().next().unwrap_or_default();

        Self {
            id: wire.id,
            name: wire.name,
            contractor: asset.owner,
            rig_name: asset.name,
            operator: site.owner,
            start_date: wire.start_date,
            first_data_date: wire.first_data_date,
            last_data_date: wire.last_data_date,
            job_number: wire.job_number.and_then(|v| value_to_text(&v)),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    value_to_text(&value).ok_or_else(|| serde::de::Error::custom("expected string or number"))
}

fn value_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One page of the job listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct JobPage {
    /// Total number of jobs matching the query, when requested
    #[serde(default)]
    pub total: Option<u64>,
    /// Jobs on this page
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// Attribute (data channel) metadata as returned by `/jobs/{id}/attributes`
///
/// Only `id` and `hasData` drive selection; everything else is kept verbatim
/// so the report can show the full description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobAttribute {
    /// Attribute identifier
    pub id: String,
    /// Whether the server holds data for this attribute
    #[serde(rename = "hasData", default)]
    pub has_data: bool,
    /// Remaining fields (units, names, capabilities...)
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Body of the attributes endpoint
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AttributeList {
    /// Attributes defined for the job
    #[serde(default)]
    pub attributes: Vec<JobAttribute>,
}

/// Sampling mode used when the attribute appears in a time request
pub const DEFAULT_ATTRIBUTE_MODE: &str = "Last";

/// Attribute reference sent inside time-series requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute identifier
    pub id: String,
    /// Sampling mode (e.g., "Last")
    pub mode: String,
}

impl Attribute {
    /// Reference an attribute sampled by its last value
    pub fn last(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mode: DEFAULT_ATTRIBUTE_MODE.to_string(),
        }
    }
}

/// Keep attributes that have data and, when `allow_list` is non-empty, are on it
pub fn select_attributes(attributes: &[JobAttribute], allow_list: &[String]) -> Vec<JobAttribute> {
    attributes
        .iter()
        .filter(|a| a.has_data)
        .filter(|a| allow_list.is_empty() || allow_list.iter().any(|id| id == &a.id))
        .cloned()
        .collect()
}
