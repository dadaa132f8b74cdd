//! Configuration file loading
//!
//! The config is a TOML file with a `[server]` table (connection and
//! credentials) and a `[download]` table (job filters and request shapes).
//! When the file does not exist a commented template is written in its place
//! and loading fails, so the user can fill it in and rerun.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::request::TimeRequestKind;
use crate::JobStatus;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "welldata.toml";

/// Default WellData API root
pub const DEFAULT_API_URL: &str = "https://data.welldata.net/api/v1";

/// Largest accepted `from_hours`, one hundred years
pub const MAX_WINDOW_HOURS: i64 = 24 * 365 * 100;

/// Format of the listing date bounds in `[download]`
pub const JOB_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error on {path}: {message}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error text
        message: String,
    },

    /// The file is not valid TOML for this schema
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// No config existed; a template has been written
    #[error("config file {0} did not exist; a template was written there, edit it and run again")]
    TemplateCreated(PathBuf),

    /// A value is present but unusable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Connection settings
    pub server: ServerConfig,
    /// Filters and request settings
    #[serde(default)]
    pub download: DownloadConfig,
}

/// `[server]` table
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// API root, e.g. `https://data.welldata.net/api/v1`
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Application id issued by WellData
    #[serde(default)]
    pub app_id: String,
    /// Account name
    #[serde(default)]
    pub username: String,
    /// Account password
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_url", &self.api_url)
            .field("app_id", &self.app_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// `[download]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
    /// Keep only jobs of this contractor; empty keeps all
    pub contractor_name: String,
    /// Keep only jobs of this operator; empty keeps all
    pub operator_name: String,
    /// Keep only jobs on this rig; empty keeps all
    pub rig_number: String,
    /// Job status filter sent to the server
    pub job_status: JobStatus,
    /// Window start, in hours before now
    pub from_hours: i64,
    /// Window end, in hours before now
    pub to_hours: i64,
    /// Historical sampling interval in seconds
    pub historic_interval: f64,
    /// Current-data frequency
    pub current_frequency: f64,
    /// Current-data interval in seconds
    pub current_interval: f64,
    /// Attribute ids to request; empty requests every attribute with data
    pub filter_list: Vec<String>,
    /// Time requests issued for each job
    pub time_requests: Vec<TimeRequestKind>,
    /// Jobs requested per listing page
    pub page_size: u32,
    /// Earliest job start date sent to the listing, `YYYY-MM-DD HH:MM:SS`
    pub start_date_min: String,
    /// Latest job start date sent to the listing
    pub start_date_max: String,
    /// Earliest job end date sent to the listing
    pub end_date_min: String,
    /// Latest job end date sent to the listing
    pub end_date_max: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            contractor_name: String::new(),
            operator_name: String::new(),
            rig_number: String::new(),
            job_status: JobStatus::ActiveJobs,
            from_hours: 24,
            to_hours: 0,
            historic_interval: 43200.0,
            current_frequency: 1.0,
            current_interval: 0.0,
            filter_list: Vec::new(),
            time_requests: vec![TimeRequestKind::Historical],
            page_size: 1000,
            start_date_min: String::new(),
            start_date_max: String::new(),
            end_date_min: String::new(),
            end_date_max: String::new(),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_job_date(name: &str, value: &str) -> ConfigResult<Option<NaiveDateTime>> {
    non_empty(value)
        .map(|v| {
            NaiveDateTime::parse_from_str(v, JOB_DATE_FORMAT).map_err(|e| {
                ConfigError::Invalid(format!("{name} '{v}' is not {JOB_DATE_FORMAT}: {e}"))
            })
        })
        .transpose()
}

impl DownloadConfig {
    /// Contractor filter, if set
    pub fn contractor(&self) -> Option<&str> {
        non_empty(&self.contractor_name)
    }

    /// Operator filter, if set
    pub fn operator(&self) -> Option<&str> {
        non_empty(&self.operator_name)
    }

    /// Rig filter, if set
    pub fn rig(&self) -> Option<&str> {
        non_empty(&self.rig_number)
    }

    /// Job start date bounds, `(min, max)`
    ///
    /// # Errors
    /// A bound that is set but not in [`JOB_DATE_FORMAT`].
    pub fn start_dates(&self) -> ConfigResult<(Option<NaiveDateTime>, Option<NaiveDateTime>)> {
        Ok((
            parse_job_date("start_date_min", &self.start_date_min)?,
            parse_job_date("start_date_max", &self.start_date_max)?,
        ))
    }

    /// Job end date bounds, `(min, max)`
    pub fn end_dates(&self) -> ConfigResult<(Option<NaiveDateTime>, Option<NaiveDateTime>)> {
        Ok((
            parse_job_date("end_date_min", &self.end_date_min)?,
            parse_job_date("end_date_max", &self.end_date_max)?,
        ))
    }
}

const TEMPLATE: &str = r#"# WellData poller configuration

[server]
# API root
api_url = "https://data.welldata.net/api/v1"
# App ID provided by WellData Engineering, e.g. 17147920-2DFB-4E95-B3AB-67ED69D1E02D
app_id = ""
# WellData username
username = ""
# WellData password
password = ""

[download]
# If the contractor string is empty, all wells are retrieved
contractor_name = ""
# If the operator string is empty, all wells are retrieved
operator_name = ""
# If the rig string is empty, all rigs are retrieved
rig_number = ""
# Job status filter: AllJobs / ActiveJobs / EndedJobs
job_status = "ActiveJobs"
# Time window for time data, in hours before now
from_hours = 24
to_hours = 0
# Historical sampling interval in seconds (6h = 21600, 12h = 43200, 24h = 86400)
historic_interval = 43200.0
# Current data frequency and interval
current_frequency = 1.0
current_interval = 0.0
# Attribute ids to request; leave empty for every attribute with data
filter_list = []
# Time requests per job: historical, current, events
time_requests = ["historical"]
# Jobs per listing page
page_size = 1000
# Optional job date bounds sent to the listing, "YYYY-MM-DD HH:MM:SS"; empty sends none
start_date_min = ""
start_date_max = ""
end_date_min = ""
end_date_max = ""
"#;

impl Config {
    /// Parse and validate a config file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config = Self::from_toml_str(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path`, writing a template there first if it is missing
    pub fn load_or_template(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            error!(
                "Config file {} does not exist. Creating a sample configuration file. Please edit it and try again",
                path.display()
            );
            write_template(path)?;
            return Err(ConfigError::TemplateCreated(path.to_path_buf()));
        }
        Self::load(path)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the type system cannot
    pub fn validate(&self) -> ConfigResult<()> {
        let url = url::Url::parse(&self.server.api_url).map_err(|e| {
            ConfigError::Invalid(format!("api_url '{}': {e}", self.server.api_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "api_url must be http or https, got '{}'",
                url.scheme()
            )));
        }

        for (name, value) in [
            ("app_id", &self.server.app_id),
            ("username", &self.server.username),
            ("password", &self.server.password),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("server.{name} must be set")));
            }
        }

        let d = &self.download;
        if d.from_hours < d.to_hours {
            return Err(ConfigError::Invalid(format!(
                "from_hours ({}) must be >= to_hours ({})",
                d.from_hours, d.to_hours
            )));
        }
        if d.from_hours > MAX_WINDOW_HOURS {
            return Err(ConfigError::Invalid(format!(
                "from_hours must be at most {MAX_WINDOW_HOURS}, got {}",
                d.from_hours
            )));
        }
        if d.to_hours < 0 {
            return Err(ConfigError::Invalid(format!(
                "to_hours must be non-negative, got {}",
                d.to_hours
            )));
        }
        if d.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".to_string()));
        }
        if d.historic_interval < 0.0 || d.current_interval < 0.0 || d.current_frequency < 0.0 {
            return Err(ConfigError::Invalid(
                "intervals and frequency must be non-negative".to_string(),
            ));
        }
        d.start_dates()?;
        d.end_dates()?;

        Ok(())
    }
}

/// Write the commented template to `path`
pub fn write_template(path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }

    std::fs::write(path, TEMPLATE).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
