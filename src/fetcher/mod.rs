//! WellData API access
//!
//! - [`http`] - reqwest wrapper with the token exchange and retry-once policy
//! - [`retry`] - retry policies and failure classification
//! - [`urls`] - URL templates and placeholder substitution
//! - [`jobs`] - job listing query and owner/rig filter
//! - [`pagination`] - skip/take paging over the job listing
//! - [`welldata`] - [`WellDataSource`] implementation over HTTP

use crate::config::ServerConfig;
use crate::{Job, JobAttribute, JobPage, TimeRequest};
use async_trait::async_trait;

pub mod http;
pub mod jobs;
pub mod pagination;
pub mod retry;
pub mod urls;
pub mod welldata;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Server answered with something other than 200
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Request never produced a response
    #[error("network error: {0}")]
    NetworkError(String),

    /// Response body was not the expected JSON
    #[error("parse error: {0}")]
    ParseError(String),

    /// Token exchange rejected
    #[error("authentication failed with HTTP {status}: {reason}")]
    AuthFailed {
        /// Status code
        status: u16,
        /// Reason phrase
        reason: String,
    },

    /// Base URL or rendered URL is unusable
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Request body could not be encoded
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Paging did not terminate
    #[error("pagination exceeded {0} pages")]
    PaginationLimit(usize),
}

impl FetcherError {
    /// Transient failures worth one more attempt: network errors and 4xx/5xx
    pub fn is_retryable(&self) -> bool {
        match self {
            FetcherError::NetworkError(_) => true,
            FetcherError::HttpStatus { status, .. } => (400..600).contains(status),
            _ => false,
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// API token returned by the token exchange
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token for the `Token` header
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token(<{} chars>)", self.0.len())
    }
}

/// Application id and account used for the token exchange
#[derive(Clone)]
pub struct Credentials {
    /// Application id header value
    pub app_id: String,
    /// Basic-auth user
    pub username: String,
    /// Basic-auth password
    pub password: String,
}

impl From<&ServerConfig> for Credentials {
    fn from(server: &ServerConfig) -> Self {
        Self {
            app_id: server.app_id.clone(),
            username: server.username.clone(),
            password: server.password.clone(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of WellData jobs, attributes and time data
///
/// Every call is a single request/response pair; retries happen inside the
/// implementation. Callers decide whether an error is fatal or skipped.
#[async_trait]
pub trait WellDataSource: Send + Sync {
    /// Exchange the configured credentials for a token
    async fn authenticate(&self) -> FetcherResult<Token>;

    /// Fetch one page of the job listing
    async fn list_jobs(&self, token: &Token, query: &jobs::JobQuery) -> FetcherResult<JobPage>;

    /// Fetch a single job by id
    async fn get_job(&self, token: &Token, job_id: &str) -> FetcherResult<Job>;

    /// Fetch every attribute defined for a job
    async fn get_attributes(&self, token: &Token, job_id: &str) -> FetcherResult<Vec<JobAttribute>>;

    /// Post a time-series request for a job
    async fn fetch_time_data(
        &self,
        token: &Token,
        job_id: &str,
        request: &TimeRequest,
    ) -> FetcherResult<serde_json::Value>;

    /// API root this source talks to
    fn base_url(&self) -> &str;
}
