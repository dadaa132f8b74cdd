//! Retry policies and failure classification
//!
//! Two fixed-delay policies are used against the API:
//!
//! - data calls (jobs, attributes, time data): one retry after 20 seconds,
//!   then the caller gets an error and skips the item;
//! - token exchange: up to 4 attempts, 2 seconds apart, on transient failures.

use reqwest::StatusCode;
use std::time::Duration;

use super::FetcherError;

/// Attempts for data calls (initial + one retry)
pub const DATA_MAX_ATTEMPTS: u32 = 2;

/// Wait before retrying a data call
pub const DATA_RETRY_DELAY: Duration = Duration::from_secs(20);

/// Attempts for the token exchange
pub const TOKEN_MAX_ATTEMPTS: u32 = 4;

/// Wait between token attempts
pub const TOKEN_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Wait between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Policy with `max_attempts` total attempts spaced by `delay`
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Retry-once policy for data calls
    pub const fn data() -> Self {
        Self::fixed(DATA_MAX_ATTEMPTS, DATA_RETRY_DELAY)
    }

    /// Policy for the token exchange
    pub const fn token() -> Self {
        Self::fixed(TOKEN_MAX_ATTEMPTS, TOKEN_RETRY_DELAY)
    }

    /// Same attempt count, different delay
    pub const fn with_delay(self, delay: Duration) -> Self {
        Self::fixed(self.max_attempts, delay)
    }

    /// Whether another attempt follows `attempt` (1-based)
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::data()
    }
}

/// Classification of failed calls for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timed out waiting for the server
    NetworkTimeout,
    /// Connection refused, DNS failure
    NetworkOffline,
    /// HTTP 5xx
    ServerError(u16),
    /// HTTP 400
    BadRequest,
    /// HTTP 401/403
    AuthFailed(u16),
    /// Other 4xx
    ClientError(u16),
    /// Non-200 outside 4xx/5xx
    UnexpectedStatus(u16),
    /// Body did not parse
    InvalidBody,
    /// Anything else
    Other,
}

impl FailureKind {
    /// Short description used inside log lines
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::BadRequest => "bad request",
            Self::AuthFailed(_) => "authentication failed",
            Self::ClientError(code) => match code {
                404 => "resource not found",
                429 => "rate limit exceeded",
                _ => "client error",
            },
            Self::UnexpectedStatus(_) => "unexpected status",
            Self::InvalidBody => "invalid response body",
            Self::Other => "request failed",
        }
    }

    /// Classify an HTTP status
    pub fn from_status(status: StatusCode) -> Self {
        let code = status.as_u16();
        match code {
            400 => Self::BadRequest,
            401 | 403 => Self::AuthFailed(code),
            _ if status.is_server_error() => Self::ServerError(code),
            _ if status.is_client_error() => Self::ClientError(code),
            _ => Self::UnexpectedStatus(code),
        }
    }

    /// Classify a reqwest transport error
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::NetworkTimeout
        } else if err.is_connect() {
            Self::NetworkOffline
        } else if err.is_decode() {
            Self::InvalidBody
        } else {
            Self::Other
        }
    }

    /// Classify a fetcher error
    pub fn from_error(err: &FetcherError) -> Self {
        match err {
            FetcherError::HttpStatus { status, .. } => StatusCode::from_u16(*status)
                .map(Self::from_status)
                .unwrap_or(Self::UnexpectedStatus(*status)),
            FetcherError::AuthFailed { status, .. } => Self::AuthFailed(*status),
            FetcherError::ParseError(_) => Self::InvalidBody,
            FetcherError::NetworkError(_) => Self::NetworkOffline,
            _ => Self::Other,
        }
    }
}

/// Log line for an attempt that will be retried
pub fn format_retry(attempt: u32, policy: &RetryPolicy, err: &FetcherError, url: &str) -> String {
    format!(
        "Retrying (attempt {}/{}) after {} - waiting {:.1} seconds... ({url}: {err})",
        attempt + 1,
        policy.max_attempts,
        FailureKind::from_error(err).description(),
        policy.delay.as_secs_f64()
    )
}

/// Log line for a call that gave up after `attempts` tries
pub fn format_failure(attempts: u32, err: &FetcherError, url: &str) -> String {
    format!(
        "[FAILED] {url} failed after {} attempt(s): {} ({err})",
        attempts,
        FailureKind::from_error(err).description()
    )
}
