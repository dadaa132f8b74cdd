//! WellData HTTP client
//!
//! Wraps reqwest with the two request flavours the API needs:
//! - the token exchange (`ApplicationID` header + basic auth), retried on
//!   transient failures and fatal on any non-200 answer;
//! - token-authenticated GET/POST data calls, retried once after a fixed wait
//!   on network errors and 4xx/5xx answers.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::retry::{format_failure, format_retry, FailureKind, RetryPolicy};
use super::{Credentials, FetcherError, FetcherResult, Token};

/// Header carrying the application id on the token exchange
pub const APPLICATION_ID_HEADER: &str = "ApplicationID";

/// Header carrying the token on data calls
pub const TOKEN_HEADER: &str = "Token";

/// HTTP connect timeout (seconds)
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds); historical pulls can be slow
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Build the reqwest client used against the API
pub fn build_client() -> FetcherResult<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetcherError::NetworkError(format!("failed to build HTTP client: {e}")))
}

/// HTTP client for WellData API calls
pub struct WellDataHttpClient {
    client: Client,
    data_retry: RetryPolicy,
    token_retry: RetryPolicy,
}

impl WellDataHttpClient {
    /// Wrap `client` with the default retry policies
    pub fn new(client: Client) -> Self {
        Self {
            client,
            data_retry: RetryPolicy::data(),
            token_retry: RetryPolicy::token(),
        }
    }

    /// Override the data-call policy
    pub fn with_data_retry(mut self, policy: RetryPolicy) -> Self {
        self.data_retry = policy;
        self
    }

    /// Override the token policy
    pub fn with_token_retry(mut self, policy: RetryPolicy) -> Self {
        self.token_retry = policy;
        self
    }

    /// Policy used for data calls
    pub fn data_retry(&self) -> RetryPolicy {
        self.data_retry
    }

    /// Policy used for the token exchange
    pub fn token_retry(&self) -> RetryPolicy {
        self.token_retry
    }

    /// Exchange credentials for a token at `url`
    ///
    /// A non-200 answer fails immediately with [`FetcherError::AuthFailed`].
    /// Network errors and unreadable bodies are retried per the token policy.
    pub async fn fetch_token(&self, url: &str, credentials: &Credentials) -> FetcherResult<Token> {
        let policy = self.token_retry;
        let mut last_error = None;

        debug!("Getting auth token from {}", url);

        for attempt in 1..=policy.max_attempts {
            match self.try_fetch_token(url, credentials).await {
                Ok(token) => {
                    if attempt > 1 {
                        info!("Token request succeeded on attempt {}/{}", attempt, policy.max_attempts);
                    }
                    return Ok(token);
                }
                Err(err @ FetcherError::AuthFailed { .. }) => {
                    error!("Token request rejected: {}", err);
                    return Err(err);
                }
                Err(err) => {
                    if policy.has_next(attempt) {
                        warn!("{}", format_retry(attempt, &policy, &err, url));
                        last_error = Some(err);
                        tokio::time::sleep(policy.delay).await;
                    } else {
                        error!("{}", format_failure(attempt, &err, url));
                        last_error = Some(err);
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetcherError::NetworkError("token request never attempted".to_string())))
    }

    async fn try_fetch_token(&self, url: &str, credentials: &Credentials) -> FetcherResult<Token> {
        let response = self
            .client
            .get(url)
            .header(APPLICATION_ID_HEADER, &credentials.app_id)
            .header(ACCEPT, "application/json")
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetcherError::AuthFailed {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let body: TokenResponse = read_json(response).await?;
        Ok(Token::new(body.token))
    }

    /// Authenticated GET returning parsed JSON
    pub async fn get_json<T>(&self, url: &str, token: &Token) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_retry(url, || {
            self.client
                .get(url)
                .header(TOKEN_HEADER, token.as_str())
                .header(ACCEPT, "application/json")
        })
        .await
    }

    /// Authenticated POST of `body` as JSON, returning parsed JSON
    pub async fn post_json<T, B>(&self, url: &str, token: &Token, body: &B) -> FetcherResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|e| FetcherError::SerializationError(e.to_string()))?;

        self.request_with_retry(url, || {
            self.client
                .post(url)
                .header(TOKEN_HEADER, token.as_str())
                .header(ACCEPT, "application/json")
                .header(CONTENT_TYPE, "application/json")
                .body(payload.clone())
        })
        .await
    }

    /// Send the request built by `build`, retrying per the data policy
    ///
    /// Retries on:
    /// - network errors (timeout, connection refused)
    /// - 4xx and 5xx answers
    ///
    /// Does not retry on other non-200 answers or unparseable bodies.
    async fn request_with_retry<T, F>(&self, url: &str, build: F) -> FetcherResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let policy = self.data_retry;
        let mut last_error = None;

        for attempt in 1..=policy.max_attempts {
            debug!("Request attempt {}/{}: {}", attempt, policy.max_attempts, url);

            match send_once(build(), url).await {
                Ok(data) => {
                    if attempt > 1 {
                        info!("Retry attempt {}/{} succeeded: {}", attempt, policy.max_attempts, url);
                    }
                    return Ok(data);
                }
                Err(err) if err.is_retryable() && policy.has_next(attempt) => {
                    warn!("{}", format_retry(attempt, &policy, &err, url));
                    last_error = Some(err);
                    tokio::time::sleep(policy.delay).await;
                }
                Err(err) => {
                    error!("{}", format_failure(attempt, &err, url));
                    last_error = Some(err);
                    break;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetcherError::NetworkError("request never attempted".to_string())))
    }
}

async fn send_once<T>(request: RequestBuilder, url: &str) -> FetcherResult<T>
where
    T: DeserializeOwned,
{
    let response = request.send().await.map_err(|e| transport_error(url, &e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetcherError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    read_json(response).await
}

async fn read_json<T>(response: reqwest::Response) -> FetcherResult<T>
where
    T: DeserializeOwned,
{
    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetcherError::NetworkError(format!("failed to read body: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| FetcherError::ParseError(format!("failed to deserialize response: {e}")))
}

fn transport_error(url: &str, err: &reqwest::Error) -> FetcherError {
    FetcherError::NetworkError(format!(
        "{} on {url}: {err}",
        FailureKind::from_reqwest(err).description()
    ))
}
