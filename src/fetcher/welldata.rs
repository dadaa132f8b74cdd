//! [`WellDataSource`] over the WellData REST API

use async_trait::async_trait;
use tracing::debug;

use super::http::{build_client, WellDataHttpClient};
use super::jobs::JobQuery;
use super::retry::RetryPolicy;
use super::urls::ApiUrls;
use super::{Credentials, FetcherResult, Token, WellDataSource};
use crate::config::ServerConfig;
use crate::{AttributeList, Job, JobAttribute, JobPage, TimeRequest};

/// HTTP-backed WellData source
pub struct WellDataFetcher {
    http: WellDataHttpClient,
    urls: ApiUrls,
    credentials: Credentials,
}

impl WellDataFetcher {
    /// Fetcher for `urls` using `http` and `credentials`
    pub fn new(http: WellDataHttpClient, urls: ApiUrls, credentials: Credentials) -> Self {
        Self {
            http,
            urls,
            credentials,
        }
    }

    /// Fetcher built from the `[server]` table with default retry policies
    pub fn from_config(server: &ServerConfig) -> FetcherResult<Self> {
        let http = WellDataHttpClient::new(build_client()?);
        let urls = ApiUrls::new(server.api_url.clone())?;
        Ok(Self::new(http, urls, Credentials::from(server)))
    }

    /// Replace the data-call retry policy
    pub fn with_data_retry(mut self, policy: RetryPolicy) -> Self {
        self.http = self.http.with_data_retry(policy);
        self
    }

    /// Replace the token retry policy
    pub fn with_token_retry(mut self, policy: RetryPolicy) -> Self {
        self.http = self.http.with_token_retry(policy);
        self
    }

    /// URL builder in use
    pub fn urls(&self) -> &ApiUrls {
        &self.urls
    }
}

#[async_trait]
impl WellDataSource for WellDataFetcher {
    async fn authenticate(&self) -> FetcherResult<Token> {
        self.http.fetch_token(&self.urls.token(), &self.credentials).await
    }

    async fn list_jobs(&self, token: &Token, query: &JobQuery) -> FetcherResult<JobPage> {
        let url = self.urls.jobs(query);
        let page: JobPage = self.http.get_json(&url, token).await?;
        debug!("Jobs page skip={} returned {} jobs", query.skip, page.jobs.len());
        Ok(page)
    }

    async fn get_job(&self, token: &Token, job_id: &str) -> FetcherResult<Job> {
        self.http.get_json(&self.urls.job(job_id), token).await
    }

    async fn get_attributes(&self, token: &Token, job_id: &str) -> FetcherResult<Vec<JobAttribute>> {
        let list: AttributeList = self.http.get_json(&self.urls.attributes(job_id), token).await?;
        debug!("Job {} has {} attributes", job_id, list.attributes.len());
        Ok(list.attributes)
    }

    async fn fetch_time_data(
        &self,
        token: &Token,
        job_id: &str,
        request: &TimeRequest,
    ) -> FetcherResult<serde_json::Value> {
        let url = self.urls.time_data(job_id, request.kind());
        self.http.post_json(&url, token, request).await
    }

    fn base_url(&self) -> &str {
        self.urls.base()
    }
}
