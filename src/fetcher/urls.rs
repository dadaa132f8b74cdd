//! URL templates for the WellData API
//!
//! Templates carry `<name>` placeholders. Values are percent-encoded before
//! substitution. Optional job date filters that are not set are removed from
//! the query together with their `&name=` prefix.

use chrono::NaiveDateTime;
use url::form_urlencoded::byte_serialize;

use super::jobs::JobQuery;
use super::{FetcherError, FetcherResult};
use crate::request::TimeRequestKind;

/// Token exchange
pub const TOKEN_TEMPLATE: &str = "/tokens/token";

/// Job listing with every supported filter
pub const JOBS_TEMPLATE: &str = "/jobs?jobStatus=<jobStatus>&startDateMin=<startDateMin>&startDateMax=<startDateMax>&endDateMin=<endDateMin>&endDateMax=<endDateMax>&includeCapabilities=<includeCapabilities>&sort=<sort>%20<sortOrder>&take=<take>&skip=<skip>&total=<total>";

/// Single job
pub const JOB_TEMPLATE: &str = "/jobs/<jobId>";

/// Attributes of a job
pub const ATTRIBUTES_TEMPLATE: &str = "/jobs/<jobId>/attributes";

/// Time data of a job; `<timePath>` is the request kind's path
pub const TIME_DATA_TEMPLATE: &str = "/jobs/<jobId>/<timePath>";

/// Date format the job listing expects, e.g. `2021-07-06 5:13:48 PM`
pub const JOB_DATE_FORMAT: &str = "%Y-%m-%d %-I:%M:%S %p";

/// Replace every `<key>` in `template` with its value, verbatim
pub fn render(template: &str, values: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("<{key}>"), value);
    }
    out
}

/// Percent-encode a value for use in a URL
pub fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

fn date_param(name: &str, value: Option<NaiveDateTime>, template: String) -> String {
    match value {
        Some(dt) => render(
            &template,
            &[(name, encode(&dt.format(JOB_DATE_FORMAT).to_string()))],
        ),
        None => template.replace(&format!("&{name}=<{name}>"), ""),
    }
}

/// URL builder bound to one API root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUrls {
    base: String,
}

impl ApiUrls {
    /// Bind to `base`, e.g. `https://data.welldata.net/api/v1`
    pub fn new(base: impl Into<String>) -> FetcherResult<Self> {
        let base = base.into();
        url::Url::parse(&base).map_err(|e| FetcherError::InvalidUrl(format!("{base}: {e}")))?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// API root without a trailing slash
    pub fn base(&self) -> &str {
        &self.base
    }

    fn absolute(&self, path: String) -> String {
        format!("{}{}", self.base, path)
    }

    /// Token exchange URL
    pub fn token(&self) -> String {
        self.absolute(TOKEN_TEMPLATE.to_string())
    }

    /// Job listing URL for `query`
    pub fn jobs(&self, query: &JobQuery) -> String {
        let mut path = JOBS_TEMPLATE.to_string();
        path = date_param("startDateMin", query.start_date_min, path);
        path = date_param("startDateMax", query.start_date_max, path);
        path = date_param("endDateMin", query.end_date_min, path);
        path = date_param("endDateMax", query.end_date_max, path);

        let path = render(
            &path,
            &[
                ("jobStatus", encode(&query.status.to_string())),
                ("includeCapabilities", query.include_capabilities.to_string()),
                ("sort", encode(&query.sort)),
                ("sortOrder", query.sort_order.to_string()),
                ("take", query.take.to_string()),
                ("skip", query.skip.to_string()),
                ("total", query.total.to_string()),
            ],
        );
        self.absolute(path)
    }

    /// Single job URL
    pub fn job(&self, job_id: &str) -> String {
        self.absolute(render(JOB_TEMPLATE, &[("jobId", encode(job_id))]))
    }

    /// Attributes URL
    pub fn attributes(&self, job_id: &str) -> String {
        self.absolute(render(ATTRIBUTES_TEMPLATE, &[("jobId", encode(job_id))]))
    }

    /// Time data URL for `kind`
    pub fn time_data(&self, job_id: &str, kind: TimeRequestKind) -> String {
        self.absolute(render(
            TIME_DATA_TEMPLATE,
            &[("jobId", encode(job_id)), ("timePath", kind.path().to_string())],
        ))
    }
}
