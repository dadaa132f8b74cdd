//! In-process WellData API stand-in for integration tests

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use welldata_poller::fetcher::http::{build_client, WellDataHttpClient};
use welldata_poller::fetcher::retry::RetryPolicy;
use welldata_poller::fetcher::urls::ApiUrls;
use welldata_poller::fetcher::welldata::WellDataFetcher;
use welldata_poller::fetcher::Credentials;

pub const TOKEN: &str = "tok-123";
pub const APP_ID: &str = "17147920-2DFB-4E95-B3AB-67ED69D1E02D";
pub const USERNAME: &str = "tester";
pub const PASSWORD: &str = "secret";

/// Server-side state shared with the test
#[derive(Default)]
pub struct MockApi {
    pub jobs: Vec<Value>,
    pub token_status: Option<u16>,
    /// Remaining 200 token answers whose body is not JSON
    pub token_garbage: usize,
    /// Remaining 500 answers per path, consumed one per request
    pub failures: HashMap<String, usize>,
    pub hits: HashMap<String, usize>,
    pub posted: Vec<(String, Value)>,
    pub listing_queries: Vec<HashMap<String, String>>,
}

pub type Shared = Arc<Mutex<MockApi>>;

/// Job in the server's JSON shape
pub fn job_json(id: &str, contractor: &str, rig: &str, operator: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Well {id}"),
        "jobNumber": format!("JN-{id}"),
        "startDate": "2021-07-06T17:13:48Z",
        "firstDataDate": "2021-07-06T18:00:00Z",
        "lastDataDate": "2021-07-08T06:00:00Z",
        "assetInfoList": [{ "owner": contractor, "name": rig }],
        "siteInfoList": [{ "owner": operator }]
    })
}

/// Count the hit and decide whether this request should fail
fn take_failure(api: &mut MockApi, key: &str) -> bool {
    *api.hits.entry(key.to_string()).or_default() += 1;
    match api.failures.get_mut(key) {
        Some(n) if *n > 0 => {
            *n -= 1;
            true
        }
        _ => false,
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("token").and_then(|v| v.to_str().ok()) == Some(TOKEN)
}

async fn token(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut api = state.lock().unwrap();
    *api.hits.entry("token".to_string()).or_default() += 1;

    if let Some(status) = api.token_status {
        return StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response();
    }
    let app_ok = headers.get("applicationid").and_then(|v| v.to_str().ok()) == Some(APP_ID);
    // "tester:secret"
    let auth_ok = headers.get("authorization").and_then(|v| v.to_str().ok())
        == Some("Basic dGVzdGVyOnNlY3JldA==");
    if !app_ok || !auth_ok {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if api.token_garbage > 0 {
        api.token_garbage -= 1;
        return (StatusCode::OK, "<html>maintenance</html>").into_response();
    }
    Json(json!({ "token": TOKEN })).into_response()
}

async fn list_jobs(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut api = state.lock().unwrap();
    let skip: usize = params.get("skip").and_then(|v| v.parse().ok()).unwrap_or(0);
    let take: usize = params.get("take").and_then(|v| v.parse().ok()).unwrap_or(1);
    let failed = take_failure(&mut api, &format!("jobs?skip={skip}"));
    api.listing_queries.push(params);
    if failed {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let jobs: Vec<Value> = api.jobs.iter().skip(skip).take(take).cloned().collect();
    Json(json!({ "total": api.jobs.len(), "jobs": jobs })).into_response()
}

async fn get_job(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut api = state.lock().unwrap();
    if take_failure(&mut api, &format!("job/{id}")) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match api.jobs.iter().find(|j| j["id"] == id.as_str()) {
        Some(job) => Json(job.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn attributes(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut api = state.lock().unwrap();
    if take_failure(&mut api, &format!("attributes/{id}")) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({
        "attributes": [
            { "id": "depth", "hasData": true, "unit": "m", "name": "Hole Depth" },
            { "id": "rpm", "hasData": false, "unit": "rpm" },
            { "id": "wob", "hasData": true, "unit": "klbf" }
        ]
    }))
    .into_response()
}

fn time_answer(state: &Shared, headers: &HeaderMap, key: String, body: Value) -> Response {
    if !authorized(headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut api = state.lock().unwrap();
    let failed = take_failure(&mut api, &key);
    api.posted.push((key.clone(), body));
    if failed {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({ "timeRecords": [{ "timeStamp": "2021-07-07T00:00:00Z", "values": [1.0, 2.0] }] }))
        .into_response()
}

async fn historical(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    time_answer(&state, &headers, format!("time/{id}"), body)
}

async fn current(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    time_answer(&state, &headers, format!("current/{id}"), body)
}

async fn events(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    time_answer(&state, &headers, format!("events/{id}"), body)
}

/// Serve `api` on an ephemeral port; returns the API root URL
pub async fn spawn(api: MockApi) -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(api));

    let routes = Router::new()
        .route("/tokens/token", get(token))
        .route("/jobs", get(list_jobs))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/attributes", get(attributes))
        .route("/jobs/{id}/data/time", post(historical))
        .route("/jobs/{id}/data/time/current", post(current))
        .route("/jobs/{id}/data/time/events", post(events))
        .with_state(state.clone());
    let app = Router::new().nest("/api/v1", routes);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/api/v1"), state)
}

/// Fetcher pointed at `base` with zero retry delays
pub fn fetcher(base: &str) -> WellDataFetcher {
    let http = WellDataHttpClient::new(build_client().unwrap());
    let credentials = Credentials {
        app_id: APP_ID.to_string(),
        username: USERNAME.to_string(),
        password: PASSWORD.to_string(),
    };
    WellDataFetcher::new(http, ApiUrls::new(base).unwrap(), credentials)
        .with_data_retry(RetryPolicy::data().with_delay(Duration::ZERO))
        .with_token_retry(RetryPolicy::token().with_delay(Duration::ZERO))
}

/// TOML config for `base` with extra `[download]` lines
pub fn config_toml(base: &str, download: &str) -> String {
    format!(
        "[server]\napi_url = \"{base}\"\napp_id = \"{APP_ID}\"\nusername = \"{USERNAME}\"\npassword = \"{PASSWORD}\"\n\n[download]\n{download}\n"
    )
}
