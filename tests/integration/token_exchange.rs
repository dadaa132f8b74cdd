//! Token exchange against the mock API

use crate::common::{self, MockApi, TOKEN};
use welldata_poller::config::Config;
use welldata_poller::fetcher::{FetcherError, WellDataSource};
use welldata_poller::pipeline::RunPipeline;

#[tokio::test]
async fn test_token_exchange_succeeds() {
    let (base, state) = common::spawn(MockApi::default()).await;
    let fetcher = common::fetcher(&base);

    let token = fetcher.authenticate().await.unwrap();
    assert_eq!(token.as_str(), TOKEN);
    assert_eq!(state.lock().unwrap().hits["token"], 1);
}

#[tokio::test]
async fn test_unauthorized_is_fatal_without_retry() {
    let api = MockApi {
        token_status: Some(401),
        ..MockApi::default()
    };
    let (base, state) = common::spawn(api).await;
    let fetcher = common::fetcher(&base);

    let err = fetcher.authenticate().await.unwrap_err();
    assert!(matches!(err, FetcherError::AuthFailed { status: 401, .. }));
    assert_eq!(state.lock().unwrap().hits["token"], 1);
}

#[tokio::test]
async fn test_server_error_on_token_is_fatal() {
    let api = MockApi {
        token_status: Some(503),
        ..MockApi::default()
    };
    let (base, _state) = common::spawn(api).await;
    let fetcher = common::fetcher(&base);

    let err = fetcher.authenticate().await.unwrap_err();
    assert!(matches!(err, FetcherError::AuthFailed { status: 503, .. }));
}

#[tokio::test]
async fn test_unparsable_token_body_is_retried() {
    let api = MockApi {
        token_garbage: 1,
        ..MockApi::default()
    };
    let (base, state) = common::spawn(api).await;
    let fetcher = common::fetcher(&base);

    let token = fetcher.authenticate().await.unwrap();
    assert_eq!(token.as_str(), TOKEN);
    assert_eq!(state.lock().unwrap().hits["token"], 2);
}

#[tokio::test]
async fn test_unparsable_token_body_gives_up_after_four_attempts() {
    let api = MockApi {
        token_garbage: usize::MAX,
        ..MockApi::default()
    };
    let (base, state) = common::spawn(api).await;
    let fetcher = common::fetcher(&base);

    let err = fetcher.authenticate().await.unwrap_err();
    assert!(matches!(err, FetcherError::ParseError(_)));
    assert_eq!(state.lock().unwrap().hits["token"], 4);
}

#[tokio::test]
async fn test_token_failure_stops_the_run_before_listing() {
    let api = MockApi {
        token_status: Some(403),
        jobs: vec![common::job_json("net_1", "Nabors", "X1", "Shell")],
        ..MockApi::default()
    };
    let (base, state) = common::spawn(api).await;
    let fetcher = common::fetcher(&base);
    let config = Config::from_toml_str(&common::config_toml(&base, "")).unwrap();

    let result = RunPipeline::new(&fetcher, &config).run().await;
    assert!(matches!(result, Err(FetcherError::AuthFailed { status: 403, .. })));
    assert!(state.lock().unwrap().listing_queries.is_empty());
}

#[tokio::test]
async fn test_unreachable_token_endpoint_is_network_error() {
    let fetcher = common::fetcher("http://127.0.0.1:9/api/v1");
    let err = fetcher.authenticate().await.unwrap_err();
    assert!(matches!(err, FetcherError::NetworkError(_)));
}
