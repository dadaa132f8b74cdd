//! One-retry-then-skip behaviour of data calls

use crate::common::{self, MockApi};
use std::collections::HashMap;
use welldata_poller::config::Config;
use welldata_poller::fetcher::{FetcherError, WellDataSource};
use welldata_poller::pipeline::RunPipeline;
use welldata_poller::request::TimeRequestKind;
use welldata_poller::Phase;

fn three_jobs(failures: &[(&str, usize)]) -> MockApi {
    MockApi {
        jobs: vec![
            common::job_json("net_1", "Nabors", "X1", "Shell"),
            common::job_json("net_2", "Nabors", "X2", "BP"),
            common::job_json("net_3", "H&P", "F9", "Shell"),
        ],
        failures: failures
            .iter()
            .map(|(k, n)| (k.to_string(), *n))
            .collect::<HashMap<_, _>>(),
        ..MockApi::default()
    }
}

#[tokio::test]
async fn test_single_failure_is_retried() {
    let (base, state) = common::spawn(three_jobs(&[("job/net_2", 1)])).await;
    let fetcher = common::fetcher(&base);
    let token = fetcher.authenticate().await.unwrap();

    let job = fetcher.get_job(&token, "net_2").await.unwrap();
    assert_eq!(job.id, "net_2");
    assert_eq!(job.rig_name.as_deref(), Some("X2"));
    assert_eq!(state.lock().unwrap().hits["job/net_2"], 2);
}

#[tokio::test]
async fn test_two_failures_give_up_after_second_attempt() {
    let (base, state) = common::spawn(three_jobs(&[("attributes/net_1", 5)])).await;
    let fetcher = common::fetcher(&base);
    let token = fetcher.authenticate().await.unwrap();

    let err = fetcher.get_attributes(&token, "net_1").await.unwrap_err();
    assert!(matches!(err, FetcherError::HttpStatus { status: 500, .. }));
    assert_eq!(state.lock().unwrap().hits["attributes/net_1"], 2);
}

#[tokio::test]
async fn test_not_found_is_retried_once() {
    let (base, state) = common::spawn(three_jobs(&[])).await;
    let fetcher = common::fetcher(&base);
    let token = fetcher.authenticate().await.unwrap();

    let err = fetcher.get_job(&token, "net_404").await.unwrap_err();
    assert!(matches!(err, FetcherError::HttpStatus { status: 404, .. }));
    assert_eq!(state.lock().unwrap().hits["job/net_404"], 2);
}

#[tokio::test]
async fn test_failed_job_is_skipped_and_run_continues() {
    let (base, _state) = common::spawn(three_jobs(&[("job/net_2", 2)])).await;
    let fetcher = common::fetcher(&base);
    let config = Config::from_toml_str(&common::config_toml(&base, "")).unwrap();

    let results = RunPipeline::new(&fetcher, &config).run().await.unwrap();

    let ids: Vec<_> = results.jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["net_1", "net_3"]);
    assert_eq!(results.skipped_jobs, vec!["net_2".to_string()]);
    assert_eq!(results.time_data_of(TimeRequestKind::Historical).count(), 2);
    // the failed lookup is still timed
    assert_eq!(results.timing.phase(Phase::JobById).count(), 3);
}

#[tokio::test]
async fn test_failed_time_pull_appends_nothing() {
    let (base, state) = common::spawn(three_jobs(&[("time/net_3", 2)])).await;
    let fetcher = common::fetcher(&base);
    let config = Config::from_toml_str(&common::config_toml(&base, "")).unwrap();

    let results = RunPipeline::new(&fetcher, &config).run().await.unwrap();

    assert_eq!(results.jobs.len(), 3);
    assert!(results.skipped_jobs.is_empty());
    let pulled: Vec<_> = results.time_data.iter().map(|r| r.job_id.as_str()).collect();
    assert_eq!(pulled, vec!["net_1", "net_2"]);
    assert_eq!(state.lock().unwrap().hits["time/net_3"], 2);
}

#[tokio::test]
async fn test_failed_listing_page_is_skipped() {
    let (base, state) = common::spawn(three_jobs(&[("jobs?skip=1", 2)])).await;
    let fetcher = common::fetcher(&base);
    let config = Config::from_toml_str(&common::config_toml(&base, "page_size = 1")).unwrap();

    let results = RunPipeline::new(&fetcher, &config).run().await.unwrap();

    assert_eq!(results.total_jobs, Some(3));
    let ids: Vec<_> = results.jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["net_1", "net_3"]);
    let api = state.lock().unwrap();
    assert_eq!(api.hits["jobs?skip=1"], 2);
    assert_eq!(api.hits["jobs?skip=2"], 1);
}

#[tokio::test]
async fn test_failed_last_listing_page_keeps_earlier_pages() {
    let (base, _state) = common::spawn(three_jobs(&[("jobs?skip=2", 2)])).await;
    let fetcher = common::fetcher(&base);
    let config = Config::from_toml_str(&common::config_toml(&base, "page_size = 2")).unwrap();

    let results = RunPipeline::new(&fetcher, &config).run().await.unwrap();

    assert_eq!(results.listed_jobs, 2);
    assert_eq!(results.total_jobs, Some(3));
    let ids: Vec<_> = results.jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["net_1", "net_2"]);
}
