//! Full runs from config file to written report

use crate::common::{self, MockApi};
use clap::Parser;
use serde_json::Value;
use tempfile::TempDir;
use welldata_poller::cli::{Cli, CliError};
use welldata_poller::config::{Config, ConfigError};
use welldata_poller::output::sheets::{JOBS_HEADER, JOBS_SHEET};
use welldata_poller::output::Report;
use welldata_poller::pipeline::RunPipeline;

fn two_jobs() -> MockApi {
    MockApi {
        jobs: vec![
            common::job_json("net_1", "Nabors", "X1", "Shell"),
            common::job_json("net_2", "H&P", "F9", "BP"),
        ],
        ..MockApi::default()
    }
}

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["welldata-poller", "--quiet", "--retry-delay-secs", "0"];
    argv.extend_from_slice(args);
    Cli::parse_from(argv)
}

fn read_csv(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn test_csv_report_rows_and_headers() {
    let (base, _state) = common::spawn(two_jobs()).await;
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("welldata.toml");
    std::fs::write(
        &config_path,
        common::config_toml(&base, "time_requests = [\"historical\", \"events\"]"),
    )
    .unwrap();
    let out = dir.path().join("reports");

    let cli = cli(&[
        "--config",
        config_path.to_str().unwrap(),
        "--runs",
        "1",
        "--format",
        "csv",
        "--output-dir",
        out.to_str().unwrap(),
    ]);
    let written = cli.execute().await.unwrap();

    let report_dir = out.join("1 - API Time Tester-interval(43200)");
    assert_eq!(written, vec![report_dir.clone()]);

    let jobs = read_csv(&report_dir.join("JobsID.csv"));
    assert_eq!(jobs[0], JOBS_HEADER.to_vec());
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[1][0], "net_1");
    assert_eq!(jobs[2][2], "H&P");
    assert_eq!(jobs[2][7], "JN-net_2");

    // two attributes with data per job
    let attributes = read_csv(&report_dir.join("Attributes.csv"));
    assert_eq!(attributes[0], vec!["Job ID", "Attribute Data"]);
    assert_eq!(attributes.len(), 5);
    let first: Value = serde_json::from_str(&attributes[1][1]).unwrap();
    assert_eq!(first["id"], "depth");
    assert_eq!(first["unit"], "m");

    let history = read_csv(&report_dir.join("TimeBased.csv"));
    assert_eq!(history[0], vec!["Job ID", "Historical Data"]);
    assert_eq!(history.len(), 3);
    assert!(history[1][1].contains("timeRecords"));

    let events = read_csv(&report_dir.join("Events.csv"));
    assert_eq!(events.len(), 3);
    assert!(!report_dir.join("CurrentTime.csv").exists());

    let token_time = read_csv(&report_dir.join("Token Time.csv"));
    assert_eq!(token_time[0], vec!["Get Token Time Data"]);
    assert_eq!(token_time.len(), 2);
    assert!(token_time[1][0].parse::<f64>().unwrap() >= 0.0);

    let job_time = read_csv(&report_dir.join("Job_Id Time.csv"));
    assert_eq!(job_time.len(), 3);
    let total = read_csv(&report_dir.join("Total Process Time.csv"));
    assert_eq!(total.len(), 3);

    let issues = read_csv(&report_dir.join("IssueJobs.csv"));
    assert_eq!(issues, vec![vec!["JobID".to_string(), "Time".to_string()]]);
}

#[tokio::test]
async fn test_runs_write_one_report_each() {
    let (base, state) = common::spawn(two_jobs()).await;
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("welldata.toml");
    std::fs::write(&config_path, common::config_toml(&base, "historic_interval = 21600")).unwrap();

    let cli = cli(&[
        "--config",
        config_path.to_str().unwrap(),
        "--runs",
        "2",
        "--output-dir",
        dir.path().to_str().unwrap(),
    ]);
    let written = cli.execute().await.unwrap();

    assert_eq!(written.len(), 2);
    for (i, path) in written.iter().enumerate() {
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, format!("{} - API Time Tester-interval(21600).xlsx", i + 1));
        assert!(path.is_file());
    }
    assert_eq!(state.lock().unwrap().hits["token"], 2);
}

#[tokio::test]
async fn test_missing_config_writes_template_and_fails() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("conf").join("welldata.toml");

    let cli = cli(&["--config", config_path.to_str().unwrap()]);
    let err = cli.execute().await.unwrap_err();

    assert!(matches!(err, CliError::ConfigError(ConfigError::TemplateCreated(_))));
    assert!(err.is_fatal());
    let template = std::fs::read_to_string(&config_path).unwrap();
    assert!(template.contains("[server]"));
    assert!(template.contains("time_requests = [\"historical\"]"));
    // the untouched template is rejected until credentials are filled in
    assert!(matches!(Config::load(&config_path), Err(ConfigError::Invalid(_))));
}

#[tokio::test]
async fn test_token_failure_aborts_all_runs() {
    let api = MockApi {
        token_status: Some(401),
        ..two_jobs()
    };
    let (base, state) = common::spawn(api).await;
    let dir = TempDir::new().unwrap();
    let config = Config::from_toml_str(&common::config_toml(&base, "")).unwrap();
    let fetcher = common::fetcher(&base);

    let cli = cli(&["--runs", "3", "--output-dir", dir.path().to_str().unwrap()]);
    let err = cli.execute_with(&fetcher, &config).await.unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(state.lock().unwrap().hits["token"], 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unwritable_report_does_not_stop_next_run() {
    let (base, state) = common::spawn(two_jobs()).await;
    let dir = TempDir::new().unwrap();
    // a plain file where the output directory should be
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, "not a directory").unwrap();
    let config = Config::from_toml_str(&common::config_toml(&base, "")).unwrap();
    let fetcher = common::fetcher(&base);

    let cli = cli(&["--runs", "2", "--output-dir", blocked.to_str().unwrap()]);
    let written = cli.execute_with(&fetcher, &config).await.unwrap();

    assert!(written.is_empty());
    assert_eq!(state.lock().unwrap().hits["token"], 2);
}

#[tokio::test]
async fn test_posted_payloads() {
    let (base, state) = common::spawn(two_jobs()).await;
    let config = Config::from_toml_str(&common::config_toml(
        &base,
        "time_requests = [\"historical\", \"current\", \"events\"]\nfilter_list = [\"depth\"]\nhistoric_interval = 60",
    ))
    .unwrap();
    let fetcher = common::fetcher(&base);

    let results = RunPipeline::new(&fetcher, &config).run().await.unwrap();
    assert_eq!(results.attributes.len(), 2);

    let api = state.lock().unwrap();
    let body = |key: &str| {
        api.posted
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, b)| b.clone())
            .unwrap()
    };

    let historical = body("time/net_1");
    assert_eq!(historical["attributes"], serde_json::json!([{"id": "depth", "mode": "Last"}]));
    assert_eq!(historical["interval"], 60.0);
    assert_eq!(historical["isDifferential"], false);
    assert!(historical["fromTime"].as_str().unwrap() < historical["toTime"].as_str().unwrap());

    let current = body("current/net_2");
    assert_eq!(current["frequency"], 1.0);
    assert!(current.get("fromTime").is_none());

    let events = body("events/net_1");
    assert_eq!(events["outputAttributes"][0]["id"], "depth");
    assert!(events["timeRange"].get("from").is_some());
    assert_eq!(events["filter"]["attributeId"], "depth");
    assert_eq!(events["filter"]["greaterThanEqual"]["value"], 0);

    let report = Report::from_results(&results);
    assert_eq!(report.sheet(JOBS_SHEET).unwrap().rows.len(), 2);
    assert_eq!(report.sheet("CurrentTime").unwrap().rows.len(), 2);
}
