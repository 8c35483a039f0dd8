//! # Logger Integration Tests
//!
//! File output in a temporary directory and alert delivery to a mock webhook.

use chrono::Utc;
use serde_json::{json, Value};
use service_toolkit::observability::{Level, Logger};
use std::fs;
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn parse_lines(content: &str) -> Vec<Value> {
    content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_records_are_written_to_dated_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("log");

    let logger = Logger::new()
        .set_output(std::io::sink())
        .set_level(Level::Debug)
        .log_file(&dir)
        .unwrap();

    logger.debug("cache warmed", &[json!("entries"), json!(42)]);
    logger.info("user created", &[json!("user"), json!("bella"), json!("dangling")]);

    let file = dir.join(format!("{}.log", Utc::now().format("%Y-%m-%d")));
    let records = parse_lines(&fs::read_to_string(file).unwrap());

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["level"], "debug");
    assert_eq!(records[0]["msg"], "cache warmed");
    assert_eq!(records[0]["entries"], 42);
    assert_eq!(records[1]["level"], "info");
    assert_eq!(records[1]["user"], "bella");
    assert_eq!(records[1]["extra"], "dangling");
    assert!(records[1]["time"].is_string());
}

#[tokio::test]
async fn test_records_below_level_are_dropped() {
    let tmp = TempDir::new().unwrap();

    let logger = Logger::new()
        .set_output(std::io::sink())
        .set_level(Level::Warn)
        .log_file(tmp.path())
        .unwrap();

    logger.info("ignored", &[]);
    logger.warn("kept", &[]);

    let file = tmp.path().join(format!("{}.log", Utc::now().format("%Y-%m-%d")));
    let records = parse_lines(&fs::read_to_string(file).unwrap());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["msg"], "kept");
}

#[tokio::test]
async fn test_error_records_are_posted_to_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let logger = Logger::new()
        .set_output(std::io::sink())
        .set_webhook(&format!("{}/alerts", server.uri()));

    logger.info("not an alert", &[]);
    logger.error("database unreachable", &[json!("db"), json!("orders")]);

    let mut received = Vec::new();
    for _ in 0..50 {
        received = server.received_requests().await.unwrap();
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(received.len(), 1);
    let alert: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(alert["level"], "error");
    assert_eq!(alert["msg"], "database unreachable");
    assert_eq!(alert["db"], "orders");
}

#[tokio::test]
async fn test_invalid_webhook_is_ignored() {
    let logger = Logger::new()
        .set_output(std::io::sink())
        .set_webhook("not a url");

    logger.error("still logs", &[]);
    assert_eq!(logger.level(), Level::Info);
}

const FATAL_CHILD_ENV: &str = "SERVICE_TOOLKIT_FATAL_CHILD";

#[test]
fn test_fatal_exits_with_status_one() {
    if std::env::var_os(FATAL_CHILD_ENV).is_some() {
        Logger::new().fatal("cannot continue", &[json!("reason"), json!("disk full")]);
    }

    let output = Command::new(std::env::current_exe().unwrap())
        .args(["test_fatal_exits_with_status_one", "--exact", "--nocapture"])
        .env(FATAL_CHILD_ENV, "1")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let record = stdout
        .lines()
        .filter_map(|line| {
            // the harness may print `test <name> ... ` on the same line
            let start = line.find('{')?;
            serde_json::from_str::<Value>(&line[start..]).ok()
        })
        .find(|value| value["level"] == "fatal")
        .expect("fatal record on stdout");
    assert_eq!(record["msg"], "cannot continue");
    assert_eq!(record["reason"], "disk full");
}
