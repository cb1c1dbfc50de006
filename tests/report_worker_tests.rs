// Report worker: one-shot report over the log; worker stops on shutdown

mod common;

use battery_telemetry::models::WAITING_FOR_DATA;
use battery_telemetry::report_worker::{ReportWorkerConfig, run_one_report, spawn};
use battery_telemetry::sample_store::SampleStore;
use common::samples_with_percents;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;
use tokio::time::Duration;

#[tokio::test]
async fn report_on_missing_log_is_waiting() {
    let dir = TempDir::new().unwrap();
    let store = SampleStore::new(dir.path().join("log.csv"));
    let report = run_one_report(&store).await.unwrap();
    assert!(report.is_waiting());
    assert_eq!(report.recommendations, vec![WAITING_FOR_DATA.to_string()]);
}

#[tokio::test]
async fn report_analyzes_stored_samples() {
    let dir = TempDir::new().unwrap();
    let store = SampleStore::new(dir.path().join("log.csv"));
    for s in samples_with_percents(&[60, 60, 61]) {
        store.append(&s).await.unwrap();
    }
    let report = run_one_report(&store).await.unwrap();
    assert_eq!(report.sample_count, 3);
    assert_eq!(report.discharge_rate, 0.5);
    assert!(report.recommendations.is_empty());
}

#[tokio::test]
async fn report_propagates_schema_mismatch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log.csv");
    std::fs::write(&path, "a,b,c\n1,2,3\n").unwrap();
    assert!(run_one_report(&SampleStore::new(&path)).await.is_err());
}

#[tokio::test]
async fn worker_stops_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SampleStore::new(dir.path().join("log.csv")));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn(
        store,
        ReportWorkerConfig {
            schedule: Some("0 0 * * * *".into()),
            interval_secs: 900,
        },
        shutdown_rx,
    );
    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("report worker should stop after shutdown")
        .unwrap();
}

#[tokio::test]
async fn invalid_schedule_falls_back_to_interval() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SampleStore::new(dir.path().join("log.csv")));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn(
        store,
        ReportWorkerConfig {
            schedule: Some("whenever".into()),
            interval_secs: 900,
        },
        shutdown_rx,
    );
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.is_finished());
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}
