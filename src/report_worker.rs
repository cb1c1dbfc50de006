// Periodic health report: load the sample log, analyze, log the result.
// Runs on a cron schedule (local time) or a fixed interval. Read-only.

use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Duration, Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{info, instrument, warn};

use crate::analysis;
use crate::models::HealthReport;
use crate::sample_store::{SampleStore, StoreError};

#[derive(Debug, Clone)]
pub struct ReportWorkerConfig {
    /// Optional cron expression (e.g. "0 0 * * * *" = top of every hour).
    pub schedule: Option<String>,
    /// Report every N seconds when `schedule` is not set.
    pub interval_secs: u64,
}

pub fn spawn(
    store: Arc<SampleStore>,
    config: ReportWorkerConfig,
    shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(store, config, shutdown_rx))
}

/// When the next report is due.
enum ReportCadence {
    /// Next fire time of a local-time cron expression.
    Cron(cron::Schedule),
    Every(Interval),
}

impl ReportCadence {
    /// An unparsable cron expression falls back to the fixed interval.
    fn from_config(config: &ReportWorkerConfig) -> Self {
        if let Some(expr) = &config.schedule {
            match cron::Schedule::from_str(expr) {
                Ok(schedule) => return ReportCadence::Cron(schedule),
                Err(e) => warn!(
                    cron = %expr,
                    error = %e,
                    "invalid reporting schedule; using interval_secs"
                ),
            }
        }
        let period = Duration::from_secs(config.interval_secs.max(1));
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ReportCadence::Every(interval)
    }

    async fn wait(&mut self) {
        match self {
            ReportCadence::Cron(schedule) => {
                let now = chrono::Local::now();
                let next = schedule.after(&now).next();
                match next {
                    Some(next) => {
                        tokio::time::sleep((next - now).to_std().unwrap_or_default()).await
                    }
                    // Expression with no future fire time: never due again.
                    None => std::future::pending().await,
                }
            }
            ReportCadence::Every(interval) => {
                interval.tick().await;
            }
        }
    }
}

#[instrument(skip(store, shutdown_rx), fields(interval_secs = config.interval_secs))]
async fn run(
    store: Arc<SampleStore>,
    config: ReportWorkerConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut cadence = ReportCadence::from_config(&config);

    loop {
        tokio::select! {
            _ = cadence.wait() => {
                if let Err(e) = run_one_report(&store).await {
                    warn!(error = %e, operation = "health_report", "health report failed");
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    tracing::debug!("Report worker shutting down");
}

/// Analyze the whole log once and log the report. Used by the worker loop.
pub async fn run_one_report(store: &SampleStore) -> Result<HealthReport, StoreError> {
    let loaded = store.load_checked().await?;
    if loaded.skipped_rows > 0 {
        warn!(
            skipped_rows = loaded.skipped_rows,
            "sample log contains malformed rows"
        );
    }
    let report = analysis::analyze(&loaded.samples);
    log_report(&report);
    Ok(report)
}

fn log_report(report: &HealthReport) {
    if report.is_waiting() {
        info!(samples = report.sample_count, "health report: waiting for data");
        return;
    }
    info!(
        samples = report.sample_count,
        soh_percent = report.soh_percent,
        health_score = report.health_score,
        discharge_rate = report.discharge_rate,
        stability_index = report.stability_index,
        cycle_count = report.cycle_count,
        "health report"
    );
    for rec in &report.recommendations {
        warn!(recommendation = %rec, "health advisory");
    }
}
