// Capture loop: read hardware -> durable append -> adaptive sleep, until shutdown.
// The previous charge status is loop state threaded into the sampler, nothing global.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, interval_at};
use tracing::instrument;

use crate::hardware::HardwareReader;
use crate::models::{ChargeStatus, TelemetrySample};
use crate::sample_store::SampleStore;
use crate::sampler::AdaptiveSampler;

/// Hardware, storage, and shutdown for the capture loop.
pub struct CaptureDeps {
    pub reader: Arc<HardwareReader>,
    pub store: Arc<SampleStore>,
    pub samples_saved_total: Arc<AtomicU64>,
    /// Loop exits when this flips to true (or the sender is dropped).
    pub shutdown_rx: watch::Receiver<bool>,
}

pub struct CaptureConfig {
    pub sampler: AdaptiveSampler,
    /// Bound on one capture's sysfs reads.
    pub read_timeout: Duration,
    /// How often to log the saved-sample counter (real seconds).
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: CaptureDeps, config: CaptureConfig) -> JoinHandle<()> {
    tokio::spawn(run(deps, config))
}

#[instrument(name = "capture", skip_all)]
pub async fn run(deps: CaptureDeps, config: CaptureConfig) {
    let CaptureDeps {
        reader,
        store,
        samples_saved_total,
        mut shutdown_rx,
    } = deps;
    let CaptureConfig {
        sampler,
        read_timeout,
        stats_log_interval_secs,
    } = config;

    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);
    let mut stats_log_tick = interval_at(Instant::now() + stats_log_interval, stats_log_interval);
    stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut previous_status: Option<ChargeStatus> = None;
    let mut last_timestamp: Option<NaiveDateTime> = None;
    // A read that outlived its timeout; no new read starts until it returns.
    let mut stuck_read: Option<JoinHandle<TelemetrySample>> = None;

    tracing::info!(battery = %reader.battery().name, "Capture loop started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let sleep_for = match capture_sample(&reader, read_timeout, &mut stuck_read).await {
            Some(mut sample) => {
                // Wall clock may step backwards (NTP); keep timestamps non-decreasing.
                if let Some(last) = last_timestamp
                    && sample.timestamp < last
                {
                    sample.timestamp = last;
                }
                last_timestamp = Some(sample.timestamp);

                match store.append(&sample).await {
                    Ok(()) => {
                        samples_saved_total.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            operation = "append",
                            "failed to persist sample; retrying next cycle"
                        );
                    }
                }

                let mode = sampler.mode(previous_status, sample.status, sample.power_w);
                previous_status = Some(sample.status);
                tracing::debug!(
                    pct = sample.percent,
                    power_w = sample.power_w,
                    temp_c = sample.temp_c,
                    status = %sample.status,
                    mode = mode.as_str(),
                    "telemetry"
                );
                sampler.interval(mode)
            }
            None => sampler.economy,
        };

        let sleep = tokio::time::sleep(sleep_for);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::info!(
                            samples_saved_total = samples_saved_total.load(Ordering::Relaxed),
                            "Capture loop shutting down"
                        );
                        return;
                    }
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        samples_saved_total = samples_saved_total.load(Ordering::Relaxed),
                        "capture stats"
                    );
                }
            }
        }
    }
    tracing::info!("Capture loop shutting down");
}

/// One capture on the blocking pool, bounded by `read_timeout`. None if it did not finish.
///
/// A timed-out read keeps its blocking thread, so its handle is parked in `stuck_read` and
/// captures are skipped until it returns. At most one thread is ever held by a hung node.
async fn capture_sample(
    reader: &Arc<HardwareReader>,
    read_timeout: Duration,
    stuck_read: &mut Option<JoinHandle<TelemetrySample>>,
) -> Option<TelemetrySample> {
    if stuck_read.as_ref().is_some_and(|h| !h.is_finished()) {
        tracing::warn!(
            operation = "capture",
            "previous hardware read still blocked; skipping sample"
        );
        return None;
    }
    // Finished late: that reading is stale, drop it.
    *stuck_read = None;

    let reader = reader.clone();
    let mut task = tokio::task::spawn_blocking(move || reader.capture());
    match tokio::time::timeout(read_timeout, &mut task).await {
        Ok(Ok(sample)) => Some(sample),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, operation = "capture", "capture task failed");
            None
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = read_timeout.as_millis() as u64,
                operation = "capture",
                "hardware read timed out; skipping sample"
            );
            *stuck_read = Some(task);
            None
        }
    }
}
