use anyhow::{Context, Result};
use battery_telemetry::*;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    // No battery is not transient: abort instead of retrying.
    let reader = match hardware::HardwareReader::discover(
        Path::new(&app_config.hardware.power_supply_root),
        Path::new(&app_config.hardware.thermal_root),
    ) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            tracing::error!(error = %e, "battery discovery failed");
            return Err(e).context("no battery hardware; cannot start telemetry");
        }
    };

    let store = Arc::new(sample_store::SampleStore::new(&app_config.storage.path));
    store
        .initialize_if_absent()
        .await
        .context("sample log unusable; move it aside or fix its header")?;
    tracing::info!(path = %app_config.storage.path, "Sample log ready");

    let samples_saved_total = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let capture_handle = capture::spawn(
        capture::CaptureDeps {
            reader,
            store: store.clone(),
            samples_saved_total: samples_saved_total.clone(),
            shutdown_rx: shutdown_rx.clone(),
        },
        capture::CaptureConfig {
            sampler: app_config.sampling.sampler(),
            read_timeout: Duration::from_millis(app_config.hardware.read_timeout_ms),
            stats_log_interval_secs: app_config.sampling.stats_log_interval_secs,
        },
    );

    let report_handle = report_worker::spawn(
        store.clone(),
        report_worker::ReportWorkerConfig {
            schedule: app_config.reporting.schedule.clone(),
            interval_secs: app_config.reporting.interval_secs,
        },
        shutdown_rx.clone(),
    );

    let app = routes::app(store, samples_saved_total);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let mut server_shutdown = shutdown_rx.clone();
    let mut server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.wait_for(|stop| *stop).await;
            })
            .await
    });

    let server_exited = tokio::select! {
        result = &mut server_handle => {
            result??;
            tracing::warn!("HTTP server exited");
            true
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            false
        }
    };

    // Capture finishes any in-flight append before observing the signal.
    let _ = shutdown_tx.send(true);
    let _ = capture_handle.await;
    let _ = report_handle.await;
    if !server_exited {
        server_handle.await??;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
