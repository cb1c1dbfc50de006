// Analyze a sample log once and print the health report as JSON.
//
// Usage: bms-report [LOG_PATH]
//   LOG_PATH  default: storage.path from CONFIG_FILE, else ./battery_master_log.csv

use battery_telemetry::analysis;
use battery_telemetry::config::AppConfig;
use battery_telemetry::sample_store::SampleStore;
use std::env;

const DEFAULT_LOG_PATH: &str = "battery_master_log.csv";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = env::args()
        .nth(1)
        .or_else(|| AppConfig::load().ok().map(|c| c.storage.path))
        .unwrap_or_else(|| DEFAULT_LOG_PATH.into());

    let store = SampleStore::new(&path);
    let loaded = store.load_checked().await?;
    if loaded.skipped_rows > 0 {
        eprintln!("{}: skipped {} malformed rows", path, loaded.skipped_rows);
    }
    let report = analysis::analyze(&loaded.samples);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
