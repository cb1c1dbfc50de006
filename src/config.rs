use serde::Deserialize;

use crate::hardware::{DEFAULT_POWER_SUPPLY_ROOT, DEFAULT_THERMAL_ROOT};
use crate::sampler::{AdaptiveSampler, ECONOMY_INTERVAL, HIGH_RES_INTERVAL, POWER_THRESHOLD_W};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// CSV sample log; created with a header row on first use, appended to afterwards.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_high_res_secs")]
    pub high_res_secs: u64,
    #[serde(default = "default_economy_secs")]
    pub economy_secs: u64,
    #[serde(default = "default_power_threshold_w")]
    pub power_threshold_w: f64,
    /// How often to log the running sample counter at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

fn default_high_res_secs() -> u64 {
    HIGH_RES_INTERVAL.as_secs()
}

fn default_economy_secs() -> u64 {
    ECONOMY_INTERVAL.as_secs()
}

fn default_power_threshold_w() -> f64 {
    POWER_THRESHOLD_W
}

fn default_stats_log_interval_secs() -> u64 {
    300
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            high_res_secs: default_high_res_secs(),
            economy_secs: default_economy_secs(),
            power_threshold_w: default_power_threshold_w(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

impl SamplingConfig {
    pub fn sampler(&self) -> AdaptiveSampler {
        AdaptiveSampler {
            high_res: std::time::Duration::from_secs(self.high_res_secs),
            economy: std::time::Duration::from_secs(self.economy_secs),
            power_threshold_w: self.power_threshold_w,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HardwareConfig {
    #[serde(default = "default_power_supply_root")]
    pub power_supply_root: String,
    #[serde(default = "default_thermal_root")]
    pub thermal_root: String,
    /// Upper bound for one capture's sysfs reads before the cycle is skipped.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_power_supply_root() -> String {
    DEFAULT_POWER_SUPPLY_ROOT.into()
}

fn default_thermal_root() -> String {
    DEFAULT_THERMAL_ROOT.into()
}

fn default_read_timeout_ms() -> u64 {
    1000
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            power_supply_root: default_power_supply_root(),
            thermal_root: default_thermal_root(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    /// Optional cron expression for periodic health reports (e.g. "0 0 * * * *" = hourly).
    /// Uses local time.
    pub schedule: Option<String>,
    /// Report every N seconds when `schedule` is not set.
    #[serde(default = "default_report_interval_secs")]
    pub interval_secs: u64,
}

fn default_report_interval_secs() -> u64 {
    900
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            schedule: None,
            interval_secs: default_report_interval_secs(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.storage.path.is_empty(),
            "storage.path must be non-empty"
        );
        anyhow::ensure!(
            self.sampling.high_res_secs > 0,
            "sampling.high_res_secs must be > 0, got {}",
            self.sampling.high_res_secs
        );
        anyhow::ensure!(
            self.sampling.economy_secs >= self.sampling.high_res_secs,
            "sampling.economy_secs must be >= sampling.high_res_secs ({}), got {}",
            self.sampling.high_res_secs,
            self.sampling.economy_secs
        );
        anyhow::ensure!(
            self.sampling.power_threshold_w.is_finite() && self.sampling.power_threshold_w >= 0.0,
            "sampling.power_threshold_w must be a non-negative number, got {}",
            self.sampling.power_threshold_w
        );
        anyhow::ensure!(
            self.sampling.stats_log_interval_secs > 0,
            "sampling.stats_log_interval_secs must be > 0, got {}",
            self.sampling.stats_log_interval_secs
        );
        anyhow::ensure!(
            !self.hardware.power_supply_root.is_empty(),
            "hardware.power_supply_root must be non-empty"
        );
        anyhow::ensure!(
            self.hardware.read_timeout_ms > 0,
            "hardware.read_timeout_ms must be > 0, got {}",
            self.hardware.read_timeout_ms
        );
        anyhow::ensure!(
            self.reporting.interval_secs > 0,
            "reporting.interval_secs must be > 0, got {}",
            self.reporting.interval_secs
        );
        if let Some(schedule) = &self.reporting.schedule {
            anyhow::ensure!(
                schedule.parse::<cron::Schedule>().is_ok(),
                "reporting.schedule is not a valid cron expression: {}",
                schedule
            );
        }
        Ok(())
    }
}
