// Adaptive sampling cadence: short interval on state change or heavy load, long otherwise.

use std::time::Duration;

use crate::models::ChargeStatus;

pub const HIGH_RES_INTERVAL: Duration = Duration::from_secs(2);
pub const ECONOMY_INTERVAL: Duration = Duration::from_secs(10);
/// Absolute power draw (W) above which high-res sampling is used regardless of status.
pub const POWER_THRESHOLD_W: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    HighRes,
    Economy,
}

impl SamplingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingMode::HighRes => "high-res",
            SamplingMode::Economy => "economy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveSampler {
    pub high_res: Duration,
    pub economy: Duration,
    pub power_threshold_w: f64,
}

impl Default for AdaptiveSampler {
    fn default() -> Self {
        Self {
            high_res: HIGH_RES_INTERVAL,
            economy: ECONOMY_INTERVAL,
            power_threshold_w: POWER_THRESHOLD_W,
        }
    }
}

impl AdaptiveSampler {
    /// `previous` is None before the first capture, which counts as a status change.
    pub fn mode(
        &self,
        previous: Option<ChargeStatus>,
        current: ChargeStatus,
        power_w: f64,
    ) -> SamplingMode {
        if previous != Some(current) || power_w.abs() > self.power_threshold_w {
            SamplingMode::HighRes
        } else {
            SamplingMode::Economy
        }
    }

    pub fn interval(&self, mode: SamplingMode) -> Duration {
        match mode {
            SamplingMode::HighRes => self.high_res,
            SamplingMode::Economy => self.economy,
        }
    }

    pub fn next_interval(
        &self,
        previous: Option<ChargeStatus>,
        current: ChargeStatus,
        power_w: f64,
    ) -> Duration {
        self.interval(self.mode(previous, current, power_w))
    }
}
