// One capture cycle: the row written to the durable log and served to the dashboard.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Charge status as reported by the power-supply `status` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChargeStatus {
    Charging,
    Discharging,
    Full,
    Unknown,
}

impl ChargeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeStatus::Charging => "Charging",
            ChargeStatus::Discharging => "Discharging",
            ChargeStatus::Full => "Full",
            ChargeStatus::Unknown => "Unknown",
        }
    }
}

impl FromStr for ChargeStatus {
    type Err = std::convert::Infallible;

    /// Kernel strings outside the known set ("Not charging", vendor values) map to Unknown.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Charging" => ChargeStatus::Charging,
            "Discharging" => ChargeStatus::Discharging,
            "Full" => ChargeStatus::Full,
            _ => ChargeStatus::Unknown,
        })
    }
}

impl From<String> for ChargeStatus {
    fn from(s: String) -> Self {
        let Ok(status) = s.parse::<ChargeStatus>();
        status
    }
}

impl From<ChargeStatus> for String {
    fn from(status: ChargeStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record produced by one capture. Unreadable hardware values are 0.0, never absent.
///
/// Field order and serde names are the log schema; see [`crate::sample_store::SCHEMA`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Local wall-clock capture time, ISO-8601 without offset.
    #[serde(with = "iso_local")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "pct")]
    pub percent: u8,
    pub status: ChargeStatus,
    pub voltage_v: f64,
    pub current_a: f64,
    pub power_w: f64,
    pub temp_c: f64,
    #[serde(rename = "energy_wh")]
    pub energy_now_wh: f64,
    pub energy_full_wh: f64,
    pub energy_design_wh: f64,
    pub cycles: u32,
    /// Positive while charging, negative otherwise.
    pub charge_rate_w: f64,
}

/// Rounds to `decimals` places (half away from zero).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// ISO-8601 local timestamps with microsecond precision, e.g. `2025-03-01T14:02:11.123456`.
/// Parsing also accepts whole seconds and any fractional precision.
pub mod iso_local {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        raw.trim()
            .parse::<NaiveDateTime>()
            .map_err(|e| serde::de::Error::custom(format!("timestamp '{}': {}", raw, e)))
    }
}
