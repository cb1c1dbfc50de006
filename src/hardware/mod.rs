// Battery + thermal hardware access through the Linux power-supply and thermal classes.
//
// Discovery failures are fatal (no battery, nothing to log). Individual node reads never
// fail the caller: they default to 0.0 and are logged at debug level.

mod sysfs;

pub use sysfs::normalize_temperature;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::instrument;

use crate::models::{ChargeStatus, TelemetrySample, round_to};

pub const DEFAULT_POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";
pub const DEFAULT_THERMAL_ROOT: &str = "/sys/class/thermal";

/// Thermal zone `type` labels that plausibly track battery or package temperature.
const THERMAL_KEYWORDS: [&str; 4] = ["bat", "pkg", "acpi", "intel"];

/// Power-supply nodes report micro-units (µV, µA, µW, µWh, µAh).
const MICRO: f64 = 1e6;

const ENERGY_NOW_NODES: [&str; 2] = ["energy_now", "charge_now"];
const ENERGY_FULL_NODES: [&str; 2] = ["energy_full", "charge_full"];
const ENERGY_DESIGN_NODES: [&str; 2] = ["energy_full_design", "charge_full_design"];

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("no battery hardware detected under {root}")]
    NoBattery { root: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A discovered battery entry, e.g. /sys/class/power_supply/BAT0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatteryHandle {
    pub name: String,
    pub path: PathBuf,
}

/// A single numeric temperature node and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThermalHandle {
    /// "battery" for the battery's own node, otherwise the zone's `type` label.
    pub label: String,
    pub path: PathBuf,
}

pub struct HardwareReader {
    battery: BatteryHandle,
    thermal: Option<ThermalHandle>,
}

impl HardwareReader {
    /// Discover the battery and its best thermal source. Fails only if no battery exists.
    #[instrument(fields(operation = "discover"))]
    pub fn discover(power_supply_root: &Path, thermal_root: &Path) -> Result<Self, HardwareError> {
        let battery = Self::discover_battery(power_supply_root)?;
        tracing::info!(battery = %battery.path.display(), "Connected to battery");
        let thermal = Self::discover_thermal_source(&battery, thermal_root);
        match &thermal {
            Some(t) => {
                tracing::info!(label = %t.label, path = %t.path.display(), "Thermal source")
            }
            None => tracing::warn!("No thermal source found; temperature will read 0.0"),
        }
        Ok(Self { battery, thermal })
    }

    pub fn from_handles(battery: BatteryHandle, thermal: Option<ThermalHandle>) -> Self {
        Self { battery, thermal }
    }

    pub fn battery(&self) -> &BatteryHandle {
        &self.battery
    }

    pub fn thermal(&self) -> Option<&ThermalHandle> {
        self.thermal.as_ref()
    }

    /// First battery-class entry (sorted by name). Peripheral batteries (`scope` = Device,
    /// e.g. wireless mice) are skipped.
    pub fn discover_battery(root: &Path) -> Result<BatteryHandle, HardwareError> {
        sysfs::list_entries(root)
            .into_iter()
            .find(|entry| {
                let name = sysfs::entry_name(entry);
                let is_battery = name.starts_with("BAT")
                    || sysfs::read_trimmed(&entry.join("type")).is_ok_and(|t| t == "Battery");
                let is_peripheral =
                    sysfs::read_trimmed(&entry.join("scope")).is_ok_and(|s| s == "Device");
                is_battery && !is_peripheral
            })
            .map(|path| BatteryHandle {
                name: sysfs::entry_name(&path).to_string(),
                path,
            })
            .ok_or_else(|| HardwareError::NoBattery {
                root: root.display().to_string(),
            })
    }

    /// Battery's own `temp` node first, then the first thermal zone whose type label
    /// matches a battery/package keyword.
    pub fn discover_thermal_source(
        battery: &BatteryHandle,
        thermal_root: &Path,
    ) -> Option<ThermalHandle> {
        let own = battery.path.join("temp");
        if own.is_file() {
            return Some(ThermalHandle {
                label: "battery".into(),
                path: own,
            });
        }
        sysfs::list_entries(thermal_root)
            .into_iter()
            .filter(|zone| sysfs::entry_name(zone).starts_with("thermal_zone"))
            .find_map(|zone| {
                let zone_type = sysfs::read_trimmed(&zone.join("type")).ok()?;
                let lower = zone_type.to_lowercase();
                THERMAL_KEYWORDS
                    .iter()
                    .any(|k| lower.contains(k))
                    .then(|| ThermalHandle {
                        label: zone_type,
                        path: zone.join("temp"),
                    })
            })
    }

    /// Battery node divided by `divisor`; 0.0 on a missing node, I/O error or bad value.
    pub fn read_scaled(&self, node: &str, divisor: f64) -> f64 {
        sysfs::read_number(&self.battery.path.join(node))
            .map(|v| v / divisor)
            .unwrap_or(0.0)
    }

    pub fn read_string(&self, node: &str) -> Result<String, HardwareError> {
        sysfs::read_trimmed(&self.battery.path.join(node))
    }

    /// First strictly positive value among equivalent nodes (kernels differ in naming).
    pub fn read_fallback(&self, nodes: &[&str], divisor: f64) -> f64 {
        nodes
            .iter()
            .map(|node| self.read_scaled(node, divisor))
            .find(|v| *v > 0.0)
            .unwrap_or(0.0)
    }

    /// Degrees Celsius from the thermal source; 0.0 without one.
    pub fn read_temperature(&self) -> f64 {
        self.thermal
            .as_ref()
            .and_then(|t| sysfs::read_number(&t.path))
            .map(normalize_temperature)
            .unwrap_or(0.0)
    }

    pub fn read_status(&self) -> ChargeStatus {
        match self.read_string("status") {
            Ok(s) => {
                let Ok(status) = s.parse::<ChargeStatus>();
                status
            }
            Err(e) => {
                tracing::debug!(error = %e, operation = "read_status", "status unreadable");
                ChargeStatus::Unknown
            }
        }
    }

    /// Capture one sample stamped with the current local time.
    pub fn capture(&self) -> TelemetrySample {
        self.capture_at(chrono::Local::now().naive_local())
    }

    pub fn capture_at(&self, timestamp: NaiveDateTime) -> TelemetrySample {
        let volts = self.read_scaled("voltage_now", MICRO);
        let amps = self.read_scaled("current_now", MICRO);

        let mut power = self.read_scaled("power_now", MICRO);
        if power == 0.0 {
            power = volts * amps;
        }

        let status = self.read_status();
        let charge_rate = if status == ChargeStatus::Charging {
            power.abs()
        } else {
            -power.abs()
        };

        TelemetrySample {
            timestamp,
            percent: self.read_scaled("capacity", 1.0).clamp(0.0, 100.0) as u8,
            status,
            voltage_v: round_to(volts, 3),
            current_a: round_to(amps, 3),
            power_w: round_to(power, 2),
            temp_c: round_to(self.read_temperature(), 1),
            energy_now_wh: self.read_fallback(&ENERGY_NOW_NODES, MICRO),
            energy_full_wh: self.read_fallback(&ENERGY_FULL_NODES, MICRO),
            energy_design_wh: self.read_fallback(&ENERGY_DESIGN_NODES, MICRO),
            cycles: self.read_scaled("cycle_count", 1.0).max(0.0) as u32,
            charge_rate_w: round_to(charge_rate, 2),
        }
    }
}
