// Shared test helpers: sample builder and a fake sysfs tree

#![allow(dead_code)]

use battery_telemetry::models::{ChargeStatus, TelemetrySample};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn ts(second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        + chrono::Duration::seconds(second as i64)
}

/// A healthy discharging sample; tests override the fields they care about.
pub fn sample(second: u32) -> TelemetrySample {
    TelemetrySample {
        timestamp: ts(second),
        percent: 80,
        status: ChargeStatus::Discharging,
        voltage_v: 12.0,
        current_a: 0.5,
        power_w: 6.0,
        temp_c: 30.0,
        energy_now_wh: 40.0,
        energy_full_wh: 50.0,
        energy_design_wh: 50.0,
        cycles: 0,
        charge_rate_w: -6.0,
    }
}

pub fn samples_with_percents(percents: &[u8]) -> Vec<TelemetrySample> {
    percents
        .iter()
        .enumerate()
        .map(|(i, p)| TelemetrySample {
            percent: *p,
            ..sample(i as u32 * 10)
        })
        .collect()
}

/// Fake /sys/class/{power_supply,thermal} under a temp dir.
pub struct FakeSysfs {
    pub dir: TempDir,
}

impl FakeSysfs {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("power_supply")).unwrap();
        std::fs::create_dir_all(dir.path().join("thermal")).unwrap();
        Self { dir }
    }

    pub fn power_supply_root(&self) -> PathBuf {
        self.dir.path().join("power_supply")
    }

    pub fn thermal_root(&self) -> PathBuf {
        self.dir.path().join("thermal")
    }

    pub fn supply_node(&self, entry: &str, node: &str, value: &str) -> &Self {
        write_node(&self.power_supply_root().join(entry), node, value);
        self
    }

    pub fn thermal_zone(&self, zone: &str, zone_type: &str, temp: &str) -> &Self {
        let dir = self.thermal_root().join(zone);
        write_node(&dir, "type", zone_type);
        write_node(&dir, "temp", temp);
        self
    }

    /// BAT0 reporting energy_* nodes, discharging at 12 V / 0.5 A.
    pub fn with_standard_battery(self) -> Self {
        for (node, value) in [
            ("type", "Battery"),
            ("status", "Discharging"),
            ("capacity", "85"),
            ("voltage_now", "12000000"),
            ("current_now", "500000"),
            ("energy_now", "42500000"),
            ("energy_full", "50000000"),
            ("energy_full_design", "56000000"),
            ("cycle_count", "120"),
        ] {
            self.supply_node("BAT0", node, value);
        }
        self
    }
}

fn write_node(dir: &Path, node: &str, value: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(node), format!("{}\n", value)).unwrap();
}
