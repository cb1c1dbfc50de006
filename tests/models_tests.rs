// Model serialization tests (status strings, JSON camelCase, timestamp format)

mod common;

use battery_telemetry::models::*;
use common::sample;

#[test]
fn test_charge_status_parses_kernel_strings() {
    assert_eq!("Charging".parse::<ChargeStatus>(), Ok(ChargeStatus::Charging));
    assert_eq!("Discharging\n".parse::<ChargeStatus>(), Ok(ChargeStatus::Discharging));
    assert_eq!("Full".parse::<ChargeStatus>(), Ok(ChargeStatus::Full));
    assert_eq!("Not charging".parse::<ChargeStatus>(), Ok(ChargeStatus::Unknown));
    assert_eq!("".parse::<ChargeStatus>(), Ok(ChargeStatus::Unknown));
    assert_eq!(ChargeStatus::Full.to_string(), "Full");
}

#[test]
fn test_sample_json_uses_log_column_names() {
    let json = serde_json::to_value(sample(5)).unwrap();
    assert_eq!(json["timestamp"], "2025-03-01T12:00:05.000000");
    assert_eq!(json["pct"], 80);
    assert_eq!(json["status"], "Discharging");
    assert_eq!(json["energy_wh"], 40.0);
    assert_eq!(json["charge_rate_w"], -6.0);
    assert!(json.get("percent").is_none());
}

#[test]
fn test_sample_timestamp_accepts_whole_seconds() {
    let mut json = serde_json::to_value(sample(0)).unwrap();
    json["timestamp"] = "2025-03-01T12:00:00".into();
    let back: TelemetrySample = serde_json::from_value(json).unwrap();
    assert_eq!(back, sample(0));
}

#[test]
fn test_health_report_serialization_camel_case() {
    let report = HealthReport {
        soh_percent: 84.15,
        health_score: 91,
        discharge_rate: -0.886,
        stability_index: Some(98.42),
        cycle_count: 120,
        recommendations: vec![],
        sample_count: 6,
    };
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"sohPercent\":84.15"));
    assert!(json.contains("\"healthScore\":91"));
    assert!(json.contains("\"dischargeRate\":-0.886"));
    assert!(json.contains("\"stabilityIndex\""));
    assert!(json.contains("\"cycleCount\":120"));
    let back: HealthReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
    assert!(!back.is_waiting());
}

#[test]
fn test_round_to() {
    assert_eq!(round_to(12.34567, 3), 12.346);
    assert_eq!(round_to(-0.8857, 3), -0.886);
    assert_eq!(round_to(36.55, 0), 37.0);
}
