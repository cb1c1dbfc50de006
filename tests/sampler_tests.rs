// AdaptiveSampler: status transitions and load pick the sampling interval

use battery_telemetry::models::ChargeStatus::*;
use battery_telemetry::sampler::{
    AdaptiveSampler, ECONOMY_INTERVAL, HIGH_RES_INTERVAL, SamplingMode,
};
use std::time::Duration;

#[test]
fn status_change_selects_high_res() {
    let s = AdaptiveSampler::default();
    assert_eq!(
        s.next_interval(Some(Discharging), Charging, 5.0),
        HIGH_RES_INTERVAL
    );
}

#[test]
fn steady_low_power_selects_economy() {
    let s = AdaptiveSampler::default();
    assert_eq!(
        s.next_interval(Some(Discharging), Discharging, 3.0),
        ECONOMY_INTERVAL
    );
}

#[test]
fn high_power_overrides_steady_status() {
    let s = AdaptiveSampler::default();
    assert_eq!(
        s.next_interval(Some(Discharging), Discharging, 20.0),
        HIGH_RES_INTERVAL
    );
    // Threshold applies to magnitude (negative current on some kernels).
    assert_eq!(
        s.next_interval(Some(Discharging), Discharging, -20.0),
        HIGH_RES_INTERVAL
    );
    // Exactly at the threshold is not above it.
    assert_eq!(s.mode(Some(Full), Full, 15.0), SamplingMode::Economy);
}

#[test]
fn first_sample_counts_as_status_change() {
    let s = AdaptiveSampler::default();
    assert_eq!(s.mode(None, Unknown, 0.0), SamplingMode::HighRes);
}

#[test]
fn default_intervals() {
    assert_eq!(HIGH_RES_INTERVAL, Duration::from_secs(2));
    assert_eq!(ECONOMY_INTERVAL, Duration::from_secs(10));
}

#[test]
fn custom_intervals_and_threshold() {
    let s = AdaptiveSampler {
        high_res: Duration::from_millis(500),
        economy: Duration::from_secs(60),
        power_threshold_w: 5.0,
    };
    assert_eq!(
        s.next_interval(Some(Charging), Charging, 6.0),
        Duration::from_millis(500)
    );
    assert_eq!(
        s.next_interval(Some(Charging), Charging, 4.0),
        Duration::from_secs(60)
    );
}
