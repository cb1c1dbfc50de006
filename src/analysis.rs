// Health analytics over the stored sample sequence. Pure: no I/O, no shared state.

use crate::models::{HealthReport, TelemetrySample, round_to};

/// Voltage std-dev window (samples).
pub const STABILITY_WINDOW: usize = 5;
/// Charge-percent samples used for the discharge trend.
pub const TREND_WINDOW: usize = 10;

const MAX_CYCLE_PENALTY: f64 = 20.0;
const RATED_CYCLES: f64 = 1000.0;
const THERMAL_HISTORY_LIMIT_C: f64 = 45.0;
const THERMAL_PENALTY: f64 = 20.0;

const THROTTLE_TEMP_C: f64 = 40.0;
const END_OF_LIFE_SOH: f64 = 80.0;
const RAPID_DISCHARGE_SLOPE: f64 = -0.5;

pub const THERMAL_ADVISORY: &str =
    "Critical: Thermal throttling advised. High temp reduces lifespan.";
pub const END_OF_LIFE_ADVISORY: &str =
    "Battery reaching End-of-Life (SoH < 80%). Consider replacement.";
pub const RAPID_DISCHARGE_ADVISORY: &str =
    "Rapid Discharge: Heavy background processes detected.";

/// Build a health report from samples in chronological order.
pub fn analyze(samples: &[TelemetrySample]) -> HealthReport {
    let [_, .., latest] = samples else {
        return HealthReport::waiting(samples.len());
    };

    let soh = state_of_health(latest);
    let soh_or_zero = soh.unwrap_or(0.0);
    let voltages: Vec<f64> = samples.iter().map(|s| s.voltage_v).collect();
    let stability = stability_index(&voltages);

    let max_temp = samples
        .iter()
        .map(|s| s.temp_c)
        .fold(f64::NEG_INFINITY, f64::max);
    let score = health_score(soh_or_zero, latest.cycles, max_temp);

    let tail_start = samples.len().saturating_sub(TREND_WINDOW);
    let percents: Vec<f64> = samples[tail_start..]
        .iter()
        .map(|s| f64::from(s.percent))
        .collect();
    let slope = ols_slope(&percents);

    HealthReport {
        soh_percent: round_to(soh_or_zero, 2),
        health_score: score,
        discharge_rate: round_to(slope, 3),
        stability_index: stability.map(|s| round_to(s, 2)),
        cycle_count: latest.cycles,
        recommendations: recommendations(latest.temp_c, soh, slope),
        sample_count: samples.len(),
    }
}

/// Full-charge over design energy, percent. None when design energy is unknown (0).
pub fn state_of_health(sample: &TelemetrySample) -> Option<f64> {
    (sample.energy_design_wh > 0.0)
        .then(|| sample.energy_full_wh / sample.energy_design_wh * 100.0)
}

/// Weighted composite: SoH 60%, cycle wear up to 20 points, thermal history 20 points.
/// Truncated toward zero, not clamped.
pub fn health_score(soh: f64, cycles: u32, max_temp_c: f64) -> i32 {
    let cycle_penalty = (f64::from(cycles) / RATED_CYCLES * MAX_CYCLE_PENALTY).min(MAX_CYCLE_PENALTY);
    let temp_penalty = thermal_penalty(max_temp_c);
    (soh * 0.6 + (MAX_CYCLE_PENALTY - cycle_penalty) + (THERMAL_PENALTY - temp_penalty)) as i32
}

pub fn thermal_penalty(max_temp_c: f64) -> f64 {
    if max_temp_c > THERMAL_HISTORY_LIMIT_C {
        THERMAL_PENALTY
    } else {
        0.0
    }
}

/// `100 - 10 * mean(rolling std)` over complete voltage windows. Windows with fewer than
/// `STABILITY_WINDOW` samples are excluded; with no complete window there is no index.
pub fn stability_index(voltages: &[f64]) -> Option<f64> {
    let stds: Vec<f64> = voltages
        .windows(STABILITY_WINDOW)
        .map(sample_std_dev)
        .collect();
    if stds.is_empty() {
        return None;
    }
    let mean_std = stds.iter().sum::<f64>() / stds.len() as f64;
    Some(100.0 - mean_std * 10.0)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

/// Least-squares slope of `values` against their positions 0..n-1.
pub fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;
    let (sxy, sxx) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sxy, sxx), (i, y)| {
            let dx = i as f64 - x_mean;
            (sxy + dx * (y - y_mean), sxx + dx * dx)
        });
    sxy / sxx
}

/// Advisories in fixed order; each rule is evaluated independently.
/// An unknown SoH never triggers the end-of-life advisory.
pub fn recommendations(latest_temp_c: f64, soh: Option<f64>, slope: f64) -> Vec<String> {
    let mut recs = Vec::new();
    if latest_temp_c > THROTTLE_TEMP_C {
        recs.push(THERMAL_ADVISORY.to_string());
    }
    if soh.is_some_and(|soh| soh < END_OF_LIFE_SOH) {
        recs.push(END_OF_LIFE_ADVISORY.to_string());
    }
    if slope < RAPID_DISCHARGE_SLOPE {
        recs.push(RAPID_DISCHARGE_ADVISORY.to_string());
    }
    recs
}
