// Health report: derived from the stored sample sequence, never persisted.

use serde::{Deserialize, Serialize};

/// Recommendation emitted while there are fewer than two samples.
pub const WAITING_FOR_DATA: &str = "Waiting for data...";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Full-charge energy over design energy, percent (2 decimals).
    pub soh_percent: f64,
    pub health_score: i32,
    /// OLS slope of charge percent per sample interval (3 decimals).
    pub discharge_rate: f64,
    /// None (JSON null) until the log holds one full voltage window.
    pub stability_index: Option<f64>,
    pub cycle_count: u32,
    pub recommendations: Vec<String>,
    pub sample_count: usize,
}

impl HealthReport {
    /// Report for a history too short to analyze.
    pub fn waiting(sample_count: usize) -> Self {
        Self {
            soh_percent: 0.0,
            health_score: 0,
            discharge_rate: 0.0,
            stability_index: Some(0.0),
            cycle_count: 0,
            recommendations: vec![WAITING_FOR_DATA.to_string()],
            sample_count,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.sample_count < 2
    }
}
