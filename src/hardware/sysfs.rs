// sysfs helpers: trimmed reads, numeric parsing, directory listing, temperature units.

use std::path::{Path, PathBuf};

use super::HardwareError;

/// Read a sysfs node and return its trimmed content.
pub(super) fn read_trimmed(path: &Path) -> Result<String, HardwareError> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| HardwareError::Read {
            path: path.display().to_string(),
            source: e,
        })
}

/// Read a node holding a single integer (or decimal) value. None on any failure.
pub(super) fn read_number(path: &Path) -> Option<f64> {
    let content = match read_trimmed(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, operation = "read_number", "sysfs node unreadable");
            return None;
        }
    };
    match content.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::debug!(
                path = %path.display(),
                value = %content,
                operation = "read_number",
                "sysfs node not numeric"
            );
            None
        }
    }
}

/// Entries of a class directory (e.g. /sys/class/power_supply), sorted by name.
/// Missing or unreadable directories yield an empty list.
pub(super) fn list_entries(dir: &Path) -> Vec<PathBuf> {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut entries: Vec<PathBuf> = read_dir
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();
    entries
}

/// File name of a sysfs entry as a string ("" when not UTF-8).
pub(super) fn entry_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Thermal nodes report millidegrees (thermal zones) or tenths of a degree (battery `temp`).
/// Values above 1000 are millidegrees; everything else is tenths.
pub fn normalize_temperature(raw: f64) -> f64 {
    if raw > 1000.0 { raw / 1000.0 } else { raw / 10.0 }
}
