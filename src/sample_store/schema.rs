// Fixed log schema: header row, record encoding, header validation.

use csv::StringRecord;

use crate::models::TelemetrySample;

/// Column order of the durable log. This header is the contract with the dashboard.
pub const SCHEMA: [&str; 12] = [
    "timestamp",
    "pct",
    "status",
    "voltage_v",
    "current_a",
    "power_w",
    "temp_c",
    "energy_wh",
    "energy_full_wh",
    "energy_design_wh",
    "cycles",
    "charge_rate_w",
];

pub(super) fn header_line() -> String {
    let mut line = SCHEMA.join(",");
    line.push('\n');
    line
}

/// One complete CSV line (with trailing newline) for `sample`.
pub(super) fn encode_record(sample: &TelemetrySample) -> std::io::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::with_capacity(160));
    writer.serialize(sample).map_err(std::io::Error::other)?;
    writer.into_inner().map_err(|e| e.into_error())
}

pub(super) fn header_matches(headers: &StringRecord) -> bool {
    headers.len() == SCHEMA.len() && headers.iter().zip(SCHEMA).all(|(h, s)| h.trim() == s)
}

/// True when a raw first line (with or without its terminator) is the schema header.
pub(super) fn header_line_matches(line: &str) -> bool {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
    fields.len() == SCHEMA.len() && fields.iter().zip(SCHEMA).all(|(f, s)| f.trim() == s)
}
