// Domain models

mod report;
mod sample;

pub use report::{HealthReport, WAITING_FOR_DATA};
pub use sample::{ChargeStatus, TelemetrySample, iso_local, round_to};
