//! Capacity conversion from sector counts.

use serde_json::Value;
use tracing::warn;

use crate::fields::as_i64;

/// Target unit for capacity conversion (1024-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityUnit {
    B,
    KB,
    MB,
    GB,
    TB,
}

impl CapacityUnit {
    fn divisor(self) -> f64 {
        match self {
            CapacityUnit::B => 1.0,
            CapacityUnit::KB => 1024.0,
            CapacityUnit::MB => 1024.0 * 1024.0,
            CapacityUnit::GB => 1024.0 * 1024.0 * 1024.0,
            CapacityUnit::TB => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        }
    }
}

/// Converts a sector count into the target unit, rounded to two decimals.
///
/// Vendor payloads carry counters as strings or numbers interchangeably;
/// anything that does not parse yields 0.0 instead of an error.
pub fn format_capacity(sectors: &Value, sector_size: i64, unit: CapacityUnit) -> f64 {
    let Some(count) = as_i64(sectors) else {
        warn!("unparsable sector count: {sectors}");
        return 0.0;
    };
    let bytes = count as f64 * sector_size as f64;
    round2(bytes / unit.divisor())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
