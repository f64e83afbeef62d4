//! SensorLog - Bin Telemetry and Latest-Reading Resolution

use serde::{Deserialize, Serialize};

use crate::constants::{HISTORY_ELEVATED_FILL_PERCENT, HISTORY_HIGH_FILL_PERCENT};
use crate::domain::bin::parse_assigned_id;
use crate::domain::timestamp::Timestamp;

/// One telemetry report from a bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorLog {
    /// Document ID
    #[serde(default)]
    pub id: String,
    /// Numeric bin ID (matches a parsed registry assigned ID)
    #[serde(rename = "binID", alias = "binId")]
    pub bin_id: i64,
    /// Fill level (%)
    #[serde(rename = "fillPercentage", default)]
    pub fill_percentage: f64,
    /// Weight (kg)
    #[serde(default)]
    pub weight: f64,
    /// Ultrasonic distance (cm)
    #[serde(default)]
    pub distance: f64,
    /// Signal strength (dBm)
    #[serde(rename = "rssi", alias = "signalStrength", default)]
    pub signal_strength: i32,
    /// Report time
    pub timestamp: Timestamp,
}

impl SensorLog {
    /// Normalized report time in epoch milliseconds
    pub fn epoch_millis(&self) -> Option<i64> {
        self.timestamp.epoch_millis()
    }

    pub fn fill_band(&self) -> FillBand {
        FillBand::from_percent(self.fill_percentage)
    }
}

/// Display band for a history row's fill level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillBand {
    Normal,
    Elevated,
    High,
}

impl FillBand {
    pub fn from_percent(fill: f64) -> Self {
        if fill > HISTORY_HIGH_FILL_PERCENT {
            FillBand::High
        } else if fill > HISTORY_ELEVATED_FILL_PERCENT {
            FillBand::Elevated
        } else {
            FillBand::Normal
        }
    }
}

/// Select the most recent log for `bin_id`
///
/// Logs for other bins and logs whose timestamp cannot be normalized are
/// skipped. On equal timestamps the first log encountered wins, so the
/// result depends on storage order for exact ties.
pub fn latest_reading<'a, I>(bin_id: i64, logs: I) -> Option<&'a SensorLog>
where
    I: IntoIterator<Item = &'a SensorLog>,
{
    let mut best: Option<(i64, &'a SensorLog)> = None;
    for log in logs.into_iter().filter(|log| log.bin_id == bin_id) {
        let Some(ms) = log.epoch_millis() else {
            continue;
        };
        match best {
            Some((best_ms, _)) if ms <= best_ms => {}
            _ => best = Some((ms, log)),
        }
    }
    best.map(|(_, log)| log)
}

/// Resolve the latest log for a registry assigned ID
///
/// Returns `None` for non-numeric IDs instead of failing.
pub fn latest_for_assigned_id<'a, I>(assigned_id: &str, logs: I) -> Option<&'a SensorLog>
where
    I: IntoIterator<Item = &'a SensorLog>,
{
    let bin_id = parse_assigned_id(assigned_id)?;
    latest_reading(bin_id, logs)
}

/// Sort logs newest first; ties keep their relative order
pub fn sort_newest_first(logs: &mut [SensorLog]) {
    logs.sort_by(|a, b| b.timestamp.cmp_normalized(&a.timestamp));
}
