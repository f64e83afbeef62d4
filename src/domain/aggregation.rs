//! Aggregation - Fleet KPIs and Enriched Bins
//!
//! KPIs only count bins whose latest report falls on the current local day.
//! The enriched per-bin view always shows the latest known report, however
//! old it is.

use chrono::{DateTime, Duration, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{CRITICAL_FILL_PERCENT, WARNING_FILL_PERCENT};
use crate::domain::bin::BinRecord;
use crate::domain::sensor_log::SensorLog;

/// Fleet-wide dashboard KPIs
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Sum of today's latest weights (kg), one decimal
    #[serde(rename = "totalWaste")]
    pub total_waste_kg: f64,
    /// Mean fill of bins active today, rounded
    #[serde(rename = "avgFill")]
    pub average_fill_percent: i64,
    /// Bins whose latest report is from today
    #[serde(rename = "activeBins")]
    pub active_bin_count: usize,
    /// Active bins at or above the critical fill level
    #[serde(rename = "criticalBins")]
    pub critical_bin_count: usize,
}

/// Marker status derived from a bin's current fill level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStatus {
    Normal,
    Warning,
    Critical,
}

impl MarkerStatus {
    pub fn from_fill(fill: f64) -> Self {
        if fill >= CRITICAL_FILL_PERCENT {
            MarkerStatus::Critical
        } else if fill >= WARNING_FILL_PERCENT {
            MarkerStatus::Warning
        } else {
            MarkerStatus::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarkerStatus::Normal => "Normal",
            MarkerStatus::Warning => "Warning",
            MarkerStatus::Critical => "Critical",
        }
    }
}

/// A registry record with its latest known reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBin {
    #[serde(flatten)]
    pub bin: BinRecord,
    #[serde(rename = "fillLevel")]
    pub fill_level: f64,
    pub weight: f64,
    #[serde(rename = "lastUpdated")]
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl EnrichedBin {
    pub fn status(&self) -> MarkerStatus {
        MarkerStatus::from_fill(self.fill_level)
    }
}

/// A bin paired with its resolved latest log, if any
#[derive(Debug, Clone, PartialEq)]
pub struct BinReading {
    pub bin: BinRecord,
    pub latest: Option<SensorLog>,
}

impl BinReading {
    pub fn new(bin: BinRecord, latest: Option<SensorLog>) -> Self {
        Self { bin, latest }
    }

    fn enrich(&self) -> EnrichedBin {
        let (fill_level, weight, last_updated_at) = match &self.latest {
            Some(log) => (
                log.fill_percentage,
                log.weight,
                log.timestamp.to_datetime(),
            ),
            None => (0.0, 0.0, None),
        };
        EnrichedBin {
            bin: self.bin.clone(),
            fill_level,
            weight,
            last_updated_at,
        }
    }

    /// The latest log, only when it was reported at or after `day_start_ms`
    fn today_log(&self, day_start_ms: i64) -> Option<&SensorLog> {
        self.latest
            .as_ref()
            .filter(|log| log.epoch_millis().is_some_and(|ms| ms >= day_start_ms))
    }
}

/// Result of one aggregation pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub bins: Vec<EnrichedBin>,
}

impl DashboardSnapshot {
    /// Zeroed stats and no bins
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Epoch milliseconds of local midnight on `now`'s calendar day
///
/// When a DST jump skips midnight, the day starts at the first local time
/// that exists.
pub fn day_start_millis<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    let tz = now.timezone();
    // Offset transitions fall on quarter hours
    (0..DAY_QUARTER_HOURS)
        .map(|k| midnight + Duration::minutes(15 * k))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|start| start.timestamp_millis())
        .unwrap_or_else(|| {
            let offset = i64::from(now.offset().fix().local_minus_utc());
            (midnight.and_utc().timestamp() - offset) * 1000
        })
}

const DAY_QUARTER_HOURS: i64 = 24 * 4;

/// Fold per-bin readings into KPIs and the enriched bin list
///
/// KPI totals are sums and counts, so the result does not depend on the
/// order in which readings arrived. The enriched list keeps input order.
pub fn aggregate<I>(readings: I, day_start_ms: i64) -> DashboardSnapshot
where
    I: IntoIterator<Item = BinReading>,
{
    let mut total_weight = 0.0;
    let mut total_fill = 0.0;
    let mut active = 0usize;
    let mut critical = 0usize;
    let mut bins = Vec::new();

    for reading in readings {
        if let Some(log) = reading.today_log(day_start_ms) {
            total_weight += log.weight;
            total_fill += log.fill_percentage;
            active += 1;
            if log.fill_percentage >= CRITICAL_FILL_PERCENT {
                critical += 1;
            }
        }
        bins.push(reading.enrich());
    }

    let average_fill_percent = if active > 0 {
        (total_fill / active as f64).round() as i64
    } else {
        0
    };

    DashboardSnapshot {
        stats: DashboardStats {
            total_waste_kg: round_one_decimal(total_weight),
            average_fill_percent,
            active_bin_count: active,
            critical_bin_count: critical,
        },
        bins,
    }
}

/// Aggregate with "today" taken from `now`'s time zone
pub fn aggregate_at<I, Tz>(readings: I, now: &DateTime<Tz>) -> DashboardSnapshot
where
    I: IntoIterator<Item = BinReading>,
    Tz: TimeZone,
{
    aggregate(readings, day_start_millis(now))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timestamp::Timestamp;
    use chrono::{FixedOffset, LocalResult, NaiveDate, NaiveDateTime};

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).expect("offset")
    }

    fn local(day: u32, hour: u32) -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(2024, 5, day, hour, 0, 0)
            .single()
            .expect("valid time")
    }

    fn bin(assigned_id: &str) -> BinRecord {
        BinRecord {
            id: format!("doc-{assigned_id}"),
            assigned_id: assigned_id.to_string(),
            hardware_address: format!("MAC-{assigned_id}"),
            registered_at: None,
            status: "active".to_string(),
            position: None,
        }
    }

    fn log_at(bin_id: i64, at: DateTime<FixedOffset>, fill: f64, weight: f64) -> SensorLog {
        SensorLog {
            id: format!("log-{bin_id}-{}", at.timestamp()),
            bin_id,
            fill_percentage: fill,
            weight,
            distance: 10.0,
            signal_strength: -60,
            timestamp: Timestamp::Millis(at.timestamp_millis()),
        }
    }

    fn reading(assigned_id: &str, latest: Option<SensorLog>) -> BinReading {
        BinReading::new(bin(assigned_id), latest)
    }

    #[test]
    fn day_start_is_local_midnight() {
        let now = local(1, 15);
        let expected = tz()
            .with_ymd_and_hms(2024, 5, 1, 0, 0, 0)
            .single()
            .expect("midnight")
            .timestamp_millis();
        assert_eq!(day_start_millis(&now), expected);
    }

    /// UTC until 2024-03-10 00:00 UTC, then UTC+1; local [00:00, 01:00)
    /// on that day does not exist.
    #[derive(Debug, Clone, Copy)]
    struct MidnightGap;

    impl MidnightGap {
        fn switch_local() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 10)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("valid date")
        }

        fn before() -> FixedOffset {
            FixedOffset::east_opt(0).expect("offset")
        }

        fn after() -> FixedOffset {
            FixedOffset::east_opt(3600).expect("offset")
        }
    }

    impl TimeZone for MidnightGap {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            MidnightGap
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let switch = Self::switch_local();
            if *local < switch {
                LocalResult::Single(Self::before())
            } else if *local < switch + Duration::hours(1) {
                LocalResult::None
            } else {
                LocalResult::Single(Self::after())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch_local() {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    #[test]
    fn day_start_skipped_by_dst_is_first_valid_instant() {
        let noon_utc = NaiveDate::from_ymd_opt(2024, 3, 10)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date");
        let now = MidnightGap.from_utc_datetime(&noon_utc);
        // 01:00 local (UTC+1) is 00:00 UTC, not 23:00 UTC the day before
        let expected = MidnightGap::switch_local().and_utc().timestamp_millis();
        assert_eq!(day_start_millis(&now), expected);

        let late_yesterday = Utc
            .with_ymd_and_hms(2024, 3, 9, 23, 30, 0)
            .single()
            .expect("valid time")
            .timestamp_millis();
        assert!(late_yesterday < day_start_millis(&now));
    }

    #[test]
    fn fleet_scenario() {
        let now = local(1, 15);
        let readings = vec![
            reading("1", Some(log_at(1, local(1, 9), 80.0, 5.0))),
            reading("2", Some(log_at(2, local(1, 10), 100.0, 3.0))),
        ];
        let snapshot = aggregate_at(readings, &now);
        assert_eq!(
            snapshot.stats,
            DashboardStats {
                total_waste_kg: 8.0,
                average_fill_percent: 90,
                active_bin_count: 2,
                critical_bin_count: 1,
            }
        );
        assert_eq!(snapshot.bins.len(), 2);
    }

    #[test]
    fn average_over_active_bins_only() {
        let now = local(2, 12);
        let readings = vec![
            reading("1", Some(log_at(1, local(2, 8), 70.0, 1.0))),
            reading("2", Some(log_at(2, local(2, 9), 90.0, 1.0))),
            reading("3", Some(log_at(3, local(1, 23), 10.0, 9.0))),
            reading("4", None),
        ];
        let stats = aggregate_at(readings, &now).stats;
        assert_eq!(stats.average_fill_percent, 80);
        assert_eq!(stats.active_bin_count, 2);
        assert_eq!(stats.total_waste_kg, 2.0);
    }

    #[test]
    fn critical_is_inclusive_at_threshold() {
        let now = local(3, 18);
        let readings = vec![
            reading("1", Some(log_at(1, local(3, 1), 96.0, 0.0))),
            reading("2", Some(log_at(2, local(3, 2), 94.0, 0.0))),
            reading("3", Some(log_at(3, local(3, 3), 95.0, 0.0))),
        ];
        assert_eq!(aggregate_at(readings, &now).stats.critical_bin_count, 2);
    }

    #[test]
    fn average_rounds_half_up() {
        let now = local(3, 18);
        let readings = vec![
            reading("1", Some(log_at(1, local(3, 1), 70.0, 0.0))),
            reading("2", Some(log_at(2, local(3, 2), 71.0, 0.0))),
        ];
        assert_eq!(aggregate_at(readings, &now).stats.average_fill_percent, 71);
    }

    #[test]
    fn total_waste_rounds_to_one_decimal() {
        let now = local(3, 18);
        let readings = vec![
            reading("1", Some(log_at(1, local(3, 1), 0.0, 1.26))),
            reading("2", Some(log_at(2, local(3, 2), 0.0, 2.02))),
        ];
        assert_eq!(aggregate_at(readings, &now).stats.total_waste_kg, 3.3);
    }

    #[test]
    fn enriched_view_uses_latest_regardless_of_date() {
        let now = local(5, 12);
        let stale = log_at(7, local(1, 12), 88.0, 4.5);
        let snapshot = aggregate_at(vec![reading("7", Some(stale.clone()))], &now);

        assert_eq!(snapshot.stats, DashboardStats::default());
        let enriched = &snapshot.bins[0];
        assert_eq!(enriched.fill_level, 88.0);
        assert_eq!(enriched.weight, 4.5);
        assert_eq!(enriched.last_updated_at, stale.timestamp.to_datetime());
        assert_eq!(enriched.status(), MarkerStatus::Warning);
    }

    #[test]
    fn bins_without_logs_enrich_to_zero() {
        let now = local(5, 12);
        let snapshot = aggregate_at(vec![reading("x", None)], &now);
        assert_eq!(snapshot.bins[0].fill_level, 0.0);
        assert_eq!(snapshot.bins[0].last_updated_at, None);
        assert_eq!(snapshot.bins[0].status(), MarkerStatus::Normal);
    }

    #[test]
    fn empty_registry_is_all_zero() {
        let snapshot = aggregate(Vec::new(), 0);
        assert_eq!(snapshot, DashboardSnapshot::empty());
    }

    #[test]
    fn kpis_do_not_depend_on_arrival_order() {
        let now = local(3, 18);
        let readings = vec![
            reading("1", Some(log_at(1, local(3, 1), 33.0, 1.1))),
            reading("2", Some(log_at(2, local(3, 2), 97.0, 2.2))),
            reading("3", Some(log_at(3, local(3, 3), 51.0, 3.3))),
        ];
        let forward = aggregate_at(readings.clone(), &now).stats;
        let backward = aggregate_at(readings.into_iter().rev(), &now).stats;
        assert_eq!(forward, backward);
    }

    #[test]
    fn marker_status_thresholds() {
        assert_eq!(MarkerStatus::from_fill(95.0), MarkerStatus::Critical);
        assert_eq!(MarkerStatus::from_fill(75.0), MarkerStatus::Warning);
        assert_eq!(MarkerStatus::from_fill(74.9), MarkerStatus::Normal);
    }
}
