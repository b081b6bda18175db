//! Request and result types exchanged with a health-data store.
//!
//! These mirror what a platform health service accepts and hands back:
//! read-only sample queries and bucketed statistics queries.

use crate::core::window::{bucket_index, bucket_start};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A platform-defined category of health metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    StepCount,
    HeartRate,
}

impl DataKind {
    /// Identifier used in configuration files.
    pub fn identifier(&self) -> &'static str {
        match self {
            DataKind::StepCount => "step_count",
            DataKind::HeartRate => "heart_rate",
        }
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier.trim() {
            "step_count" => Some(DataKind::StepCount),
            "heart_rate" => Some(DataKind::HeartRate),
            _ => None,
        }
    }

    /// Whether values of this kind can be summed over an interval.
    pub fn is_cumulative(&self) -> bool {
        matches!(self, DataKind::StepCount)
    }
}

/// A single quantity reading recorded by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitySample {
    pub kind: DataKind,
    pub value: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QuantitySample {
    pub fn new(kind: DataKind, value: f64, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            kind,
            value,
            start,
            end,
        }
    }

    /// A sample whose start and end coincide.
    pub fn instant(kind: DataKind, value: f64, at: DateTime<Utc>) -> Self {
        Self::new(kind, value, at, at)
    }
}

/// Half-open time range matched against a sample's start time.
///
/// A sample matches when `start <= sample.start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn matches(&self, sample: &QuantitySample) -> bool {
        sample.start >= self.start && sample.start < self.end
    }
}

/// Sort applied to sample query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Unsorted,
    EndDateDescending,
}

/// Query for raw samples of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleQuery {
    pub kind: DataKind,
    pub predicate: Option<DateRange>,
    pub limit: Option<usize>,
    pub sort: SortOrder,
}

/// How samples within a bucket are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    CumulativeSum,
}

/// Query for samples aggregated into fixed-width calendar buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsQuery {
    pub kind: DataKind,
    pub predicate: DateRange,
    pub aggregation: Aggregation,
    /// Reference instant aligning bucket boundaries.
    pub anchor: DateTime<Tz>,
    pub interval_days: u32,
}

/// Aggregate over one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// `None` when no sample fell into the bucket.
    pub sum: Option<f64>,
}

/// Bucketed result of a statistics query.
///
/// Buckets are stored sparsely; enumeration fills the gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsCollection {
    anchor: DateTime<Tz>,
    interval_days: u32,
    sums: BTreeMap<i64, f64>,
}

impl StatisticsCollection {
    pub fn new(anchor: DateTime<Tz>, interval_days: u32) -> Self {
        Self {
            anchor,
            interval_days: interval_days.max(1),
            sums: BTreeMap::new(),
        }
    }

    /// Add a value to the bucket containing `at`.
    pub fn add(&mut self, at: DateTime<Utc>, value: f64) {
        let index = bucket_index(&self.anchor, self.interval_days, at);
        *self.sums.entry(index).or_insert(0.0) += value;
    }

    /// Every bucket from the one containing `from` through the one containing
    /// `to`, in ascending order.
    pub fn enumerate(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Statistics> {
        let first = bucket_index(&self.anchor, self.interval_days, from);
        let last = bucket_index(&self.anchor, self.interval_days, to);
        (first..=last).map(|i| self.statistics_at(i)).collect()
    }

    fn statistics_at(&self, index: i64) -> Statistics {
        Statistics {
            start: bucket_start(&self.anchor, self.interval_days, index),
            end: bucket_start(&self.anchor, self.interval_days, index + 1),
            sum: self.sums.get(&index).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_identifier_round_trip() {
        for kind in [DataKind::StepCount, DataKind::HeartRate] {
            assert_eq!(DataKind::from_identifier(kind.identifier()), Some(kind));
        }
        assert_eq!(DataKind::from_identifier("blood_glucose"), None);
    }

    #[test]
    fn test_range_is_strict_on_start() {
        let range = DateRange::new(utc(2022, 5, 22, 0, 0), utc(2022, 5, 29, 0, 0));
        let inside = QuantitySample::instant(DataKind::StepCount, 1.0, utc(2022, 5, 22, 0, 0));
        let before = QuantitySample::new(
            DataKind::StepCount,
            1.0,
            utc(2022, 5, 21, 23, 59),
            utc(2022, 5, 22, 0, 10),
        );
        let at_end = QuantitySample::instant(DataKind::StepCount, 1.0, utc(2022, 5, 29, 0, 0));

        assert!(range.matches(&inside));
        assert!(!range.matches(&before));
        assert!(!range.matches(&at_end));
    }

    #[test]
    fn test_collection_sums_per_day_and_fills_gaps() {
        let tz = chrono_tz::UTC;
        let anchor = tz.with_ymd_and_hms(2022, 5, 23, 0, 0, 0).unwrap();
        let mut collection = StatisticsCollection::new(anchor, 1);

        collection.add(utc(2022, 5, 24, 9, 0), 1200.0);
        collection.add(utc(2022, 5, 24, 18, 30), 800.0);
        collection.add(utc(2022, 5, 26, 7, 0), 300.0);

        let buckets = collection.enumerate(utc(2022, 5, 23, 0, 0), utc(2022, 5, 26, 12, 0));
        let sums: Vec<Option<f64>> = buckets.iter().map(|b| b.sum).collect();
        assert_eq!(sums, vec![None, Some(2000.0), None, Some(300.0)]);
        assert_eq!(
            buckets[1].start.date_naive(),
            NaiveDate::from_ymd_opt(2022, 5, 24).unwrap()
        );
    }

    #[test]
    fn test_collection_buckets_before_anchor() {
        let tz = chrono_tz::UTC;
        let anchor = tz.with_ymd_and_hms(2022, 5, 23, 0, 0, 0).unwrap();
        let mut collection = StatisticsCollection::new(anchor, 1);
        collection.add(utc(2022, 5, 21, 15, 0), 42.0);

        let buckets = collection.enumerate(utc(2022, 5, 21, 1, 0), utc(2022, 5, 21, 23, 0));
        assert_eq!(buckets.len(), 1);
        let stats = &buckets[0];
        assert_eq!(stats.sum, Some(42.0));
        assert_eq!(stats.start, tz.with_ymd_and_hms(2022, 5, 21, 0, 0, 0).unwrap());
        assert_eq!(stats.end, tz.with_ymd_and_hms(2022, 5, 22, 0, 0, 0).unwrap());
    }
}
