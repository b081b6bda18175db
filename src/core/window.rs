//! Calendar arithmetic for the trailing step window.
//!
//! Buckets are whole local days aligned to an anchor at local midnight. The
//! anchor is the Monday that starts the current ISO week; it only fixes where
//! bucket boundaries fall and never changes the lookback itself.

use crate::core::readings::StepDay;
use crate::store::{DateRange, StatisticsCollection};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Longest lookback the window accepts.
pub const MAX_LOOKBACK_DAYS: u32 = 366;

/// Local midnight that starts `date` in `tz`.
///
/// Zones that skip midnight for a DST change start the day at the first
/// valid local time instead.
pub fn local_midnight(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

/// Monday 00:00 of the ISO week containing `now`, in `now`'s zone.
pub fn iso_week_anchor(now: &DateTime<Tz>) -> DateTime<Tz> {
    let today = now.date_naive();
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    local_midnight(&now.timezone(), monday)
}

/// Index of the bucket containing `at`, relative to the anchor's bucket.
pub fn bucket_index(anchor: &DateTime<Tz>, interval_days: u32, at: DateTime<Utc>) -> i64 {
    let local_date = at.with_timezone(&anchor.timezone()).date_naive();
    let days = (local_date - anchor.date_naive()).num_days();
    days.div_euclid(i64::from(interval_days.max(1)))
}

/// Start of the bucket at `index`.
pub fn bucket_start(anchor: &DateTime<Tz>, interval_days: u32, index: i64) -> DateTime<Tz> {
    let offset = index * i64::from(interval_days.max(1));
    local_midnight(&anchor.timezone(), anchor.date_naive() + Duration::days(offset))
}

/// A lookback window ending at a fixed instant.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailingWindow {
    /// `end` minus the lookback
    pub start: DateTime<Utc>,
    /// The instant the window was taken
    pub end: DateTime<Utc>,
    /// Bucket alignment anchor
    pub anchor: DateTime<Tz>,
    /// Number of calendar days reported
    pub lookback_days: u32,
}

impl TrailingWindow {
    /// Window of `lookback_days` days ending at `now`, bucketed in `tz`.
    ///
    /// The lookback is clamped to `1..=MAX_LOOKBACK_DAYS`.
    pub fn ending_at(now: DateTime<Utc>, tz: Tz, lookback_days: u32) -> Self {
        let lookback_days = lookback_days.clamp(1, MAX_LOOKBACK_DAYS);
        Self {
            start: now
                .checked_sub_signed(Duration::days(i64::from(lookback_days)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: now,
            anchor: iso_week_anchor(&now.with_timezone(&tz)),
            lookback_days,
        }
    }

    /// Sample predicate for the statistics query.
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }

    fn timezone(&self) -> Tz {
        self.anchor.timezone()
    }

    /// Local midnight of the oldest reported day.
    pub fn first_day_start(&self) -> DateTime<Utc> {
        let today = self.end.with_timezone(&self.timezone()).date_naive();
        let first = today - Duration::days(i64::from(self.lookback_days) - 1);
        local_midnight(&self.timezone(), first).with_timezone(&Utc)
    }

    /// One entry per reported day, ascending; empty buckets count as zero.
    pub fn step_days(&self, collection: &StatisticsCollection) -> Vec<StepDay> {
        collection
            .enumerate(self.first_day_start(), self.end)
            .into_iter()
            .map(|stats| StepDay {
                date: stats.start.date_naive(),
                count: stats.sum.map(|sum| sum.max(0.0) as u64).unwrap_or(0),
            })
            .collect()
    }
}
