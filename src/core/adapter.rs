//! Awaitable queries over a callback-based health store.
//!
//! Each operation issues one store request, hands the store a handler holding
//! a [`Resolver`](crate::bridge::Resolver), and awaits the matching
//! [`Completion`](crate::bridge::Completion). The caller is resumed exactly
//! once whatever the store does with the handler.

use crate::bridge::completion;
use crate::config::ValidatedConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::core::readings::{HeartRateReading, StepDay};
use crate::core::window::TrailingWindow;
use crate::error::{QueryError, StoreError};
use crate::store::{
    Aggregation, DataKind, HealthStore, QuantitySample, SampleQuery, SortOrder,
    StatisticsCollection, StatisticsQuery,
};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::debug;

const HEART_RATE_FAILURE: &str = "Something went wrong while accessing heart rate.";
const STEPS_FAILURE: &str = "Something went wrong while accessing steps.";

/// Read-only query front end for a [`HealthStore`].
pub struct QueryAdapter {
    store: Arc<dyn HealthStore>,
    clock: Arc<dyn Clock>,
    step_kind: DataKind,
    heart_rate_kind: DataKind,
    timezone: Tz,
    lookback_days: u32,
}

impl QueryAdapter {
    pub fn new(store: Arc<dyn HealthStore>, config: &ValidatedConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            step_kind: config.step_kind,
            heart_rate_kind: config.heart_rate_kind,
            timezone: config.timezone,
            lookback_days: config.lookback_days,
        }
    }

    /// Replace the wall clock, e.g. with a [`FixedClock`](crate::core::FixedClock).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Ask once for read access to steps and heart rate.
    ///
    /// Fails with [`QueryError::Unavailable`] when the store does not exist
    /// on this device; otherwise reports whether access was granted.
    pub async fn request_authorization(&self) -> Result<bool, QueryError> {
        if !self.store.is_available() {
            return Err(QueryError::Unavailable);
        }

        let read = [self.step_kind, self.heart_rate_kind];
        debug!(kinds = ?read, "requesting read authorization");

        let (resolver, pending) = completion::<bool>();
        self.store.request_authorization(
            &read,
            Arc::new(move |granted: bool, error: Option<StoreError>| {
                if let Some(err) = error {
                    debug!(error = %err, granted, "authorization prompt reported an error");
                }
                resolver.succeed(granted);
            }),
        );
        pending.wait().await
    }

    /// The single most recent heart-rate sample, by end time.
    ///
    /// `Ok(None)` means the store succeeded but holds no heart-rate samples.
    pub async fn fetch_most_recent_heart_rate(
        &self,
    ) -> Result<Option<HeartRateReading>, QueryError> {
        let query = SampleQuery {
            kind: self.heart_rate_kind,
            predicate: None,
            limit: Some(1),
            sort: SortOrder::EndDateDescending,
        };
        debug!("fetching most recent heart rate");

        let (resolver, pending) = completion::<Vec<QuantitySample>>();
        self.store.execute_sample_query(
            query,
            Arc::new(move |samples: Option<Vec<QuantitySample>>, error: Option<StoreError>| {
                resolver.resolve(settle(samples, error, HEART_RATE_FAILURE));
            }),
        );

        let samples = pending.wait().await?;
        Ok(samples.first().map(|sample| HeartRateReading {
            value: sample.value,
            measured_at: sample.start,
        }))
    }

    /// Daily step totals for the trailing window ending now, oldest first.
    ///
    /// Always one entry per calendar day of the window; days without samples
    /// report zero.
    pub async fn fetch_steps_over_trailing_week(&self) -> Result<Vec<StepDay>, QueryError> {
        let window = TrailingWindow::ending_at(self.clock.now(), self.timezone, self.lookback_days);
        let query = StatisticsQuery {
            kind: self.step_kind,
            predicate: window.range(),
            aggregation: Aggregation::CumulativeSum,
            anchor: window.anchor,
            interval_days: 1,
        };
        debug!(start = %window.start, end = %window.end, anchor = %window.anchor, "fetching steps");

        let (resolver, pending) = completion::<StatisticsCollection>();
        self.store.execute_statistics_query(
            query,
            Arc::new(move |collection: Option<StatisticsCollection>, error: Option<StoreError>| {
                resolver.resolve(settle(collection, error, STEPS_FAILURE));
            }),
        );

        let collection = pending.wait().await?;
        Ok(window.step_days(&collection))
    }
}

/// A result wins over an error; neither is a failure of its own.
fn settle<T>(
    result: Option<T>,
    error: Option<StoreError>,
    fallback: &str,
) -> Result<T, QueryError> {
    match (result, error) {
        (Some(result), _) => Ok(result),
        (None, Some(err)) => Err(err.into()),
        (None, None) => Err(QueryError::failed(fallback)),
    }
}
