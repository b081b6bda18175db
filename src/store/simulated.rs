//! In-process health-data store.
//!
//! Serves queries from an in-memory sample set on a dedicated worker thread,
//! the way a platform service answers on its own queue. Each query kind can
//! be told to misbehave so callers can be exercised against failures,
//! missing results and handlers that fire twice.

use crate::core::window::local_midnight;
use crate::error::StoreError;
use crate::store::{
    AuthorizationHandler, DataKind, HealthStore, QuantitySample, SampleHandler, SampleQuery,
    SortOrder, StatisticsCollection, StatisticsHandler, StatisticsQuery,
};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use crossbeam_channel::{unbounded, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Daily step totals for the demo week, oldest first.
const DEMO_DAILY_STEPS: [u64; 7] = [6_240, 8_915, 0, 11_402, 4_870, 9_633, 3_158];

/// Local hours at which demo walks start, with their share of the day in tenths.
const DEMO_WALKS: [(i64, u64); 3] = [(8, 3), (12, 2), (18, 5)];

/// How the store answers queries of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryBehavior {
    /// Deliver the result once.
    #[default]
    Normal,
    /// Deliver an error.
    Fail,
    /// Invoke the handler with neither a result nor an error.
    Empty,
    /// Drop the handler without invoking it.
    Withhold,
    /// Deliver the result, then an error.
    TrailingError,
}

/// Behavior of a [`SimulatedStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedBehavior {
    pub grant_authorization: bool,
    pub steps: QueryBehavior,
    pub heart_rate: QueryBehavior,
}

impl Default for SimulatedBehavior {
    fn default() -> Self {
        Self {
            grant_authorization: true,
            steps: QueryBehavior::Normal,
            heart_rate: QueryBehavior::Normal,
        }
    }
}

impl SimulatedBehavior {
    fn for_kind(&self, kind: DataKind) -> QueryBehavior {
        match kind {
            DataKind::StepCount => self.steps,
            DataKind::HeartRate => self.heart_rate,
        }
    }
}

/// A request received by the store, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuedRequest {
    Authorization(Vec<DataKind>),
    Samples(SampleQuery),
    Statistics(StatisticsQuery),
}

impl IssuedRequest {
    pub fn is_query(&self) -> bool {
        !matches!(self, IssuedRequest::Authorization(_))
    }
}

type Job = Box<dyn FnOnce(&[QuantitySample]) + Send>;

/// An in-memory store answering on a worker thread.
pub struct SimulatedStore {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    behavior: SimulatedBehavior,
    issued: Mutex<Vec<IssuedRequest>>,
}

impl SimulatedStore {
    /// Create a store holding `samples`.
    pub fn new(samples: Vec<QuantitySample>, behavior: SimulatedBehavior) -> Self {
        let (sender, receiver) = unbounded::<Job>();

        let worker = thread::spawn(move || {
            for job in receiver.iter() {
                job(&samples);
            }
            debug!("simulated store worker stopped");
        });

        Self {
            sender: Some(sender),
            worker: Some(worker),
            behavior,
            issued: Mutex::new(Vec::new()),
        }
    }

    /// Create a store holding a synthetic week of data ending at `now`.
    pub fn demo(now: DateTime<Utc>, tz: Tz, behavior: SimulatedBehavior) -> Self {
        Self::new(demo_samples(now, tz), behavior)
    }

    /// Requests received so far.
    pub fn issued(&self) -> Vec<IssuedRequest> {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of sample and statistics queries received so far.
    pub fn queries_issued(&self) -> usize {
        self.issued().iter().filter(|r| r.is_query()).count()
    }

    fn record(&self, request: IssuedRequest) {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }

    fn dispatch(&self, job: Job) {
        let Some(sender) = self.sender.as_ref() else {
            error!("simulated store is shut down; dropping request");
            return;
        };
        if sender.send(job).is_err() {
            error!("simulated store worker is gone; dropping request");
        }
    }
}

impl Drop for SimulatedStore {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl HealthStore for SimulatedStore {
    fn is_available(&self) -> bool {
        true
    }

    fn request_authorization(&self, read: &[DataKind], handler: AuthorizationHandler) {
        self.record(IssuedRequest::Authorization(read.to_vec()));
        let granted = self.behavior.grant_authorization;
        self.dispatch(Box::new(move |_: &[QuantitySample]| handler(granted, None)));
    }

    fn execute_sample_query(&self, query: SampleQuery, handler: SampleHandler) {
        debug!(kind = query.kind.identifier(), limit = ?query.limit, "executing sample query");
        self.record(IssuedRequest::Samples(query.clone()));
        let behavior = self.behavior.for_kind(query.kind);
        self.dispatch(Box::new(move |samples: &[QuantitySample]| {
            deliver(behavior, query.kind, || run_sample_query(samples, &query), &*handler);
        }));
    }

    fn execute_statistics_query(&self, query: StatisticsQuery, handler: StatisticsHandler) {
        debug!(kind = query.kind.identifier(), anchor = %query.anchor, "executing statistics query");
        self.record(IssuedRequest::Statistics(query.clone()));
        let behavior = self.behavior.for_kind(query.kind);
        self.dispatch(Box::new(move |samples: &[QuantitySample]| {
            deliver(behavior, query.kind, || run_statistics_query(samples, &query), &*handler);
        }));
    }
}

fn deliver<R>(
    behavior: QueryBehavior,
    kind: DataKind,
    result: impl FnOnce() -> R,
    handler: &(dyn Fn(Option<R>, Option<StoreError>) + Send + Sync),
) {
    match behavior {
        QueryBehavior::Normal => handler(Some(result()), None),
        QueryBehavior::Fail => handler(
            None,
            Some(StoreError::new(format!(
                "{} data could not be read",
                kind.identifier()
            ))),
        ),
        QueryBehavior::Empty => handler(None, None),
        QueryBehavior::Withhold => {}
        QueryBehavior::TrailingError => {
            handler(Some(result()), None);
            handler(None, Some(StoreError::new("query stopped after delivery")));
        }
    }
}

/// Samples matching `query`, sorted and limited as requested.
pub fn run_sample_query(samples: &[QuantitySample], query: &SampleQuery) -> Vec<QuantitySample> {
    let mut matched: Vec<QuantitySample> = samples
        .iter()
        .filter(|s| s.kind == query.kind)
        .filter(|s| query.predicate.map_or(true, |range| range.matches(s)))
        .cloned()
        .collect();

    match query.sort {
        SortOrder::Unsorted => {}
        SortOrder::EndDateDescending => matched.sort_by(|a, b| b.end.cmp(&a.end)),
    }

    if let Some(limit) = query.limit {
        matched.truncate(limit);
    }
    matched
}

/// Samples matching `query`, summed into its buckets.
pub fn run_statistics_query(
    samples: &[QuantitySample],
    query: &StatisticsQuery,
) -> StatisticsCollection {
    let mut collection = StatisticsCollection::new(query.anchor, query.interval_days);
    for sample in samples
        .iter()
        .filter(|s| s.kind == query.kind && query.predicate.matches(s))
    {
        collection.add(sample.start, sample.value);
    }
    collection
}

/// A synthetic week of walks and heart-rate readings ending at `now`.
///
/// Nothing is placed at or after `now`.
pub fn demo_samples(now: DateTime<Utc>, tz: Tz) -> Vec<QuantitySample> {
    let today = now.with_timezone(&tz).date_naive();
    let mut samples = Vec::new();

    for (back, total) in DEMO_DAILY_STEPS.iter().rev().enumerate() {
        let day = today - Duration::days(back as i64);
        let midnight = local_midnight(&tz, day).with_timezone(&Utc);
        let mut remaining = *total;

        for (i, (hour, tenths)) in DEMO_WALKS.iter().enumerate() {
            let portion = if i + 1 == DEMO_WALKS.len() {
                remaining
            } else {
                total * tenths / 10
            };
            remaining -= portion;

            let start = midnight + Duration::hours(*hour);
            if portion == 0 || start >= now {
                continue;
            }
            samples.push(QuantitySample::new(
                DataKind::StepCount,
                portion as f64,
                start,
                start + Duration::minutes(30),
            ));
        }
    }

    for (minutes_ago, bpm) in [(180, 64.0), (95, 81.0), (40, 72.0)] {
        let at = now - Duration::minutes(minutes_ago);
        samples.push(QuantitySample::new(
            DataKind::HeartRate,
            bpm,
            at,
            at + Duration::seconds(5),
        ));
    }

    samples
}
