//! Health-data store seam.
//!
//! A platform health service is consumed through [`HealthStore`], whose
//! operations report back through handlers rather than return values. The
//! crate ships a store for platforms without health data ([`NoopStore`]) and
//! an in-process store ([`SimulatedStore`]) that serves queries from memory on
//! its own worker thread.

pub mod noop;
pub mod simulated;
pub mod types;

use crate::error::StoreError;
use std::sync::Arc;

pub use noop::NoopStore;
pub use simulated::{IssuedRequest, QueryBehavior, SimulatedBehavior, SimulatedStore};
pub use types::{
    Aggregation, DataKind, DateRange, QuantitySample, SampleQuery, SortOrder, Statistics,
    StatisticsCollection, StatisticsQuery,
};

/// Receives whether read access was granted, plus any error from the prompt.
pub type AuthorizationHandler = Arc<dyn Fn(bool, Option<StoreError>) + Send + Sync>;

/// Receives matching samples, or an error. Both may be absent.
pub type SampleHandler = Arc<dyn Fn(Option<Vec<QuantitySample>>, Option<StoreError>) + Send + Sync>;

/// Receives a bucketed collection, or an error. Both may be absent.
pub type StatisticsHandler =
    Arc<dyn Fn(Option<StatisticsCollection>, Option<StoreError>) + Send + Sync>;

/// A health-data service with callback-based, read-only operations.
///
/// Implementations may invoke a handler on any thread and are not required
/// to invoke it exactly once.
pub trait HealthStore: Send + Sync {
    /// Whether the service exists on this device.
    fn is_available(&self) -> bool;

    /// Show the permission prompt for reading `read`.
    fn request_authorization(&self, read: &[DataKind], handler: AuthorizationHandler);

    fn execute_sample_query(&self, query: SampleQuery, handler: SampleHandler);

    fn execute_statistics_query(&self, query: StatisticsQuery, handler: StatisticsHandler);
}
