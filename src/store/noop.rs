//! Store for devices without a health-data service.
//!
//! Lets the crate and binary run where no platform store exists; every
//! operation reports the service as unavailable.

use crate::error::StoreError;
use crate::store::{
    AuthorizationHandler, DataKind, HealthStore, SampleHandler, SampleQuery, StatisticsHandler,
    StatisticsQuery,
};

const UNAVAILABLE: &str = "health data is not available on this platform";

/// A store that never holds data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl NoopStore {
    pub fn new() -> Self {
        Self
    }
}

impl HealthStore for NoopStore {
    fn is_available(&self) -> bool {
        false
    }

    fn request_authorization(&self, _read: &[DataKind], handler: AuthorizationHandler) {
        handler(false, Some(StoreError::new(UNAVAILABLE)));
    }

    fn execute_sample_query(&self, _query: SampleQuery, handler: SampleHandler) {
        handler(None, Some(StoreError::new(UNAVAILABLE)));
    }

    fn execute_statistics_query(&self, _query: StatisticsQuery, handler: StatisticsHandler) {
        handler(None, Some(StoreError::new(UNAVAILABLE)));
    }
}
