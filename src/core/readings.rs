//! Display-ready records produced by a fetch cycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Total steps for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDay {
    pub date: NaiveDate,
    pub count: u64,
}

/// The most recent heart-rate sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateReading {
    /// Beats (counts) per minute
    pub value: f64,
    pub measured_at: DateTime<Utc>,
}
