//! Fetch-cycle sequencing and display shaping.
//!
//! A cycle runs authorize → steps → heart rate, strictly in that order, and
//! builds a fresh [`DisplayState`]. Failures are logged once at the top of the
//! cycle and never reach the view: whatever was fetched before the failure is
//! shown, the rest stays unset.

use crate::config::ValidatedConfig;
use crate::core::adapter::QueryAdapter;
use crate::core::readings::{HeartRateReading, StepDay};
use crate::error::QueryError;
use crate::render::View;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// What the view layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayState {
    /// Per-day step totals for the chart, oldest first
    pub steps: Vec<StepDay>,
    /// Formatted heart-rate value
    pub heart_rate_value: Option<String>,
    /// Formatted heart-rate measurement time
    pub heart_rate_measured_at: Option<String>,
}

impl DisplayState {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.heart_rate_value.is_none()
    }
}

/// How a fetch cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Read access was refused or could not be requested; nothing was fetched.
    NotAuthorized,
    /// Every query completed.
    Completed,
    /// A query failed; fields fetched before it are kept.
    Failed(QueryError),
}

/// Format a timestamp in `tz` using a strftime `pattern`.
pub fn format_timestamp(at: DateTime<Utc>, tz: Tz, pattern: &str) -> String {
    at.with_timezone(&tz).format(pattern).to_string()
}

/// Format a heart rate with one decimal place.
pub fn format_bpm(value: f64) -> String {
    format!("{value:.1}")
}

/// Sequences queries and owns the display state.
pub struct Presenter {
    adapter: QueryAdapter,
    timezone: Tz,
    timestamp_format: String,
    state: DisplayState,
}

impl Presenter {
    pub fn new(adapter: QueryAdapter, config: &ValidatedConfig) -> Self {
        Self {
            adapter,
            timezone: config.timezone,
            timestamp_format: config.timestamp_format.clone(),
            state: DisplayState::default(),
        }
    }

    /// State produced by the last cycle.
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Run one full fetch cycle, replacing the display state.
    ///
    /// Never fails; the outcome only reports what happened.
    pub async fn refresh(&mut self) -> CycleOutcome {
        let mut state = DisplayState::default();

        let outcome = match self.run_cycle(&mut state).await {
            Ok(true) => CycleOutcome::Completed,
            Ok(false) => CycleOutcome::NotAuthorized,
            Err(err) => {
                error!(error = %err, "health data fetch failed");
                CycleOutcome::Failed(err)
            }
        };

        self.state = state;
        outcome
    }

    /// Run one cycle and hand the result to `view`.
    pub async fn present(&mut self, view: &mut dyn View) -> CycleOutcome {
        let outcome = self.refresh().await;
        if let Err(err) = view.render(&self.state) {
            error!(error = %err, "failed to render health data");
        }
        outcome
    }

    async fn run_cycle(&self, state: &mut DisplayState) -> Result<bool, QueryError> {
        match self.adapter.request_authorization().await {
            Ok(true) => {}
            Ok(false) => {
                info!("read access not granted; skipping fetch");
                return Ok(false);
            }
            Err(err) => {
                warn!(error = %err, "authorization could not be requested; skipping fetch");
                return Ok(false);
            }
        }

        let steps = self.adapter.fetch_steps_over_trailing_week().await?;
        info!(days = steps.len(), "fetched step totals");
        state.steps = steps;

        if let Some(reading) = self.adapter.fetch_most_recent_heart_rate().await? {
            self.show_heart_rate(state, &reading);
        } else {
            info!("no heart-rate samples recorded");
        }

        Ok(true)
    }

    fn show_heart_rate(&self, state: &mut DisplayState, reading: &HeartRateReading) {
        state.heart_rate_value = Some(format_bpm(reading.value));
        state.heart_rate_measured_at = Some(format_timestamp(
            reading.measured_at,
            self.timezone,
            &self.timestamp_format,
        ));
    }
}
