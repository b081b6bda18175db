//! Integration tests for a full fetch cycle against in-process stores.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use vitals_view::config::{Config, ValidatedConfig};
use vitals_view::core::{CycleOutcome, DisplayState, FixedClock, Presenter, QueryAdapter};
use vitals_view::error::{QueryError, StoreError};
use vitals_view::render::View;
use vitals_view::store::{
    AuthorizationHandler, DataKind, HealthStore, IssuedRequest, NoopStore, QuantitySample,
    QueryBehavior, SampleHandler, SampleQuery, SimulatedBehavior, SimulatedStore,
    StatisticsHandler, StatisticsQuery,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 5, 29, 14, 3, 0).unwrap()
}

fn utc_config() -> ValidatedConfig {
    ValidatedConfig {
        timezone: chrono_tz::Tz::UTC,
        ..ValidatedConfig::default()
    }
}

fn presenter_for(store: Arc<dyn HealthStore>, config: &ValidatedConfig) -> Presenter {
    let adapter = QueryAdapter::new(store, config).with_clock(Arc::new(FixedClock(now())));
    Presenter::new(adapter, config)
}

fn steps(value: f64, at: DateTime<Utc>) -> QuantitySample {
    QuantitySample::new(DataKind::StepCount, value, at, at + Duration::minutes(20))
}

fn heart_rate(bpm: f64, at: DateTime<Utc>) -> QuantitySample {
    QuantitySample::new(DataKind::HeartRate, bpm, at, at + Duration::seconds(5))
}

/// A known week: totals per day from May 23 to May 29, with May 25 empty.
fn known_week() -> Vec<QuantitySample> {
    let day = |d: u32, h: u32| Utc.with_ymd_and_hms(2022, 5, d, h, 0, 0).unwrap();
    vec![
        // Before the lookback window; must not be counted.
        steps(9_999.0, day(22, 9)),
        steps(3_000.0, day(23, 9)),
        steps(1_500.0, day(23, 17)),
        steps(8_000.0, day(24, 12)),
        steps(2_200.0, day(26, 7)),
        steps(6_100.0, day(27, 19)),
        steps(4_321.0, day(28, 23)),
        steps(987.0, day(29, 8)),
        heart_rate(64.0, day(29, 9)),
        heart_rate(71.0, Utc.with_ymd_and_hms(2022, 5, 29, 14, 3, 0).unwrap() - Duration::hours(1)),
    ]
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 5, d).unwrap()
}

#[tokio::test]
async fn test_full_cycle_shapes_week_and_heart_rate() {
    let config = utc_config();
    let store = Arc::new(SimulatedStore::new(known_week(), SimulatedBehavior::default()));
    let mut presenter = presenter_for(store, &config);

    assert_eq!(presenter.refresh().await, CycleOutcome::Completed);

    let state = presenter.state();
    let dates: Vec<NaiveDate> = state.steps.iter().map(|d| d.date).collect();
    assert_eq!(dates, (23..=29).map(date).collect::<Vec<_>>());
    let counts: Vec<u64> = state.steps.iter().map(|d| d.count).collect();
    assert_eq!(counts, vec![4_500, 8_000, 0, 2_200, 6_100, 4_321, 987]);

    assert_eq!(state.heart_rate_value.as_deref(), Some("71.0"));
    assert_eq!(
        state.heart_rate_measured_at.as_deref(),
        Some("May 29, 2022 at 01:03 PM")
    );
}

#[tokio::test]
async fn test_buckets_follow_local_days() {
    let config = Config {
        timezone: Some("America/Los_Angeles".to_string()),
        ..Config::default()
    }
    .validate()
    .unwrap();

    // 2022-05-29 03:00 UTC is still May 28 in Los Angeles.
    let samples = vec![steps(500.0, Utc.with_ymd_and_hms(2022, 5, 29, 3, 0, 0).unwrap())];
    let store = Arc::new(SimulatedStore::new(samples, SimulatedBehavior::default()));
    let mut presenter = presenter_for(store, &config);
    presenter.refresh().await;

    let state = presenter.state();
    assert_eq!(state.steps.len(), 7);
    assert_eq!(state.steps.last().map(|d| d.date), Some(date(29)));
    let may_28 = state.steps.iter().find(|d| d.date == date(28)).unwrap();
    assert_eq!(may_28.count, 500);
}

#[tokio::test]
async fn test_denied_authorization_issues_no_queries() {
    let config = utc_config();
    let behavior = SimulatedBehavior {
        grant_authorization: false,
        ..SimulatedBehavior::default()
    };
    let store = Arc::new(SimulatedStore::new(known_week(), behavior));
    let mut presenter = presenter_for(store.clone(), &config);

    assert_eq!(presenter.refresh().await, CycleOutcome::NotAuthorized);
    assert_eq!(presenter.state(), &DisplayState::default());
    assert_eq!(store.queries_issued(), 0);
    assert_eq!(
        store.issued(),
        vec![IssuedRequest::Authorization(vec![
            DataKind::StepCount,
            DataKind::HeartRate
        ])]
    );
}

#[tokio::test]
async fn test_unavailable_store_is_silent() {
    let config = utc_config();
    let mut presenter = presenter_for(Arc::new(NoopStore::new()), &config);

    assert_eq!(presenter.refresh().await, CycleOutcome::NotAuthorized);
    assert!(presenter.state().is_empty());
}

#[tokio::test]
async fn test_no_heart_rate_samples_is_not_an_error() {
    let config = utc_config();
    let week: Vec<QuantitySample> = known_week()
        .into_iter()
        .filter(|s| s.kind == DataKind::StepCount)
        .collect();
    let store = Arc::new(SimulatedStore::new(week, SimulatedBehavior::default()));
    let mut presenter = presenter_for(store, &config);

    assert_eq!(presenter.refresh().await, CycleOutcome::Completed);
    assert_eq!(presenter.state().steps.len(), 7);
    assert!(presenter.state().heart_rate_value.is_none());
    assert!(presenter.state().heart_rate_measured_at.is_none());
}

#[tokio::test]
async fn test_failed_heart_rate_keeps_steps() {
    let config = utc_config();
    let behavior = SimulatedBehavior {
        heart_rate: QueryBehavior::Fail,
        ..SimulatedBehavior::default()
    };
    let store = Arc::new(SimulatedStore::new(known_week(), behavior));
    let mut presenter = presenter_for(store, &config);

    let outcome = presenter.refresh().await;
    assert!(matches!(outcome, CycleOutcome::Failed(QueryError::Failed { .. })));
    assert_eq!(presenter.state().steps.len(), 7);
    assert!(presenter.state().heart_rate_value.is_none());
}

#[tokio::test]
async fn test_failed_steps_stops_cycle() {
    let config = utc_config();
    let behavior = SimulatedBehavior {
        steps: QueryBehavior::Fail,
        ..SimulatedBehavior::default()
    };
    let store = Arc::new(SimulatedStore::new(known_week(), behavior));
    let mut presenter = presenter_for(store.clone(), &config);

    let outcome = presenter.refresh().await;
    assert!(matches!(outcome, CycleOutcome::Failed(_)));
    assert!(presenter.state().is_empty());
    // Authorization and the step query only.
    assert_eq!(store.issued().len(), 2);
}

#[tokio::test]
async fn test_withheld_result_is_abandoned_not_hung() {
    let config = utc_config();
    let behavior = SimulatedBehavior {
        heart_rate: QueryBehavior::Withhold,
        ..SimulatedBehavior::default()
    };
    let store = Arc::new(SimulatedStore::new(known_week(), behavior));
    let mut presenter = presenter_for(store, &config);

    assert_eq!(
        presenter.refresh().await,
        CycleOutcome::Failed(QueryError::Abandoned)
    );
    assert_eq!(presenter.state().steps.len(), 7);
}

#[tokio::test]
async fn test_trailing_error_does_not_double_resolve() {
    let config = utc_config();
    let behavior = SimulatedBehavior {
        steps: QueryBehavior::TrailingError,
        heart_rate: QueryBehavior::TrailingError,
        ..SimulatedBehavior::default()
    };
    let store = Arc::new(SimulatedStore::new(known_week(), behavior));
    let mut presenter = presenter_for(store, &config);

    assert_eq!(presenter.refresh().await, CycleOutcome::Completed);
    assert_eq!(presenter.state().steps[0].count, 4_500);
    assert_eq!(presenter.state().heart_rate_value.as_deref(), Some("71.0"));
}

#[tokio::test]
async fn test_each_cycle_replaces_state() {
    let config = utc_config();
    let store = Arc::new(SimulatedStore::new(known_week(), SimulatedBehavior::default()));
    let mut presenter = presenter_for(store, &config);

    presenter.refresh().await;
    let first = presenter.state().clone();
    presenter.refresh().await;

    assert_eq!(presenter.state(), &first);
    assert_eq!(presenter.state().steps.len(), 7);
}

/// Store whose handlers fire from several threads at once.
struct RacingStore;

impl HealthStore for RacingStore {
    fn is_available(&self) -> bool {
        true
    }

    fn request_authorization(&self, _read: &[DataKind], handler: AuthorizationHandler) {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let handler = handler.clone();
                std::thread::spawn(move || handler(i % 2 == 0, None))
            })
            .collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    fn execute_sample_query(&self, _query: SampleQuery, handler: SampleHandler) {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let handler = handler.clone();
                std::thread::spawn(move || {
                    if i == 0 {
                        handler(Some(Vec::new()), None)
                    } else {
                        handler(None, Some(StoreError::new("late")))
                    }
                })
            })
            .collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    fn execute_statistics_query(&self, query: StatisticsQuery, handler: StatisticsHandler) {
        let collection = vitals_view::store::StatisticsCollection::new(query.anchor, 1);
        handler(Some(collection), None);
        handler(None, Some(StoreError::new("late")));
    }
}

#[tokio::test]
async fn test_racing_handlers_resolve_once() {
    let config = utc_config();
    let adapter = QueryAdapter::new(Arc::new(RacingStore), &config)
        .with_clock(Arc::new(FixedClock(now())));

    // Whichever thread wins, the caller sees exactly one well-formed answer.
    assert!(adapter.request_authorization().await.is_ok());
    assert!(matches!(
        adapter.fetch_most_recent_heart_rate().await,
        Ok(None) | Err(QueryError::Failed { .. })
    ));
    let week = adapter.fetch_steps_over_trailing_week().await.unwrap();
    assert_eq!(week.len(), 7);
    assert!(week.iter().all(|d| d.count == 0));
}

/// View that remembers what it was given.
#[derive(Default)]
struct RecordingView {
    rendered: Arc<Mutex<Vec<DisplayState>>>,
}

impl View for RecordingView {
    fn render(&mut self, state: &DisplayState) -> std::io::Result<()> {
        self.rendered.lock().unwrap().push(state.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_present_hands_state_to_view() {
    let config = utc_config();
    let behavior = SimulatedBehavior {
        grant_authorization: false,
        ..SimulatedBehavior::default()
    };
    let store = Arc::new(SimulatedStore::new(known_week(), behavior));
    let mut presenter = presenter_for(store, &config);
    let mut view = RecordingView::default();

    presenter.present(&mut view).await;

    let rendered = view.rendered.lock().unwrap();
    assert_eq!(rendered.len(), 1);
    assert!(rendered[0].is_empty());
}
