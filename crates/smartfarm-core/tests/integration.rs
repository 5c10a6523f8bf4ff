//! Integration tests for smartfarm-core
//!
//! These drive the live and historical paths end to end against
//! [`MockSource`], the same way the dashboard worker does.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use time::macros::datetime;
use tokio::sync::mpsc;
use tokio::time::timeout;

use smartfarm_core::{
    Dashboard, DevicePath, Error, MockSource, RealtimeSource, fetch_historical_at,
    fetch_historical_cancellable, subscribe_latest,
};
use tokio_util::sync::CancellationToken;
use smartfarm_types::{LiveEvent, LiveState, LiveStatus, SensorValue, SensorValues, TimeRange};

const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

fn record(received_at: &str, payload: Value) -> Value {
    json!({
        "received_at": received_at,
        "uplink_message": { "decoded_payload": payload }
    })
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<LiveEvent>) -> LiveEvent {
    timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for live event")
        .expect("subscription ended")
}

async fn subscribe(
    source: Arc<MockSource>,
) -> (smartfarm_core::Subscription, mpsc::UnboundedReceiver<LiveEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = subscribe_latest(source, DevicePath::default(), move |event| {
        let _ = tx.send(event);
    })
    .await
    .expect("subscribe");
    (subscription, rx)
}

#[tokio::test]
async fn test_push_with_string_fields_is_ready() {
    let source = Arc::new(MockSource::new());
    let (_subscription, mut rx) = subscribe(Arc::clone(&source)).await;

    // Initial snapshot of an empty path.
    let _ = next_event(&mut rx).await;

    source.push(record(
        "2024-01-01T00:00:00Z",
        json!({
            "temperature": "21.3",
            "humidity": "55",
            "soil_moisture": "6.2",
            "light_intensity": "410"
        }),
    ));

    let state = LiveState::default().apply(&next_event(&mut rx).await);
    assert_eq!(state.status, LiveStatus::Ready);
    assert_eq!(state.values.temperature, SensorValue::Numeric(21.3));
    assert_eq!(state.values.humidity, SensorValue::Numeric(55.0));
    assert_eq!(state.values.soil_moisture, SensorValue::Numeric(6.2));
    assert_eq!(state.values.light_intensity, SensorValue::Numeric(410.0));
    assert_eq!(state.last_updated, Some(datetime!(2024-01-01 00:00:00 UTC)));
}

#[tokio::test]
async fn test_empty_path_is_no_data() {
    let source = Arc::new(MockSource::new());
    let (_subscription, mut rx) = subscribe(source).await;

    let state = LiveState::default().apply(&next_event(&mut rx).await);
    assert_eq!(state.status, LiveStatus::NoData);
    assert_eq!(state.values, SensorValues::missing());
    assert_eq!(state.last_updated, None);
}

#[tokio::test]
async fn test_latest_tracks_newest_record() {
    let source = Arc::new(MockSource::with_records([record(
        "2024-01-01T00:00:00Z",
        json!({ "temperature": 18 }),
    )]));
    let (_subscription, mut rx) = subscribe(Arc::clone(&source)).await;
    let mut state = LiveState::default().apply(&next_event(&mut rx).await);
    assert_eq!(state.values.temperature, SensorValue::Numeric(18.0));

    source.push(record("2024-01-01T00:05:00Z", json!({ "temperature": 19 })));
    state = state.apply(&next_event(&mut rx).await);
    assert_eq!(state.values.temperature, SensorValue::Numeric(19.0));
    assert_eq!(state.last_updated, Some(datetime!(2024-01-01 00:05:00 UTC)));
}

#[tokio::test]
async fn test_runtime_error_keeps_last_values() {
    let source = Arc::new(MockSource::with_records([record(
        "2024-01-01T00:00:00Z",
        json!({ "temperature": "21.3", "humidity": 50 }),
    )]));
    let (_subscription, mut rx) = subscribe(Arc::clone(&source)).await;
    let mut state = LiveState::default().apply(&next_event(&mut rx).await);

    source.push_error("permission denied");
    let event = next_event(&mut rx).await;
    assert!(matches!(event, LiveEvent::Failed(ref m) if m.contains("permission denied")));
    state = state.apply(&event);

    assert!(state.status.is_error());
    assert_eq!(state.values.temperature, SensorValue::Numeric(21.3));
    assert_eq!(state.last_updated, Some(datetime!(2024-01-01 00:00:00 UTC)));
}

#[tokio::test]
async fn test_init_failure_yields_no_handle() {
    let source = Arc::new(MockSource::new());
    source.set_fail_listen(Some("database unreachable"));

    let result = subscribe_latest(source, DevicePath::default(), |_| {}).await;
    match result {
        Err(Error::SubscriptionInit(message)) => assert_eq!(message, "database unreachable"),
        other => panic!("expected init failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unsubscribe_is_idempotent_and_stops_events() {
    let source = Arc::new(MockSource::new());
    let (subscription, mut rx) = subscribe(Arc::clone(&source)).await;
    let _ = next_event(&mut rx).await;

    assert!(subscription.unsubscribe());
    assert!(!subscription.unsubscribe());
    assert!(subscription.is_released());

    source.push(record("2024-01-01T00:00:00Z", json!({ "temperature": 20 })));
    match timeout(Duration::from_millis(200), rx.recv()).await {
        Ok(Some(event)) => panic!("event after unsubscribe: {event:?}"),
        Ok(None) | Err(_) => {}
    }
}

#[tokio::test]
async fn test_drop_releases_subscription() {
    let source = Arc::new(MockSource::new());
    let (subscription, mut rx) = subscribe(Arc::clone(&source)).await;
    let _ = next_event(&mut rx).await;
    drop(subscription);

    // The task ends and drops the sink, closing the channel.
    let closed = timeout(EVENT_TIMEOUT, rx.recv()).await;
    assert!(matches!(closed, Ok(None)));
}

#[tokio::test]
async fn test_history_sorted_ascending() {
    let now = datetime!(2024-01-02 00:00:00 UTC);
    let source = MockSource::with_records([
        record("2024-01-01T21:00:00Z", json!({ "temperature": 21 })),
        record("2024-01-01T23:00:00Z", json!({ "temperature": 23 })),
        record("2024-01-01T22:00:00Z", json!({ "temperature": 22 })),
    ]);

    let series = fetch_historical_at(&source, &DevicePath::default(), TimeRange::Day, now)
        .await
        .unwrap();

    let hours: Vec<u8> = series.readings().iter().map(|r| r.timestamp.hour()).collect();
    assert_eq!(hours, vec![21, 22, 23]);
}

#[tokio::test]
async fn test_history_window_and_incomplete_records() {
    let now = datetime!(2024-01-02 00:00:00 UTC);
    let source = MockSource::with_records([
        record("2023-12-31T12:00:00Z", json!({ "temperature": 1 })),
        record("2024-01-01T12:00:00Z", json!({ "temperature": 2 })),
        json!({ "received_at": "2024-01-01T13:00:00Z", "uplink_message": {} }),
        record("2024-01-01T14:00:00Z", json!({ "humidity": "48" })),
    ]);

    let series = fetch_historical_at(&source, &DevicePath::default(), TimeRange::Day, now)
        .await
        .unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series.range(), TimeRange::Day);
    let last = series.latest().unwrap();
    assert_eq!(last.values.temperature, SensorValue::Missing);
    assert_eq!(last.values.humidity, SensorValue::Numeric(48.0));
}

#[tokio::test]
async fn test_history_respects_sample_cap() {
    let now = datetime!(2024-01-02 00:00:00 UTC);
    let records = (0..90).map(|i| {
        let ts = now - time::Duration::seconds(30 * (i + 1));
        let ts = ts
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap();
        record(&ts, json!({ "temperature": i }))
    });
    let source = MockSource::with_records(records);

    let series = fetch_historical_at(&source, &DevicePath::default(), TimeRange::OneHour, now)
        .await
        .unwrap();
    assert_eq!(series.len(), 60);
    // The cap keeps the most recent entries.
    assert_eq!(series.latest().unwrap().timestamp, now - time::Duration::seconds(30));
}

#[tokio::test]
async fn test_history_failure_is_descriptive() {
    let source = MockSource::new();
    source.set_fail_query(Some("HTTP 401: Permission denied"));

    let err = fetch_historical_at(
        &source,
        &DevicePath::default(),
        TimeRange::Week,
        datetime!(2024-01-02 00:00:00 UTC),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::HistoricalFetch { range: TimeRange::Week, .. }));
    assert!(err.to_string().contains("Permission denied"));
}

#[tokio::test]
async fn test_out_of_order_history_responses() {
    let now = datetime!(2024-01-02 00:00:00 UTC);
    let source = MockSource::with_records([
        record("2023-12-30T00:00:00Z", json!({ "temperature": 10 })),
        record("2024-01-01T23:30:00Z", json!({ "temperature": 20 })),
    ]);
    let path = DevicePath::default();
    let mut dashboard = Dashboard::new(TimeRange::Day);

    let day = dashboard.refresh_history();
    let week = dashboard.select_range(TimeRange::Week);

    let week_series = fetch_historical_at(&source, &path, week.range, now).await.unwrap();
    let day_series = fetch_historical_at(&source, &path, day.range, now).await.unwrap();

    // The 7d response lands first, then the stale 24h one.
    assert!(dashboard.apply_history(week.generation, Ok(week_series)));
    assert!(!dashboard.apply_history(day.generation, Ok(day_series)));

    assert_eq!(dashboard.state().range, TimeRange::Week);
    assert_eq!(dashboard.state().history.len(), 2);
    assert_eq!(source.query_count(), 2);
}

#[tokio::test]
async fn test_source_is_object_safe() {
    let source: Arc<dyn RealtimeSource> = Arc::new(MockSource::new());
    assert_eq!(source.name(), "mock");
}

#[tokio::test]
async fn test_cancelled_fetch_reports_cancelled() {
    let source = MockSource::with_records([record("2024-01-01T00:00:00Z", json!({}))]);
    source.set_query_latency(Duration::from_secs(60));
    let cancel = CancellationToken::new();

    let device = DevicePath::default();
    let fetch = fetch_historical_cancellable(&source, &device, TimeRange::Day, &cancel);
    let trigger = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    };
    let (result, ()) = tokio::join!(fetch, trigger);

    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn test_pre_cancelled_fetch_skips_source() {
    let source = MockSource::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result =
        fetch_historical_cancellable(&source, &DevicePath::default(), TimeRange::Day, &cancel)
            .await;
    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(source.query_count(), 0);
}

#[tokio::test]
async fn test_slow_listen_does_not_delay_history() {
    let source = Arc::new(MockSource::with_records([record(
        "2024-01-01T00:00:00Z",
        json!({ "temperature": 20 }),
    )]));
    source.set_listen_latency(Duration::from_secs(3600));

    let live: Arc<dyn RealtimeSource> = source.clone();
    let _opening = tokio::spawn(subscribe_latest(live, DevicePath::default(), |_| {}));

    let series = timeout(
        EVENT_TIMEOUT,
        fetch_historical_at(
            source.as_ref(),
            &DevicePath::default(),
            TimeRange::Day,
            datetime!(2024-01-01 12:00:00 UTC),
        ),
    )
    .await
    .expect("history should not wait for the live channel")
    .unwrap();
    assert_eq!(series.len(), 1);
}
