//! Contract Test: Notification Decision Policy
//!
//! Verifies when a sighting reaches the notifier:
//! - First sighting always notifies
//! - Closer-only mode suppresses sightings that are not strictly closer
//! - Re-notify interval overrides closer-only
//! - Closer-only disabled notifies on every sighting
//! - Disabled notifications still track
//! - Concurrent first sightings of one aircraft notify exactly once

mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::*;
use godar_core::config::GodarConfig;
use godar_core::geo::CompassDirection;
use godar_core::state::TrackerHistory;
use godar_core::tracking::TrackingEngine;
use godar_core::MonitorEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn minutes(n: i64) -> chrono::Duration {
    chrono::Duration::minutes(n)
}

fn engine_with(
    config: GodarConfig,
    notifier: &RecordingNotifier,
) -> (TrackingEngine, mpsc::Receiver<MonitorEvent>) {
    let (tx, rx) = mpsc::channel(256);
    let engine = TrackingEngine::new(
        &config,
        TrackerHistory::new(),
        Arc::new(RecordingNotifier::sharing_counters_with(notifier)),
        tx,
    );
    (engine, rx)
}

#[tokio::test]
async fn first_sighting_always_notifies() {
    let notifier = RecordingNotifier::new();
    let (engine, mut events) = engine_with(test_config(), &notifier);

    let notified = engine
        .process_aircraft_at(&aircraft("4CA123", "EIN123", 51.7, -0.1), t0())
        .await
        .unwrap();

    assert!(notified);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].callsign, "EIN123");
    assert_eq!(sent[0].direction, CompassDirection::N);
    assert_eq!(sent[0].previous_distance_km, None);
    assert!((sent[0].distance_km - 22.24).abs() < 0.1, "{}", sent[0].distance_km);

    let events = drain(&mut events);
    assert!(matches!(
        &events[0],
        MonitorEvent::AircraftDetected { id, notify: true, .. } if id == "4CA123"
    ));
    assert!(matches!(&events[1], MonitorEvent::NotificationSent { id } if id == "4CA123"));
}

#[tokio::test]
async fn closer_only_suppresses_receding_aircraft() {
    let notifier = RecordingNotifier::new();
    let (engine, _events) = engine_with(test_config(), &notifier);

    // 22 km, then 33 km (farther), then 11 km (closer)
    for (i, lat) in [51.7, 51.8, 51.6].into_iter().enumerate() {
        engine
            .process_aircraft_at(&aircraft("4CA123", "EIN123", lat, -0.1), t0() + minutes(i as i64))
            .await
            .unwrap();
    }

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2, "farther sighting must not notify");

    let closer = &sent[1];
    let previous = closer.previous_distance_km.expect("previous distance");
    assert!((previous - 33.36).abs() < 0.1, "{}", previous);
    assert!(closer.message().contains("closer by"), "{}", closer.message());
}

#[tokio::test]
async fn constant_distance_does_not_renotify() {
    let notifier = RecordingNotifier::new();
    let (engine, _events) = engine_with(test_config(), &notifier);

    for i in 0..5 {
        engine
            .process_aircraft_at(&aircraft("4CA123", "EIN123", 51.7, -0.1), t0() + minutes(i))
            .await
            .unwrap();
    }

    assert_eq!(notifier.send_count(), 1);
}

#[tokio::test]
async fn re_notify_interval_overrides_closer_only() {
    let notifier = RecordingNotifier::new();
    let mut config = test_config();
    config.notification.re_notify_after_secs = 5 * 60;
    let (engine, _events) = engine_with(config, &notifier);

    let ac = aircraft("4CA123", "EIN123", 51.7, -0.1);
    engine.process_aircraft_at(&ac, t0()).await.unwrap();
    engine.process_aircraft_at(&ac, t0() + minutes(2)).await.unwrap();
    assert_eq!(notifier.send_count(), 1);

    // Last seen 2 minutes in; 6 minutes later the interval has elapsed
    engine.process_aircraft_at(&ac, t0() + minutes(8)).await.unwrap();
    assert_eq!(notifier.send_count(), 2);
}

#[tokio::test]
async fn closer_only_disabled_notifies_every_sighting() {
    let notifier = RecordingNotifier::new();
    let mut config = test_config();
    config.notification.notify_on_closer_only = false;
    let (engine, _events) = engine_with(config, &notifier);

    for (i, lat) in [51.7, 51.8, 51.8, 51.6].into_iter().enumerate() {
        engine
            .process_aircraft_at(&aircraft("4CA123", "EIN123", lat, -0.1), t0() + minutes(i as i64))
            .await
            .unwrap();
    }

    assert_eq!(notifier.send_count(), 4);
}

#[tokio::test]
async fn disabled_notifications_still_track() {
    let notifier = RecordingNotifier::new();
    let mut config = test_config();
    config.notification.enabled = false;
    let (engine, mut events) = engine_with(config, &notifier);

    let notified = engine
        .process_aircraft_at(&aircraft("4CA123", "EIN123", 51.7, -0.1), t0())
        .await
        .unwrap();

    assert!(notified, "decision is still reported");
    assert_eq!(notifier.send_count(), 0);
    assert!(engine.history().get("4CA123").await.is_some());

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], MonitorEvent::AircraftDetected { notify: true, .. }));
}

#[tokio::test]
async fn no_location_reports_zero_distance() {
    let notifier = RecordingNotifier::new();
    let mut config = test_config();
    config.location.latitude = 0.0;
    config.location.longitude = 0.0;
    let (engine, _events) = engine_with(config, &notifier);

    let ac = aircraft("4CA123", "EIN123", 51.7, -0.1);
    engine.process_aircraft_at(&ac, t0()).await.unwrap();
    engine.process_aircraft_at(&ac, t0() + minutes(1)).await.unwrap();

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1, "0 km is never closer than 0 km");
    assert_eq!(sent[0].distance_km, 0.0);
    assert_eq!(sent[0].direction, CompassDirection::N);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_sightings_notify_once() {
    let notifier = RecordingNotifier::new();
    let (engine, _events) = engine_with(test_config(), &notifier);
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .process_aircraft_at(&aircraft("4CA123", "EIN123", 51.7, -0.1), t0())
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(notifier.send_count(), 1);
    assert_eq!(engine.history().len().await, 1);
}
