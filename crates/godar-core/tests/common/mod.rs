//! Test doubles and common utilities for the monitor contract tests
//!
//! The doubles count calls through shared `Arc` counters so a test can keep a
//! handle after moving the double into a `Monitor`.

#![allow(dead_code)]

use godar_core::aircraft::{Aircraft, AircraftList};
use godar_core::config::GodarConfig;
use godar_core::error::{Error, Result};
use godar_core::traits::{AircraftFeed, Notification, Notifier};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Observer location used throughout the tests (central London)
pub const OBSERVER: (f64, f64) = (51.5, -0.1);

/// One scripted fetch outcome
#[derive(Debug, Clone)]
pub enum Script {
    List(AircraftList),
    Fail(String),
}

/// A feed that replays scripted outcomes, then returns empty lists
pub struct ScriptedFeed {
    script: Arc<Mutex<VecDeque<Script>>>,
    fetch_count: Arc<AtomicUsize>,
    completed_count: Arc<AtomicUsize>,
    delay: Duration,
}

impl ScriptedFeed {
    pub fn new(script: Vec<Script>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fetch_count: Arc::new(AtomicUsize::new(0)),
            completed_count: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// A feed that always fails
    pub fn failing() -> Self {
        Self::new(vec![Script::Fail("connection refused".to_string()); 64])
    }

    /// Make every fetch take `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of fetches started
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Number of fetches that ran to completion
    pub fn completed_count(&self) -> usize {
        self.completed_count.load(Ordering::SeqCst)
    }

    /// Create a new ScriptedFeed that shares script and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            fetch_count: Arc::clone(&other.fetch_count),
            completed_count: Arc::clone(&other.completed_count),
            delay: other.delay,
        }
    }
}

#[async_trait::async_trait]
impl AircraftFeed for ScriptedFeed {
    async fn fetch(&self) -> Result<AircraftList> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        self.completed_count.fetch_add(1, Ordering::SeqCst);

        match next {
            Some(Script::List(list)) => Ok(list),
            Some(Script::Fail(message)) => Err(Error::transport(message)),
            None => Ok(AircraftList::default()),
        }
    }

    fn feed_name(&self) -> &'static str {
        "scripted"
    }
}

/// A notifier that records every notification and can fail for chosen callsigns
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    send_count: Arc<AtomicUsize>,
    fail_for: Arc<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            send_count: Arc::new(AtomicUsize::new(0)),
            fail_for: Arc::new(HashSet::new()),
        }
    }

    /// A notifier that fails for the given callsigns and records the rest
    pub fn failing_for(callsigns: &[&str]) -> Self {
        Self {
            fail_for: Arc::new(callsigns.iter().map(|c| c.to_string()).collect()),
            ..Self::new()
        }
    }

    /// Number of send() calls, failed ones included
    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Notifications that were delivered
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Callsigns of delivered notifications, in order
    pub fn sent_callsigns(&self) -> Vec<String> {
        self.sent().into_iter().map(|n| n.callsign).collect()
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            sent: Arc::clone(&other.sent),
            send_count: Arc::clone(&other.send_count),
            fail_for: Arc::clone(&other.fail_for),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        self.send_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_for.contains(&notification.callsign) {
            return Err(Error::notification(format!(
                "delivery refused for {}",
                notification.callsign
            )));
        }

        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Configuration with an observer location, notifications enabled and a
/// 1 s poll interval
pub fn test_config() -> GodarConfig {
    let mut config = GodarConfig::new("http://127.0.0.1:1/VirtualRadar/AircraftList.json");
    config.location.latitude = OBSERVER.0;
    config.location.longitude = OBSERVER.1;
    config.monitoring.poll_interval_secs = 1;
    config.notification.enabled = true;
    config
}

/// An aircraft with the given identity at a position
pub fn aircraft(icao: &str, callsign: &str, lat: f64, long: f64) -> Aircraft {
    Aircraft {
        icao: icao.to_string(),
        call: callsign.to_string(),
        aircraft_type: "A320".to_string(),
        alt: 35000,
        spd: 450.0,
        lat,
        long,
        ..Aircraft::default()
    }
}

/// An aircraft list containing `aircraft`
pub fn list_of(aircraft: Vec<Aircraft>) -> AircraftList {
    AircraftList {
        total_ac: aircraft.len() as i64,
        aircraft,
        ..AircraftList::default()
    }
}

/// Drain every event currently in the channel
pub fn drain<T>(rx: &mut mpsc::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
