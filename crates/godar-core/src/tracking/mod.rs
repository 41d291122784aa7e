//! Aircraft tracking engine
//!
//! Turns one decoded aircraft list into notify/suppress decisions:
//!
//! 1. Resolve the aircraft's identifier
//! 2. Compute distance and bearing from the observer
//! 3. Record the sighting in [`TrackerHistory`] and get the decision
//! 4. If the decision is positive and notifications are enabled, notify
//!
//! Tracking always runs, even with notifications disabled, so enabling them
//! later does not produce a burst of "first sightings".
//!
//! A failure for one aircraft (today only a notifier failure) is logged and
//! reported as an event; the rest of the batch is still processed.

use crate::aircraft::{Aircraft, AircraftList};
use crate::config::{GodarConfig, LocationConfig};
use crate::engine::{MonitorEvent, emit_event};
use crate::error::{Error, Result};
use crate::geo::{self, CompassDirection};
use crate::state::{NotifyPolicy, TrackerHistory};
use crate::traits::{Notification, Notifier};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Trackers not seen for longer than this are removed by a cleanup sweep
pub const STALE_AFTER: Duration = Duration::from_secs(15 * 60);

/// Canonical history key of an aircraft
///
/// ICAO address if present, else callsign, else `"{type}_{altitude}"`.
/// The last form can collide between unrelated aircraft.
pub fn aircraft_identifier(aircraft: &Aircraft) -> String {
    if !aircraft.icao.is_empty() {
        return aircraft.icao.clone();
    }
    if !aircraft.call.is_empty() {
        return aircraft.call.clone();
    }
    format!("{}_{}", aircraft.aircraft_type, aircraft.alt)
}

/// Counts from processing one aircraft list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Aircraft in the list
    pub processed: usize,
    /// Notifications delivered
    pub notified: usize,
    /// Aircraft whose processing failed
    pub failed: usize,
}

/// Per-aircraft decision logic
pub struct TrackingEngine {
    location: LocationConfig,
    policy: NotifyPolicy,
    notifications_enabled: bool,
    history: TrackerHistory,
    notifier: Arc<dyn Notifier>,
    event_tx: mpsc::Sender<MonitorEvent>,
}

impl TrackingEngine {
    /// Create a tracking engine
    ///
    /// `history` is shared with the caller; pass a fresh
    /// [`TrackerHistory::new()`] for an independent engine.
    pub fn new(
        config: &GodarConfig,
        history: TrackerHistory,
        notifier: Arc<dyn Notifier>,
        event_tx: mpsc::Sender<MonitorEvent>,
    ) -> Self {
        Self {
            location: config.location,
            policy: NotifyPolicy::from(&config.notification),
            notifications_enabled: config.notification.enabled,
            history,
            notifier,
            event_tx,
        }
    }

    pub fn history(&self) -> &TrackerHistory {
        &self.history
    }

    pub fn notifier_name(&self) -> &'static str {
        self.notifier.name()
    }

    /// Distance (km) and bearing (degrees) from the observer, both 0 when
    /// no observer location is configured
    pub fn geometry(&self, aircraft: &Aircraft) -> (f64, f64) {
        if !self.location.is_set() {
            return (0.0, 0.0);
        }
        let (lat, lon) = (self.location.latitude, self.location.longitude);
        (
            geo::distance(lat, lon, aircraft.lat, aircraft.long),
            geo::bearing(lat, lon, aircraft.lat, aircraft.long),
        )
    }

    /// Process one aircraft observed now
    pub async fn process_aircraft(&self, aircraft: &Aircraft) -> Result<bool> {
        self.process_aircraft_at(aircraft, Utc::now()).await
    }

    /// Process one aircraft observed at `now`
    ///
    /// Returns whether the sighting was notification-worthy. `Err` only when
    /// the notifier failed; the tracker is updated either way.
    pub async fn process_aircraft_at(&self, aircraft: &Aircraft, now: DateTime<Utc>) -> Result<bool> {
        let id = aircraft_identifier(aircraft);
        let (distance, bearing) = self.geometry(aircraft);
        let direction = geo::bearing_to_compass_direction(bearing);

        let decision = self.history.observe(&id, distance, now, self.policy).await;

        info!(
            id = %id,
            callsign = %aircraft.call,
            aircraft_type = %aircraft.aircraft_type,
            altitude = aircraft.alt,
            distance_km = distance,
            bearing_degrees = bearing,
            direction = %direction,
            previous_distance_km = decision.previous_distance.unwrap_or(0.0),
            military = aircraft.mil,
            notifying = decision.notify,
            "Aircraft detected"
        );

        emit_event(
            &self.event_tx,
            MonitorEvent::AircraftDetected {
                id: id.clone(),
                distance_km: distance,
                direction,
                notify: decision.notify,
            },
        );

        if !decision.notify || !self.notifications_enabled {
            return Ok(decision.notify);
        }

        let notification =
            self.build_notification(aircraft, distance, direction, decision.previous_distance);

        match self.notifier.send(&notification).await {
            Ok(()) => {
                debug!(id = %id, notifier = self.notifier.name(), "Notification sent");
                emit_event(&self.event_tx, MonitorEvent::NotificationSent { id });
                Ok(true)
            }
            Err(e) => {
                emit_event(
                    &self.event_tx,
                    MonitorEvent::NotificationFailed {
                        id,
                        error: e.to_string(),
                    },
                );
                Err(Error::notification(format!(
                    "{} notifier failed: {}",
                    self.notifier.name(),
                    e
                )))
            }
        }
    }

    fn build_notification(
        &self,
        aircraft: &Aircraft,
        distance: f64,
        direction: CompassDirection,
        previous_distance: Option<f64>,
    ) -> Notification {
        Notification {
            callsign: aircraft.call.clone(),
            aircraft_type: aircraft.aircraft_type.clone(),
            altitude: aircraft.alt,
            speed: aircraft.spd,
            distance_km: distance,
            direction,
            previous_distance_km: previous_distance,
        }
    }

    /// Process every aircraft of one poll
    pub async fn process_batch(&self, list: &AircraftList) -> BatchOutcome {
        self.process_batch_at(list, Utc::now()).await
    }

    /// Process every aircraft of one poll, observed at `now`
    pub async fn process_batch_at(&self, list: &AircraftList, now: DateTime<Utc>) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            processed: list.aircraft.len(),
            ..BatchOutcome::default()
        };

        for aircraft in &list.aircraft {
            match self.process_aircraft_at(aircraft, now).await {
                Ok(true) if self.notifications_enabled => outcome.notified += 1,
                Ok(_) => {}
                Err(e) => {
                    error!(callsign = %aircraft.call, error = %e, "Failed to process aircraft");
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Remove stale trackers
    pub async fn cleanup(&self) -> (usize, usize) {
        self.cleanup_at(Utc::now()).await
    }

    /// Remove trackers not seen within [`STALE_AFTER`] of `now`
    ///
    /// Returns `(removed, remaining)`. Never notifies.
    pub async fn cleanup_at(&self, now: DateTime<Utc>) -> (usize, usize) {
        let (removed, remaining) = self.history.sweep(now, STALE_AFTER).await;

        if removed > 0 {
            debug!(removed, remaining, "Cleaned up aircraft history");
        }
        emit_event(&self.event_tx, MonitorEvent::HistoryCleaned { removed, remaining });

        (removed, remaining)
    }
}
