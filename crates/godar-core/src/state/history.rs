// # Tracker History
//
// In-memory map from aircraft identifier to its tracker.
//
// ## Locking
//
// - Reads (`get`, `previous_distance`, `len`) share a read lock.
// - The notify decision in `observe()` runs in a single write-lock critical
//   section, so two concurrent first sightings of the same aircraft produce
//   exactly one "first sighting" decision.
// - No lock is held across network I/O; callers notify after `observe()`
//   returns.
//
// ## Crash Behavior
//
// Nothing is persisted. After a restart every aircraft in range is a first
// sighting again and notifies once.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Proximity history of one aircraft
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftTracker {
    /// Distance from the observer at the last sighting (km)
    pub last_distance: f64,
    /// Time of the last sighting; never moves backwards
    pub last_seen: DateTime<Utc>,
    /// Whether a notification decision was ever positive
    pub notified: bool,
}

impl AircraftTracker {
    fn first_sighting(distance: f64, now: DateTime<Utc>) -> Self {
        Self {
            last_distance: distance,
            last_seen: now,
            notified: true,
        }
    }
}

/// When a repeat sighting should notify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyPolicy {
    /// Only notify for repeat sightings that got strictly closer
    pub closer_only: bool,
    /// Notify anyway when the aircraft was last seen longer ago than this
    pub re_notify_after: Option<Duration>,
}

impl Default for NotifyPolicy {
    fn default() -> Self {
        Self {
            closer_only: true,
            re_notify_after: None,
        }
    }
}

impl From<&crate::config::NotificationConfig> for NotifyPolicy {
    fn from(config: &crate::config::NotificationConfig) -> Self {
        Self {
            closer_only: config.notify_on_closer_only,
            re_notify_after: config.re_notify_after(),
        }
    }
}

/// Outcome of one observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Whether this sighting is notification-worthy
    pub notify: bool,
    /// Distance recorded at the previous sighting (`None` on first sighting)
    pub previous_distance: Option<f64>,
}

/// Shared, cloneable handle to the tracker map
#[derive(Debug, Clone, Default)]
pub struct TrackerHistory {
    inner: Arc<RwLock<HashMap<String, AircraftTracker>>>,
}

impl TrackerHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked aircraft
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Snapshot of one tracker
    pub async fn get(&self, id: &str) -> Option<AircraftTracker> {
        self.inner.read().await.get(id).cloned()
    }

    /// Last recorded distance, 0 when the aircraft is untracked
    pub async fn previous_distance(&self, id: &str) -> f64 {
        self.inner
            .read()
            .await
            .get(id)
            .map(|t| t.last_distance)
            .unwrap_or(0.0)
    }

    /// Insert or replace a tracker
    pub async fn insert(&self, id: impl Into<String>, tracker: AircraftTracker) {
        self.inner.write().await.insert(id.into(), tracker);
    }

    /// Record a sighting and decide whether it should notify
    ///
    /// A first sighting always notifies. A repeat sighting updates the
    /// tracker unconditionally; in closer-only mode it notifies only when the
    /// distance strictly decreased or the re-notify interval elapsed since the
    /// last sighting, otherwise it always notifies.
    pub async fn observe(
        &self,
        id: &str,
        distance: f64,
        now: DateTime<Utc>,
        policy: NotifyPolicy,
    ) -> Decision {
        let mut guard = self.inner.write().await;

        let Some(tracker) = guard.get_mut(id) else {
            guard.insert(id.to_string(), AircraftTracker::first_sighting(distance, now));
            return Decision {
                notify: true,
                previous_distance: None,
            };
        };

        let previous_distance = tracker.last_distance;
        let closer = distance < previous_distance;
        let due = policy.re_notify_after.is_some_and(|after| {
            now.signed_duration_since(tracker.last_seen)
                .to_std()
                .is_ok_and(|elapsed| elapsed > after)
        });

        tracker.last_distance = distance;
        tracker.last_seen = tracker.last_seen.max(now);

        let notify = !policy.closer_only || closer || due;
        if notify {
            tracker.notified = true;
        }

        Decision {
            notify,
            previous_distance: Some(previous_distance),
        }
    }

    /// Remove trackers last seen more than `max_age` before `now`
    ///
    /// Returns `(removed, remaining)`.
    pub async fn sweep(&self, now: DateTime<Utc>, max_age: Duration) -> (usize, usize) {
        let mut guard = self.inner.write().await;
        let before = guard.len();

        guard.retain(|_, tracker| {
            // A last_seen in the future yields Err and is kept
            now.signed_duration_since(tracker.last_seen)
                .to_std()
                .map_or(true, |age| age <= max_age)
        });

        (before - guard.len(), guard.len())
    }
}
