// # Notifier Trait
//
// Defines the interface for telling a human about a nearby aircraft.
//
// ## Implementations
//
// - Log: `LogNotifier` in this crate
// - Webhook: `godar-notify-webhook` crate
//
// Delivery is best effort. A failed `send()` is reported to the tracking
// engine, which logs it and moves on; nothing is retried.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::config::GodarConfig;
use crate::geo::CompassDirection;

/// Everything a notifier needs to describe one sighting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub callsign: String,
    #[serde(rename = "type")]
    pub aircraft_type: String,
    /// Altitude in feet
    pub altitude: i32,
    /// Ground speed in knots
    pub speed: f64,
    /// Distance from the observer in kilometers
    pub distance_km: f64,
    /// Compass direction from the observer
    pub direction: CompassDirection,
    /// Distance at the previous sighting, if there was one
    pub previous_distance_km: Option<f64>,
}

/// How the distance moved since the previous sighting
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceChange {
    Closer(f64),
    Farther(f64),
}

impl fmt::Display for DistanceChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceChange::Closer(km) => write!(f, "closer by {:.2} km", km),
            DistanceChange::Farther(km) => write!(f, "farther by {:.2} km", km),
        }
    }
}

impl Notification {
    pub fn title(&self) -> String {
        format!("Aircraft Detected: {}", self.callsign)
    }

    /// Change since the previous sighting
    ///
    /// `None` for a first sighting, and also when the previous distance was
    /// 0 (no observer location configured).
    pub fn distance_change(&self) -> Option<DistanceChange> {
        let previous = self.previous_distance_km.filter(|d| *d > 0.0)?;
        let delta = previous - self.distance_km;
        if delta < 0.0 {
            Some(DistanceChange::Farther(-delta))
        } else {
            Some(DistanceChange::Closer(delta))
        }
    }

    /// Multi-line body text
    pub fn message(&self) -> String {
        let mut message = format!(
            "Type: {}\nAltitude: {} ft\nSpeed: {:.1} knots\nDistance: {:.2} km\nDirection: {}",
            self.aircraft_type, self.altitude, self.speed, self.distance_km, self.direction
        );

        if let (Some(previous), Some(change)) = (self.previous_distance_km, self.distance_change()) {
            message.push_str(&format!("\nPrevious: {:.2} km ({})", previous, change));
        }

        message
    }
}

/// Trait for notifier implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Contract
///
/// - Called at most once per aircraft per poll.
/// - Must not block the poll loop longer than its own delivery timeout.
/// - Must not retry: a failed delivery is returned as an error.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Delivered (or handed to the delivery mechanism)
    /// - `Err(Error)`: Delivery failed
    async fn send(&self, notification: &Notification) -> Result<(), crate::Error>;

    /// Name of the notifier implementation (for logging)
    fn name(&self) -> &'static str;
}

/// Helper trait for constructing notifiers from configuration
pub trait NotifierFactory: Send + Sync {
    /// Create a Notifier instance from configuration
    fn create(&self, config: &GodarConfig) -> Result<Box<dyn Notifier>, crate::Error>;
}
