//! Core traits for godar
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AircraftFeed`]: Fetch the current aircraft list from a remote feed
//! - [`Notifier`]: Deliver a notification about a nearby aircraft

pub mod feed;
pub mod notifier;

pub use feed::{AircraftFeed, AircraftFeedFactory};
pub use notifier::{DistanceChange, Notification, Notifier, NotifierFactory};
