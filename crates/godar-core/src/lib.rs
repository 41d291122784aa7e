// # godar-core
//
// Core library for the godar aircraft proximity monitor.
//
// ## Architecture Overview
//
// - **AircraftFeed**: Trait for fetching the current aircraft list
// - **Notifier**: Trait for delivering "aircraft nearby" notifications
// - **TrackerHistory**: Per-aircraft proximity history (injectable store)
// - **TrackingEngine**: Distance, bearing and the notify/suppress decision
// - **Monitor**: Poll loop that drives the feed and the tracking engine
// - **Registry**: Plugin-based registry for feeds and notifiers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Plugin-Based**: Feeds and notifiers are registered by name
// 3. **Library-First**: Everything the daemon does is usable as a library
// 4. **Contained Failures**: A failed poll or notification never stops the loop

pub mod aircraft;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod notifier;
pub mod registry;
pub mod state;
pub mod tracking;
pub mod traits;

// Re-export core types for convenience
pub use aircraft::{Aircraft, AircraftList};
pub use config::{GodarConfig, NotifierConfig};
pub use engine::{Monitor, MonitorEvent};
pub use error::{Error, Result};
pub use notifier::LogNotifier;
pub use registry::Registry;
pub use state::{AircraftTracker, TrackerHistory};
pub use tracking::TrackingEngine;
pub use traits::{AircraftFeed, Notification, Notifier};
