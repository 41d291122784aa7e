// # Tracker State
//
// Per-aircraft proximity history. The store is an explicitly owned handle
// passed to the tracking engine at construction, so independent engines
// (and tests) never share state by accident.

pub mod history;

pub use history::{AircraftTracker, Decision, NotifyPolicy, TrackerHistory};
