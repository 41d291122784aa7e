// # Built-in Notifiers
//
// Notifiers that need no extra dependencies. Network-backed notifiers live
// in their own crates.

pub mod log;

pub use log::{LogNotifier, LogNotifierFactory};
