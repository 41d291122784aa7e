//! Plugin-based feed and notifier registry
//!
//! Implementations are registered by name at startup, so the daemon never
//! hardcodes which feed or notifier it builds.
//!
//! ## Registration
//!
//! Each implementation crate exposes a `register` function:
//!
//! ```rust,ignore
//! // In godar-notify-webhook
//! pub fn register(registry: &Registry) -> godar_core::Result<()> {
//!     registry.register_notifier("webhook", Box::new(WebhookNotifierFactory))
//! }
//! ```

use crate::config::GodarConfig;
use crate::error::{Error, Result};
use crate::notifier::LogNotifierFactory;
use crate::traits::{AircraftFeed, AircraftFeedFactory, Notifier, NotifierFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Feed and notifier registry
///
/// Uses interior mutability, so registration works through `&Registry`.
#[derive(Default)]
pub struct Registry {
    feeds: RwLock<HashMap<String, Box<dyn AircraftFeedFactory>>>,
    notifiers: RwLock<HashMap<String, Box<dyn NotifierFactory>>>,
}

fn poisoned<T>(_: PoisonError<T>) -> Error {
    Error::Other("registry lock poisoned".to_string())
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in `log` notifier registered
    pub fn with_builtins() -> Result<Self> {
        let registry = Self::new();
        registry.register_notifier("log", Box::new(LogNotifierFactory))?;
        Ok(registry)
    }

    /// Register a feed factory under `name` (e.g. "vrs")
    pub fn register_feed(
        &self,
        name: impl Into<String>,
        factory: Box<dyn AircraftFeedFactory>,
    ) -> Result<()> {
        self.feeds.write().map_err(poisoned)?.insert(name.into(), factory);
        Ok(())
    }

    /// Register a notifier factory under `name` (e.g. "log", "webhook")
    pub fn register_notifier(
        &self,
        name: impl Into<String>,
        factory: Box<dyn NotifierFactory>,
    ) -> Result<()> {
        self.notifiers.write().map_err(poisoned)?.insert(name.into(), factory);
        Ok(())
    }

    /// Build the feed registered under `name`
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn AircraftFeed>)`: Created feed instance
    /// - `Err(Error)`: If the feed type is not registered or creation fails
    pub fn create_feed(&self, name: &str, config: &GodarConfig) -> Result<Box<dyn AircraftFeed>> {
        let feeds = self.feeds.read().map_err(poisoned)?;

        let factory = feeds
            .get(name)
            .ok_or_else(|| Error::config(format!("Unknown feed type: {}", name)))?;

        factory.create(config)
    }

    /// Build the notifier selected by `config.notification.notifier`
    pub fn create_notifier(&self, config: &GodarConfig) -> Result<Box<dyn Notifier>> {
        let notifier_type = config.notification.notifier.type_name();
        let notifiers = self.notifiers.read().map_err(poisoned)?;

        let factory = notifiers
            .get(notifier_type)
            .ok_or_else(|| Error::config(format!("Unknown notifier type: {}", notifier_type)))?;

        factory.create(config)
    }

    pub fn has_feed(&self, name: &str) -> bool {
        self.feeds
            .read()
            .map(|feeds| feeds.contains_key(name))
            .unwrap_or(false)
    }

    pub fn has_notifier(&self, name: &str) -> bool {
        self.notifiers
            .read()
            .map(|notifiers| notifiers.contains_key(name))
            .unwrap_or(false)
    }

    /// Registered feed type names, sorted
    pub fn list_feeds(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .feeds
            .read()
            .map(|feeds| feeds.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Registered notifier type names, sorted
    pub fn list_notifiers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .notifiers
            .read()
            .map(|notifiers| notifiers.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}
