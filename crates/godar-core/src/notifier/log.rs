// # Log Notifier
//
// Writes each notification to the `tracing` log at INFO level.
//
// Useful headless: the daemon's log becomes the notification stream. This
// is the default notifier.

use async_trait::async_trait;
use tracing::info;

use crate::config::GodarConfig;
use crate::traits::{Notification, Notifier, NotifierFactory};
use crate::Error;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), Error> {
        info!(
            callsign = %notification.callsign,
            aircraft_type = %notification.aircraft_type,
            distance_km = notification.distance_km,
            direction = %notification.direction,
            "{}\n{}",
            notification.title(),
            notification.message()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Factory for the `log` notifier
pub struct LogNotifierFactory;

impl NotifierFactory for LogNotifierFactory {
    fn create(&self, _config: &GodarConfig) -> Result<Box<dyn Notifier>, Error> {
        Ok(Box::new(LogNotifier::new()))
    }
}
