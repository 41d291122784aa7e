//! Monitor: the poll loop and its lifecycle
//!
//! The Monitor owns one background task that:
//! - Fetches the aircraft list via an [`AircraftFeed`] (immediately, then
//!   every poll interval)
//! - Hands each list to the [`TrackingEngine`]
//! - Sweeps stale trackers every cleanup interval
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ AircraftFeed │── AircraftList ──┐
//! └──────────────┘                  │
//!                                   ▼
//!                          ┌────────────────┐
//!                          │ TrackingEngine │
//!                          └────────────────┘
//!                                   │
//!         ┌─────────────────────────┼─────────────────────────┐
//!         │                         │                         │
//!         ▼                         ▼                         ▼
//! ┌────────────────┐        ┌──────────────┐          ┌─────────────┐
//! │ TrackerHistory │        │   Notifier   │          │   Events    │
//! │ (decide)       │        │   (send)     │          │  (monitor)  │
//! └────────────────┘        └──────────────┘          └─────────────┘
//! ```
//!
//! ## Shutdown
//!
//! Cancellation is cooperative: the stop signal is observed between cycles,
//! so a fetch in progress runs to completion (bounded by the request
//! timeout) before the task exits. [`Monitor::stop()`] waits for that.

use crate::config::GodarConfig;
use crate::error::{Error, Result};
use crate::geo::CompassDirection;
use crate::state::TrackerHistory;
use crate::tracking::TrackingEngine;
use crate::traits::{AircraftFeed, Notifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Events emitted by the Monitor and its TrackingEngine
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Poll loop started
    Started {
        feed: &'static str,
        notifier: &'static str,
    },

    /// Poll loop exited
    Stopped,

    /// A poll returned an aircraft list and it was processed
    PollCompleted {
        /// Aircraft in the list
        aircraft: usize,
    },

    /// A poll failed; tracker state was left untouched
    PollFailed { error: String },

    /// One aircraft was observed and a decision made
    AircraftDetected {
        id: String,
        distance_km: f64,
        direction: CompassDirection,
        notify: bool,
    },

    /// The notifier accepted a notification
    NotificationSent { id: String },

    /// The notifier failed for one aircraft
    NotificationFailed { id: String, error: String },

    /// A cleanup sweep ran
    HistoryCleaned { removed: usize, remaining: usize },
}

/// Send an event without blocking, dropping it when the channel is full
pub(crate) fn emit_event(event_tx: &mpsc::Sender<MonitorEvent>, event: MonitorEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            // Nobody is listening
        }
    }
}

/// Handle to a running poll loop
struct Running {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Aircraft monitor
///
/// ## Lifecycle
///
/// 1. Create with [`Monitor::new()`]
/// 2. [`Monitor::start()`] spawns the poll loop and returns immediately
/// 3. [`Monitor::stop()`] signals the loop and waits for it to exit
pub struct Monitor {
    feed: Arc<dyn AircraftFeed>,
    tracking: Arc<TrackingEngine>,
    poll_interval: Duration,
    cleanup_interval: Duration,
    event_tx: mpsc::Sender<MonitorEvent>,
    running: Option<Running>,
}

impl Monitor {
    /// Create a new monitor
    ///
    /// # Parameters
    ///
    /// - `feed`: Aircraft feed implementation
    /// - `notifier`: Notifier implementation
    /// - `history`: Tracker store (shared with the caller)
    /// - `config`: godar configuration
    ///
    /// # Returns
    ///
    /// A tuple of (monitor, event_receiver) where event_receiver yields monitor events
    pub fn new(
        feed: Box<dyn AircraftFeed>,
        notifier: Box<dyn Notifier>,
        history: TrackerHistory,
        config: GodarConfig,
    ) -> Result<(Self, mpsc::Receiver<MonitorEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity.max(1));

        let tracking = TrackingEngine::new(&config, history, Arc::from(notifier), tx.clone());

        let monitor = Self {
            feed: Arc::from(feed),
            tracking: Arc::new(tracking),
            poll_interval: config.monitoring.poll_interval(),
            cleanup_interval: config.notification.cleanup_interval(),
            event_tx: tx,
            running: None,
        };

        Ok((monitor, rx))
    }

    /// The tracking engine driven by this monitor
    pub fn tracking(&self) -> &TrackingEngine {
        &self.tracking
    }

    /// Whether the poll loop has been started and not stopped
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Spawn the poll loop
    ///
    /// Must be called from within a tokio runtime. The first poll runs
    /// immediately.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` if the monitor is already running.
    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Err(Error::invalid_input("monitor is already running"));
        }

        info!(
            feed = self.feed.feed_name(),
            poll_interval_secs = self.poll_interval.as_secs(),
            cleanup_interval_secs = self.cleanup_interval.as_secs(),
            "Starting aircraft monitoring"
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let poll_loop = PollLoop {
            feed: Arc::clone(&self.feed),
            tracking: Arc::clone(&self.tracking),
            poll_interval: self.poll_interval,
            cleanup_interval: self.cleanup_interval,
            event_tx: self.event_tx.clone(),
        };

        let handle = tokio::spawn(poll_loop.run(shutdown_rx));
        self.running = Some(Running { shutdown_tx, handle });

        Ok(())
    }

    /// Stop the poll loop and wait for it to exit
    ///
    /// A cycle in progress completes first. Calling `stop()` on a monitor
    /// that is not running is a no-op.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            debug!("Monitor is not running, nothing to stop");
            return;
        };

        info!("Stopping aircraft monitoring");

        // Err means the loop already exited
        let _ = running.shutdown_tx.send(());

        if let Err(e) = running.handle.await {
            error!(error = %e, "Poll loop task failed");
        }

        info!("Aircraft monitoring stopped");
    }
}

/// State moved into the background task
struct PollLoop {
    feed: Arc<dyn AircraftFeed>,
    tracking: Arc<TrackingEngine>,
    poll_interval: Duration,
    cleanup_interval: Duration,
    event_tx: mpsc::Sender<MonitorEvent>,
}

impl PollLoop {
    async fn run(self, mut shutdown_rx: oneshot::Receiver<()>) {
        emit_event(
            &self.event_tx,
            MonitorEvent::Started {
                feed: self.feed.feed_name(),
                notifier: self.tracking.notifier_name(),
            },
        );

        // First tick completes immediately
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cleanup =
            tokio::time::interval_at(Instant::now() + self.cleanup_interval, self.cleanup_interval);
        cleanup.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                // Also fires if the Monitor was dropped without stop()
                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received");
                    break;
                }

                // Ahead of poll: a fetch slower than the poll interval
                // leaves the poll tick permanently due
                _ = cleanup.tick() => {
                    self.tracking.cleanup().await;
                }

                _ = poll.tick() => {
                    self.poll_once().await;
                }
            }
        }

        emit_event(&self.event_tx, MonitorEvent::Stopped);
    }

    async fn poll_once(&self) {
        match self.feed.fetch().await {
            Ok(list) => {
                debug!(
                    total_aircraft = list.total_ac,
                    filtered_aircraft = list.aircraft.len(),
                    "Fetched aircraft data"
                );

                let outcome = self.tracking.process_batch(&list).await;
                if outcome.failed > 0 {
                    warn!(
                        failed = outcome.failed,
                        processed = outcome.processed,
                        "Some aircraft could not be processed"
                    );
                }

                emit_event(
                    &self.event_tx,
                    MonitorEvent::PollCompleted {
                        aircraft: outcome.processed,
                    },
                );
            }
            Err(e) => {
                error!(feed = self.feed.feed_name(), error = %e, "Failed to fetch aircraft data");
                emit_event(
                    &self.event_tx,
                    MonitorEvent::PollFailed {
                        error: e.to_string(),
                    },
                );
            }
        }
    }
}
