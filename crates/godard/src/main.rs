// # godar - Aircraft Proximity Monitor
//
// Thin integration layer: reads configuration from the environment, wires
// the feed and notifier into a `Monitor`, and runs until SIGTERM or SIGINT.
// All tracking and notification logic lives in godar-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Server
// - `GODAR_SERVER_URL`: AircraftList.json endpoint (required)
// - `GODAR_SERVER_USERNAME` / `GODAR_SERVER_PASSWORD`: credentials (optional)
// - `GODAR_SERVER_TIMEOUT_SECS`: request timeout (default 30)
// - `GODAR_SERVER_MAX_RETRIES`: retries for transient failures (default 3)
// - `GODAR_SERVER_RETRY_DELAY_SECS`: base retry delay (default 1)
// - `GODAR_SERVER_USER_AGENT`: override the browser-like User-Agent
//
// ### Filters
// - `GODAR_FILTER_AIRCRAFT_TYPE`, `GODAR_FILTER_OPERATOR`,
//   `GODAR_FILTER_FLIGHT_NUMBER`: substring filters
// - `GODAR_FILTER_MIN_ALTITUDE` / `GODAR_FILTER_MAX_ALTITUDE`: feet
// - `GODAR_FILTER_MILITARY`: military aircraft only
//
// ### Location
// - `GODAR_LOCATION_LATITUDE` / `GODAR_LOCATION_LONGITUDE`: observer position
// - `GODAR_LOCATION_MAX_DISTANCE`: server-side radius in km
//
// ### Monitoring and notifications
// - `GODAR_POLL_INTERVAL_SECS`: seconds between polls (default 60)
// - `GODAR_NOTIFICATION_ENABLED`: deliver notifications (default false)
// - `GODAR_NOTIFICATION_CLOSER_ONLY`: only notify approaching aircraft (default true)
// - `GODAR_NOTIFICATION_RE_NOTIFY_SECS`: re-notify after this long (default 0, off)
// - `GODAR_NOTIFICATION_CLEANUP_SECS`: history sweep interval (default 0, 10 min)
// - `GODAR_NOTIFIER_TYPE`: `log` or `webhook` (default `webhook` when
//   `GODAR_WEBHOOK_URL` is set, otherwise `log`)
// - `GODAR_WEBHOOK_URL`: webhook target
//
// ### Logging
// - `GODAR_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `GODAR_DEBUG`: force debug logging
//
// ## Example
//
// ```bash
// export GODAR_SERVER_URL=https://radar.example/VirtualRadar/AircraftList.json
// export GODAR_LOCATION_LATITUDE=51.5074
// export GODAR_LOCATION_LONGITUDE=-0.1278
// export GODAR_NOTIFICATION_ENABLED=true
//
// godar
// ```

use anyhow::{Context, Result};
use godar_core::config::{GodarConfig, NotifierConfig};
use godar_core::{Monitor, MonitorEvent, Registry, TrackerHistory};
use std::env;
use std::fmt::Display;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long to wait for the event logger to drain after the monitor stops
const EVENT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum GodarExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<GodarExitCode> for ExitCode {
    fn from(code: GodarExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    godar: GodarConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Empty variables are treated as unset.
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok().filter(|v| !v.is_empty()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup("GODAR_SERVER_URL").context(
            "GODAR_SERVER_URL is required. \
            Set it via: export GODAR_SERVER_URL=https://host/VirtualRadar/AircraftList.json",
        )?;

        let mut godar = GodarConfig::new(url);

        let server = &mut godar.server;
        server.username = lookup("GODAR_SERVER_USERNAME").unwrap_or_default();
        server.password = lookup("GODAR_SERVER_PASSWORD").unwrap_or_default();
        server.user_agent = lookup("GODAR_SERVER_USER_AGENT");
        if let Some(secs) = parse(&lookup, "GODAR_SERVER_TIMEOUT_SECS")? {
            server.request_timeout_secs = secs;
        }
        if let Some(retries) = parse(&lookup, "GODAR_SERVER_MAX_RETRIES")? {
            server.max_retries = retries;
        }
        if let Some(secs) = parse(&lookup, "GODAR_SERVER_RETRY_DELAY_SECS")? {
            server.retry_delay_secs = secs;
        }

        let filters = &mut godar.filters;
        filters.aircraft_type = lookup("GODAR_FILTER_AIRCRAFT_TYPE").unwrap_or_default();
        filters.operator = lookup("GODAR_FILTER_OPERATOR").unwrap_or_default();
        filters.flight_number = lookup("GODAR_FILTER_FLIGHT_NUMBER").unwrap_or_default();
        filters.min_altitude = parse(&lookup, "GODAR_FILTER_MIN_ALTITUDE")?.unwrap_or(0);
        filters.max_altitude = parse(&lookup, "GODAR_FILTER_MAX_ALTITUDE")?.unwrap_or(0);
        filters.military = parse_bool(&lookup, "GODAR_FILTER_MILITARY")?.unwrap_or(false);

        let location = &mut godar.location;
        location.latitude = parse(&lookup, "GODAR_LOCATION_LATITUDE")?.unwrap_or(0.0);
        location.longitude = parse(&lookup, "GODAR_LOCATION_LONGITUDE")?.unwrap_or(0.0);
        location.max_distance = parse(&lookup, "GODAR_LOCATION_MAX_DISTANCE")?.unwrap_or(0.0);

        if let Some(secs) = parse(&lookup, "GODAR_POLL_INTERVAL_SECS")? {
            godar.monitoring.poll_interval_secs = secs;
        }
        godar.monitoring.debug = parse_bool(&lookup, "GODAR_DEBUG")?.unwrap_or(false);

        let notification = &mut godar.notification;
        notification.enabled = parse_bool(&lookup, "GODAR_NOTIFICATION_ENABLED")?.unwrap_or(false);
        if let Some(closer_only) = parse_bool(&lookup, "GODAR_NOTIFICATION_CLOSER_ONLY")? {
            notification.notify_on_closer_only = closer_only;
        }
        if let Some(secs) = parse(&lookup, "GODAR_NOTIFICATION_RE_NOTIFY_SECS")? {
            notification.re_notify_after_secs = secs;
        }
        if let Some(secs) = parse(&lookup, "GODAR_NOTIFICATION_CLEANUP_SECS")? {
            notification.cleanup_interval_secs = secs;
        }

        let webhook_url = lookup("GODAR_WEBHOOK_URL");
        let notifier_type = lookup("GODAR_NOTIFIER_TYPE")
            .unwrap_or_else(|| {
                let default = if webhook_url.is_some() { "webhook" } else { "log" };
                default.to_string()
            });
        notification.notifier = match notifier_type.to_lowercase().as_str() {
            "log" => NotifierConfig::Log,
            "webhook" => NotifierConfig::Webhook {
                url: webhook_url.unwrap_or_default(),
            },
            other => anyhow::bail!(
                "GODAR_NOTIFIER_TYPE '{}' is not supported. \
                Supported types: log, webhook",
                other
            ),
        };

        Ok(Self {
            godar,
            log_level: lookup("GODAR_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.godar.validate()?;

        // Validate log level
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "GODAR_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Effective log level; `GODAR_DEBUG` wins over `GODAR_LOG_LEVEL`
    fn level(&self) -> Level {
        if self.godar.monitoring.debug {
            return Level::DEBUG;
        }
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
        })
        .transpose()
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>> {
    lookup(key)
        .map(|raw| match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(anyhow::anyhow!(
                "{} must be true or false. Got: '{}'",
                key,
                raw
            )),
        })
        .transpose()
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return GodarExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return GodarExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder().with_max_level(config.level()).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return GodarExitCode::ConfigError.into();
    }

    info!("Starting godar");
    debug!(config = ?config.godar, "Configuration loaded");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return GodarExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            GodarExitCode::RuntimeError
        } else {
            GodarExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: Config) -> Result<()> {
    let registry = Registry::with_builtins()?;

    #[cfg(feature = "vrs")]
    godar_feed_vrs::register(&registry)?;

    #[cfg(feature = "webhook")]
    godar_notify_webhook::register(&registry)?;

    debug!(
        feeds = ?registry.list_feeds(),
        notifiers = ?registry.list_notifiers(),
        "Registered implementations"
    );

    let feed = registry.create_feed("vrs", &config.godar)?;
    let notifier = registry.create_notifier(&config.godar)?;

    let (mut monitor, events) = Monitor::new(feed, notifier, TrackerHistory::new(), config.godar)?;
    let event_task = tokio::spawn(log_events(events));

    monitor.start()?;
    info!("Monitoring started");

    let shutdown = wait_for_shutdown().await;
    match &shutdown {
        Ok(signal) => info!("Received shutdown signal: {}", signal),
        Err(e) => error!("Shutdown error: {}", e),
    }

    info!("Shutting down");
    monitor.stop().await;

    // Dropping the monitor closes the event channel
    drop(monitor);
    if tokio::time::timeout(EVENT_DRAIN_TIMEOUT, event_task).await.is_err() {
        warn!("Event logger did not finish within {:?}", EVENT_DRAIN_TIMEOUT);
    }

    shutdown.map(|_| ())
}

/// Log monitor events until the channel closes
async fn log_events(mut events: mpsc::Receiver<MonitorEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            MonitorEvent::Started { feed, notifier } => {
                info!(feed, notifier, "Monitor running")
            }
            MonitorEvent::Stopped => info!("Monitor stopped"),
            MonitorEvent::PollCompleted { aircraft } => debug!(aircraft, "Poll completed"),
            MonitorEvent::PollFailed { error } => warn!(%error, "Poll failed"),
            MonitorEvent::AircraftDetected {
                id,
                distance_km,
                direction,
                notify,
            } => debug!(%id, distance_km, %direction, notify, "Aircraft detected"),
            MonitorEvent::NotificationSent { id } => debug!(%id, "Notification sent"),
            MonitorEvent::NotificationFailed { id, error } => {
                warn!(%id, %error, "Notification failed")
            }
            MonitorEvent::HistoryCleaned { removed, remaining } => {
                debug!(removed, remaining, "History cleaned")
            }
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
