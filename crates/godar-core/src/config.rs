//! Configuration types for godar
//!
//! This module defines all configuration structures used throughout the crate.
//! Configuration is read once when the monitor is constructed; nothing here
//! is reloaded at runtime.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cleanup interval used when none is configured
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Main godar configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GodarConfig {
    /// Feed server connection
    pub server: ServerConfig,

    /// Server-side aircraft filters
    #[serde(default)]
    pub filters: FilterConfig,

    /// Observer location
    #[serde(default)]
    pub location: LocationConfig,

    /// Poll loop settings
    #[serde(default)]
    pub monitoring: MonitoringConfig,

    /// Notification policy and delivery
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl GodarConfig {
    /// Create a configuration for the given feed URL with defaults everywhere else
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                url: url.into(),
                ..ServerConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.server.validate()?;
        self.filters.validate()?;
        self.location.validate()?;
        self.monitoring.validate()?;
        self.notification.validate()?;
        Ok(())
    }
}

/// Feed server connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Full URL of the aircraft list endpoint
    pub url: String,

    /// Login username (empty = no credentials)
    #[serde(default)]
    pub username: String,

    /// Login password
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub password: String,

    /// Request timeout (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for transient fetch failures (transport errors, 5xx)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Base delay between retries (in seconds); attempt `n` waits `n` times this
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            user_agent: None,
        }
    }
}

impl ServerConfig {
    /// Whether any credential was supplied
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }

    /// Validate the server configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("server URL is required"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "server URL must use http or https: {}",
                self.url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("request timeout must be > 0"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Server-side filters; each is sent only when it differs from its default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Aircraft type substring (e.g. "A320")
    pub aircraft_type: String,
    /// Minimum altitude in feet (0 = unset)
    pub min_altitude: i32,
    /// Maximum altitude in feet (0 = unset)
    pub max_altitude: i32,
    /// Only military aircraft
    pub military: bool,
    /// Operator substring
    pub operator: String,
    /// Callsign substring
    pub flight_number: String,
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.min_altitude > 0 && self.max_altitude > 0 && self.min_altitude > self.max_altitude {
            return Err(crate::Error::config(
                "min_altitude cannot be greater than max_altitude",
            ));
        }
        Ok(())
    }
}

/// Observer location
///
/// `(0.0, 0.0)` means "no location": no location filter is sent and distance
/// and bearing are reported as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius filter in kilometers (0 = unset)
    pub max_distance: f64,
}

impl LocationConfig {
    /// Whether an observer location is configured
    pub fn is_set(&self) -> bool {
        !(self.latitude == 0.0 && self.longitude == 0.0)
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.is_set() {
            return Ok(());
        }
        if !crate::geo::is_valid_latitude(self.latitude) {
            return Err(crate::Error::config("latitude must be between -90 and 90"));
        }
        if !crate::geo::is_valid_longitude(self.longitude) {
            return Err(crate::Error::config("longitude must be between -180 and 180"));
        }
        if self.max_distance < 0.0 {
            return Err(crate::Error::config("max_distance cannot be negative"));
        }
        Ok(())
    }
}

/// Poll loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Interval between polls (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Verbose logging
    #[serde(default)]
    pub debug: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            debug: false,
        }
    }
}

impl MonitoringConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs < 1 {
            return Err(crate::Error::config("poll_interval must be at least 1 second"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Notifier implementation selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Write notifications to the log
    #[default]
    Log,

    /// POST notifications as JSON to a URL
    Webhook {
        /// Target URL
        url: String,
    },
}

impl NotifierConfig {
    /// Registry key of the notifier
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Log => "log",
            NotifierConfig::Webhook { .. } => "webhook",
        }
    }
}

/// Notification policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Master switch; decisions are still tracked when disabled
    #[serde(default)]
    pub enabled: bool,

    /// Only re-notify for an aircraft that got closer (first sighting always notifies)
    #[serde(default = "default_notify_on_closer_only")]
    pub notify_on_closer_only: bool,

    /// Re-notify after this many seconds without a notification-worthy change (0 = never)
    #[serde(default)]
    pub re_notify_after_secs: u64,

    /// How often stale trackers are swept (in seconds, 0 = default of 10 minutes)
    #[serde(default)]
    pub cleanup_interval_secs: u64,

    /// Which notifier delivers notifications
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            notify_on_closer_only: default_notify_on_closer_only(),
            re_notify_after_secs: 0,
            cleanup_interval_secs: 0,
            notifier: NotifierConfig::default(),
        }
    }
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if let NotifierConfig::Webhook { url } = &self.notifier {
            if url.is_empty() {
                return Err(crate::Error::config("webhook notifier requires a URL"));
            }
        }
        Ok(())
    }

    /// Re-notify interval, `None` when disabled
    pub fn re_notify_after(&self) -> Option<Duration> {
        match self.re_notify_after_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Effective cleanup interval
    pub fn cleanup_interval(&self) -> Duration {
        match self.cleanup_interval_secs {
            0 => DEFAULT_CLEANUP_INTERVAL,
            secs => Duration::from_secs(secs),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the monitor event channel
    ///
    /// When full, new events are dropped (with a warning log) rather than
    /// blocking the poll loop.
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_secs() -> u64 {
    1
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_notify_on_closer_only() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    1000
}
