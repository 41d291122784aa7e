// # Webhook Notifier
//
// `Notifier` implementation that POSTs each notification as JSON to a
// configured URL.
//
// ## Payload
//
// ```json
// {
//   "callsign": "BAW123",
//   "type": "A320",
//   "altitude": 35000,
//   "speed": 450.0,
//   "distance_km": 12.34,
//   "direction": "NE",
//   "previous_distance_km": 15.1,
//   "title": "Aircraft Detected: BAW123",
//   "message": "Type: A320\n..."
// }
// ```
//
// `previous_distance_km` is `null` on a first sighting.
//
// ## Delivery
//
// One POST per notification, no retries. Any non-2xx status is an error,
// which the tracking engine logs before moving on to the next aircraft.
//
// ## Security
//
// Webhook URLs often embed a token in their path, so only the origin is
// ever logged.

use async_trait::async_trait;
use godar_core::config::{GodarConfig, NotifierConfig};
use godar_core::registry::Registry;
use godar_core::traits::{Notification, Notifier, NotifierFactory};
use godar_core::{Error, Result};
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default HTTP timeout for webhook delivery
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON body of one webhook call
#[derive(Debug, Serialize)]
struct Payload<'a> {
    #[serde(flatten)]
    notification: &'a Notification,
    title: String,
    message: String,
}

impl<'a> Payload<'a> {
    fn new(notification: &'a Notification) -> Self {
        Self {
            notification,
            title: notification.title(),
            message: notification.message(),
        }
    }
}

/// Webhook notifier
pub struct WebhookNotifier {
    /// ⚠️ May carry a token; log `origin` instead
    url: Url,
    origin: String,
    client: reqwest::Client,
}

// Custom Debug implementation that hides the URL path
impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("origin", &self.origin)
            .field("url", &"<REDACTED>")
            .finish()
    }
}

impl WebhookNotifier {
    /// Create a notifier posting to `url` with the default timeout
    ///
    /// # Errors
    ///
    /// `Error::Config` if the URL does not parse or is not http(s).
    pub fn new(url: &str) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::config(format!("invalid webhook URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "webhook URL must be http or https, got {}",
                url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            origin: url.origin().ascii_serialization(),
            url,
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        debug!(
            webhook = %self.origin,
            callsign = %notification.callsign,
            "Sending webhook notification"
        );

        let response = self
            .client
            .post(self.url.clone())
            .json(&Payload::new(notification))
            .send()
            .await
            .map_err(|e| {
                // reqwest errors include the full URL
                Error::notification(format!(
                    "webhook request to {} failed: {}",
                    self.origin,
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                webhook = %self.origin,
                status = status.as_u16(),
                "Webhook rejected notification"
            );
            return Err(Error::notification(format!(
                "webhook returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        debug!(webhook = %self.origin, status = status.as_u16(), "Webhook notification delivered");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

/// Factory for creating webhook notifiers
pub struct WebhookNotifierFactory;

impl NotifierFactory for WebhookNotifierFactory {
    fn create(&self, config: &GodarConfig) -> Result<Box<dyn Notifier>> {
        match &config.notification.notifier {
            NotifierConfig::Webhook { url } => {
                if url.is_empty() {
                    return Err(Error::config("webhook notifier requires a URL"));
                }
                Ok(Box::new(WebhookNotifier::with_timeout(
                    url,
                    config.server.request_timeout(),
                )?))
            }
            other => Err(Error::config(format!(
                "invalid config for webhook notifier: notifier type is {}",
                other.type_name()
            ))),
        }
    }
}

/// Register the webhook notifier with a registry under `"webhook"`
///
/// # Example
///
/// ```rust
/// use godar_core::Registry;
///
/// let registry = Registry::new();
/// godar_notify_webhook::register(&registry).unwrap();
/// assert!(registry.has_notifier("webhook"));
/// ```
pub fn register(registry: &Registry) -> Result<()> {
    registry.register_notifier("webhook", Box::new(WebhookNotifierFactory))
}
