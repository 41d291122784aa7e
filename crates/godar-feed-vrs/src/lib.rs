// # Virtual Radar Server Feed
//
// `AircraftFeed` implementation that polls a Virtual Radar Server
// `AircraftList.json` endpoint.
//
// ## Behavior
//
// - Authenticates on first use when credentials are configured (see `auth`)
// - Sends server-side filters as query parameters
// - Requires HTTP 200 with an `application/json` content type
// - Never follows redirects; a redirect to the login page clears the session,
//   re-authenticates and retries the request once
// - Retries transport failures and 5xx responses with a linear delay
//   (`attempt × retry_delay`); 4xx, non-JSON and decode errors are final
//
// ## Query Parameters
//
// | parameter | sent when |
// |---|---|
// | `fTypQ` | aircraft type filter is non-empty |
// | `fAltL` / `fAltU` | min / max altitude > 0 |
// | `fMilQ=1` | military-only |
// | `fOpQ` | operator filter is non-empty |
// | `fCallQ` | callsign filter is non-empty |
// | `lat`, `lng` | observer location is not (0, 0) |
// | `fDstU` | location set and max distance > 0 |
//
// ## Security
//
// The password and session cookie NEVER appear in logs. Request URLs are
// logged without their query string.

pub mod auth;

pub use auth::{AuthMethod, AuthStrategy};

use async_trait::async_trait;
use godar_core::aircraft::AircraftList;
use godar_core::config::{FilterConfig, GodarConfig, LocationConfig};
use godar_core::registry::Registry;
use godar_core::traits::{AircraftFeed, AircraftFeedFactory};
use godar_core::{Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue, LOCATION, REFERER};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Browser-like User-Agent; some VRS front ends reject unknown clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                                      (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Path of the VRS login page, relative to the server origin
const LOGIN_PATH: &str = "/login.php";

/// Longest body excerpt included in errors and logs
const BODY_SNIPPET_CHARS: usize = 200;

/// Build the filter query parameters for one poll
///
/// Each filter is included only when it differs from its default.
pub fn filter_query(filters: &FilterConfig, location: &LocationConfig) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();

    if !filters.aircraft_type.is_empty() {
        query.push(("fTypQ", filters.aircraft_type.clone()));
    }
    if filters.min_altitude > 0 {
        query.push(("fAltL", filters.min_altitude.to_string()));
    }
    if filters.max_altitude > 0 {
        query.push(("fAltU", filters.max_altitude.to_string()));
    }
    if filters.military {
        query.push(("fMilQ", "1".to_string()));
    }
    if !filters.operator.is_empty() {
        query.push(("fOpQ", filters.operator.clone()));
    }
    if !filters.flight_number.is_empty() {
        query.push(("fCallQ", filters.flight_number.clone()));
    }

    if location.is_set() {
        // f64 Display is the shortest round-trip form: 51.5, -0.1, 100
        query.push(("lat", location.latitude.to_string()));
        query.push(("lng", location.longitude.to_string()));
        if location.max_distance > 0.0 {
            query.push(("fDstU", location.max_distance.to_string()));
        }
    }

    query
}

/// Virtual Radar Server feed
///
/// # Sessions
///
/// The authentication method that worked is kept for the life of the feed
/// and reused on every request, until the server redirects to its login
/// page again.
pub struct VrsFeed {
    /// AircraftList.json endpoint
    url: Url,

    /// Login page at the server origin
    login_url: Url,

    /// Origin with trailing slash, sent as Referer
    referer: String,

    username: String,

    /// ⚠️ NEVER log this value
    password: String,

    filters: FilterConfig,
    location: LocationConfig,

    max_retries: usize,
    retry_delay: Duration,

    client: reqwest::Client,

    /// Established authentication method, `None` until first needed
    session: Mutex<Option<AuthMethod>>,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for VrsFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VrsFeed")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("filters", &self.filters)
            .field("location", &self.location)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl VrsFeed {
    /// Create a feed from configuration
    ///
    /// # Errors
    ///
    /// `Error::Config` if the server URL does not parse or the HTTP client
    /// cannot be built.
    pub fn new(config: &GodarConfig) -> Result<Self> {
        let server = &config.server;

        let url = Url::parse(&server.url)
            .map_err(|e| Error::config(format!("invalid server URL {:?}: {}", server.url, e)))?;
        let login_url = url
            .join(LOGIN_PATH)
            .map_err(|e| Error::config(format!("cannot derive login URL: {}", e)))?;
        let referer = format!("{}/", url.origin().ascii_serialization());

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(server.request_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(server.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url,
            login_url,
            referer,
            username: server.username.clone(),
            password: server.password.clone(),
            filters: config.filters.clone(),
            location: config.location,
            max_retries: server.max_retries,
            retry_delay: server.retry_delay(),
            client,
            session: Mutex::new(None),
        })
    }

    fn has_credentials(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }

    /// The authentication method currently in use, if one is established
    pub async fn auth_method(&self) -> Option<AuthMethod> {
        self.session.lock().await.clone()
    }

    /// Run the authentication chain
    ///
    /// Each strategy is attempted once; the first to validate wins.
    async fn authenticate(&self) -> Result<AuthMethod> {
        let mut failures = Vec::new();

        for strategy in AuthStrategy::CHAIN {
            debug!(method = %strategy, "Trying authentication method");

            match self.try_strategy(strategy).await {
                Ok(method) => {
                    info!(method = %strategy, "Authentication successful");
                    return Ok(method);
                }
                Err(e) => {
                    debug!(method = %strategy, error = %e, "Authentication method failed");
                    failures.push(format!("{}: {}", strategy, e));
                }
            }
        }

        Err(Error::auth(format!(
            "all authentication methods failed ({})",
            failures.join("; ")
        )))
    }

    async fn try_strategy(&self, strategy: AuthStrategy) -> Result<AuthMethod> {
        match strategy {
            AuthStrategy::FormLogin => self.form_login().await,
            AuthStrategy::BasicAuth => {
                let request = self
                    .client
                    .get(self.url.clone())
                    .query(&[("test", "1")])
                    .basic_auth(&self.username, Some(&self.password));
                self.probe(request).await.map(|_| AuthMethod::Basic)
            }
            AuthStrategy::QueryParam => {
                let request = self.client.get(self.url.clone()).query(&[
                    ("username", self.username.as_str()),
                    ("password", self.password.as_str()),
                ]);
                self.probe(request).await.map(|_| AuthMethod::QueryParam)
            }
            AuthStrategy::NoAuth => {
                let request = self.client.get(self.url.clone());
                self.probe(request).await.map(|_| AuthMethod::None)
            }
        }
    }

    async fn form_login(&self) -> Result<AuthMethod> {
        let response = self
            .client
            .post(self.login_url.clone())
            .header(REFERER, &self.referer)
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::transport(format!("login request failed: {}", e)))?;

        debug!(status = %response.status(), "Form login response");

        auth::session_cookie(response.headers())
            .map(AuthMethod::SessionCookie)
            .ok_or_else(|| Error::auth(format!("no {} cookie in login response", auth::SESSION_COOKIE)))
    }

    /// Send a trial request; it validates if the server answers with JSON
    async fn probe(&self, request: RequestBuilder) -> Result<()> {
        let response = request
            .header(REFERER, &self.referer)
            .send()
            .await
            .map_err(|e| Error::transport(format!("probe request failed: {}", e)))?;

        let content_type = content_type(&response);
        debug!(status = %response.status(), content_type = %content_type, "Probe response");

        if content_type.contains("application/json") {
            Ok(())
        } else {
            Err(Error::auth(format!(
                "not accepted (status {}, content-type {:?})",
                response.status().as_u16(),
                content_type
            )))
        }
    }

    /// Fetch with transient-failure retries
    async fn fetch_with_retry(&self, method: &AuthMethod) -> Result<AircraftList> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(method).await {
                Ok(list) => return Ok(list),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_delay * attempt as u32;
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One poll request
    ///
    /// A redirect to the login page is reported as `Error::SessionExpired`.
    async fn fetch_once(&self, method: &AuthMethod) -> Result<AircraftList> {
        let query = filter_query(&self.filters, &self.location);

        let mut request = self
            .client
            .get(self.url.clone())
            .query(&query)
            .header(REFERER, &self.referer);

        request = match method {
            AuthMethod::None => request,
            AuthMethod::Basic => request.basic_auth(&self.username, Some(&self.password)),
            AuthMethod::SessionCookie(cookie) => request.header(COOKIE, cookie.as_str()),
            AuthMethod::QueryParam => request.query(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ]),
        };

        debug!(
            url = %self.url,
            filters = query.len(),
            auth = method.name(),
            "Sending HTTP request"
        );

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        debug!(status = %status, content_type = %content_type(&response), "Received HTTP response");

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if location.contains("login") {
                return Err(Error::session_expired(format!("redirected to {}", location)));
            }
        }

        if status != StatusCode::OK {
            let snippet = body_snippet(response).await;
            return Err(Error::http(
                status.as_u16(),
                format!(
                    "{} {}",
                    status.canonical_reason().unwrap_or("Unexpected status"),
                    snippet
                )
                .trim_end()
                .to_string(),
            ));
        }

        let content_type = content_type(&response);
        if !content_type.starts_with("application/json") {
            return Err(Error::provider(
                "vrs",
                format!("expected JSON response, got content-type: {:?}", content_type),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(format!("failed to read response body: {}", e)))?;

        let list = AircraftList::from_slice(&body)?;

        info!(
            url = %self.url,
            total_aircraft = list.total_ac,
            aircraft_count = list.aircraft.len(),
            timestamp = list.stm,
            filters_applied = query.len(),
            "Successfully fetched aircraft data"
        );

        Ok(list)
    }
}

fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn body_snippet(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(BODY_SNIPPET_CHARS)
        .collect()
}

#[async_trait]
impl AircraftFeed for VrsFeed {
    /// Fetch the current aircraft list
    ///
    /// # Errors
    ///
    /// - `Error::Authentication`: every strategy failed
    /// - `Error::SessionExpired`: redirected to login again after re-authenticating
    /// - `Error::Transport` / `Error::Http`: after retries where applicable
    /// - `Error::Provider`: non-JSON response
    /// - `Error::Decode`: malformed aircraft list
    async fn fetch(&self) -> Result<AircraftList> {
        // Serializes fetches so only one of them ever authenticates
        let mut session = self.session.lock().await;

        if session.is_none() && self.has_credentials() {
            *session = Some(self.authenticate().await?);
        }
        let method = session.clone().unwrap_or(AuthMethod::None);

        match self.fetch_with_retry(&method).await {
            Err(Error::SessionExpired(location)) => {
                info!(%location, "Session expired, attempting to login again");
                *session = None;

                if !self.has_credentials() {
                    return Err(Error::auth(
                        "server requires login but no credentials are configured",
                    ));
                }

                let method = self.authenticate().await?;
                *session = Some(method.clone());

                match self.fetch_with_retry(&method).await {
                    Err(Error::SessionExpired(location)) => {
                        *session = None;
                        Err(Error::session_expired(format!(
                            "still redirected to login after re-authentication ({})",
                            location
                        )))
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    fn feed_name(&self) -> &'static str {
        "vrs"
    }
}

/// Factory for creating VRS feeds
pub struct VrsFeedFactory;

impl AircraftFeedFactory for VrsFeedFactory {
    fn create(&self, config: &GodarConfig) -> Result<Box<dyn AircraftFeed>> {
        Ok(Box::new(VrsFeed::new(config)?))
    }
}

/// Register the VRS feed with a registry under `"vrs"`
///
/// # Example
///
/// ```rust
/// use godar_core::Registry;
///
/// let registry = Registry::new();
/// godar_feed_vrs::register(&registry).unwrap();
/// assert!(registry.has_feed("vrs"));
/// ```
pub fn register(registry: &Registry) -> Result<()> {
    registry.register_feed("vrs", Box::new(VrsFeedFactory))
}
