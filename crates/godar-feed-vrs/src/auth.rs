// # VRS Authentication
//
// Virtual Radar Server installations are fronted by a variety of login
// schemes. The feed tries them in a fixed order the first time it needs a
// session and remembers whichever one worked.
//
// ## Chain
//
// 1. Form login: POST username/password to `login.php`, keep the `rauth`
//    cookie from `Set-Cookie`
// 2. HTTP Basic Auth, probed with a GET that must return JSON
// 3. `username`/`password` query parameters, probed the same way
// 4. No authentication, probed the same way
//
// ## Security
//
// The password and the captured cookie never appear in logs or `Debug`
// output.

use reqwest::header::{HeaderMap, SET_COOKIE};
use std::fmt;

/// Name of the session cookie set by the VRS login page (matched case-insensitively)
pub const SESSION_COOKIE: &str = "rauth";

/// How requests are authenticated once a strategy has succeeded
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// The server serves the feed without credentials
    None,
    /// `Authorization: Basic ...` on every request
    Basic,
    /// `Cookie: <name>=<value>` on every request
    SessionCookie(String),
    /// `username` and `password` query parameters on every request
    QueryParam,
}

impl AuthMethod {
    pub fn name(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Basic => "basic",
            AuthMethod::SessionCookie(_) => "session-cookie",
            AuthMethod::QueryParam => "query-param",
        }
    }
}

// Custom Debug implementation that hides the session cookie
impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::SessionCookie(_) => f.write_str("SessionCookie(<REDACTED>)"),
            AuthMethod::None => f.write_str("None"),
            AuthMethod::Basic => f.write_str("Basic"),
            AuthMethod::QueryParam => f.write_str("QueryParam"),
        }
    }
}

/// One step of the authentication fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    FormLogin,
    BasicAuth,
    QueryParam,
    NoAuth,
}

impl AuthStrategy {
    /// Strategies in the order they are attempted
    pub const CHAIN: [AuthStrategy; 4] = [
        AuthStrategy::FormLogin,
        AuthStrategy::BasicAuth,
        AuthStrategy::QueryParam,
        AuthStrategy::NoAuth,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AuthStrategy::FormLogin => "form login",
            AuthStrategy::BasicAuth => "basic auth",
            AuthStrategy::QueryParam => "query-param auth",
            AuthStrategy::NoAuth => "no auth",
        }
    }
}

impl fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Find the session cookie among `Set-Cookie` headers
///
/// Returns the `name=value` pair exactly as the server named it.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| {
            let pair = cookie.split(';').next()?.trim();
            let (name, value) = pair.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case(SESSION_COOKIE)
                .then(|| format!("{}={}", name.trim(), value.trim()))
        })
        .next()
}
