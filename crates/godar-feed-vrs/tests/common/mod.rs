//! Local mock Virtual Radar Server for feed tests
//!
//! Each test builds a small axum router that scripts one server behavior
//! (login page, auth scheme, redirects, failures) and serves it on an
//! ephemeral port.

#![allow(dead_code)]

use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use godar_core::config::GodarConfig;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Path the feed is served from
pub const FEED_PATH: &str = "/VirtualRadar/AircraftList.json";

/// `Authorization` header for pilot:hunter2
pub const BASIC_PILOT: &str = "Basic cGlsb3Q6aHVudGVyMg==";

/// A one-aircraft list using the string forms of the polymorphic fields
pub const AIRCRAFT_JSON: &str = r#"{
    "lastDv": "638400000000000000",
    "totalAc": 12,
    "src": 1,
    "stm": 1700000000000,
    "acList": [
        {"Id": 1, "Icao": "ABCDEF", "Call": "TEST123", "Type": "A320",
         "Alt": 38000, "Lat": 51.6, "Long": -0.1, "Spd": 450.5,
         "Sqk": "7500", "WTC": 2, "Mil": false}
    ]
}"#;

pub fn json(body: &'static str) -> Response {
    ([(header::CONTENT_TYPE, "application/json; charset=utf-8")], body).into_response()
}

pub fn html(body: &'static str) -> Response {
    ([(header::CONTENT_TYPE, "text/html")], body).into_response()
}

pub fn redirect_to_login() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/login.php")]).into_response()
}

pub fn status(code: StatusCode) -> Response {
    (code, [(header::CONTENT_TYPE, "text/plain")], "error").into_response()
}

/// One request as the mock server saw it
#[derive(Debug, Clone)]
pub struct Seen {
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
}

impl Seen {
    pub fn header(&self, name: header::HeaderName) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// Shared log of requests to one route
#[derive(Debug, Clone, Default)]
pub struct Requests(Arc<Mutex<Vec<Seen>>>);

impl Requests {
    pub fn record(&self, query: HashMap<String, String>, headers: HeaderMap) -> usize {
        let mut seen = self.0.lock().unwrap();
        seen.push(Seen { query, headers });
        seen.len()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<Seen> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> Seen {
        self.0.lock().unwrap().last().cloned().expect("at least one request")
    }
}

/// Serve `router` on 127.0.0.1 and return its address
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Configuration pointing at a mock server, with instant retries
pub fn config_for(addr: SocketAddr) -> GodarConfig {
    let mut config = GodarConfig::new(format!("http://{}{}", addr, FEED_PATH));
    config.server.retry_delay_secs = 0;
    config.server.request_timeout_secs = 5;
    config
}

/// Same as [`config_for`] with pilot:hunter2 credentials
pub fn config_with_credentials(addr: SocketAddr) -> GodarConfig {
    let mut config = config_for(addr);
    config.server.username = "pilot".to_string();
    config.server.password = "hunter2".to_string();
    config
}
