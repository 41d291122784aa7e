//! Poll request behavior against a mock VRS
//!
//! Covers filters, response validation, retries and session expiry.

mod common;

use axum::Router;
use axum::extract::{Form, Query};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, get, post};
use common::*;
use godar_core::traits::AircraftFeed;
use godar_core::Error;
use godar_feed_vrs::{AuthMethod, VrsFeed};
use std::collections::HashMap;

type Params = HashMap<String, String>;

/// Feed route that records each request and answers with `respond(hit)`,
/// where `hit` counts from 1
fn feed_route(requests: Requests, respond: fn(usize) -> Response) -> MethodRouter {
    get(move |Query(query): Query<Params>, headers: HeaderMap| {
        let requests = requests.clone();
        async move {
            let hit = requests.record(query, headers);
            respond(hit)
        }
    })
}

/// Login route that hands out `RAuth=tok<n>` on the n-th login
fn numbered_login(login: Requests) -> MethodRouter {
    post(move |headers: HeaderMap, Form(form): Form<Params>| {
        let login = login.clone();
        async move {
            let hit = login.record(form, headers);
            let cookie = format!("RAuth=tok{}; Path=/", hit);
            ([(header::SET_COOKIE, cookie)], "welcome").into_response()
        }
    })
}

#[tokio::test]
async fn filters_are_sent_as_query_parameters() {
    let requests = Requests::default();
    let addr = serve(Router::new().route(FEED_PATH, feed_route(requests.clone(), |_| json(AIRCRAFT_JSON)))).await;

    let mut config = config_for(addr);
    config.filters.aircraft_type = "B738".to_string();
    config.filters.min_altitude = 5000;
    config.filters.military = true;
    config.filters.flight_number = "RYR".to_string();
    config.location.latitude = 51.5;
    config.location.longitude = -0.1;
    config.location.max_distance = 25.0;

    let feed = VrsFeed::new(&config).unwrap();
    let list = feed.fetch().await.unwrap();
    assert_eq!(list.total_ac, 12);

    let query = requests.last().query;
    let get = |key: &str| query.get(key).map(String::as_str);
    assert_eq!(get("fTypQ"), Some("B738"));
    assert_eq!(get("fAltL"), Some("5000"));
    assert_eq!(get("fAltU"), None);
    assert_eq!(get("fMilQ"), Some("1"));
    assert_eq!(get("fOpQ"), None);
    assert_eq!(get("fCallQ"), Some("RYR"));
    assert_eq!(get("lat"), Some("51.5"));
    assert_eq!(get("lng"), Some("-0.1"));
    assert_eq!(get("fDstU"), Some("25"));
}

#[tokio::test]
async fn default_config_sends_no_query() {
    let requests = Requests::default();
    let addr = serve(Router::new().route(FEED_PATH, feed_route(requests.clone(), |_| json(AIRCRAFT_JSON)))).await;

    let feed = VrsFeed::new(&config_for(addr)).unwrap();
    feed.fetch().await.unwrap();

    let seen = requests.last();
    assert!(seen.query.is_empty(), "unexpected query {:?}", seen.query);
    assert_eq!(seen.header(header::ACCEPT).as_deref(), Some("application/json"));
    assert!(seen.header(header::USER_AGENT).is_some_and(|ua| ua.starts_with("Mozilla/5.0")));
}

#[tokio::test]
async fn configured_user_agent_is_used() {
    let requests = Requests::default();
    let addr = serve(Router::new().route(FEED_PATH, feed_route(requests.clone(), |_| json(AIRCRAFT_JSON)))).await;

    let mut config = config_for(addr);
    config.server.user_agent = Some("godar-test/1.0".to_string());

    VrsFeed::new(&config).unwrap().fetch().await.unwrap();
    assert_eq!(requests.last().header(header::USER_AGENT).as_deref(), Some("godar-test/1.0"));
}

#[tokio::test]
async fn decodes_polymorphic_fields() {
    let addr = serve(Router::new().route(FEED_PATH, feed_route(Requests::default(), |_| json(AIRCRAFT_JSON)))).await;

    let list = VrsFeed::new(&config_for(addr)).unwrap().fetch().await.unwrap();
    let aircraft = &list.aircraft[0];
    assert_eq!(aircraft.icao, "ABCDEF");
    assert_eq!(aircraft.call, "TEST123");
    assert_eq!(aircraft.sqk.value(), 7500);
    assert_eq!(aircraft.wtc.as_str(), "2");
    assert_eq!(list.last_dv.value(), 638_400_000_000_000_000);
}

#[tokio::test]
async fn non_json_response_is_a_provider_error() {
    let requests = Requests::default();
    let addr = serve(Router::new().route(FEED_PATH, feed_route(requests.clone(), |_| html("<html>maintenance</html>")))).await;

    let err = VrsFeed::new(&config_for(addr)).unwrap().fetch().await.unwrap_err();

    assert!(matches!(err, Error::Provider { .. }), "{}", err);
    assert!(err.to_string().contains("text/html"));
    assert_eq!(requests.count(), 1);
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let requests = Requests::default();
    let addr = serve(Router::new().route(FEED_PATH, feed_route(requests.clone(), |_| status(StatusCode::NOT_FOUND)))).await;

    let err = VrsFeed::new(&config_for(addr)).unwrap().fetch().await.unwrap_err();

    assert!(matches!(err, Error::Http { status: 404, .. }), "{}", err);
    assert_eq!(requests.count(), 1);
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let requests = Requests::default();
    let addr = serve(Router::new().route(
        FEED_PATH,
        feed_route(requests.clone(), |hit| {
            if hit < 3 {
                status(StatusCode::SERVICE_UNAVAILABLE)
            } else {
                json(AIRCRAFT_JSON)
            }
        }),
    ))
    .await;

    let list = VrsFeed::new(&config_for(addr)).unwrap().fetch().await.unwrap();

    assert_eq!(list.aircraft.len(), 1);
    assert_eq!(requests.count(), 3);
}

#[tokio::test]
async fn retries_are_bounded() {
    let requests = Requests::default();
    let addr = serve(Router::new().route(
        FEED_PATH,
        feed_route(requests.clone(), |_| status(StatusCode::INTERNAL_SERVER_ERROR)),
    ))
    .await;

    let mut config = config_for(addr);
    config.server.max_retries = 2;

    let err = VrsFeed::new(&config).unwrap().fetch().await.unwrap_err();

    assert!(matches!(err, Error::Http { status: 500, .. }), "{}", err);
    assert_eq!(requests.count(), 3);
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let addr = serve(Router::new().route(FEED_PATH, feed_route(Requests::default(), |_| json("{\"acList\": [")))).await;

    let err = VrsFeed::new(&config_for(addr)).unwrap().fetch().await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)), "{}", err);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = config_for(addr);
    config.server.max_retries = 1;

    let err = VrsFeed::new(&config).unwrap().fetch().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{}", err);
}

#[tokio::test]
async fn expired_session_logs_in_again_and_retries() {
    let login = Requests::default();
    let requests = Requests::default();

    let router = Router::new().route("/login.php", numbered_login(login.clone())).route(
        FEED_PATH,
        get({
            let requests = requests.clone();
            move |Query(query): Query<Params>, headers: HeaderMap| {
                let requests = requests.clone();
                async move {
                    // Only the second session is honoured
                    let valid = headers
                        .get(header::COOKIE)
                        .is_some_and(|c| c == "RAuth=tok2");
                    requests.record(query, headers);
                    if valid { json(AIRCRAFT_JSON) } else { redirect_to_login() }
                }
            }
        }),
    );
    let addr = serve(router).await;

    let feed = VrsFeed::new(&config_with_credentials(addr)).unwrap();
    let list = feed.fetch().await.unwrap();

    assert_eq!(list.aircraft.len(), 1);
    assert_eq!(login.count(), 2);
    assert_eq!(requests.count(), 2);
    assert_eq!(
        feed.auth_method().await,
        Some(AuthMethod::SessionCookie("RAuth=tok2".to_string()))
    );
}

#[tokio::test]
async fn repeated_login_redirect_is_session_expired() {
    let login = Requests::default();
    let requests = Requests::default();

    let router = Router::new()
        .route("/login.php", numbered_login(login.clone()))
        .route(FEED_PATH, feed_route(requests.clone(), |_| redirect_to_login()));
    let addr = serve(router).await;

    let feed = VrsFeed::new(&config_with_credentials(addr)).unwrap();
    let err = feed.fetch().await.unwrap_err();

    assert!(matches!(err, Error::SessionExpired(_)), "{}", err);
    assert_eq!(login.count(), 2);
    assert_eq!(requests.count(), 2);
    assert_eq!(feed.auth_method().await, None);
}

#[tokio::test]
async fn login_redirect_without_credentials_is_an_auth_error() {
    let requests = Requests::default();
    let addr = serve(Router::new().route(FEED_PATH, feed_route(requests.clone(), |_| redirect_to_login()))).await;

    let err = VrsFeed::new(&config_for(addr)).unwrap().fetch().await.unwrap_err();

    assert!(matches!(err, Error::Authentication(_)), "{}", err);
    assert_eq!(requests.count(), 1);
}

#[tokio::test]
async fn redirect_elsewhere_is_an_http_error() {
    let addr = serve(Router::new().route(
        FEED_PATH,
        feed_route(Requests::default(), |_| {
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/maintenance.html")]).into_response()
        }),
    ))
    .await;

    let err = VrsFeed::new(&config_for(addr)).unwrap().fetch().await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 301, .. }), "{}", err);
}
