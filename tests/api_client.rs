//! HTTP-level tests for the departures client: routing between proxy and
//! direct paths, failure reporting and status mapping.
//!
//! A plain HTTP mock server stands in for a forward proxy: reqwest sends it
//! absolute-form requests, which it answers like any other request. The API
//! base URL must therefore be `http://`.

mod helpers;

use std::sync::Arc;

use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flight_ingest::api::{DepartureFetcher, DepartureRequest, FlightRadarClient, Route};
use flight_ingest::error_handling::FetchError;
use flight_ingest::proxy::ProxyEndpoint;

use helpers::{departure, departures_payload, RecordingProxySource};

fn api_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/common/v1/airport.json", server.uri())).expect("url")
}

fn client_for(server: &MockServer) -> FlightRadarClient {
    FlightRadarClient::new()
        .expect("client")
        .with_base_url(api_url(server))
}

fn mapping_for(server: &MockServer) -> flight_ingest::proxy::ProxyMapping {
    let address = server.address();
    ProxyEndpoint::new(address.ip().to_string(), address.port())
        .expect("endpoint")
        .mapping()
}

fn payload() -> serde_json::Value {
    departures_payload(vec![departure("NH10", 1_700_000_000, "JFK")])
}

#[tokio::test]
async fn test_direct_request_sends_expected_query() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/common/v1/airport.json"))
        .and(query_param("code", "NRT"))
        .and(query_param("page", "-2"))
        .and(query_param("limit", "100"))
        .and(query_param("plugin[]", "schedule"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
        .expect(1)
        .mount(&api)
        .await;

    let client = client_for(&api);
    let body = client
        .fetch_departures(&DepartureRequest::new("NRT", -2, 100), Route::Auto)
        .await
        .expect("payload");
    assert!(body["result"]["response"].is_object());
}

#[tokio::test]
async fn test_auto_route_goes_through_proxy() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
        .expect(0)
        .mount(&api)
        .await;

    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("code", "HND"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
        .expect(1)
        .mount(&proxy)
        .await;

    let source = Arc::new(RecordingProxySource::new(mapping_for(&proxy)));
    let client = client_for(&api).with_proxy_source(source.clone());
    assert!(client.has_proxy_source());

    client
        .fetch_departures(&DepartureRequest::new("HND", 1, 10), Route::Auto)
        .await
        .expect("payload via proxy");
    assert!(source.reported().is_empty());
}

#[tokio::test]
async fn test_direct_route_bypasses_proxy_source() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
        .expect(1)
        .mount(&api)
        .await;

    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&proxy)
        .await;

    let source = Arc::new(RecordingProxySource::new(mapping_for(&proxy)));
    let client = client_for(&api).with_proxy_source(source);
    client
        .fetch_departures(&DepartureRequest::new("HND", 1, 10), Route::Direct)
        .await
        .expect("direct payload");
}

#[tokio::test]
async fn test_transport_failure_reports_proxy_once() {
    let api = MockServer::start().await;
    let dead = ProxyEndpoint::new("127.0.0.1", 1).expect("endpoint").mapping();
    let source = Arc::new(RecordingProxySource::new(dead.clone()));
    let client = client_for(&api).with_proxy_source(source.clone());

    let err = client
        .fetch_departures(&DepartureRequest::new("KIX", 1, 10), Route::Auto)
        .await
        .expect_err("dead proxy");
    assert!(matches!(err, FetchError::Transport(_)), "{err:?}");
    assert_eq!(source.reported(), vec![dead]);
}

#[tokio::test]
async fn test_http_status_does_not_report_proxy() {
    let api = MockServer::start().await;
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&proxy)
        .await;

    let source = Arc::new(RecordingProxySource::new(mapping_for(&proxy)));
    let client = client_for(&api).with_proxy_source(source.clone());
    let err = client
        .fetch_departures(&DepartureRequest::new("KIX", 1, 10), Route::Auto)
        .await
        .expect_err("502");
    assert!(matches!(err, FetchError::Status(502)), "{err:?}");
    assert!(source.reported().is_empty());
}

#[tokio::test]
async fn test_rate_limit_surfaces_retry_after() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "17"))
        .mount(&api)
        .await;

    let err = client_for(&api)
        .fetch_departures(&DepartureRequest::new("ITM", 1, 10), Route::Direct)
        .await
        .expect_err("429");
    assert!(err.is_rate_limited());
    assert_eq!(err.retry_after(), Some("17"));
}

#[tokio::test]
async fn test_rate_limit_without_header() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&api)
        .await;

    let err = client_for(&api)
        .fetch_departures(&DepartureRequest::new("ITM", 1, 10), Route::Direct)
        .await
        .expect_err("429");
    assert!(matches!(err, FetchError::RateLimited { retry_after: None }));
}

#[tokio::test]
async fn test_undecodable_body_is_decode_error() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&api)
        .await;

    let err = client_for(&api)
        .fetch_departures(&DepartureRequest::new("CTS", 1, 10), Route::Direct)
        .await
        .expect_err("not json");
    assert!(matches!(err, FetchError::Decode(_)), "{err:?}");
}
