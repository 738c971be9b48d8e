//! GeoIP lookups against a mock HTTP service.

use f2b_client::{ErrorKind, Fail2BanSocket, GeoIpClient, GeoIpError};
use f2b_test_utils::FakeDaemon;
use serde_json::json;
use std::collections::BTreeSet;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn city(ip: &str, geo_id: i64, country: &str, name: &str) -> serde_json::Value {
    json!({
        "Ip": ip,
        "Network": format!("{ip}/32"),
        "GeoId": geo_id,
        "CountryCode": country,
        "CountryName": country,
        "CityName": name,
        "Lat": 1.5,
        "Lon": -2.5,
    })
}

fn ips(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|ip| (*ip).to_string()).collect()
}

fn client(server: &MockServer) -> GeoIpClient {
    GeoIpClient::new(&format!("{}/geoip", server.uri())).unwrap()
}

#[tokio::test]
async fn test_lookup_groups_by_geo_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/geoip"))
        .and(body_string("ips=192.0.2.1%2C192.0.2.2%2C203.0.113.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "city": [
                city("192.0.2.1", 7, "FR", "Paris"),
                city("192.0.2.2", 7, "FR", "Paris"),
                city("203.0.113.9", 9, "DE", "Berlin"),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut located = client(&server)
        .lookup(&ips(&["192.0.2.1", "192.0.2.2", "203.0.113.9"]))
        .await
        .unwrap();
    located.sort_by_key(|record| record.geo_id);

    assert_eq!(located.len(), 2);
    assert_eq!((located[0].geo_id, located[0].count), (7, 2));
    assert_eq!(located[0].ip, "192.0.2.1");
    assert_eq!(located[0].city_name, "Paris");
    assert_eq!((located[1].geo_id, located[1].count), (9, 1));
}

#[tokio::test]
async fn test_empty_city_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "city": [] })))
        .mount(&server)
        .await;

    let located = client(&server)
        .lookup(&ips(&["192.0.2.1"]))
        .await
        .unwrap();
    assert!(located.is_empty());
}

#[tokio::test]
async fn test_missing_city_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "country": [] })))
        .mount(&server)
        .await;

    let err = client(&server)
        .lookup(&ips(&["192.0.2.1"]))
        .await
        .unwrap_err();
    assert!(matches!(err, GeoIpError::Decode(_)));
}

#[tokio::test]
async fn test_http_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server)
        .lookup(&ips(&["192.0.2.1"]))
        .await
        .unwrap_err();
    assert!(matches!(err, GeoIpError::Status(503)));
}

#[tokio::test]
async fn test_empty_set_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "city": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let located = client(&server).lookup(&BTreeSet::new()).await.unwrap();
    assert!(located.is_empty());
}

#[tokio::test]
async fn test_banned_locations_sends_each_address_once() {
    let daemon = FakeDaemon::two_jails().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/geoip"))
        .and(body_string("ips=192.0.2.1%2C198.51.100.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "city": [
                city("192.0.2.1", 7, "FR", "Paris"),
                city("198.51.100.2", 7, "FR", "Paris"),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let geoip = client(&server);
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();
    let located = socket.banned_locations(&geoip).await.unwrap();

    assert_eq!(located.len(), 1);
    assert_eq!(located[0].count, 2);
}

#[tokio::test]
async fn test_banned_locations_lookup_failure_is_bad_format() {
    let daemon = FakeDaemon::two_jails().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let geoip = client(&server);
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();
    let err = socket.banned_locations(&geoip).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BadFormat);
    assert_eq!(err.command(), "banned");
}
