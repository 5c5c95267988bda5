//! Session and fetch-normalization tests against a mock management API.

use arrayfetcher::{resources, ArrayClient, FetchError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/deviceManager/rest/xxxxx/sessions"))
        .and(body_partial_json(json!({"scope": "0"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"deviceid": "dev-1", "iBaseToken": "token-1"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_captures_device_and_token() {
    let server = MockServer::start().await;
    mock_login(&server).await;

    let client = ArrayClient::login(&server.uri(), "admin", "secret", false)
        .await
        .expect("login should succeed");
    assert_eq!(client.device_id(), "dev-1");
}

#[tokio::test]
async fn login_without_token_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deviceManager/rest/xxxxx/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"deviceid": "dev-1"}
        })))
        .mount(&server)
        .await;

    let err = ArrayClient::login(&server.uri(), "admin", "secret", false)
        .await
        .expect_err("login must fail without iBaseToken");
    assert!(matches!(err, FetchError::Login(_)));
}

#[tokio::test]
async fn resource_list_returns_records_in_order() {
    let server = MockServer::start().await;
    mock_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/deviceManager/rest/dev-1/controller"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"ID": "0A"}, {"ID": "0B"}]
        })))
        .mount(&server)
        .await;

    let client = ArrayClient::login(&server.uri(), "admin", "secret", false)
        .await
        .unwrap();
    let records = client.resource_list(resources::CONTROLLER).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["ID"], "0A");
    assert_eq!(records[1]["ID"], "0B");
}

#[tokio::test]
async fn system_object_payload_becomes_single_record() {
    let server = MockServer::start().await;
    mock_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/deviceManager/rest/dev-1/system/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"NAME": "array-01", "SECTORSIZE": "512"}
        })))
        .mount(&server)
        .await;

    let client = ArrayClient::login(&server.uri(), "admin", "secret", false)
        .await
        .unwrap();
    let records = client.resource_list(resources::SYSTEM).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["NAME"], "array-01");
}

#[tokio::test]
async fn fetch_failures_normalize_to_empty() {
    let server = MockServer::start().await;
    mock_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/deviceManager/rest/dev-1/lun"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/deviceManager/rest/dev-1/disk"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/deviceManager/rest/dev-1/host"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": {"code": 0}})))
        .mount(&server)
        .await;

    let client = ArrayClient::login(&server.uri(), "admin", "secret", false)
        .await
        .unwrap();
    assert!(client.resource_list(resources::LUN).await.is_empty());
    assert!(client.resource_list(resources::DISK).await.is_empty());
    assert!(client.resource_list(resources::HOST).await.is_empty());
}
