use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header_exists, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use snapsweep_application::EmailService;
use snapsweep_core::{AppError, AppResult};
use snapsweep_domain::EmailAddress;

use super::{AcsEmailConfig, AcsEmailService, content_sha256};

/// Matches requests whose `Authorization` header carries the shared-key
/// HMAC scheme with the expected signed-header list.
struct HmacAuthorization;

impl Match for HmacAuthorization {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| {
                value.starts_with(
                    "HMAC-SHA256 SignedHeaders=x-ms-date;host;x-ms-content-sha256&Signature=",
                )
            })
    }
}

fn service(server: &MockServer) -> AppResult<AcsEmailService> {
    let connection_string = format!(
        "endpoint={};accesskey={}",
        server.uri(),
        BASE64.encode(b"unit-test-access-key")
    );
    Ok(AcsEmailService::new(
        reqwest::Client::new(),
        AcsEmailConfig::from_connection_string(&connection_string)?,
        EmailAddress::new("reports@example.com")?,
    ))
}

#[test]
fn parses_connection_string_parts() -> AppResult<()> {
    let config = AcsEmailConfig::from_connection_string(
        "endpoint=https://sweeper.communication.azure.com/;accesskey=c2VjcmV0",
    )?;
    assert_eq!(config.endpoint(), "https://sweeper.communication.azure.com");
    Ok(())
}

#[test]
fn connection_string_without_access_key_is_rejected() {
    let result =
        AcsEmailConfig::from_connection_string("endpoint=https://sweeper.communication.azure.com");
    assert!(matches!(result, Err(AppError::Configuration(_))));
}

#[test]
fn connection_string_without_endpoint_is_rejected() {
    let result = AcsEmailConfig::from_connection_string("accesskey=c2VjcmV0");
    assert!(matches!(result, Err(AppError::Configuration(_))));
}

#[test]
fn content_hash_matches_known_sha256() {
    // SHA-256 of the empty input, base64-encoded.
    assert_eq!(
        content_sha256(b""),
        "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
    );
}

#[tokio::test]
async fn sends_signed_request_and_accepts_202() -> AppResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails:send"))
        .and(query_param("api-version", "2023-03-31"))
        .and(header_exists("x-ms-date"))
        .and(header_exists("x-ms-content-sha256"))
        .and(HmacAuthorization)
        .and(body_partial_json(json!({
            "senderAddress": "reports@example.com",
            "recipients": { "to": [ { "address": "ops@example.com" } ] },
            "content": { "subject": "1 Snapshot(s) Deleted" },
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "status": "Running",
        })))
        .expect(1)
        .mount(&server)
        .await;

    service(&server)?
        .send_email(
            "ops@example.com",
            "1 Snapshot(s) Deleted",
            "/subscriptions/sub-1/snapshots/orphan",
            None,
        )
        .await
}

#[tokio::test]
async fn rejection_status_is_a_delivery_error() -> AppResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails:send"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad signature"))
        .mount(&server)
        .await;

    let result = service(&server)?
        .send_email("ops@example.com", "No snapshots deleted", "", None)
        .await;

    assert!(matches!(result, Err(AppError::Delivery(_))));
    Ok(())
}

#[tokio::test]
async fn garbage_access_key_fails_before_any_request() -> AppResult<()> {
    let config =
        AcsEmailConfig::from_connection_string("endpoint=https://sweeper.example.com;accesskey=!!")?;
    let service = AcsEmailService::new(
        reqwest::Client::new(),
        config,
        EmailAddress::new("reports@example.com")?,
    );

    let result = service
        .send_email("ops@example.com", "No snapshots deleted", "", None)
        .await;

    assert!(matches!(result, Err(AppError::Configuration(_))));
    Ok(())
}
