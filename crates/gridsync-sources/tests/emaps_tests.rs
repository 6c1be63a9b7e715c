// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Electricity Maps client against a wiremock server.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gridsync_core::{FieldValue, GridsyncError};
use gridsync_sources::{EmapsClient, normalize_carbon_intensity, normalize_power_breakdown};

fn client(server: &MockServer, token: Option<&str>) -> EmapsClient {
    let token = token.map(|t| SecretString::from(t.to_string()));
    EmapsClient::new(
        format!("{}/v3/power-breakdown/history", server.uri()),
        format!("{}/v3/carbon-intensity/history", server.uri()),
        token.as_ref(),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn history_requests_send_the_auth_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/power-breakdown/history"))
        .and(header("auth-token", "emaps-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zone": "TR",
            "history": [{
                "datetime": "2025-01-01T00:00:00.000Z",
                "zone": "TR",
                "powerConsumptionTotal": 100,
                "powerProductionBreakdown": {"wind": 50, "gas": 50}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/carbon-intensity/history"))
        .and(header("auth-token", "emaps-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zone": "TR",
            "temporalGranularity": "hourly",
            "history": [{"datetime": "2025-01-01T00:00:00.000Z", "carbonIntensity": 700}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Some("emaps-key"));

    let power = normalize_power_breakdown(&client.fetch_power_breakdown().await.unwrap()).unwrap();
    assert_eq!(power[0].get("percent_renewable"), Some(&FieldValue::Float(50.0)));

    let carbon = normalize_carbon_intensity(&client.fetch_carbon_intensity().await.unwrap()).unwrap();
    assert_eq!(carbon[0].get("carbon_level"), Some(&FieldValue::Text("Very High".into())));
    assert_eq!(carbon[0].get("zone"), Some(&FieldValue::Text("TR".into())));
}

#[tokio::test]
async fn unauthorized_is_a_plain_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, None).fetch_carbon_intensity().await.unwrap_err();
    assert!(!err.is_credential_rejection());
    match err {
        GridsyncError::Fetch { message, .. } => assert!(message.contains("401"), "{message}"),
        other => panic!("expected Fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_a_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client(&server, Some("k")).fetch_power_breakdown().await.unwrap_err();
    assert!(matches!(err, GridsyncError::Fetch { .. }), "{err:?}");
}
