//! Router-level tests: request in, JSON out. The linkage service is mocked
//! where an endpoint needs one.

mod common;

use axum::http::StatusCode;
use common::{body_json, body_text, build_test_app, get, post_json, post_raw, test_config};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_linkage(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sessionId": "sess-1" })))
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/sessions/sess-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

#[tokio::test]
async fn healthz_answers_ok() {
    let (app, _state) = build_test_app(test_config("http://127.0.0.1:9", false));

    let response = get(app, "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let (app, _state) = build_test_app(test_config("http://127.0.0.1:9", false));

    let response = get(app, "/healthz").await;
    let id = response
        .headers()
        .get("x-request-id")
        .expect("missing x-request-id header")
        .to_str()
        .unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn unknown_routes_return_404() {
    let (app, _state) = build_test_app(test_config("http://127.0.0.1:9", false));

    let response = get(app, "/definitely-not-a-route").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_patient_tokens_end_to_end() {
    let server = MockServer::start().await;
    mock_linkage(&server).await;
    Mock::given(method("POST"))
        .and(path("/sessions/sess-1/tokens"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "tok-1" })))
        .expect(2)
        .mount(&server)
        .await;

    let (app, _state) = build_test_app(test_config(&server.uri(), false));

    let response = post_json(app, "/tokens/addPatient", json!({ "count": 2 })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["useCallback"], false);
    assert_eq!(body["urlTokens"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["urlTokens"][0],
        format!("{}/patients?tokenId=tok-1", server.uri())
    );
}

#[tokio::test]
async fn read_patients_reports_invalid_pseudonyms() {
    let server = MockServer::start().await;
    mock_linkage(&server).await;
    Mock::given(method("POST"))
        .and(path("/sessions/sess-1/tokens"))
        .and(wiremock::matchers::body_string_contains("ghost"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string("No patient found with provided pid 'ghost'."),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sessions/sess-1/tokens"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "tok-read" })))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _state) = build_test_app(test_config(&server.uri(), false));

    let response = post_json(
        app,
        "/tokens/readPatients",
        json!({ "pseudonyms": ["known", "ghost"], "resultFields": ["pseudonym"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(
        body["url"],
        format!("{}/patients?tokenId=tok-read", server.uri())
    );
    assert_eq!(body["invalidPseudonyms"], json!(["ghost"]));
}

#[tokio::test]
async fn an_unreachable_linkage_service_maps_to_service_unavailable() {
    let (app, _state) = build_test_app(test_config("http://127.0.0.1:9", false));

    let response = post_json(app, "/tokens/addPatient", json!({ "count": 1 })).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let text = body_text(response).await;
    assert!(text.contains("linkage service"));
}

#[tokio::test]
async fn callback_intake_feeds_send_and_request() {
    let (app, state) = build_test_app(test_config("http://127.0.0.1:9", true));

    // the linkage service reports a token→pseudonym pair
    let response = post_json(
        app.clone(),
        "/patients/send/pseudonyms",
        json!({ "tokenId": "tok-1", "ids": [{ "idString": "psn-1" }] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.store.get("tok-1").as_deref(), Some("psn-1"));

    // a record submitted under that token lands in the backend
    let response = post_json(
        app.clone(),
        "/patients/send",
        json!([{ "pseudonym": "tok-1", "mdat": "payload" }]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["tok-1"], true);

    // a fresh token mapping reads the record back out, token-keyed
    state.store.put("tok-2", "psn-1");
    let response = post_json(
        app.clone(),
        "/patients/request",
        json!(["tok-2", "tok-unknown"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["pseudonym"], "tok-2");
    assert_eq!(records[0]["mdat"], "payload");
}

#[tokio::test]
async fn malformed_callbacks_are_rejected_with_400() {
    let (app, state) = build_test_app(test_config("http://127.0.0.1:9", true));

    let response = post_raw(app, "/patients/send/pseudonyms", "not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.store.is_empty());
}

#[tokio::test]
async fn routes_move_under_the_configured_request_path() {
    let mut config = test_config("http://127.0.0.1:9", true);
    config.request_path = "/pseudo".into();
    let (app, _state) = build_test_app(config);

    let response = post_json(
        app.clone(),
        "/pseudo/patients/send/pseudonyms",
        json!({ "tokenId": "tok-1", "id": "psn-1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        app,
        "/patients/send/pseudonyms",
        json!({ "tokenId": "tok-2", "id": "psn-2" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
