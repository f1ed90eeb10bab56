use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use pseudogate::backend::MemoryBackend;
use pseudogate::config::Config;
use pseudogate::{api, AppState};

/// Config pointing at the given linkage service, everything else defaulted
/// for tests.
pub fn test_config(linkage_url: &str, use_callback: bool) -> Config {
    Config {
        port: 0,
        linkage_url: linkage_url.trim_end_matches('/').to_string(),
        api_key: "test-key".into(),
        api_version: "3.0".into(),
        public_url: Some("https://gateway.example".into()),
        request_path: String::new(),
        use_callback,
        token_ttl: Duration::from_secs(300),
        sweep_interval: Duration::from_secs(300),
    }
}

/// Build the full router the way `main` does, handing back the state so
/// tests can look inside the token store.
pub fn build_test_app(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, Arc::new(MemoryBackend::new())));
    (api::router(state.clone()), state)
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
