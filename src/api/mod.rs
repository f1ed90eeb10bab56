use std::sync::Arc;

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod handlers;

/// Build the gateway router. Endpoints sit under the configured request
/// path when one is set; the health probe always lives at the root.
pub fn router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route("/tokens/addPatient", post(handlers::add_patient_tokens))
        .route("/tokens/readPatients", post(handlers::read_patients_token))
        .route("/patients/send", post(handlers::send_patients))
        .route(
            "/patients/send/pseudonyms",
            post(handlers::receive_pseudonyms),
        )
        .route("/patients/request", post(handlers::request_patients));

    let prefixed = if state.config.request_path.is_empty() {
        routes
    } else {
        Router::new().nest(&state.config.request_path, routes)
    };

    prefixed
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id))
        .fallback(fallback_404)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Middleware: stamps every response with an id callers can quote when
/// correlating failures with gateway logs.
async fn request_id(req: Request, next: Next) -> Response {
    let id = uuid::Uuid::new_v4().to_string();
    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}
