use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The linkage service could not be reached, or its response could not
    /// be read: network failure, timeout, malformed body. Never retried.
    #[error("error while connecting to the linkage service: {0}")]
    Connection(String),

    /// The linkage service answered and rejected the request. Carries the
    /// service's message verbatim.
    #[error("error occurred at the linkage service: {0}")]
    Protocol(String),

    /// A callback request from the linkage service that does not match any
    /// known wire shape.
    #[error("invalid callback payload: {0}")]
    InvalidCallback(String),

    /// Failure inside the patient backend.
    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            // Both linkage failure modes surface as "temporarily unavailable";
            // the body keeps the underlying message, which differs between a
            // dead service and a rejected request.
            AppError::Connection(_) | AppError::Protocol(_) => {
                tracing::warn!("linkage service failure: {}", self);
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::InvalidCallback(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Backend(e) => {
                tracing::error!("backend error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, msg).into_response()
    }
}
