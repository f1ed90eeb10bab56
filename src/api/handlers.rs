use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::linkage::LinkageSession;
use crate::models::{
    DepseudonymizationUrlRequest, DepseudonymizationUrlResponse, Patient,
    PseudonymizationUrlRequest, PseudonymizationUrlResponse,
};
use crate::AppState;

/// Sessions live for one request. Failing to delete one is worth a warning
/// and nothing more; the service expires it on its own.
async fn close_best_effort(state: &AppState, session: &LinkageSession) {
    if let Err(e) = state
        .connection
        .close_session(&state.transport, session)
        .await
    {
        tracing::warn!(session_id = %session.session_id(), "failed to close linkage session: {}", e);
    }
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /tokens/addPatient — issue one redeem URL per expected record.
pub async fn add_patient_tokens(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PseudonymizationUrlRequest>,
) -> Result<Json<PseudonymizationUrlResponse>, AppError> {
    let session = state.connection.open_session(&state.transport).await?;
    let result = session
        .add_patient_tokens(&state.transport, payload.count)
        .await;
    close_best_effort(&state, &session).await;
    Ok(Json(result?))
}

/// POST /tokens/readPatients — issue a batch lookup URL, reporting which
/// pseudonyms the linkage service refused.
pub async fn read_patients_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DepseudonymizationUrlRequest>,
) -> Result<Json<DepseudonymizationUrlResponse>, AppError> {
    let session = state.connection.open_session(&state.transport).await?;
    let result = session
        .read_patients_token(&state.transport, &payload.pseudonyms, &payload.result_fields)
        .await;
    close_best_effort(&state, &session).await;
    Ok(Json(result?))
}

/// POST /patients/send — accept records, keyed by token in callback mode.
pub async fn send_patients(
    State(state): State<Arc<AppState>>,
    Json(patients): Json<Vec<Patient>>,
) -> Result<Json<HashMap<String, bool>>, AppError> {
    Ok(Json(state.mediator.accept_patients(patients).await?))
}

/// POST /patients/send/pseudonyms — callback intake from the linkage
/// service. The body shape varies by service version, so it arrives raw.
pub async fn receive_pseudonyms(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<StatusCode, AppError> {
    state.mediator.record_callback(&body)?;
    Ok(StatusCode::OK)
}

/// POST /patients/request — fetch records for the caller's identifiers.
pub async fn request_patients(
    State(state): State<Arc<AppState>>,
    Json(ids): Json<Vec<String>>,
) -> Result<Json<Vec<Patient>>, AppError> {
    Ok(Json(state.mediator.fetch_patients(ids).await?))
}
