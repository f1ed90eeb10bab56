//! Request-time translation between caller identifiers and backend
//! pseudonyms.
//!
//! In callback mode the caller only ever holds tokens; the linkage service
//! reports each token's pseudonym here asynchronously, and every inbound or
//! outbound record is translated at this boundary. With callback mode off
//! the mediator is a pass-through.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::backend::PatientBackend;
use crate::errors::AppError;
use crate::models::Patient;
use crate::store::TokenStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallbackBody {
    token_id: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    ids: Vec<CallbackId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallbackId {
    id_string: String,
}

pub struct PatientMediator {
    store: TokenStore,
    backend: Arc<dyn PatientBackend>,
    use_callback: bool,
}

impl PatientMediator {
    pub fn new(store: TokenStore, backend: Arc<dyn PatientBackend>, use_callback: bool) -> Self {
        Self {
            store,
            backend,
            use_callback,
        }
    }

    /// Accept inbound records and report per-record success, keyed by the
    /// identifier the caller used. In callback mode that identifier is a
    /// token; records whose token is unknown or already consumed are dropped
    /// without reaching the backend.
    pub async fn accept_patients(
        &self,
        patients: Vec<Patient>,
    ) -> Result<HashMap<String, bool>, AppError> {
        if !self.use_callback {
            return Ok(self.backend.store(patients).await?);
        }

        // pseudonym → token, for translating the result map back
        let mut token_for: HashMap<String, String> = HashMap::new();
        let mut forwarded = Vec::with_capacity(patients.len());

        for mut patient in patients {
            let token = std::mem::take(&mut patient.pseudonym);
            match self.store.remove(&token) {
                Some(pseudonym) => {
                    token_for.insert(pseudonym.clone(), token);
                    patient.pseudonym = pseudonym;
                    forwarded.push(patient);
                }
                None => {
                    tracing::debug!(token = %token, "dropping record with unknown token");
                }
            }
        }

        let stored = self.backend.store(forwarded).await?;

        let mut outcome = HashMap::with_capacity(stored.len());
        for (pseudonym, ok) in stored {
            if let Some(token) = token_for.remove(&pseudonym) {
                outcome.insert(token, ok);
            }
        }
        Ok(outcome)
    }

    /// Fetch records for the caller's identifiers. In callback mode each
    /// identifier is a token that is consumed here; unknown tokens are
    /// skipped, and returned records carry the caller's token again, never
    /// the pseudonym.
    pub async fn fetch_patients(&self, ids: Vec<String>) -> Result<Vec<Patient>, AppError> {
        if !self.use_callback {
            return Ok(self.backend.fetch(ids).await?);
        }

        let mut token_for: HashMap<String, String> = HashMap::new();
        let mut pseudonyms = Vec::with_capacity(ids.len());

        for token in ids {
            match self.store.remove(&token) {
                Some(pseudonym) => {
                    token_for.insert(pseudonym.clone(), token);
                    pseudonyms.push(pseudonym);
                }
                None => {
                    tracing::debug!(token = %token, "skipping request with unknown token");
                }
            }
        }

        let patients = self.backend.fetch(pseudonyms).await?;

        let mut translated = Vec::with_capacity(patients.len());
        for mut patient in patients {
            if let Some(token) = token_for.remove(&patient.pseudonym) {
                patient.pseudonym = token;
                translated.push(patient);
            }
        }
        Ok(translated)
    }

    /// Ingest a token/pseudonym pair reported by the linkage service. The
    /// service has used two body shapes over the years; both are accepted.
    pub fn record_callback(&self, raw: &str) -> Result<(), AppError> {
        let body: CallbackBody = serde_json::from_str(raw)
            .map_err(|e| AppError::InvalidCallback(format!("unparseable body: {e}")))?;

        let CallbackBody { token_id, id, ids } = body;
        let pseudonym = id
            .or_else(|| ids.into_iter().next().map(|entry| entry.id_string))
            .ok_or_else(|| AppError::InvalidCallback("payload names no pseudonym".into()))?;

        self.store.put(token_id, pseudonym);
        Ok(())
    }
}
