//! Token issuance against an open linkage session.
//!
//! Two token kinds exist: `addPatient` (one per future inbound record) and
//! `readPatients` (one per batch lookup). The service rejects a readPatients
//! request outright when any submitted pseudonym is unknown to it, naming
//! exactly one offender per response, so issuing that token means discovering
//! the invalid pseudonyms one at a time and retrying without them.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::linkage::body_snippet;
use crate::linkage::connection::{LinkageConnection, API_KEY_HEADER, API_VERSION_HEADER};
use crate::linkage::transport::HttpTransport;
use crate::models::{DepseudonymizationUrlResponse, PseudonymizationUrlResponse};

/// Rejection message the service sends for a pseudonym it has no record of.
/// The quoted capture may be empty; the empty string is a rejectable
/// pseudonym like any other.
static UNKNOWN_PID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"No patient found with provided pid '([^']*)'")
        .expect("invalid unknown-pid pattern")
});

/// Typed outcome of a single token request.
#[derive(Debug)]
pub(crate) enum TokenOutcome {
    /// The service created the token.
    Issued(String),
    /// The service refused. `unknown_pseudonym` is set when the message
    /// names a pseudonym it could not find; `message` is the body verbatim.
    Rejected {
        message: String,
        unknown_pseudonym: Option<String>,
    },
}

fn classify_rejection(body: &str) -> TokenOutcome {
    TokenOutcome::Rejected {
        message: body.to_string(),
        unknown_pseudonym: UNKNOWN_PID
            .captures(body)
            .map(|caps| caps[1].to_string()),
    }
}

/// Response field carrying the token id, which moved between versions.
fn token_id_field(api_version: &str) -> &'static str {
    if api_version == "1.0" {
        "tokenId"
    } else {
        "id"
    }
}

/// A session on the linkage service. Lives for one logical operation; there
/// is no renewal, and expiry of the session itself is the service's concern.
#[derive(Debug, Clone)]
pub struct LinkageSession {
    connection: LinkageConnection,
    session_id: String,
}

impl LinkageSession {
    pub fn new(connection: LinkageConnection, session_id: impl Into<String>) -> Self {
        Self {
            connection,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_url(&self) -> String {
        format!(
            "{}/sessions/{}",
            self.connection.linkage_url(),
            self.session_id
        )
    }

    /// URL a caller visits to redeem a token.
    fn patient_url(&self, token: &str) -> String {
        format!(
            "{}/patients?tokenId={}",
            self.connection.linkage_url(),
            token
        )
    }

    fn add_patient_body(&self) -> Value {
        let mut data = serde_json::Map::new();
        if self.connection.use_callback() {
            data.insert("callback".into(), json!(self.connection.callback_url()));
        }
        json!({ "type": "addPatient", "data": data })
    }

    fn read_patients_body(pseudonyms: &[&String], result_fields: &[String]) -> Value {
        let search_ids: Vec<Value> = pseudonyms
            .iter()
            .map(|p| json!({ "idType": "pid", "idString": p }))
            .collect();
        json!({
            "type": "readPatients",
            "data": {
                "resultFields": result_fields,
                "resultIds": ["pid"],
                "searchIds": search_ids,
            }
        })
    }

    /// Issue `count` addPatient tokens, one round trip each, and return the
    /// redeem URLs in request order. Any rejection aborts the batch.
    pub async fn add_patient_tokens(
        &self,
        transport: &HttpTransport,
        count: usize,
    ) -> Result<PseudonymizationUrlResponse, AppError> {
        // Grows with successful issuance; `count` arrives off the wire and
        // must not size an allocation.
        let mut url_tokens = Vec::new();
        let body = self.add_patient_body();

        for _ in 0..count {
            match self.request_token(transport, &body).await? {
                TokenOutcome::Issued(token) => url_tokens.push(self.patient_url(&token)),
                TokenOutcome::Rejected { message, .. } => {
                    return Err(AppError::Protocol(message));
                }
            }
        }

        Ok(PseudonymizationUrlResponse {
            use_callback: self.connection.use_callback(),
            url_tokens,
        })
    }

    /// Issue one readPatients token for `pseudonyms`, discovering invalid
    /// entries as the service names them. Each pass either succeeds or
    /// strikes one submitted pseudonym, so at most `pseudonyms.len()`
    /// requests go out. A rejection naming anything other than a submitted
    /// pseudonym propagates verbatim.
    pub async fn read_patients_token(
        &self,
        transport: &HttpTransport,
        pseudonyms: &[String],
        result_fields: &[String],
    ) -> Result<DepseudonymizationUrlResponse, AppError> {
        let mut invalid: Vec<String> = Vec::new();
        let mut url = String::new();

        loop {
            let remaining: Vec<&String> = pseudonyms
                .iter()
                .filter(|p| !invalid.contains(p))
                .collect();
            if remaining.is_empty() {
                break;
            }

            let body = Self::read_patients_body(&remaining, result_fields);
            match self.request_token(transport, &body).await? {
                TokenOutcome::Issued(token) => {
                    url = self.patient_url(&token);
                    break;
                }
                TokenOutcome::Rejected {
                    unknown_pseudonym: Some(pid),
                    ..
                } if remaining.iter().any(|p| p.as_str() == pid) => {
                    tracing::debug!(pseudonym = %pid, "linkage service has no record for pseudonym");
                    invalid.push(pid);
                }
                TokenOutcome::Rejected { message, .. } => {
                    return Err(AppError::Protocol(message));
                }
            }
        }

        Ok(DepseudonymizationUrlResponse {
            url,
            invalid_pseudonyms: invalid,
        })
    }

    /// One token POST. Only 201 counts as issued; any other answer is
    /// classified from its body. I/O and parse failures are connection
    /// errors.
    pub(crate) async fn request_token(
        &self,
        transport: &HttpTransport,
        body: &Value,
    ) -> Result<TokenOutcome, AppError> {
        let response = transport
            .client()
            .post(format!("{}/tokens", self.session_url()))
            .header(API_KEY_HEADER, self.connection.api_key())
            .header(API_VERSION_HEADER, self.connection.api_version())
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Connection(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Connection(format!("failed to read token response: {e}")))?;

        if status != StatusCode::CREATED {
            return Ok(classify_rejection(&body));
        }

        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            AppError::Connection(format!(
                "token response was not understood: {e} (body: {})",
                body_snippet(&body)
            ))
        })?;

        let field = token_id_field(self.connection.api_version());
        let token = parsed
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::Connection(format!(
                    "token response is missing '{field}' (body: {})",
                    body_snippet(&body)
                ))
            })?;

        Ok(TokenOutcome::Issued(token.to_string()))
    }
}

// ── Tests ──────────────────────────────────────────────────────
