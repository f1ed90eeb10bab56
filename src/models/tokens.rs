//! Request/response envelopes for the token endpoints. Field names are
//! camelCase on the wire.

use serde::{Deserialize, Serialize};

/// Body of a request for add-record token URLs.
#[derive(Debug, Serialize, Deserialize)]
pub struct PseudonymizationUrlRequest {
    /// Number of records the caller intends to submit.
    pub count: usize,
}

/// The URLs handed to a caller for adding records, one fresh token each.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PseudonymizationUrlResponse {
    /// Whether resolved pseudonyms will be reported via callback instead of
    /// being returned to the caller.
    pub use_callback: bool,
    pub url_tokens: Vec<String>,
}

/// Body of a request for a batch depseudonymization URL.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepseudonymizationUrlRequest {
    pub pseudonyms: Vec<String>,
    /// Names of the identity fields the depseudonymization should return.
    pub result_fields: Vec<String>,
}

/// Depseudonymization URL plus the identifiers the linkage service refused.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepseudonymizationUrlResponse {
    /// Empty when every requested pseudonym was invalid.
    pub url: String,
    pub invalid_pseudonyms: Vec<String>,
}
