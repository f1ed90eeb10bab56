use serde::{Deserialize, Serialize};

/// The unit of exchange with the patient backend.
///
/// `pseudonym` identifies the record. While callback mode is active it
/// carries a token at the gateway boundary; past the mediator it is always
/// a real pseudonym.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub pseudonym: String,
    /// Medical payload. Opaque to the gateway; no shape is enforced here.
    #[serde(default)]
    pub mdat: String,
    /// Set when the linkage service merged this record with an existing one
    /// under an uncertain-match policy.
    #[serde(default)]
    pub tentative: bool,
}

impl Patient {
    pub fn new(pseudonym: impl Into<String>, mdat: impl Into<String>) -> Self {
        Self {
            pseudonym: pseudonym.into(),
            mdat: mdat.into(),
            tentative: false,
        }
    }
}
