//! Connection parameters for the linkage service and the session handshake.

use serde::Deserialize;

use crate::config::Config;
use crate::errors::AppError;
use crate::linkage::body_snippet;
use crate::linkage::session::LinkageSession;
use crate::linkage::transport::HttpTransport;

/// Header carrying the API key, as the service expects it.
pub const API_KEY_HEADER: &str = "mainzellisteApiKey";
/// Header carrying the protocol version.
pub const API_VERSION_HEADER: &str = "mainzellisteApiVersion";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionCreated {
    session_id: String,
}

/// Immutable connection parameters for one linkage service. Cloned freely;
/// sessions hold their own copy.
#[derive(Debug, Clone)]
pub struct LinkageConnection {
    linkage_url: String,
    api_key: String,
    api_version: String,
    callback_url: String,
    use_callback: bool,
}

impl LinkageConnection {
    pub fn new(
        linkage_url: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        callback_url: impl Into<String>,
        use_callback: bool,
    ) -> Self {
        Self {
            linkage_url: linkage_url.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            callback_url: callback_url.into(),
            use_callback,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.linkage_url.clone(),
            config.api_key.clone(),
            config.api_version.clone(),
            config.callback_url(),
            config.use_callback,
        )
    }

    pub fn linkage_url(&self) -> &str {
        &self.linkage_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    pub fn use_callback(&self) -> bool {
        self.use_callback
    }

    /// Open a session on the linkage service. Only transport or parse
    /// failures are errors here; an unexpected status surfaces as a parse
    /// failure since the body then carries no session id.
    pub async fn open_session(
        &self,
        transport: &HttpTransport,
    ) -> Result<LinkageSession, AppError> {
        let response = transport
            .client()
            .post(format!("{}/sessions", self.linkage_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_VERSION_HEADER, &self.api_version)
            .send()
            .await
            .map_err(|e| AppError::Connection(format!("session open failed: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Connection(format!("failed to read session response: {e}")))?;

        let created: SessionCreated = serde_json::from_str(&body).map_err(|e| {
            AppError::Connection(format!(
                "session response was not understood: {e} (body: {})",
                body_snippet(&body)
            ))
        })?;

        tracing::debug!(session_id = %created.session_id, "opened linkage session");
        Ok(LinkageSession::new(self.clone(), created.session_id))
    }

    /// Delete a session this connection opened. The service answers 204 when
    /// the session is gone; anything else is its problem, reported verbatim.
    pub async fn close_session(
        &self,
        transport: &HttpTransport,
        session: &LinkageSession,
    ) -> Result<(), AppError> {
        let response = transport
            .client()
            .delete(session.session_url())
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_VERSION_HEADER, &self.api_version)
            .send()
            .await
            .map_err(|e| AppError::Connection(format!("session delete failed: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Protocol(format!(
                "session delete returned {status}: {body}"
            )));
        }

        tracing::debug!(session_id = %session.session_id(), "closed linkage session");
        Ok(())
    }
}
