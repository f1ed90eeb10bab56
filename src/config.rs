use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Base URL of the record linkage service, without a trailing slash.
    pub linkage_url: String,
    /// API key presented to the linkage service.
    pub api_key: String,
    /// Protocol version spoken by the linkage service. "1.0" changes which
    /// response field carries the token id.
    pub api_version: String,
    /// Externally reachable base URL of this gateway. The linkage service
    /// must be able to POST callbacks here, so it is required in callback
    /// mode.
    pub public_url: Option<String>,
    /// Route prefix for every endpoint (e.g. "/pseudo"). Empty by default.
    pub request_path: String,
    /// Whether the linkage service reports pseudonyms back to this gateway
    /// instead of handing them to the caller.
    pub use_callback: bool,
    /// How long a token→pseudonym mapping stays usable.
    pub token_ttl: Duration,
    /// How often the background sweeper scans for expired mappings.
    pub sweep_interval: Duration,
}

impl Config {
    /// URL the linkage service calls back with token/pseudonym pairs.
    pub fn callback_url(&self) -> String {
        format!(
            "{}{}/patients/send/pseudonyms",
            self.public_url.as_deref().unwrap_or_default(),
            self.request_path
        )
    }
}

/// Route prefixes come in as "pseudo", "/pseudo" or "/pseudo/"; the router
/// needs "/pseudo", and no prefix at all must stay empty.
fn normalize_request_path(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let linkage_url = std::env::var("PSEUDOGATE_LINKAGE_URL")
        .context("PSEUDOGATE_LINKAGE_URL is not set — point it at the linkage service")?;
    url::Url::parse(&linkage_url).context("PSEUDOGATE_LINKAGE_URL is not a valid URL")?;
    let linkage_url = linkage_url.trim_end_matches('/').to_string();

    let api_key = std::env::var("PSEUDOGATE_API_KEY")
        .context("PSEUDOGATE_API_KEY is not set — the linkage service rejects unkeyed requests")?;

    let use_callback = std::env::var("PSEUDOGATE_USE_CALLBACK")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let public_url = std::env::var("PSEUDOGATE_PUBLIC_URL")
        .ok()
        .map(|v| v.trim_end_matches('/').to_string());

    if use_callback && public_url.is_none() {
        anyhow::bail!(
            "PSEUDOGATE_USE_CALLBACK is enabled but PSEUDOGATE_PUBLIC_URL is not set. \
             The linkage service needs a reachable URL to report pseudonyms to."
        );
    }

    Ok(Config {
        port: std::env::var("PSEUDOGATE_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        linkage_url,
        api_key,
        api_version: std::env::var("PSEUDOGATE_API_VERSION").unwrap_or_else(|_| "3.0".into()),
        public_url,
        request_path: normalize_request_path(
            &std::env::var("PSEUDOGATE_REQUEST_PATH").unwrap_or_default(),
        ),
        use_callback,
        token_ttl: Duration::from_secs(
            std::env::var("PSEUDOGATE_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        ),
        sweep_interval: Duration::from_secs(
            std::env::var("PSEUDOGATE_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        ),
    })
}
