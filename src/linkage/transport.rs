//! HTTP transport for talking to the linkage service.
//! One shared connection pool; timeouts live here, not in the callers.

use std::time::Duration;

use reqwest::Client;

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(32)
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }

    /// The underlying client. Callers build their own requests; failures are
    /// surfaced immediately, there is no retry at this layer.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}
