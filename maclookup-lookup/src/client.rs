//! maclookup.app HTTP client and API key sources.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use maclookup_core::constants::{API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECONDS, MACS_PATH};
use maclookup_core::error::{LookupError, Result};
use maclookup_core::traits::{ApiKeySource, UpstreamClient};
use maclookup_core::UpstreamReply;

/// Client for `GET /v2/macs/{prefix}?apiKey={key}`.
#[derive(Clone, Debug)]
pub struct MacLookupClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl MacLookupClient {
    /// Creates a client for the public maclookup.app endpoint.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }

    /// Creates a client for another base URL (a mirror or a test server).
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LookupError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(LookupError::Config(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Builds the request URL for `prefix`.
    pub fn request_url(&self, prefix: &str, api_key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(MACS_PATH.split('/'))
                .push(prefix);
        }
        url.query_pairs_mut().append_pair("apiKey", api_key);
        url
    }
}

#[async_trait]
impl UpstreamClient for MacLookupClient {
    #[instrument(skip(self, api_key))]
    async fn fetch(&self, prefix: &str, api_key: &str) -> Result<UpstreamReply> {
        let url = self.request_url(prefix, api_key);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LookupError::Http(e.to_string()))?;
        let reply: UpstreamReply =
            serde_json::from_slice(&bytes).map_err(|e| LookupError::Decode(e.to_string()))?;

        debug!(prefix, found = reply.found, "Upstream replied");
        Ok(reply)
    }
}

/// Reads the API key from an environment variable.
#[derive(Clone, Debug)]
pub struct EnvKeySource {
    var: String,
}

impl EnvKeySource {
    /// Reads from `var` instead of `MAC_LOOKUP_APP_APIKEY`.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvKeySource {
    fn default() -> Self {
        Self::new(API_KEY_ENV)
    }
}

impl ApiKeySource for EnvKeySource {
    fn read(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|k| !k.is_empty())
    }
}

/// A fixed API key.
#[derive(Clone, Debug, Default)]
pub struct StaticKeySource(pub Option<String>);

impl ApiKeySource for StaticKeySource {
    fn read(&self) -> Option<String> {
        self.0.clone().filter(|k| !k.is_empty())
    }
}
