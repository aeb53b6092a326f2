use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants::http::{IDLE_TIMEOUT, MAX_IDLE_CONNECTIONS, REQUEST_TIMEOUT};
use crate::errors::SecretsError;
use crate::utils::SecretString;

/// Transport used to reach the KMS endpoint
#[async_trait]
pub trait RemoteSigningClient: Send + Sync {
    /// POST a JSON body and return the raw response body.
    ///
    /// Fails with `Transport` when the endpoint cannot be reached and with
    /// `RemoteStatus` on any non-2xx status. Never retries.
    async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, SecretsError>;

    /// Short name of the transport, for logs
    fn client_type(&self) -> &'static str;
}

/// Connection pool and deadline settings for [`HttpSigningClient`]
#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    pub max_idle_connections: usize,
    pub idle_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            max_idle_connections: MAX_IDLE_CONNECTIONS,
            idle_timeout: IDLE_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

/// reqwest-backed KMS transport. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct HttpSigningClient {
    client: reqwest::Client,
    token: SecretString,
}

impl HttpSigningClient {
    pub fn new(token: SecretString, options: &HttpClientOptions) -> Result<Self, SecretsError> {
        // Built without gzip/brotli features, so bodies are never decompressed
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(options.max_idle_connections)
            .pool_idle_timeout(options.idle_timeout)
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| SecretsError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, token })
    }
}

impl fmt::Debug for HttpSigningClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSigningClient")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteSigningClient for HttpSigningClient {
    async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, SecretsError> {
        debug!("POST {} ({} bytes)", url, body.len());

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if !self.token.is_empty() {
            request = request.bearer_auth(self.token.expose());
        }

        // Status errors become RemoteStatus before the body is read
        let response = request
            .send()
            .await
            .inspect_err(|e| warn!("KMS request to {} failed: {}", url, e))?
            .error_for_status()
            .inspect_err(|e| warn!("KMS rejected the request: {}", e))?;

        let bytes = response.bytes().await?;

        debug!("KMS response: {}", String::from_utf8_lossy(&bytes));
        Ok(bytes.to_vec())
    }

    fn client_type(&self) -> &'static str {
        "http"
    }
}
