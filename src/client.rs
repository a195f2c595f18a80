//! Authenticated HTTP client for the Netskope v1 REST API.
//!
//! `NsClient` wraps a `reqwest::Client`, providing one JSON GET helper used
//! by both endpoint families. Authentication is Netskope APIv1 style: the
//! token travels as a `token` query-string parameter on every request, so
//! there is no token lifecycle to manage — but the token must never appear
//! in logs or `Debug` output.
//!
//! Timeout policy:
//! - One uniform request timeout covers every call (connect through body
//!   download). It is an explicit constructor parameter rather than ambient
//!   process state, so tests can inject a short budget against a delayed
//!   mock server instead of touching real sockets.
//! - A request that exceeds the budget maps to `AuditError::Timeout`
//!   carrying the configured duration; all other transport failures map to
//!   `AuditError::Network`.

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{AuditError, Result};

/// Uniform per-request timeout applied when the caller does not override it.
/// The Netskope API has no indefinite-response endpoints; anything slower
/// than this is treated as a transient infrastructure problem.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Authenticated HTTP client for the Netskope v1 REST API.
///
/// `base_url` is stored as a `String` rather than derived from the tenant
/// on every call so it can be overridden in tests (e.g. pointing at a
/// wiremock server).
pub struct NsClient {
    client: Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

// Manual impl so the token can never leak through `{:?}` formatting.
impl std::fmt::Debug for NsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NsClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NsClient {
    /// Creates a client for the given tenant host (e.g.
    /// `"example.goskope.com"`). Pass `None` to use [`DEFAULT_TIMEOUT`].
    pub fn new(tenant: &str, token: &str, timeout: Option<Duration>) -> Self {
        Self::with_base_url(&format!("https://{tenant}"), token, timeout)
    }

    /// Constructor that accepts a full base URL, used by tests to point at
    /// a local mock server instead of the real tenant.
    pub fn with_base_url(base_url: &str, token: &str, timeout: Option<Duration>) -> Self {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client for the Netskope API");
        NsClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            timeout,
        }
    }

    /// Sends an authenticated GET request and deserializes the JSON response.
    ///
    /// `path` is relative to the base URL and must start with a slash.
    /// `params` are appended as query parameters (URL-encoded by reqwest)
    /// after the `token` parameter, which is always attached first.
    ///
    /// Decoding goes through the response text rather than `resp.json()` so
    /// that schema mismatches surface as `AuditError::Parse` instead of
    /// being folded into the transport error type.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuditError::Api { status, body });
        }

        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Maps a reqwest transport error into the timeout/network split the
    /// rest of the crate keys on.
    fn map_transport(&self, err: reqwest::Error) -> AuditError {
        if err.is_timeout() {
            AuditError::Timeout {
                timeout: self.timeout,
            }
        } else {
            AuditError::Network(err)
        }
    }
}
