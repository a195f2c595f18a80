//! Typed error hierarchy for the ns-client-audit crate.
//!
//! `AuditError` replaces the original tool's status-code-as-integer scheme
//! with a structured enum that preserves diagnostic context at each failure
//! boundary. Variants map to real system boundaries, not to internal
//! implementation details:
//!
//! - `Timeout` covers a request exceeding the configured budget — the one
//!   failure class the report treats differently from everything else.
//! - `Api` covers non-success HTTP statuses and preserves the response body,
//!   which carries Netskope's diagnostic messages (bad token, bad query).
//! - `Parse` wraps `serde_json::Error` for responses that decode as text but
//!   not as the expected shape.
//! - `Network` wraps `reqwest::Error` for transport-level failures (DNS,
//!   TCP, TLS) that never produced an HTTP status code.
//!
//! At the device-listing stage every variant is fatal for the run. At the
//! event-correlation stage they are caught at the module boundary and
//! converted into `EventLookup` outcomes, never propagated past a row.

use reqwest::StatusCode;
use std::time::Duration;

/// Unified error type for all ns-client-audit library operations.
///
/// The `#[source]`/`#[from]` attributes on inner errors enable
/// `Error::source()` chaining so callers can traverse the full cause chain.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The request exceeded the uniform per-request timeout budget.
    ///
    /// Distinguished from `Network` because the decision table and the
    /// fatal-error diagnostics both treat a timed-out call as its own
    /// class: transient infrastructure, retry or extend the timeout.
    #[error("request timed out after {timeout:?}")]
    Timeout {
        /// The configured budget that elapsed.
        timeout: Duration,
    },

    /// The Netskope API returned a non-success HTTP status code.
    ///
    /// The full response body is preserved: Netskope error responses carry
    /// the human-readable explanation for auth failures and malformed
    /// query expressions, which `error_for_status()` would discard.
    #[error("API error {status}: {body}")]
    Api {
        /// The HTTP status code returned by the API.
        status: StatusCode,
        /// The raw response body text, or an empty string if unreadable.
        body: String,
    },

    /// JSON deserialization failed when parsing an API response body.
    ///
    /// Covers garbage payloads and unexpected schemas, e.g. a tenant
    /// gateway answering with an HTML login page.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// A transport-level failure occurred (DNS resolution, TCP connection,
    /// TLS handshake) before an HTTP status was available.
    #[error("network error: {0}")]
    Network(reqwest::Error),
}

impl AuditError {
    /// Whether this error is the timeout class.
    ///
    /// The correlator uses this to pick between the `TimedOut` and
    /// `Unknown` row outcomes without matching every variant at each
    /// call site.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AuditError::Timeout { .. })
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, AuditError>;
