//! Async Rust client for auditing a Netskope tenant's endpoint-agent fleet.
//!
//! Lists devices whose Netskope Client is reported "disabled" by the tenant
//! management API, then cross-references the events API to check whether each
//! disabled device still produced recent web traffic — a signal that the
//! disablement may be stale or the client silently broken. Each device/user
//! row is classified and streamed to a CSV sink as soon as its lookup
//! completes.
//!
//! # Modules
//!
//! - [`audit`] — Sequential two-stage pipeline orchestration.
//! - [`client`] — Authenticated HTTP wrapper for the Netskope v1 REST API.
//! - [`devices`] — Device listing, per-user flattening, false-positive filter.
//! - [`error`] — Typed error hierarchy (`AuditError`) for fatal failures.
//! - [`events`] — Per-row event correlation with contained failure outcomes.
//! - [`query`] — The `field eq value and ...` filter DSL both endpoints use.
//! - [`report`] — Row classification decision table and CSV rendering.
//!
//! # Quick Start
//!
//! ```ignore
//! use ns_client_audit::audit::{AuditOptions, run_audit};
//! use ns_client_audit::client::NsClient;
//! use ns_client_audit::report::CsvStdout;
//!
//! let client = NsClient::new("example.goskope.com", "api-token", None);
//! let options = AuditOptions::default();
//! let rows = run_audit(&client, &options, &mut CsvStdout).await?;
//! ```

#![warn(missing_docs)]

pub mod audit;
pub mod client;
pub mod devices;
pub mod error;
pub mod events;
pub mod query;
pub mod report;
