//! Row classification and CSV rendering.
//!
//! The decision table here is the report's entire value proposition: it
//! combines two independent signals — whether recent activity was found,
//! and the user's reported client status — into a triage verdict telling an
//! operator which "disabled" devices need manual investigation and which
//! are merely stale-tagged but still alive.

use crate::devices::{ClientStatus, DeviceRecord};
use crate::events::EventLookup;

/// Triage verdict for one report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Activity was found; the row needs no attention.
    Okay,
    /// No activity in the window; the device is suspicious and worth a
    /// manual look (truly offline, or a silently failing client).
    Troubleshoot,
    /// The lookup itself failed; no signal about the device either way.
    Error,
}

impl Classification {
    fn label(self) -> &'static str {
        match self {
            Classification::Okay => "OKAY",
            Classification::Troubleshoot => "TROUBLESHOOT",
            Classification::Error => "ERROR",
        }
    }
}

/// Applies the decision table to one row's correlation outcome.
///
/// Returns the verdict and its human-readable reason. The match is
/// exhaustive over both inputs; adding a lookup variant or a status is a
/// compile error here until the table covers it.
pub fn classify(
    lookup: &EventLookup,
    user_status: ClientStatus,
) -> (Classification, &'static str) {
    match (lookup, user_status) {
        (EventLookup::Found(_), ClientStatus::Disabled) => (
            Classification::Okay,
            "client disabled but activity seen in window",
        ),
        (EventLookup::Found(_), ClientStatus::Enabled) => (
            Classification::Okay,
            "client enabled and activity seen in window",
        ),
        (EventLookup::Empty, ClientStatus::Disabled) => (
            Classification::Troubleshoot,
            "client disabled and no activity in window",
        ),
        (EventLookup::Empty, ClientStatus::Enabled) => (
            Classification::Troubleshoot,
            "client enabled but no activity in window",
        ),
        (EventLookup::TimedOut, _) => (
            Classification::Error,
            "event API timed out; retry or extend the timeout",
        ),
        (EventLookup::Unknown, _) => (
            Classification::Error,
            "unexpected response from event API",
        ),
    }
}

// ── Rows ───────────────────────────────────────────────────────────────

/// One fully classified report row: the device/user record plus its
/// correlation outcome and verdict.
#[derive(Debug, Clone)]
pub struct ReportRow {
    /// The flattened device/user record this row describes.
    pub record: DeviceRecord,
    /// Domain of the correlated event, or empty when none was found.
    pub event_domain: String,
    /// Timestamp of the correlated event (epoch seconds, rendered empty
    /// when none was found).
    pub event_timestamp: Option<i64>,
    /// The triage verdict.
    pub classification: Classification,
    /// Rendered `VERDICT: reason` string, e.g.
    /// `"TROUBLESHOOT: client disabled and no activity in window"`.
    pub result: String,
}

impl ReportRow {
    /// Builds a row by running the record's lookup outcome through the
    /// decision table.
    pub fn new(record: DeviceRecord, lookup: EventLookup) -> Self {
        let (classification, reason) = classify(&lookup, record.user_status);
        let (event_domain, event_timestamp) = match lookup {
            EventLookup::Found(event) => (event.domain, Some(event.timestamp)),
            _ => (String::new(), None),
        };
        ReportRow {
            record,
            event_domain,
            event_timestamp,
            classification,
            result: format!("{}: {reason}", classification.label()),
        }
    }

    /// Renders the row as one quoted-CSV line (no trailing newline).
    pub fn to_csv(&self) -> String {
        let r = &self.record;
        let timestamp = self
            .event_timestamp
            .map(|t| t.to_string())
            .unwrap_or_default();
        [
            r.hostname.as_str(),
            r.username.as_str(),
            r.os.as_str(),
            r.os_version.as_str(),
            r.client_version.as_str(),
            &r.device_status.to_string(),
            &r.user_status.to_string(),
            r.last_event_actor.as_str(),
            r.last_event_kind.as_str(),
            &r.last_event_timestamp.to_string(),
            self.event_domain.as_str(),
            &timestamp,
            self.result.as_str(),
        ]
        .iter()
        .map(|field| quote(field))
        .collect::<Vec<_>>()
        .join(",")
    }
}

/// The header line matching [`ReportRow::to_csv`]'s column order.
pub fn csv_header() -> String {
    [
        "hostname",
        "username",
        "os",
        "os_version",
        "client_version",
        "device_status",
        "user_status",
        "last_event_actor",
        "last_event_kind",
        "last_event_timestamp",
        "event_domain",
        "event_timestamp",
        "result",
    ]
    .iter()
    .map(|field| quote(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// Quotes one CSV field, doubling embedded quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

// ── Sink ───────────────────────────────────────────────────────────────

/// Destination for the streaming report.
///
/// `begin` fires once after the device listing succeeds (before any row),
/// `emit` once per classified row, in listing order.
pub trait RowSink {
    /// Called once before the first row; the default does nothing.
    fn begin(&mut self) {}
    /// Accepts one classified row for display.
    fn emit(&mut self, row: &ReportRow);
}

/// Sink that prints the quoted-CSV report to standard output.
pub struct CsvStdout;

impl RowSink for CsvStdout {
    fn begin(&mut self) {
        println!("{}", csv_header());
    }

    fn emit(&mut self, row: &ReportRow) {
        println!("{}", row.to_csv());
    }
}
