//! Per-row event correlation against the Netskope events endpoint.
//!
//! For each [`DeviceRecord`] the pipeline asks: did this device (and user,
//! when known) produce any `page` web-navigation event within the lookback
//! window? The answer is a tagged [`EventLookup`] value, never an `Err` —
//! per-row failures are contained at this module boundary so one bad lookup
//! cannot interrupt the rest of the report.

use serde::Deserialize;

use crate::client::NsClient;
use crate::devices::{DeviceRecord, NO_USER};
use crate::error::AuditError;
use crate::query::Filter;

/// Envelope of the events endpoint: `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
pub struct EventsResponse {
    /// Matching events, most recent first. At most one, given `limit=1`.
    #[serde(default)]
    pub data: Vec<PageEvent>,
}

/// A web-navigation event as returned by the events endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEvent {
    /// Domain the device navigated to.
    #[serde(default)]
    pub domain: String,
    /// UNIX epoch seconds of the event.
    #[serde(default)]
    pub timestamp: i64,
}

/// Outcome of one correlation lookup.
///
/// Replaces the original tool's magic status integers with a variant the
/// decision table can match exhaustively.
#[derive(Debug, Clone)]
pub enum EventLookup {
    /// A qualifying event exists within the window.
    Found(PageEvent),
    /// The lookup succeeded but returned no qualifying event, or the
    /// response had an unexpected shape. Non-timeout: a real signal about
    /// the device.
    Empty,
    /// The lookup exceeded the timeout budget. Transient infrastructure,
    /// not a signal about the device.
    TimedOut,
    /// Any other failure (non-success HTTP status, transport error).
    Unknown,
}

impl EventLookup {
    /// Whether a qualifying event was found.
    pub fn found(&self) -> bool {
        matches!(self, EventLookup::Found(_))
    }
}

/// Looks up the most recent `page` event for a record within the trailing
/// `timeperiod` seconds.
///
/// The query scopes by hostname, conjoined with the username when the
/// record has a real one ([`NO_USER`] rows scope by hostname alone).
///
/// This function never returns an error: every failure mode degrades to an
/// [`EventLookup`] variant so the caller's row loop continues regardless.
pub async fn correlate(
    client: &NsClient,
    record: &DeviceRecord,
    timeperiod: u64,
) -> EventLookup {
    let mut query = Filter::new().eq("hostname", &record.hostname);
    if record.username != NO_USER {
        query = query.eq("user", &record.username);
    }
    let params = [
        ("type", "page".to_string()),
        ("timeperiod", timeperiod.to_string()),
        ("limit", "1".to_string()),
        ("query", query.render()),
    ];

    match client.get_json::<EventsResponse>("/api/v1/events", &params).await {
        Ok(resp) => match resp.data.into_iter().next() {
            Some(event) => EventLookup::Found(event),
            None => EventLookup::Empty,
        },
        Err(AuditError::Parse(_)) => EventLookup::Empty,
        Err(err) if err.is_timeout() => EventLookup::TimedOut,
        Err(_) => EventLookup::Unknown,
    }
}
