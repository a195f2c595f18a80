//! Two-stage audit pipeline orchestration.
//!
//! Stage one lists devices with disabled clients (fatal on failure, before
//! any sink output). Stage two walks the resulting rows strictly in order:
//! one event lookup at a time, each row classified and handed to the sink
//! the moment its lookup completes. Rows are independent, but the report's
//! observable ordering matches the listing order, so processing stays
//! sequential.

use crate::client::NsClient;
use crate::devices::list_disabled;
use crate::error::Result;
use crate::events::correlate;
use crate::report::{ReportRow, RowSink};

/// Tuning knobs for one audit run, validated by the caller.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Lookback window for event correlation, in seconds.
    pub timeperiod: u64,
    /// Maximum number of devices to fetch (the endpoint caps at 5000).
    pub device_limit: u32,
    /// Emit one row per user instead of one per device, and keep devices
    /// whose aggregate status is Enabled.
    pub show_all_users: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        AuditOptions {
            timeperiod: 86_400,
            device_limit: 100,
            show_all_users: false,
        }
    }
}

/// Runs the full audit: list once, then correlate and classify each row.
///
/// The sink's `begin` fires only after the listing succeeds, so a fatal
/// listing failure produces no report output at all. Per-row lookup
/// failures are already contained inside [`correlate`] and surface only as
/// `ERROR:` rows in their normal position.
///
/// Returns the number of rows emitted.
///
/// # Errors
///
/// Propagates any [`list_disabled`] failure; stage two never fails.
pub async fn run_audit<S: RowSink>(
    client: &NsClient,
    options: &AuditOptions,
    sink: &mut S,
) -> Result<usize> {
    let records = list_disabled(client, options.device_limit, options.show_all_users).await?;

    sink.begin();
    let mut emitted = 0;
    for record in records {
        let lookup = correlate(client, &record, options.timeperiod).await;
        sink.emit(&ReportRow::new(record, lookup));
        emitted += 1;
    }
    Ok(emitted)
}
