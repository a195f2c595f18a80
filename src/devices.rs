//! Device listing and per-user flattening for the Netskope clients endpoint.
//!
//! This module covers the first pipeline stage:
//!
//! - [`list_disabled`] — one bounded fetch of devices matching the
//!   disabled-client predicate.
//! - [`flatten_devices`] — pure flattening of the nested per-user payload
//!   into [`DeviceRecord`] rows, including the false-positive correction
//!   rule.
//!
//! ## The coarse predicate and its correction
//!
//! The fetch uses `query=last_event.status eq 0`, which matches devices
//! where *any* user's last reported status is Disabled. That predicate is
//! coarse: it also returns devices whose aggregate status is Enabled because
//! some non-primary user was disabled in the past. In the default
//! one-row-per-device mode those devices are dropped from the report; in
//! `show_all_users` mode every user row is kept so an operator can see the
//! full history.
//!
//! ## Failure model
//!
//! Any failure during this single request is terminal for the whole run —
//! there is no partial-result recovery at this stage. The caller
//! distinguishes only `AuditError::Timeout` from everything else.

use serde::Deserialize;

use crate::client::NsClient;
use crate::error::Result;
use crate::query::Filter;

/// Hard ceiling the clients endpoint enforces on `limit`.
pub const MAX_DEVICE_LIMIT: u32 = 5000;

/// Username placeholder for device entries with no associated user.
pub const NO_USER: &str = "(no user)";

// ── Wire types ─────────────────────────────────────────────────────────

/// Most recent client status reported for a device or user.
///
/// The API carries these as the literal strings `"Enabled"` / `"Disabled"`;
/// any other value is an unexpected schema and fails the (fatal) decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ClientStatus {
    /// The client was running and steering traffic at last report.
    Enabled,
    /// The client was reported disabled at last report.
    Disabled,
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ClientStatus::Enabled => "Enabled",
            ClientStatus::Disabled => "Disabled",
        })
    }
}

/// Envelope of the clients endpoint: `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
pub struct DevicesResponse {
    /// The array of device entries.
    pub data: Vec<Device>,
}

/// One device entry. Everything useful lives under `attributes`.
#[derive(Debug, Deserialize)]
pub struct Device {
    /// The device's attribute document.
    pub attributes: DeviceAttributes,
}

/// Device attributes: identity, client version, aggregate status, users.
#[derive(Debug, Deserialize)]
pub struct DeviceAttributes {
    /// Installed Netskope Client version string.
    #[serde(default)]
    pub client_version: String,
    /// Host identity and OS details.
    pub host_info: HostInfo,
    /// The device's most recent aggregate client event across all users.
    pub last_event: LastEvent,
    /// Users that have reported from this device, in API order. May be
    /// empty for freshly enrolled or shared devices.
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

/// Host identity as reported by the client.
#[derive(Debug, Deserialize)]
pub struct HostInfo {
    /// Device network hostname.
    pub hostname: String,
    /// Operating system family (e.g. `"Windows 10"`).
    #[serde(default)]
    pub os: String,
    /// Operating system version string.
    #[serde(default)]
    pub os_version: String,
}

/// A client status-change event (device-level or user-level).
#[derive(Debug, Clone, Deserialize)]
pub struct LastEvent {
    /// Who triggered the change (e.g. `"User"`, `"System"`).
    #[serde(default)]
    pub actor: String,
    /// Event kind (e.g. `"Disabled"`, `"Tunnel Up"`).
    #[serde(default)]
    pub event: String,
    /// Reported status after the event.
    pub status: ClientStatus,
    /// UNIX epoch seconds of the status change.
    #[serde(default)]
    pub timestamp: i64,
}

/// One user associated with a device.
#[derive(Debug, Deserialize)]
pub struct UserEntry {
    /// Reporting user identity. Absent for device entries with no user.
    #[serde(default)]
    pub username: Option<String>,
    /// This user's most recent client status event. Real user entries
    /// always carry one; absence falls back to the device-level event.
    #[serde(default)]
    pub last_event: Option<LastEvent>,
}

// ── Flattened record ───────────────────────────────────────────────────

/// One report row: a device paired with one of its users (or the
/// [`NO_USER`] sentinel when the device has none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Device network hostname.
    pub hostname: String,
    /// Reporting user, or [`NO_USER`].
    pub username: String,
    /// Operating system family.
    pub os: String,
    /// Operating system version.
    pub os_version: String,
    /// Installed client version.
    pub client_version: String,
    /// The device's aggregate client status across all users.
    pub device_status: ClientStatus,
    /// This user's most recent reported client status.
    pub user_status: ClientStatus,
    /// Actor of the user-level status change.
    pub last_event_actor: String,
    /// Kind of the user-level status change.
    pub last_event_kind: String,
    /// UNIX epoch seconds of the user-level status change.
    pub last_event_timestamp: i64,
}

impl DeviceRecord {
    fn from_parts(attrs: &DeviceAttributes, username: String, event: &LastEvent) -> Self {
        DeviceRecord {
            hostname: attrs.host_info.hostname.clone(),
            username,
            os: attrs.host_info.os.clone(),
            os_version: attrs.host_info.os_version.clone(),
            client_version: attrs.client_version.clone(),
            device_status: attrs.last_event.status,
            user_status: event.status,
            last_event_actor: event.actor.clone(),
            last_event_kind: event.event.clone(),
            last_event_timestamp: event.timestamp,
        }
    }
}

// ── Flattening ─────────────────────────────────────────────────────────

/// Flattens the nested device payload into report rows.
///
/// - `show_all_users = true`: every user entry of every device becomes a
///   row (a device with N users yields exactly N rows).
/// - `show_all_users = false`: devices whose aggregate status is Enabled
///   are dropped entirely (the false-positive correction — the coarse
///   fetch predicate matched them on a stale non-primary user), and each
///   surviving device contributes only its first user entry in API order.
///
/// In the default mode a device with no users yields one [`NO_USER`] row
/// carrying the device-level event as its user-level status; that row is
/// subject to the same correction rule as real user rows. In all-users
/// mode the row count is exactly the user count, so a zero-user device
/// contributes nothing.
pub fn flatten_devices(response: DevicesResponse, show_all_users: bool) -> Vec<DeviceRecord> {
    let mut records = Vec::new();
    for device in &response.data {
        let attrs = &device.attributes;
        if !show_all_users && attrs.last_event.status == ClientStatus::Enabled {
            continue;
        }

        if attrs.users.is_empty() {
            if !show_all_users {
                records.push(DeviceRecord::from_parts(
                    attrs,
                    NO_USER.to_string(),
                    &attrs.last_event,
                ));
            }
            continue;
        }

        let users = if show_all_users {
            &attrs.users[..]
        } else {
            &attrs.users[..1]
        };
        for user in users {
            let username = user
                .username
                .clone()
                .unwrap_or_else(|| NO_USER.to_string());
            let event = user.last_event.as_ref().unwrap_or(&attrs.last_event);
            records.push(DeviceRecord::from_parts(attrs, username, event));
        }
    }
    records
}

// ── Endpoint function ──────────────────────────────────────────────────

/// Fetches devices matching the disabled-client predicate and flattens
/// them into report rows.
///
/// Issues one GET against `/api/v1/clients` with
/// `query=last_event.status eq 0` and the given `limit` (callers clamp to
/// [`MAX_DEVICE_LIMIT`]; the endpoint rejects larger values itself).
///
/// # Errors
///
/// Every failure here is fatal for the run:
///
/// - `AuditError::Timeout` — the request exceeded the timeout budget.
/// - `AuditError::Api` — non-success HTTP status (invalid token, bad query).
/// - `AuditError::Parse` — the body was not the expected device document.
/// - `AuditError::Network` — transport-level failure.
pub async fn list_disabled(
    client: &NsClient,
    limit: u32,
    show_all_users: bool,
) -> Result<Vec<DeviceRecord>> {
    let query = Filter::new().eq("last_event.status", "0");
    let params = [
        ("limit", limit.to_string()),
        ("query", query.render()),
    ];
    let response: DevicesResponse = client.get_json("/api/v1/clients", &params).await?;
    Ok(flatten_devices(response, show_all_users))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_json(
        hostname: &str,
        device_status: &str,
        users: serde_json::Value,
    ) -> serde_json::Value {
        serde_json::json!({
            "attributes": {
                "client_version": "90.2.0.690",
                "host_info": {
                    "hostname": hostname,
                    "os": "Windows 10",
                    "os_version": "10.0.19044"
                },
                "last_event": {
                    "actor": "System",
                    "event": "Disabled",
                    "status": device_status,
                    "timestamp": 1_641_000_000
                },
                "users": users
            }
        })
    }

    fn user_json(username: &str, status: &str) -> serde_json::Value {
        serde_json::json!({
            "username": username,
            "last_event": {
                "actor": "User",
                "event": status,
                "status": status,
                "timestamp": 1_641_100_000
            }
        })
    }

    fn parse(devices: Vec<serde_json::Value>) -> DevicesResponse {
        serde_json::from_value(serde_json::json!({ "data": devices })).unwrap()
    }

    // ── Deserialization ──────────────────────────────────────────────

    #[test]
    fn device_payload_deserializes() {
        let resp = parse(vec![device_json(
            "HOST1",
            "Disabled",
            serde_json::json!([user_json("alice", "Disabled")]),
        )]);
        let attrs = &resp.data[0].attributes;
        assert_eq!(attrs.host_info.hostname, "HOST1");
        assert_eq!(attrs.last_event.status, ClientStatus::Disabled);
        assert_eq!(attrs.users.len(), 1);
        assert_eq!(attrs.users[0].username.as_deref(), Some("alice"));
    }

    #[test]
    fn device_ignores_unknown_fields() {
        // Forward compatibility: the clients endpoint grows fields over
        // time; deserialization must not fail on ones we don't read.
        let mut value = device_json("HOST1", "Disabled", serde_json::json!([]));
        value["attributes"]["device_id"] = serde_json::json!("abc-123");
        value["id"] = serde_json::json!(42);
        let resp = parse(vec![value]);
        assert_eq!(resp.data[0].attributes.host_info.hostname, "HOST1");
    }

    #[test]
    fn unexpected_status_string_is_a_parse_error() {
        let value = device_json("HOST1", "Quarantined", serde_json::json!([]));
        let result: std::result::Result<DevicesResponse, _> =
            serde_json::from_value(serde_json::json!({ "data": [value] }));
        assert!(result.is_err(), "unknown status strings are schema errors");
    }

    // ── Flattening ───────────────────────────────────────────────────

    #[test]
    fn all_users_mode_yields_one_row_per_user() {
        let resp = parse(vec![device_json(
            "HOST1",
            "Disabled",
            serde_json::json!([
                user_json("alice", "Disabled"),
                user_json("bob", "Enabled"),
                user_json("carol", "Disabled")
            ]),
        )]);
        let records = flatten_devices(resp, true);
        assert_eq!(records.len(), 3, "N users must yield N rows");
        assert_eq!(records[0].username, "alice");
        assert_eq!(records[1].username, "bob");
        assert_eq!(records[1].user_status, ClientStatus::Enabled);
        assert_eq!(records[2].username, "carol");
    }

    #[test]
    fn default_mode_keeps_only_first_user() {
        let resp = parse(vec![device_json(
            "HOST1",
            "Disabled",
            serde_json::json!([
                user_json("alice", "Disabled"),
                user_json("bob", "Enabled")
            ]),
        )]);
        let records = flatten_devices(resp, false);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].username, "alice", "first user in API order");
    }

    #[test]
    fn enabled_device_is_dropped_in_default_mode() {
        // The coarse fetch predicate matches devices where any user was
        // ever disabled; an aggregate-Enabled device is a false positive.
        let resp = parse(vec![
            device_json(
                "STALE",
                "Enabled",
                serde_json::json!([user_json("alice", "Disabled")]),
            ),
            device_json(
                "REAL",
                "Disabled",
                serde_json::json!([user_json("bob", "Disabled")]),
            ),
        ]);
        let records = flatten_devices(resp, false);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hostname, "REAL");
    }

    #[test]
    fn enabled_device_is_kept_in_all_users_mode() {
        let resp = parse(vec![device_json(
            "STALE",
            "Enabled",
            serde_json::json!([user_json("alice", "Disabled")]),
        )]);
        let records = flatten_devices(resp, true);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device_status, ClientStatus::Enabled);
        assert_eq!(records[0].user_status, ClientStatus::Disabled);
    }

    #[test]
    fn device_without_users_yields_sentinel_row() {
        let resp = parse(vec![device_json(
            "KIOSK",
            "Disabled",
            serde_json::json!([]),
        )]);
        let records = flatten_devices(resp, false);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].username, NO_USER);
        // The sentinel row inherits the device-level event.
        assert_eq!(records[0].user_status, ClientStatus::Disabled);
        assert_eq!(records[0].last_event_timestamp, 1_641_000_000);
    }

    #[test]
    fn device_without_users_yields_no_rows_in_all_users_mode() {
        // All-users mode promises exactly one row per user; zero users
        // means zero rows, never the sentinel.
        let resp = parse(vec![device_json(
            "KIOSK",
            "Disabled",
            serde_json::json!([]),
        )]);
        assert!(flatten_devices(resp, true).is_empty());
    }

    #[test]
    fn all_users_row_count_equals_user_count_across_devices() {
        let resp = parse(vec![
            device_json("KIOSK", "Disabled", serde_json::json!([])),
            device_json(
                "HOST1",
                "Disabled",
                serde_json::json!([user_json("alice", "Disabled")]),
            ),
            device_json(
                "HOST2",
                "Enabled",
                serde_json::json!([
                    user_json("bob", "Disabled"),
                    user_json("carol", "Enabled")
                ]),
            ),
        ]);
        let records = flatten_devices(resp, true);
        assert_eq!(records.len(), 3, "0 + 1 + 2 users across the fleet");
        assert!(records.iter().all(|r| r.username != NO_USER));
    }

    #[test]
    fn enabled_device_without_users_is_dropped_in_default_mode() {
        // The sentinel row is subject to the same correction rule as
        // real user rows.
        let resp = parse(vec![device_json(
            "KIOSK",
            "Enabled",
            serde_json::json!([]),
        )]);
        assert!(flatten_devices(resp, false).is_empty());
    }

    #[test]
    fn user_without_username_maps_to_sentinel() {
        let resp = parse(vec![device_json(
            "HOST1",
            "Disabled",
            serde_json::json!([{
                "last_event": {
                    "actor": "System",
                    "event": "Disabled",
                    "status": "Disabled",
                    "timestamp": 1_641_200_000
                }
            }]),
        )]);
        let records = flatten_devices(resp, false);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].username, NO_USER, "missing username is not an error");
    }

    #[test]
    fn user_without_last_event_inherits_device_event() {
        let resp = parse(vec![device_json(
            "HOST1",
            "Disabled",
            serde_json::json!([{ "username": "dave" }]),
        )]);
        let records = flatten_devices(resp, false);
        assert_eq!(records[0].username, "dave");
        assert_eq!(records[0].user_status, ClientStatus::Disabled);
        assert_eq!(records[0].last_event_actor, "System");
    }

    #[test]
    fn empty_device_list_flattens_to_no_rows() {
        assert!(flatten_devices(parse(vec![]), true).is_empty());
        assert!(flatten_devices(parse(vec![]), false).is_empty());
    }
}
