// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: devices, decoded SNMP snapshots, and the persisted
// per-device status record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a printer in the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub i64);

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A networked printer as known to the inventory.
///
/// Only identity and addressing live here; the inventory itself is owned by
/// whatever system loads the device list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    #[serde(default)]
    pub campus_label: String,
    #[serde(default)]
    pub asset_tag: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub location_in_building: String,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    /// IPv4 or IPv6 address. `None` or blank means unassigned.
    #[serde(default)]
    pub ip_address: Option<String>,
}

impl Device {
    /// The trimmed address, or `None` if unassigned.
    pub fn address(&self) -> Option<&str> {
        self.ip_address
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    }
}

/// One active bit of `prtPrinterDetectedErrorState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFlag {
    pub label: String,
    pub code: String,
}

/// A row of `prtAlertTable` with a non-empty description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub severity_code: i64,
    pub severity: String,
    pub description: String,
    /// Row index within the alert table.
    pub index: Vec<u32>,
}

/// A marker supply (toner, drum, waste box, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    pub description: String,
    pub level: i64,
    pub max_capacity: Option<i64>,
    /// Remaining percentage, `None` when capacity is unknown.
    pub percent: Option<u8>,
}

/// Decoded result of one successful poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterSnmpSnapshot {
    pub status_code: i64,
    pub status_label: String,
    pub device_status_code: Option<i64>,
    pub device_status_label: String,
    pub error_state_raw: String,
    pub error_flags: Vec<ErrorFlag>,
    pub alerts: Vec<Alert>,
    pub supplies: Vec<Supply>,
    pub console_lines: Vec<String>,
    pub attention: bool,
}

/// Persisted status of one device, updated in place on every poll attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterStatus {
    pub device_id: DeviceId,
    pub status_code: i64,
    pub status_label: String,
    pub device_status_code: Option<i64>,
    pub device_status_label: String,
    pub error_state_raw: String,
    pub error_flags: Vec<ErrorFlag>,
    pub alerts: Vec<Alert>,
    pub supplies: Vec<Supply>,
    pub console_lines: Vec<String>,
    pub attention: bool,
    pub snmp_ok: bool,
    pub snmp_message: String,
    pub fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrinterStatus {
    /// A blank record for a device that has never been polled.
    pub fn new(device_id: DeviceId, now: DateTime<Utc>) -> Self {
        Self {
            device_id,
            status_code: 0,
            status_label: String::new(),
            device_status_code: None,
            device_status_label: String::new(),
            error_state_raw: String::new(),
            error_flags: Vec::new(),
            alerts: Vec::new(),
            supplies: Vec::new(),
            console_lines: Vec::new(),
            attention: false,
            snmp_ok: true,
            snmp_message: String::new(),
            fetched_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_address_is_unassigned() {
        let mut device: Device =
            serde_json::from_str(r#"{"id": 7, "ip_address": "   "}"#).expect("parse");
        assert_eq!(device.address(), None);

        device.ip_address = Some(" 10.0.0.5 ".into());
        assert_eq!(device.address(), Some("10.0.0.5"));
    }

    #[test]
    fn device_id_is_transparent_in_json() {
        let json = serde_json::to_string(&DeviceId(42)).expect("serialize");
        assert_eq!(json, "42");
    }
}
