// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Display payloads for status views.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use printpulse_core::{Alert, Device, DeviceId, ErrorFlag, PrinterStatus, SnmpConfig, Supply};

/// Message shown for a device that has no stored status yet.
pub const NO_DATA_MESSAGE: &str = "No SNMP data available";

/// "Last checked" format, rendered in local time.
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%b %d, %Y %I:%M %p";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPayload {
    pub printer: PrinterIdentity,
    pub status: StatusView,
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrinterIdentity {
    pub id: DeviceId,
    pub campus_label: String,
    pub asset_tag: String,
    pub building: String,
    pub location_in_building: String,
    pub make: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub printer_id: DeviceId,
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
    pub updated_at: Option<DateTime<Utc>>,
    pub display_timestamp: String,
}

impl StatusView {
    fn from_record(record: &PrinterStatus) -> Self {
        let shown_at = record.fetched_at.unwrap_or(record.updated_at);
        Self {
            printer_id: record.device_id,
            status_code: record.status_code,
            status_label: record.status_label.clone(),
            device_status_code: record.device_status_code,
            device_status_label: record.device_status_label.clone(),
            error_state_raw: record.error_state_raw.clone(),
            error_flags: record.error_flags.clone(),
            alerts: record.alerts.clone(),
            supplies: record.supplies.clone(),
            console_lines: record.console_lines.clone(),
            attention: record.attention,
            snmp_ok: record.snmp_ok,
            snmp_message: record.snmp_message.clone(),
            fetched_at: record.fetched_at,
            updated_at: Some(record.updated_at),
            display_timestamp: display_timestamp(shown_at),
        }
    }

    /// Placeholder for a device that was never polled.
    fn no_data(device_id: DeviceId) -> Self {
        Self {
            printer_id: device_id,
            status_code: 0,
            status_label: "Unknown".into(),
            device_status_code: None,
            device_status_label: String::new(),
            error_state_raw: String::new(),
            error_flags: Vec::new(),
            alerts: Vec::new(),
            supplies: Vec::new(),
            console_lines: Vec::new(),
            attention: false,
            snmp_ok: false,
            snmp_message: NO_DATA_MESSAGE.into(),
            fetched_at: None,
            updated_at: None,
            display_timestamp: String::new(),
        }
    }
}

pub fn display_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format(DISPLAY_TIMESTAMP_FORMAT)
        .to_string()
}

/// Render `record` (or the no-data placeholder) for `device`. No I/O.
pub fn build_status_payload(
    device: &Device,
    record: Option<&PrinterStatus>,
    config: &SnmpConfig,
) -> StatusPayload {
    let status = match record {
        Some(record) => StatusView::from_record(record),
        None => StatusView::no_data(device.id),
    };
    StatusPayload {
        printer: PrinterIdentity {
            id: device.id,
            campus_label: device.campus_label.clone(),
            asset_tag: device.asset_tag.clone(),
            building: device.building.clone(),
            location_in_building: device.location_in_building.clone(),
            make: device.make.clone(),
            model: device.model.clone(),
        },
        status,
        poll_interval_seconds: config.poll_interval_seconds,
    }
}
