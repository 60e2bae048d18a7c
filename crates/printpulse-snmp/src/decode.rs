// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Snapshot decoder: raw Printer-MIB readings to a `PrinterSnmpSnapshot`.
//
// Everything here is pure. Missing scalars arrive as `None`; the poller maps
// v2c exception values to `None` before they get here.

use std::collections::HashSet;

use async_snmp::Value;
use printpulse_core::{Alert, ErrorFlag, PrinterSnmpSnapshot, Supply};

use crate::value::{Bitmask, as_integer, to_text};
use crate::walk::Column;

/// Longest list kept for alerts, supplies, and console lines.
pub const MAX_LIST_ITEMS: usize = 10;

/// Alerts at or above this severity need attention (warning, critical).
pub const ATTENTION_SEVERITY: i64 = 3;

/// `hrPrinterDetectedErrorState` bits, lowest first: (label, code).
pub const ERROR_FLAGS: [(&str, &str); 8] = [
    ("Other error reported", "other"),
    ("Unknown error reported", "unknown"),
    ("Paper is empty", "noPaper"),
    ("Toner is empty", "noToner"),
    ("Door open", "doorOpen"),
    ("Paper jam", "jammed"),
    ("Offline", "offline"),
    ("Service requested", "serviceRequested"),
];

/// `hrPrinterStatus` label. Unlisted codes read as "Unknown".
pub fn printer_status_label(code: i64) -> &'static str {
    match code {
        1 => "Other",
        2 => "Unknown",
        3 => "Idle",
        4 => "Printing",
        5 => "Warming Up",
        _ => "Unknown",
    }
}

/// `hrDeviceStatus` label. Unlisted codes read as "".
pub fn device_status_label(code: i64) -> &'static str {
    match code {
        1 => "Other",
        2 => "Unknown",
        3 => "Running",
        4 => "Warning",
        5 => "Testing",
        6 => "Down",
        _ => "",
    }
}

/// `prtAlertSeverityLevel` label.
pub fn alert_severity_label(code: i64) -> &'static str {
    match code {
        1 => "Other",
        3 => "Warning",
        4 => "Critical",
        _ => "Unknown",
    }
}

/// Decode the error-state bitmask into its hex form and active flags.
///
/// Octet strings are read big-endian at any length; integer values are taken
/// as the mask. A missing value decodes to `("", [])`.
pub fn decode_error_flags(value: Option<&Value>) -> (String, Vec<ErrorFlag>) {
    let Some(value) = value else {
        return (String::new(), Vec::new());
    };
    let mask = Bitmask::from_value(value);
    let flags = ERROR_FLAGS
        .iter()
        .enumerate()
        .filter(|(bit, _)| mask.is_set(*bit))
        .map(|(_, (label, code))| ErrorFlag {
            label: (*label).to_string(),
            code: (*code).to_string(),
        })
        .collect();
    (mask.to_hex(), flags)
}

/// Join severity and description rows by index, highest severity first.
pub fn decode_alerts(severities: &Column, descriptions: &Column) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = descriptions
        .iter()
        .filter_map(|(index, desc)| {
            let description = to_text(desc).trim().to_string();
            if description.is_empty() {
                return None;
            }
            let severity_code = severities.get(index).and_then(as_integer).unwrap_or(0);
            Some(Alert {
                severity_code,
                severity: alert_severity_label(severity_code).to_string(),
                description,
                index: index.to_vec(),
            })
        })
        .collect();
    // Stable: equal severities keep walk order.
    alerts.sort_by(|a, b| b.severity_code.cmp(&a.severity_code));
    alerts.truncate(MAX_LIST_ITEMS);
    alerts
}

/// Remaining percentage for a supply, or `None` when it cannot be known.
pub fn supply_percent(level: i64, max_capacity: Option<i64>) -> Option<u8> {
    let max = max_capacity.filter(|&m| m > 0)?;
    if level < 0 {
        return None;
    }
    let percent = (level as f64 / max as f64 * 100.0).round_ties_even();
    Some(percent.clamp(0.0, 100.0) as u8)
}

/// Join the supply columns by index, iterating the level column.
///
/// Rows whose level is missing, unparsable, or negative (the MIB's
/// "other"/"unknown"/"some remaining" sentinels) are dropped.
pub fn decode_supplies(descriptions: &Column, max_capacities: &Column, levels: &Column) -> Vec<Supply> {
    let mut supplies: Vec<Supply> = levels
        .iter()
        .filter_map(|(index, level)| {
            let level = as_integer(level).filter(|&l| l >= 0)?;
            let max_capacity = max_capacities.get(index).and_then(as_integer);
            let description = descriptions
                .get(index)
                .map(|d| to_text(d).trim().to_string())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| format!("Supply {}", index.last().copied().unwrap_or(0)));
            Some(Supply {
                description,
                level,
                max_capacity,
                percent: supply_percent(level, max_capacity),
            })
        })
        .collect();
    supplies.sort_by(|a, b| a.description.cmp(&b.description));
    supplies.truncate(MAX_LIST_ITEMS);
    supplies
}

/// Console display lines in row order, blank lines dropped, first occurrence
/// of each line kept.
pub fn decode_console(rows: &Column) -> Vec<String> {
    let mut ordered: Vec<(&[u32], &Value)> = rows.iter().collect();
    ordered.sort_by(|a, b| a.0.cmp(b.0));

    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .map(|(_, v)| to_text(v).trim().to_string())
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.clone()))
        .take(MAX_LIST_ITEMS)
        .collect()
}

/// True when any error flag is set or any alert is warning or worse.
/// Supply levels do not count.
pub fn needs_attention(error_flags: &[ErrorFlag], alerts: &[Alert]) -> bool {
    !error_flags.is_empty() || alerts.iter().any(|a| a.severity_code >= ATTENTION_SEVERITY)
}

/// Everything one poll attempt read from the device.
#[derive(Debug, Clone, Default)]
pub struct RawReadings {
    pub printer_status: Option<Value>,
    pub error_state: Option<Value>,
    pub device_status: Option<Value>,
    pub alert_severities: Column,
    pub alert_descriptions: Column,
    pub supply_descriptions: Column,
    pub supply_max_capacities: Column,
    pub supply_levels: Column,
    pub console: Column,
}

pub fn decode_snapshot(raw: &RawReadings) -> PrinterSnmpSnapshot {
    let status_code = raw
        .printer_status
        .as_ref()
        .and_then(as_integer)
        .unwrap_or(0);
    let device_status_code = raw.device_status.as_ref().and_then(as_integer);
    let (error_state_raw, error_flags) = decode_error_flags(raw.error_state.as_ref());
    let alerts = decode_alerts(&raw.alert_severities, &raw.alert_descriptions);
    let supplies = decode_supplies(
        &raw.supply_descriptions,
        &raw.supply_max_capacities,
        &raw.supply_levels,
    );
    let console_lines = decode_console(&raw.console);
    let attention = needs_attention(&error_flags, &alerts);

    PrinterSnmpSnapshot {
        status_code,
        status_label: printer_status_label(status_code).to_string(),
        device_status_code,
        device_status_label: device_status_code
            .map(device_status_label)
            .unwrap_or_default()
            .to_string(),
        error_state_raw,
        error_flags,
        alerts,
        supplies,
        console_lines,
        attention,
    }
}
