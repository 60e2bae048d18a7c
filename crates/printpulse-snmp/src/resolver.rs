// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Finds which hrDevice row is the printer on a multi-function device.

use async_snmp::{Oid, Value};
use tracing::debug;

use crate::oid::columns;
use crate::session::{Session, SnmpClient};
use crate::value::to_text;
use crate::walk::walk_column;

/// Row used when neither strategy finds the printer. Single-printer devices
/// almost always use row 1.
pub const DEFAULT_PRINTER_INDEX: u32 = 1;

const STATUS_ROW_CAP: usize = 8;
const DEVICE_TYPE_ROW_CAP: usize = 32;

/// Resolve the printer's row index.
///
/// Tries the smallest row of `hrPrinterStatus` first, then the smallest
/// `hrDeviceType` row typed as a printer. Walk failures are logged and fall
/// through; `None` means both strategies came up empty.
pub async fn resolve_printer_index<C: SnmpClient>(session: &Session<C>) -> Option<u32> {
    match walk_column(session, &Oid::from(columns::PRINTER_STATUS), STATUS_ROW_CAP).await {
        Ok(rows) => {
            if let Some(index) = rows.indices().filter_map(|i| i.first().copied()).min() {
                debug!(index, "printer row from status table");
                return Some(index);
            }
        }
        Err(e) => debug!(error = %e, "printer status walk failed, trying device types"),
    }

    let printer_type = Oid::from(columns::DEVICE_TYPE_PRINTER);
    match walk_column(session, &Oid::from(columns::DEVICE_TYPE), DEVICE_TYPE_ROW_CAP).await {
        Ok(rows) => {
            let index = rows
                .iter()
                .filter(|(_, value)| is_printer_type(value, &printer_type))
                .filter_map(|(i, _)| i.first().copied())
                .min();
            if let Some(index) = index {
                debug!(index, "printer row from device type table");
            }
            index
        }
        Err(e) => {
            debug!(error = %e, "device type walk failed");
            None
        }
    }
}

fn is_printer_type(value: &Value, printer_type: &Oid) -> bool {
    match value {
        Value::ObjectIdentifier(oid) => oid == printer_type,
        other => to_text(other).trim() == printer_type.to_string(),
    }
}
