// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer-MIB column identifiers and table index helpers.

use async_snmp::Oid;

/// Arcs of `oid` below `base`, or `None` unless `oid` lies strictly inside
/// the subtree rooted at `base`.
pub fn index_after(oid: &Oid, base: &Oid) -> Option<Vec<u32>> {
    if oid.len() > base.len() && oid.starts_with(base) {
        Some(oid.arcs()[base.len()..].to_vec())
    } else {
        None
    }
}

/// Instance identifier for the cell `column`.`index`.
pub fn cell(column: &[u32], index: &[u32]) -> Oid {
    Oid::new(column.iter().chain(index).copied())
}

/// Column OIDs read during a poll, as arc slices.
pub mod columns {
    /// hrPrinterStatus (HOST-RESOURCES-MIB), indexed by hrDeviceIndex.
    pub const PRINTER_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 25, 3, 5, 1, 1];
    /// hrPrinterDetectedErrorState bitmask.
    pub const PRINTER_ERROR_STATE: &[u32] = &[1, 3, 6, 1, 2, 1, 25, 3, 5, 1, 2];
    /// hrDeviceStatus.
    pub const DEVICE_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 25, 3, 2, 1, 5];
    /// hrDeviceType.
    pub const DEVICE_TYPE: &[u32] = &[1, 3, 6, 1, 2, 1, 25, 3, 2, 1, 2];
    /// hrDevicePrinter, the hrDeviceType value identifying a printer row.
    pub const DEVICE_TYPE_PRINTER: &[u32] = &[1, 3, 6, 1, 2, 1, 25, 3, 1, 5];

    /// prtAlertSeverityLevel (Printer-MIB).
    pub const ALERT_SEVERITY: &[u32] = &[1, 3, 6, 1, 2, 1, 43, 18, 1, 1, 2];
    /// prtAlertDescription.
    pub const ALERT_DESCRIPTION: &[u32] = &[1, 3, 6, 1, 2, 1, 43, 18, 1, 1, 8];
    /// prtConsoleDisplayBufferText.
    pub const CONSOLE_DISPLAY_TEXT: &[u32] = &[1, 3, 6, 1, 2, 1, 43, 16, 5, 1, 2];

    /// prtMarkerSuppliesDescription.
    pub const SUPPLY_DESCRIPTION: &[u32] = &[1, 3, 6, 1, 2, 1, 43, 11, 1, 1, 6];
    /// prtMarkerSuppliesMaxCapacity.
    pub const SUPPLY_MAX_CAPACITY: &[u32] = &[1, 3, 6, 1, 2, 1, 43, 11, 1, 1, 8];
    /// prtMarkerSuppliesLevel.
    pub const SUPPLY_LEVEL: &[u32] = &[1, 3, 6, 1, 2, 1, 43, 11, 1, 1, 9];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_match_dotted_names() {
        let oid: Oid = "1.3.6.1.2.1.25.3.5.1.1".parse().expect("parse");
        assert_eq!(oid.arcs(), columns::PRINTER_STATUS);
        assert_eq!(
            Oid::from(columns::SUPPLY_LEVEL).to_string(),
            "1.3.6.1.2.1.43.11.1.1.9"
        );
    }

    #[test]
    fn index_after_requires_strict_subtree() {
        let base = Oid::from(columns::SUPPLY_LEVEL);
        let row = cell(columns::SUPPLY_LEVEL, &[1, 3]);
        assert_eq!(index_after(&row, &base), Some(vec![1, 3]));
        assert_eq!(index_after(&base, &base), None);

        // A sibling column sharing a textual prefix is outside the subtree.
        let sibling: Oid = "1.3.6.1.2.1.43.11.1.1.90.1".parse().expect("parse");
        assert_eq!(index_after(&sibling, &base), None);
    }

    #[test]
    fn cell_appends_index() {
        let oid = cell(columns::DEVICE_STATUS, &[1]);
        assert_eq!(oid.to_string(), "1.3.6.1.2.1.25.3.2.1.5.1");
        assert_eq!(oid.parent(), Some(Oid::from(columns::DEVICE_STATUS)));
    }
}
