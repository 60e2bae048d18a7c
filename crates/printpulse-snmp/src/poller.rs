// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Poll orchestration: one full read of a printer per protocol attempt.
//
// An attempt opens one session, resolves the printer row, fetches the three
// scalars, walks the five tables, closes the session and decodes. v2c is tried
// first; any failure reruns the identical sequence under v1.

use std::future::Future;

use async_snmp::{Oid, Value};
use printpulse_core::{Device, PrinterSnmpSnapshot, SnmpConfig};
use tracing::{debug, info, instrument, warn};

use crate::capability::SnmpCapability;
use crate::decode::{RawReadings, decode_snapshot};
use crate::error::{PollError, SnmpError};
use crate::oid::{cell, columns};
use crate::resolver::{DEFAULT_PRINTER_INDEX, resolve_printer_index};
use crate::session::{Auth, Session, SnmpClient};
use crate::transport::{Connector, Target, UdpConnector};
use crate::walk::{Column, walk_column};

/// Row cap for every table walked during a poll.
pub const TABLE_ROW_CAP: usize = 20;

pub const MISSING_ADDRESS: &str = "Printer does not have an IP address configured.";
pub const POLLING_DISABLED: &str = "SNMP polling is disabled in the configuration.";

/// One attempt under a single protocol version.
#[instrument(skip_all, fields(target = %target.label(), version = %auth.version))]
pub async fn poll_once<C: Connector>(
    connector: &C,
    target: &Target,
    auth: Auth,
) -> Result<PrinterSnmpSnapshot, SnmpError> {
    let client = connector.open(target, &auth).await?;
    let mut session = Session::new(client);

    let readings = read_printer(&session).await;
    session.close().await;

    let readings = readings?;
    Ok(decode_snapshot(&readings))
}

async fn read_printer<C: SnmpClient>(session: &Session<C>) -> Result<RawReadings, SnmpError> {
    let index = match resolve_printer_index(session).await {
        Some(index) => index,
        None => {
            debug!(index = DEFAULT_PRINTER_INDEX, "printer row not found, using default");
            DEFAULT_PRINTER_INDEX
        }
    };

    Ok(RawReadings {
        printer_status: scalar(session, columns::PRINTER_STATUS, index).await?,
        error_state: scalar(session, columns::PRINTER_ERROR_STATE, index).await?,
        device_status: scalar(session, columns::DEVICE_STATUS, index).await?,
        alert_severities: walk(session, columns::ALERT_SEVERITY).await?,
        alert_descriptions: walk(session, columns::ALERT_DESCRIPTION).await?,
        supply_descriptions: walk(session, columns::SUPPLY_DESCRIPTION).await?,
        supply_max_capacities: walk(session, columns::SUPPLY_MAX_CAPACITY).await?,
        supply_levels: walk(session, columns::SUPPLY_LEVEL).await?,
        console: walk(session, columns::CONSOLE_DISPLAY_TEXT).await?,
    })
}

/// GET `column.index`; exception values and NULL read as absent.
async fn scalar<C: SnmpClient>(
    session: &Session<C>,
    column: &[u32],
    index: u32,
) -> Result<Option<Value>, SnmpError> {
    let vb = session.get(&cell(column, &[index])).await?;
    Ok(match vb.value {
        Value::Null => None,
        v if v.is_exception() => None,
        v => Some(v),
    })
}

async fn walk<C: SnmpClient>(
    session: &Session<C>,
    column: &[u32],
) -> Result<Column, SnmpError> {
    walk_column(session, &Oid::from(column), TABLE_ROW_CAP).await
}

/// Poll `target`, falling back from v2c to v1.
pub async fn poll<C: Connector>(
    connector: &C,
    target: &Target,
    community: &str,
) -> Result<PrinterSnmpSnapshot, PollError> {
    let v2c_err = match poll_once(connector, target, Auth::v2c(community)).await {
        Ok(snapshot) => return Ok(snapshot),
        Err(e) => e,
    };
    debug!(target = %target.label(), error = %v2c_err, "v2c poll failed, retrying with v1");

    match poll_once(connector, target, Auth::v1(community)).await {
        Ok(snapshot) => Ok(snapshot),
        Err(v1_err) => Err(PollError::query(format!(
            "v2c failed: {v2c_err}; v1 failed: {v1_err}"
        ))),
    }
}

/// Something that can produce a snapshot for a device.
pub trait PrinterPoller: Send + Sync + 'static {
    fn fetch_printer_status(
        &self,
        device: &Device,
        config: &SnmpConfig,
    ) -> impl Future<Output = Result<PrinterSnmpSnapshot, PollError>> + Send;
}

/// The network poller.
#[derive(Debug, Clone)]
pub struct SnmpPoller<C = UdpConnector> {
    connector: C,
    capability: SnmpCapability,
}

impl SnmpPoller<UdpConnector> {
    /// UDP poller gated on the process-wide capability.
    pub fn new() -> Self {
        Self::with_connector(UdpConnector, SnmpCapability::global().clone())
    }
}

impl Default for SnmpPoller<UdpConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> SnmpPoller<C> {
    pub fn with_connector(connector: C, capability: SnmpCapability) -> Self {
        Self {
            connector,
            capability,
        }
    }
}

impl<C: Connector + 'static> PrinterPoller for SnmpPoller<C> {
    #[instrument(skip_all, fields(device = %device.id))]
    async fn fetch_printer_status(
        &self,
        device: &Device,
        config: &SnmpConfig,
    ) -> Result<PrinterSnmpSnapshot, PollError> {
        if let Some(reason) = self.capability.reason() {
            return Err(PollError::not_configured(reason));
        }
        if !config.enabled {
            return Err(PollError::not_configured(POLLING_DISABLED));
        }
        let Some(ip) = device.address() else {
            return Err(PollError::not_configured(MISSING_ADDRESS));
        };

        let target = Target::new(ip)
            .with_port(config.port)
            .with_timeout(config.timeout())
            .with_retries(config.retries);

        match poll(&self.connector, &target, &config.community).await {
            Ok(snapshot) => {
                info!(
                    status = %snapshot.status_label,
                    attention = snapshot.attention,
                    supplies = snapshot.supplies.len(),
                    alerts = snapshot.alerts.len(),
                    "printer polled"
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "printer poll failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PollErrorKind;
    use crate::session::Version;
    use crate::testing::{FakeAgent, RequestKind};
    use async_snmp::ErrorStatus;
    use printpulse_core::DeviceId;

    fn printer_agent() -> FakeAgent {
        FakeAgent::new()
            .with_cell(columns::PRINTER_STATUS, &[1], Value::Integer(3))
            .with_cell(columns::PRINTER_ERROR_STATE, &[1], Value::from(&[0x04u8][..]))
            .with_cell(columns::DEVICE_STATUS, &[1], Value::Integer(4))
            .with_cell(columns::ALERT_SEVERITY, &[1, 1], Value::Integer(3))
            .with_cell(columns::ALERT_DESCRIPTION, &[1, 1], Value::from("Tray 2 empty"))
            .with_cell(columns::CONSOLE_DISPLAY_TEXT, &[1, 1], Value::from("Load paper"))
            .with_cell(columns::SUPPLY_DESCRIPTION, &[1, 1], Value::from("Black Toner"))
            .with_cell(columns::SUPPLY_MAX_CAPACITY, &[1, 1], Value::Integer(100))
            .with_cell(columns::SUPPLY_LEVEL, &[1, 1], Value::Integer(30))
    }

    fn target() -> Target {
        Target::new("192.0.2.10")
    }

    fn device(ip: Option<&str>) -> Device {
        Device {
            id: DeviceId(4),
            campus_label: "LIB-2F-01".into(),
            asset_tag: "A-1001".into(),
            building: "Library".into(),
            location_in_building: "2nd floor".into(),
            make: "Acme".into(),
            model: "MFP 500".into(),
            ip_address: ip.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn full_read_under_v2c() {
        let agent = printer_agent();
        let snapshot = poll(&agent.connector(), &target(), "public")
            .await
            .expect("poll");

        assert_eq!(snapshot.status_label, "Idle");
        assert_eq!(snapshot.device_status_label, "Warning");
        assert_eq!(snapshot.error_state_raw, "0x4");
        assert_eq!(snapshot.error_flags[0].label, "Paper is empty");
        assert_eq!(snapshot.alerts[0].description, "Tray 2 empty");
        assert_eq!(snapshot.supplies[0].percent, Some(30));
        assert_eq!(snapshot.console_lines, ["Load paper"]);
        assert!(snapshot.attention);
        assert_eq!((agent.opens(), agent.closes()), (1, 1));
    }

    #[tokio::test]
    async fn falls_back_to_v1() {
        let agent = printer_agent().only_version(Version::V1);
        let snapshot = poll(&agent.connector(), &target(), "public")
            .await
            .expect("poll");

        assert_eq!(snapshot.status_label, "Idle");
        assert!(agent.requests().iter().all(|r| r.version == Version::V1));
        assert_eq!((agent.opens(), agent.closes()), (2, 2));
    }

    #[tokio::test]
    async fn both_versions_failing_combines_messages() {
        let agent = printer_agent().with_community("secret");
        let err = poll(&agent.connector(), &target(), "public")
            .await
            .unwrap_err();

        assert_eq!(err.kind, PollErrorKind::QueryError);
        assert!(err.message.starts_with("v2c failed: No SNMP response"));
        assert!(err.message.contains("; v1 failed: No SNMP response"));
    }

    #[tokio::test]
    async fn v1_retry_discards_partial_v2c_readings() {
        let agent = printer_agent()
            .with_cell_on(Version::V2c, columns::PRINTER_STATUS, &[1], Value::Integer(4))
            .with_cell_on(
                Version::V2c,
                columns::PRINTER_ERROR_STATE,
                &[1],
                Value::from(&[0x20u8][..]),
            )
            .with_cell_on(Version::V2c, columns::DEVICE_STATUS, &[1], Value::Integer(6))
            .fail_under_on(Version::V2c, columns::ALERT_SEVERITY, ErrorStatus::GenErr);
        let snapshot = poll(&agent.connector(), &target(), "public")
            .await
            .expect("poll");

        // Only the v1 attempt's values reach the snapshot.
        assert_eq!(snapshot.status_label, "Idle");
        assert_eq!(snapshot.device_status_label, "Warning");
        assert_eq!(snapshot.error_state_raw, "0x4");
        assert_eq!(snapshot.error_flags.len(), 1);
        assert_eq!(snapshot.error_flags[0].code, "noPaper");
        assert_eq!(snapshot.alerts[0].description, "Tray 2 empty");

        // The v2c attempt got as far as the scalars and the first table.
        let requests = agent.requests();
        let v2c_gets = requests
            .iter()
            .filter(|r| r.version == Version::V2c && r.kind == RequestKind::Get)
            .count();
        assert_eq!(v2c_gets, 3);
        assert!(requests.iter().any(|r| {
            r.version == Version::V2c && r.oid == Oid::from(columns::ALERT_SEVERITY)
        }));
        assert!(requests.iter().any(|r| r.version == Version::V1));
        assert_eq!((agent.opens(), agent.closes()), (2, 2));
    }

    #[tokio::test]
    async fn session_closed_once_per_failed_attempt() {
        let agent = printer_agent().fail_under(columns::PRINTER_ERROR_STATE, ErrorStatus::GenErr);
        let err = poll(&agent.connector(), &target(), "public")
            .await
            .unwrap_err();

        assert_eq!(err.message, "v2c failed: genErr at index 1; v1 failed: genErr at index 1");
        assert_eq!((agent.opens(), agent.closes()), (2, 2));
    }

    #[tokio::test]
    async fn unresolved_index_defaults_to_one() {
        let agent = FakeAgent::new()
            .with_cell(columns::PRINTER_ERROR_STATE, &[1], Value::from(&[0x00u8][..]))
            .with_cell(columns::DEVICE_STATUS, &[1], Value::Integer(3));
        let snapshot = poll(&agent.connector(), &target(), "public")
            .await
            .expect("poll");

        // No status row: the GET on row 1 comes back as noSuchInstance.
        assert_eq!(snapshot.status_code, 0);
        assert_eq!(snapshot.status_label, "Unknown");
        assert_eq!(snapshot.device_status_label, "Running");
        assert!(!snapshot.attention);
    }

    #[tokio::test]
    async fn fetch_without_address_is_not_configured() {
        let agent = printer_agent();
        let poller = SnmpPoller::with_connector(agent.connector(), SnmpCapability::available());

        let err = poller
            .fetch_printer_status(&device(Some("  ")), &SnmpConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, PollErrorKind::NotConfigured);
        assert_eq!(err.message, MISSING_ADDRESS);
        assert_eq!(agent.opens(), 0);
    }

    #[tokio::test]
    async fn fetch_checks_capability_and_switch() {
        let agent = printer_agent();
        let poller = SnmpPoller::with_connector(
            agent.connector(),
            SnmpCapability::unavailable("no UDP here"),
        );
        let err = poller
            .fetch_printer_status(&device(Some("192.0.2.10")), &SnmpConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, PollErrorKind::NotConfigured);
        assert_eq!(err.message, "no UDP here");

        let poller = SnmpPoller::with_connector(agent.connector(), SnmpCapability::available());
        let config = SnmpConfig {
            enabled: false,
            ..SnmpConfig::default()
        };
        let err = poller
            .fetch_printer_status(&device(Some("192.0.2.10")), &config)
            .await
            .unwrap_err();
        assert_eq!(err.message, POLLING_DISABLED);
        assert_eq!(agent.opens(), 0);
    }

    #[tokio::test]
    async fn fetch_polls_configured_device() {
        let agent = printer_agent();
        let poller = SnmpPoller::with_connector(agent.connector(), SnmpCapability::available());
        let snapshot = poller
            .fetch_printer_status(&device(Some(" 192.0.2.10 ")), &SnmpConfig::default())
            .await
            .expect("fetch");
        assert_eq!(snapshot.supplies[0].description, "Black Toner");
    }

    #[tokio::test]
    async fn refused_connection_fails_without_close() {
        let agent = printer_agent().refuse_connections();
        let err = poll(&agent.connector(), &target(), "public")
            .await
            .unwrap_err();
        assert!(err.message.contains("connection refused"));
        assert_eq!(agent.closes(), 0);
    }
}
