// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printpulse-snmp — SNMP v1/v2c client and Printer-MIB poller.
//
// Layers, bottom up: value coercions and MIB columns over `async-snmp`
// types, the UDP client and session, column walker, printer row resolver,
// snapshot decoder, and the v2c-then-v1 poll orchestrator.

pub mod capability;
pub mod decode;
pub mod error;
pub mod oid;
pub mod poller;
pub mod resolver;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;
pub mod value;
pub mod walk;

pub use async_snmp::{Oid, Value, VarBind};
pub use capability::SnmpCapability;
pub use error::{PollError, PollErrorKind, SnmpError};
pub use poller::{PrinterPoller, SnmpPoller, poll};
pub use session::{Auth, Session, SnmpClient, Version};
pub use transport::{Connector, Target, UdpClient, UdpConnector};
pub use walk::{Column, walk_column};
