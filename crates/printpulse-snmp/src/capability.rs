// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-wide SNMP capability: whether this host can open UDP sockets at
// all. Probed once, on first use.

use std::sync::OnceLock;

use tracing::{info, warn};

/// Whether SNMP polling is possible here, and why not if it is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpCapability {
    unavailable_reason: Option<String>,
}

static GLOBAL: OnceLock<SnmpCapability> = OnceLock::new();

impl SnmpCapability {
    /// The capability for this process, probing on the first call only.
    pub fn global() -> &'static SnmpCapability {
        GLOBAL.get_or_init(Self::probe)
    }

    pub fn available() -> Self {
        Self {
            unavailable_reason: None,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable_reason: Some(reason.into()),
        }
    }

    fn probe() -> Self {
        match std::net::UdpSocket::bind("0.0.0.0:0").or_else(|_| std::net::UdpSocket::bind("[::]:0")) {
            Ok(_) => {
                info!("SNMP capability available");
                Self::available()
            }
            Err(e) => {
                warn!(error = %e, "SNMP capability unavailable");
                Self::unavailable(format!(
                    "SNMP polling is unavailable: cannot open a UDP socket ({e})."
                ))
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.unavailable_reason.is_none()
    }

    /// Message for the status record when polling is impossible.
    pub fn reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }
}
