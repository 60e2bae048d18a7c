// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Targets, connectors, and the UDP client for one SNMP conversation.
//
// A client is opened per poll attempt and closed when the attempt ends,
// whichever step failed. Each request waits `timeout` for the matching
// response and is resent up to `retries` more times before giving up.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use async_snmp::client::Retry;
use async_snmp::{Oid, VarBind};
use tracing::debug;

use crate::error::{Result, SnmpError};
use crate::session::{Auth, SnmpClient, Version};

/// Default SNMP agent port.
pub const SNMP_PORT: u16 = 161;

/// Where and how patiently to talk to an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub retries: u32,
}

impl Target {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: SNMP_PORT,
            timeout: Duration::from_secs(3),
            retries: 1,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn label(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Opens clients to targets.
pub trait Connector: Send + Sync {
    type Client: SnmpClient;

    fn open(
        &self,
        target: &Target,
        auth: &Auth,
    ) -> impl Future<Output = Result<Self::Client>> + Send;
}

// ---------------------------------------------------------------------------
// UDP
// ---------------------------------------------------------------------------

/// A UDP client bound to a single agent.
pub struct UdpClient {
    inner: async_snmp::Client,
    version: Version,
    label: String,
}

impl UdpClient {
    pub async fn connect(target: &Target, auth: &Auth) -> Result<Self> {
        let label = target.label();
        let inner = async_snmp::Client::builder(label.clone(), async_snmp::Auth::from(auth))
            .timeout(target.timeout)
            .retry(Retry::fixed(target.retries, Duration::ZERO))
            .connect()
            .await
            .map_err(|e| SnmpError::from_client(e, &label))?;
        debug!(peer = %inner.peer_addr(), version = %auth.version, "SNMP session opened");

        Ok(Self {
            inner,
            version: auth.version,
            label,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.inner.peer_addr()
    }

    fn map_err(&self, err: Box<async_snmp::Error>) -> SnmpError {
        SnmpError::from_client(err, &self.label)
    }
}

impl SnmpClient for UdpClient {
    fn version(&self) -> Version {
        self.version
    }

    async fn get(&self, oid: &Oid) -> Result<VarBind> {
        self.inner.get(oid).await.map_err(|e| self.map_err(e))
    }

    async fn get_next(&self, oid: &Oid) -> Result<VarBind> {
        self.inner.get_next(oid).await.map_err(|e| self.map_err(e))
    }

    async fn get_bulk(&self, oid: &Oid, max_repetitions: u32) -> Result<Vec<VarBind>> {
        let max_repetitions = i32::try_from(max_repetitions).unwrap_or(i32::MAX);
        self.inner
            .get_bulk(std::slice::from_ref(oid), 0, max_repetitions)
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn close(self) {
        debug!(peer = %self.peer(), "SNMP session closed");
    }
}

/// Opens a fresh `UdpClient` per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpConnector;

impl Connector for UdpConnector {
    type Client = UdpClient;

    async fn open(&self, target: &Target, auth: &Auth) -> Result<UdpClient> {
        UdpClient::connect(target, auth).await
    }
}
