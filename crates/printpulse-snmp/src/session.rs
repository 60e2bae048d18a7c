// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One SNMP conversation under fixed community auth.

use std::fmt;
use std::future::Future;

use async_snmp::{Oid, VarBind};
use tracing::trace;

use crate::error::{Result, SnmpError};

/// Community-based message model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Version {
    V1,
    V2c,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::V1 => "v1",
            Self::V2c => "v2c",
        })
    }
}

/// Community credentials and the message model they are sent under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    pub version: Version,
    pub community: String,
}

impl Auth {
    pub fn v1(community: impl Into<String>) -> Self {
        Self {
            version: Version::V1,
            community: community.into(),
        }
    }

    pub fn v2c(community: impl Into<String>) -> Self {
        Self {
            version: Version::V2c,
            community: community.into(),
        }
    }
}

impl From<&Auth> for async_snmp::Auth {
    fn from(auth: &Auth) -> Self {
        match auth.version {
            Version::V1 => async_snmp::Auth::v1(auth.community.clone()),
            Version::V2c => async_snmp::Auth::v2c(auth.community.clone()),
        }
    }
}

/// Single-OID requests against one agent.
pub trait SnmpClient: Send + Sync {
    fn version(&self) -> Version;

    fn get(&self, oid: &Oid) -> impl Future<Output = Result<VarBind>> + Send;

    fn get_next(&self, oid: &Oid) -> impl Future<Output = Result<VarBind>> + Send;

    /// GETBULK with no non-repeaters and one repeating OID (v2c only).
    fn get_bulk(
        &self,
        oid: &Oid,
        max_repetitions: u32,
    ) -> impl Future<Output = Result<Vec<VarBind>>> + Send;

    /// Release the client's resources.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// An open SNMP conversation. Single-use: one per poll attempt.
pub struct Session<C: SnmpClient> {
    client: Option<C>,
    version: Version,
}

impl<C: SnmpClient> Session<C> {
    pub fn new(client: C) -> Self {
        let version = client.version();
        Self {
            client: Some(client),
            version,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub async fn get(&self, oid: &Oid) -> Result<VarBind> {
        trace!(%oid, "GET");
        self.client()?.get(oid).await
    }

    pub async fn get_next(&self, oid: &Oid) -> Result<VarBind> {
        trace!(%oid, "GETNEXT");
        self.client()?.get_next(oid).await
    }

    pub async fn get_bulk(&self, oid: &Oid, max_repetitions: u32) -> Result<Vec<VarBind>> {
        trace!(%oid, max_repetitions, "GETBULK");
        self.client()?.get_bulk(oid, max_repetitions).await
    }

    /// Release the client. Later requests fail with `Closed`.
    pub async fn close(&mut self) {
        if let Some(client) = self.client.take() {
            client.close().await;
        }
    }

    fn client(&self) -> Result<&C> {
        self.client.as_ref().ok_or(SnmpError::Closed)
    }
}
