// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process fake SNMP agent.
//
// Answers single-OID requests from an ordered MIB map, with optional
// per-version cells and failures. Clones share state, so a test can keep a
// handle to inspect what was asked.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, Mutex};

use async_snmp::{ErrorStatus, Oid, Value, VarBind};

use crate::error::{Result, SnmpError};
use crate::oid::cell;
use crate::session::{Auth, SnmpClient, Version};
use crate::transport::{Connector, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Get,
    GetNext,
    GetBulk,
}

/// One request as seen by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub version: Version,
    pub kind: RequestKind,
    pub oid: Oid,
}

#[derive(Debug)]
struct Failure {
    version: Option<Version>,
    prefix: Oid,
    status: ErrorStatus,
}

#[derive(Debug)]
struct AgentState {
    mib: BTreeMap<Oid, Value>,
    overlays: BTreeMap<Version, BTreeMap<Oid, Value>>,
    community: String,
    versions: Vec<Version>,
    scripted: BTreeMap<Oid, Vec<VarBind>>,
    failures: Vec<Failure>,
    refuse_connections: bool,
    requests: Vec<SeenRequest>,
    opens: usize,
    closes: usize,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            mib: BTreeMap::new(),
            overlays: BTreeMap::new(),
            community: "public".into(),
            versions: vec![Version::V1, Version::V2c],
            scripted: BTreeMap::new(),
            failures: Vec::new(),
            refuse_connections: false,
            requests: Vec::new(),
            opens: 0,
            closes: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeAgent {
    state: Arc<Mutex<AgentState>>,
}

impl FakeAgent {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut AgentState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Add one object instance.
    pub fn with(self, oid: Oid, value: Value) -> Self {
        self.with_state(|s| s.mib.insert(oid, value));
        self
    }

    /// Add one table cell: `column` + `index`.
    pub fn with_cell(self, column: &[u32], index: &[u32], value: Value) -> Self {
        self.with(cell(column, index), value)
    }

    /// Add a cell seen only by requests under `version`, shadowing the
    /// shared MIB.
    pub fn with_cell_on(
        self,
        version: Version,
        column: &[u32],
        index: &[u32],
        value: Value,
    ) -> Self {
        self.with_state(|s| {
            s.overlays
                .entry(version)
                .or_default()
                .insert(cell(column, index), value)
        });
        self
    }

    pub fn with_community(self, community: &str) -> Self {
        self.with_state(|s| s.community = community.to_string());
        self
    }

    /// Only answer requests of this version; others time out.
    pub fn only_version(self, version: Version) -> Self {
        self.with_state(|s| s.versions = vec![version]);
        self
    }

    /// Answer GETNEXT/GETBULK requests for exactly `oid` with `bindings`.
    pub fn script(self, oid: Oid, bindings: Vec<VarBind>) -> Self {
        self.with_state(|s| s.scripted.insert(oid, bindings));
        self
    }

    /// Answer any request whose OID lies under `prefix` with `status`.
    pub fn fail_under(self, prefix: &[u32], status: ErrorStatus) -> Self {
        self.push_failure(None, prefix, status)
    }

    /// As `fail_under`, for requests under `version` only.
    pub fn fail_under_on(self, version: Version, prefix: &[u32], status: ErrorStatus) -> Self {
        self.push_failure(Some(version), prefix, status)
    }

    fn push_failure(self, version: Option<Version>, prefix: &[u32], status: ErrorStatus) -> Self {
        self.with_state(|s| {
            s.failures.push(Failure {
                version,
                prefix: Oid::from(prefix),
                status,
            })
        });
        self
    }

    pub fn refuse_connections(self) -> Self {
        self.with_state(|s| s.refuse_connections = true);
        self
    }

    /// A client speaking to this agent with `auth`. Not counted as an open.
    pub fn client(&self, auth: Auth) -> FakeClient {
        FakeClient {
            agent: self.clone(),
            auth,
        }
    }

    pub fn connector(&self) -> FakeConnector {
        FakeConnector {
            agent: self.clone(),
        }
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.with_state(|s| s.requests.clone())
    }

    pub fn opens(&self) -> usize {
        self.with_state(|s| s.opens)
    }

    pub fn closes(&self) -> usize {
        self.with_state(|s| s.closes)
    }

    fn answer(
        &self,
        auth: &Auth,
        kind: RequestKind,
        oid: &Oid,
        max_repetitions: u32,
    ) -> Result<Vec<VarBind>> {
        self.with_state(|s| {
            if auth.community != s.community || !s.versions.contains(&auth.version) {
                return Err(SnmpError::Timeout {
                    target: "fake-agent".into(),
                    attempts: 1,
                });
            }
            s.requests.push(SeenRequest {
                version: auth.version,
                kind,
                oid: oid.clone(),
            });

            let failure = s.failures.iter().find(|f| {
                f.version.is_none_or(|v| v == auth.version) && oid.starts_with(&f.prefix)
            });
            if let Some(failure) = failure {
                return Err(SnmpError::Status {
                    status: failure.status,
                    index: 1,
                });
            }

            let view = s.view(auth.version);
            match kind {
                RequestKind::Get => s.answer_get(&view, auth.version, oid).map(|vb| vec![vb]),
                RequestKind::GetNext => s
                    .answer_get_next(&view, auth.version, oid)
                    .map(|vb| vec![vb]),
                RequestKind::GetBulk => Ok(s.answer_get_bulk(&view, oid, max_repetitions)),
            }
        })
    }
}

impl AgentState {
    /// The MIB as seen under `version`.
    fn view(&self, version: Version) -> BTreeMap<Oid, Value> {
        let mut view = self.mib.clone();
        if let Some(overlay) = self.overlays.get(&version) {
            view.extend(overlay.iter().map(|(o, v)| (o.clone(), v.clone())));
        }
        view
    }

    fn answer_get(
        &self,
        view: &BTreeMap<Oid, Value>,
        version: Version,
        oid: &Oid,
    ) -> Result<VarBind> {
        match (view.get(oid), version) {
            (Some(value), _) => Ok(VarBind::new(oid.clone(), value.clone())),
            (None, Version::V1) => Err(SnmpError::Status {
                status: ErrorStatus::NoSuchName,
                index: 1,
            }),
            (None, Version::V2c) => Ok(VarBind::new(oid.clone(), Value::NoSuchInstance)),
        }
    }

    fn answer_get_next(
        &self,
        view: &BTreeMap<Oid, Value>,
        version: Version,
        oid: &Oid,
    ) -> Result<VarBind> {
        if let Some(first) = self.scripted.get(oid).and_then(|b| b.first()) {
            return Ok(first.clone());
        }
        match (next_after(view, oid), version) {
            (Some(next), _) => Ok(next),
            (None, Version::V1) => Err(SnmpError::Status {
                status: ErrorStatus::NoSuchName,
                index: 1,
            }),
            (None, Version::V2c) => Ok(VarBind::new(oid.clone(), Value::EndOfMibView)),
        }
    }

    fn answer_get_bulk(
        &self,
        view: &BTreeMap<Oid, Value>,
        start: &Oid,
        max_repetitions: u32,
    ) -> Vec<VarBind> {
        if let Some(bindings) = self.scripted.get(start) {
            return bindings.clone();
        }

        let max_repetitions = max_repetitions.max(1) as usize;
        let mut out = Vec::with_capacity(max_repetitions);
        let mut cursor = start.clone();
        while out.len() < max_repetitions {
            match next_after(view, &cursor) {
                Some(next) => {
                    cursor = next.oid.clone();
                    out.push(next);
                }
                None => {
                    out.push(VarBind::new(cursor.clone(), Value::EndOfMibView));
                    break;
                }
            }
        }
        out
    }
}

fn next_after(view: &BTreeMap<Oid, Value>, oid: &Oid) -> Option<VarBind> {
    view.range((Bound::Excluded(oid.clone()), Bound::Unbounded))
        .next()
        .map(|(o, v)| VarBind::new(o.clone(), v.clone()))
}

/// Client answering from a `FakeAgent`.
#[derive(Debug)]
pub struct FakeClient {
    agent: FakeAgent,
    auth: Auth,
}

impl FakeClient {
    fn single(&self, kind: RequestKind, oid: &Oid) -> Result<VarBind> {
        self.agent
            .answer(&self.auth, kind, oid, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| SnmpError::Client("response carries no variable bindings".into()))
    }
}

impl SnmpClient for FakeClient {
    fn version(&self) -> Version {
        self.auth.version
    }

    async fn get(&self, oid: &Oid) -> Result<VarBind> {
        self.single(RequestKind::Get, oid)
    }

    async fn get_next(&self, oid: &Oid) -> Result<VarBind> {
        self.single(RequestKind::GetNext, oid)
    }

    async fn get_bulk(&self, oid: &Oid, max_repetitions: u32) -> Result<Vec<VarBind>> {
        self.agent.answer(&self.auth, RequestKind::GetBulk, oid, max_repetitions)
    }

    async fn close(self) {
        self.agent.with_state(|s| s.closes += 1);
    }
}

/// Connector handing out `FakeClient`s bound to one agent.
#[derive(Debug, Clone)]
pub struct FakeConnector {
    agent: FakeAgent,
}

impl Connector for FakeConnector {
    type Client = FakeClient;

    async fn open(&self, _target: &Target, auth: &Auth) -> Result<FakeClient> {
        let refused = self.agent.with_state(|s| {
            if !s.refuse_connections {
                s.opens += 1;
            }
            s.refuse_connections
        });
        if refused {
            return Err(SnmpError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        Ok(self.agent.client(auth.clone()))
    }
}
