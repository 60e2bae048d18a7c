// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Freshness-gated status cache.
//
// A stored record younger than the poll interval is served as-is. Anything
// else, or a forced refresh, polls the device and folds the outcome (success
// or typed failure) back into the record. Every outcome is persisted; no
// poll failure reaches the caller.
//
// Refreshes of the same device are serialised. A caller that queued behind an
// in-flight refresh reuses its result when that refresh finished after the
// caller asked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use printpulse_core::error::{PrintpulseError, Result};
use printpulse_core::{Device, DeviceId, PrinterSnmpSnapshot, PrinterStatus, SnmpConfig};
use printpulse_snmp::{PollError, PollErrorKind, PrinterPoller};

use crate::payload::{StatusPayload, build_status_payload};
use crate::store::StatusStore;

/// Label used after a query failure when no earlier label exists.
pub const ATTENTION_LABEL: &str = "Attention required";
/// Label used when polling is not configured and no earlier label exists.
pub const UNAVAILABLE_LABEL: &str = "Unavailable";

type RefreshGates = HashMap<DeviceId, Arc<tokio::sync::Mutex<()>>>;

pub struct StatusCache<P> {
    poller: Arc<P>,
    store: Arc<Mutex<StatusStore>>,
    config: SnmpConfig,
    gates: Arc<Mutex<RefreshGates>>,
}

impl<P> Clone for StatusCache<P> {
    fn clone(&self) -> Self {
        Self {
            poller: Arc::clone(&self.poller),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            gates: Arc::clone(&self.gates),
        }
    }
}

impl<P: PrinterPoller> StatusCache<P> {
    pub fn new(poller: P, store: StatusStore, config: SnmpConfig) -> Self {
        Self {
            poller: Arc::new(poller),
            store: Arc::new(Mutex::new(store)),
            config,
            gates: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &SnmpConfig {
        &self.config
    }

    /// Latest status for `device`, polling when the record is stale, missing,
    /// or `force` is set.
    #[instrument(skip_all, fields(device = %device.id, force))]
    pub async fn ensure_latest_status(&self, device: &Device, force: bool) -> PrinterStatus {
        let requested_at = Utc::now();

        if !force {
            if let Some(record) = self.load(device.id) {
                if self.is_fresh(&record, requested_at) {
                    debug!("serving cached status");
                    return record;
                }
            }
        }

        let gate = self.gate(device.id);
        let _refreshing = gate.lock().await;

        // Another caller may have refreshed while this one waited.
        if let Some(record) = self.load(device.id) {
            if record.fetched_at.is_some_and(|at| at > requested_at) {
                debug!("reusing refresh that finished while waiting");
                return record;
            }
        }

        let outcome = self.poll(device).await;
        let now = Utc::now();
        let mut record = self
            .load(device.id)
            .unwrap_or_else(|| PrinterStatus::new(device.id, now));

        match outcome {
            Ok(snapshot) => apply_snapshot(&mut record, snapshot),
            Err(err) => apply_failure(&mut record, &err),
        }
        record.fetched_at = Some(now);
        record.updated_at = now;

        if let Err(e) = self.with_store(|store| store.upsert(&record)) {
            warn!(error = %e, "failed to persist status");
        }
        info!(snmp_ok = record.snmp_ok, attention = record.attention, "status refreshed");
        record
    }

    /// Stored records for `devices`, without polling.
    pub fn cached_statuses(&self, devices: &[Device]) -> HashMap<DeviceId, PrinterStatus> {
        let ids: Vec<DeviceId> = devices.iter().map(|d| d.id).collect();
        match self.with_store(|store| store.get_many(&ids)) {
            Ok(records) => records.into_iter().map(|r| (r.device_id, r)).collect(),
            Err(e) => {
                warn!(error = %e, "cached status lookup failed");
                HashMap::new()
            }
        }
    }

    /// Refresh every device concurrently, one task per device. Returns the
    /// number of devices refreshed.
    #[instrument(skip_all, fields(devices = devices.len(), force))]
    pub async fn prewarm(&self, devices: &[Device], force: bool) -> usize {
        let mut tasks = JoinSet::new();
        for device in devices.iter().cloned() {
            let cache = self.clone();
            tasks.spawn(async move { cache.ensure_latest_status(&device, force).await });
        }

        let mut refreshed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(_) => refreshed += 1,
                Err(e) => warn!(error = %e, "prewarm task failed"),
            }
        }
        info!(refreshed, "prewarm complete");
        refreshed
    }

    /// Refresh if needed, then render the display payload.
    pub async fn status_payload(&self, device: &Device, force: bool) -> StatusPayload {
        let record = self.ensure_latest_status(device, force).await;
        build_status_payload(device, Some(&record), &self.config)
    }

    /// Display payloads from stored records only, one per device in order.
    pub fn cached_payloads(&self, devices: &[Device]) -> Vec<StatusPayload> {
        let records = self.cached_statuses(devices);
        devices
            .iter()
            .map(|d| build_status_payload(d, records.get(&d.id), &self.config))
            .collect()
    }

    fn is_fresh(&self, record: &PrinterStatus, now: DateTime<Utc>) -> bool {
        record
            .fetched_at
            .is_some_and(|at| now - at < self.config.poll_interval())
    }

    /// Run the poll on its own task so a panic inside it becomes a failure
    /// record instead of unwinding through the caller.
    async fn poll(&self, device: &Device) -> std::result::Result<PrinterSnmpSnapshot, PollError> {
        let poller = Arc::clone(&self.poller);
        let device = device.clone();
        let config = self.config.clone();
        let task = tokio::spawn(async move { poller.fetch_printer_status(&device, &config).await });
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(PollError::unexpected(e)),
        }
    }

    fn gate(&self, device_id: DeviceId) -> Arc<tokio::sync::Mutex<()>> {
        let mut gates = self.gates.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(gates.entry(device_id).or_default())
    }

    fn load(&self, device_id: DeviceId) -> Option<PrinterStatus> {
        match self.with_store(|store| store.get(device_id)) {
            Ok(record) => record,
            Err(e) => {
                warn!(device = %device_id, error = %e, "failed to load status");
                None
            }
        }
    }

    fn with_store<T>(&self, f: impl FnOnce(&StatusStore) -> Result<T>) -> Result<T> {
        let store = self
            .store
            .lock()
            .map_err(|_| PrintpulseError::Database("status store lock poisoned".into()))?;
        f(&store)
    }
}

/// Overwrite every snapshot field and mark the record healthy.
pub fn apply_snapshot(record: &mut PrinterStatus, snapshot: PrinterSnmpSnapshot) {
    record.status_code = snapshot.status_code;
    record.status_label = snapshot.status_label;
    record.device_status_code = snapshot.device_status_code;
    record.device_status_label = snapshot.device_status_label;
    record.error_state_raw = snapshot.error_state_raw;
    record.error_flags = snapshot.error_flags;
    record.alerts = snapshot.alerts;
    record.supplies = snapshot.supplies;
    record.console_lines = snapshot.console_lines;
    record.attention = snapshot.attention;
    record.snmp_ok = true;
    record.snmp_message.clear();
}

/// Record a failed poll. Earlier snapshot fields stay in place; the label is
/// only filled in when empty.
pub fn apply_failure(record: &mut PrinterStatus, err: &PollError) {
    let attention = err.kind == PollErrorKind::QueryError;
    record.snmp_ok = false;
    record.snmp_message = err.message.clone();
    record.attention = attention;
    if record.status_label.is_empty() {
        record.status_label = if attention {
            ATTENTION_LABEL
        } else {
            UNAVAILABLE_LABEL
        }
        .to_string();
    }
}
