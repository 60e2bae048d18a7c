// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: loads configuration and the device inventory, opens
// the status store, and exposes the operations the CLI runs.

use std::path::Path;

use printpulse_core::error::{PrintpulseError, Result};
use printpulse_core::{AppConfig, Device, DeviceId};
use printpulse_snmp::{PrinterPoller, SnmpPoller};
use printpulse_status::{StatusCache, StatusPayload, StatusStore};
use tracing::{info, warn};

use super::data_dir;

const CONFIG_FILE: &str = "config.json";
const DEVICES_FILE: &str = "devices.json";
const DATABASE_FILE: &str = "status.db";

pub struct AppServices<P = SnmpPoller> {
    cache: StatusCache<P>,
    /// Inventory, ordered by campus label.
    devices: Vec<Device>,
}

impl AppServices<SnmpPoller> {
    /// Initialise all services. Call once at startup.
    pub fn init(explicit_dir: Option<&Path>) -> Result<Self> {
        Self::init_with(explicit_dir, SnmpPoller::new())
    }
}

impl<P: PrinterPoller> AppServices<P> {
    pub fn init_with(explicit_dir: Option<&Path>, poller: P) -> Result<Self> {
        let dir = data_dir::data_dir(explicit_dir)?;
        info!(path = %dir.display(), "initialising app services");

        // Load persisted config or use defaults
        let mut config = load_config(&dir).unwrap_or_default();
        config.snmp.apply_env_overrides()?;

        let db_path = config
            .database_path
            .clone()
            .unwrap_or_else(|| dir.join(DATABASE_FILE));
        let store = StatusStore::open(&db_path)?;

        let devices_path = config
            .devices_path
            .clone()
            .unwrap_or_else(|| dir.join(DEVICES_FILE));
        let devices = load_devices(&devices_path)?;

        info!(devices = devices.len(), "app services initialised");
        Ok(Self {
            cache: StatusCache::new(poller, store, config.snmp),
            devices,
        })
    }

    pub fn device(&self, id: DeviceId) -> Result<&Device> {
        self.devices
            .iter()
            .find(|d| d.id == id)
            .ok_or(PrintpulseError::UnknownDevice(id.0))
    }

    pub async fn prewarm(&self, force: bool) -> usize {
        self.cache.prewarm(&self.devices, force).await
    }

    pub async fn status(&self, id: DeviceId, force: bool) -> Result<StatusPayload> {
        let device = self.device(id)?;
        Ok(self.cache.status_payload(device, force).await)
    }

    /// Cached payloads for the whole inventory. Never polls.
    pub fn list(&self) -> Vec<StatusPayload> {
        self.cache.cached_payloads(&self.devices)
    }
}

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

/// Read the inventory. A missing file is an empty inventory; a malformed one
/// is an error.
fn load_devices(path: &Path) -> Result<Vec<Device>> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "no device inventory found");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    let mut devices: Vec<Device> = serde_json::from_str(&data)?;
    devices.sort_by(|a, b| a.campus_label.cmp(&b.campus_label));
    Ok(devices)
}
