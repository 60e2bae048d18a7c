// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PrintpulseError, Result};

/// SNMP polling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpConfig {
    /// Community string sent with every v1/v2c request.
    pub community: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: f64,
    /// Retransmissions per request after the first send.
    pub retries: u32,
    /// A cached status younger than this is served without polling.
    pub poll_interval_seconds: u64,
    /// UDP port of the SNMP agent (default 161).
    pub port: u16,
    /// Master switch. When false every poll reports "not configured".
    pub enabled: bool,
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            community: "public".into(),
            timeout_secs: 3.0,
            retries: 1,
            poll_interval_seconds: 300,
            port: 161,
            enabled: true,
        }
    }
}

impl SnmpConfig {
    /// Per-request timeout. Non-finite or non-positive values fall back to 3s.
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs.is_finite() && self.timeout_secs > 0.0 {
            Duration::from_secs_f64(self.timeout_secs.min(3600.0))
        } else {
            Duration::from_secs(3)
        }
    }

    pub fn poll_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.poll_interval_seconds.min(i64::MAX as u64) as i64)
    }

    /// Apply `PRINTPULSE_SNMP_*` overrides on top of the loaded values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(community) = lookup("PRINTPULSE_SNMP_COMMUNITY") {
            self.community = community;
        }
        if let Some(raw) = lookup("PRINTPULSE_SNMP_TIMEOUT") {
            self.timeout_secs = parse_override("PRINTPULSE_SNMP_TIMEOUT", &raw)?;
        }
        if let Some(raw) = lookup("PRINTPULSE_SNMP_RETRIES") {
            self.retries = parse_override("PRINTPULSE_SNMP_RETRIES", &raw)?;
        }
        if let Some(raw) = lookup("PRINTPULSE_SNMP_POLL_INTERVAL_SECONDS") {
            self.poll_interval_seconds =
                parse_override("PRINTPULSE_SNMP_POLL_INTERVAL_SECONDS", &raw)?;
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| PrintpulseError::Config(format!("{key}={raw:?}: {e}")))
}

/// Persistent application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub snmp: SnmpConfig,
    /// Overrides the status database location (defaults to the data dir).
    pub database_path: Option<std::path::PathBuf>,
    /// Overrides the device inventory location (defaults to the data dir).
    pub devices_path: Option<std::path::PathBuf>,
}
