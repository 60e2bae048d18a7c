// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session-level and poll-level error types.

use async_snmp::ErrorStatus;
use thiserror::Error;

/// Errors raised while talking SNMP to a single agent.
#[derive(Debug, Error)]
pub enum SnmpError {
    #[error("No SNMP response received before timeout from {target} ({attempts} attempt(s))")]
    Timeout { target: String, attempts: u32 },

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{status} at index {index}")]
    Status { status: ErrorStatus, index: u32 },

    /// Any other client failure: bad response, address, or configuration.
    #[error("{0}")]
    Client(String),

    #[error("session already closed")]
    Closed,
}

impl SnmpError {
    /// Map a client error, naming `target` in timeouts.
    pub(crate) fn from_client(err: Box<async_snmp::Error>, target: &str) -> Self {
        match *err {
            async_snmp::Error::Snmp { status, index, .. } => Self::Status { status, index },
            async_snmp::Error::Timeout { retries, .. } => Self::Timeout {
                target: target.to_string(),
                attempts: retries.saturating_add(1),
            },
            other => Self::Client(other.to_string()),
        }
    }

    /// True for the v1 "ran off the end of the MIB" report.
    pub fn is_no_such_name(&self) -> bool {
        matches!(
            self,
            Self::Status {
                status: ErrorStatus::NoSuchName,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, SnmpError>;

/// Why a poll produced no snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollErrorKind {
    /// No address, SNMP disabled, or no usable transport. Not an operational
    /// fault; nothing changes until the configuration does.
    NotConfigured,
    /// The device could not be queried (timeout, error status, bad response).
    QueryError,
}

/// Typed poll failure returned to the status cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PollError {
    pub kind: PollErrorKind,
    pub message: String,
}

impl PollError {
    pub fn not_configured(message: impl Into<String>) -> Self {
        Self {
            kind: PollErrorKind::NotConfigured,
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self {
            kind: PollErrorKind::QueryError,
            message: message.into(),
        }
    }

    /// Wrap a failure outside the taxonomy as a query error.
    pub fn unexpected(err: impl std::fmt::Display) -> Self {
        Self::query(format!("SNMP error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_reads_like_agent_report() {
        let err = SnmpError::Status {
            status: ErrorStatus::NoSuchName,
            index: 1,
        };
        assert_eq!(err.to_string(), "noSuchName at index 1");
        assert!(err.is_no_such_name());
    }

    #[test]
    fn client_errors_are_mapped() {
        let err = SnmpError::from_client(
            Box::new(async_snmp::Error::Config("bad target".into())),
            "192.0.2.1:161",
        );
        assert!(matches!(err, SnmpError::Client(ref m) if m.contains("bad target")));
        assert!(!err.is_no_such_name());
    }

    #[test]
    fn unexpected_is_query_shaped() {
        let err = PollError::unexpected("task panicked");
        assert_eq!(err.kind, PollErrorKind::QueryError);
        assert_eq!(err.message, "SNMP error: task panicked");
    }
}
