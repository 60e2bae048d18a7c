// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for printpulse.

use thiserror::Error;

/// Top-level error type for printpulse operations outside the SNMP wire layer.
#[derive(Debug, Error)]
pub enum PrintpulseError {
    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown device: {0}")]
    UnknownDevice(i64),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintpulseError>;
