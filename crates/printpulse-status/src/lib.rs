// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printpulse-status — Persisted per-printer status, the freshness-gated
// refresh policy, and display payloads.

pub mod cache;
pub mod payload;
pub mod store;

pub use cache::{StatusCache, apply_failure, apply_snapshot};
pub use payload::{StatusPayload, build_status_payload};
pub use store::StatusStore;
