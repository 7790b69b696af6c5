// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the lookup daemon.

use std::time::Duration;

/// Listen address for the `/ws` and `/ws/events` endpoints.
pub fn listen_addr() -> String {
    std::env::var("GAFFER_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string())
}

/// Idle cutoff: a connection that sends no frame (including `ping`) within
/// this window is closed, triggering `remove_node`.
pub fn idle_cutoff() -> Duration {
    std::env::var("GAFFER_IDLE_CUTOFF_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
