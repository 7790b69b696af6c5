// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the node registration client.

use std::time::Duration;

/// Lookup service URLs to register with, comma-separated.
pub fn lookup_urls() -> Vec<String> {
    std::env::var("GAFFER_LOOKUP_URLS")
        .ok()
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
        .unwrap_or_default()
}

fn duration_ms(var: &str, default: Duration) -> Duration {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis).unwrap_or(default)
}

/// Interval between idle `ping` frames.
pub fn ping_interval() -> Duration {
    duration_ms("GAFFER_PING_INTERVAL_MS", Duration::from_secs(15))
}

/// Per-request timeout before a pending promise resolves with `timeout`.
pub fn request_timeout() -> Duration {
    duration_ms("GAFFER_REQUEST_TIMEOUT_MS", Duration::from_secs(10))
}

/// Initial reconnect backoff.
pub fn backoff_base() -> Duration {
    duration_ms("GAFFER_BACKOFF_BASE_MS", Duration::from_secs(1))
}

/// Reconnect backoff cap.
pub fn backoff_cap() -> Duration {
    duration_ms("GAFFER_BACKOFF_CAP_MS", Duration::from_secs(60))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
