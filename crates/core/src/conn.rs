// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection identifiers.
//!
//! A `ConnId` is the opaque handle the lookup endpoint assigns to each
//! accepted duplex connection. It is the identity of a [`crate::node::Node`]
//! entry in the registry and doubles as the non-owning back-reference a
//! [`crate::remote_job::RemoteJob`] keeps to the node that hosts it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque per-connection identifier, unique for the connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ConnId(u64);

impl ConnId {
    /// Build a `ConnId` from a raw value. Exposed for adapters that need to
    /// reconstruct an id (e.g. from logs or test fixtures); normal callers
    /// should obtain ids from a [`ConnIdGen`].
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Generates monotonically increasing [`ConnId`]s for newly accepted connections.
#[derive(Debug, Default)]
pub struct ConnIdGen {
    next: AtomicU64,
}

impl ConnIdGen {
    pub const fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    pub fn next(&self) -> ConnId {
        ConnId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
#[path = "conn_tests.rs"]
mod tests;
