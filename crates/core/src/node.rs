// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Node` entry: one row per live connection to the lookup service.

use crate::conn::ConnId;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// A node-local process identifier. Matches the width the original
/// supervisor hands us (an OS `pid_t`), not a registry-generated id.
pub type Pid = i32;

/// One entry per live connection to the lookup service.
///
/// Exists in the registry from the moment a connection is accepted until
/// it disconnects. Only identified nodes may own jobs; `(hostname, port)`
/// is unique across identified nodes ([`crate::error::RegistryError::IdentExists`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub conn_id: ConnId,
    pub identified: bool,
    pub hostname: String,
    pub port: u16,
    pub broadcast_address: String,
    /// Numeric version of the node software (the original reports this as a
    /// float, e.g. `1.0`; preserved verbatim rather than coerced to an int).
    pub version: f64,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    /// session-id → set of full (`"<session>.<name>"`) job names the node
    /// hosts in that session.
    pub sessions: IndexMap<String, IndexSet<String>>,
}

impl Node {
    /// Build a fresh, unidentified node. Exposed beyond the registry since
    /// every field here is already `pub`; test doubles and fixtures in
    /// other crates (`gaffer-wire`'s subscription-frame tests) construct one
    /// directly rather than spinning up a whole [`crate::registry::Registry`].
    pub fn new(conn_id: ConnId, now_ms: u64) -> Self {
        Self {
            conn_id,
            identified: false,
            hostname: String::new(),
            port: 0,
            broadcast_address: String::new(),
            version: 0.0,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            sessions: IndexMap::new(),
        }
    }

    /// Whether this node currently lists `job_name` under its session.
    ///
    /// Mirrors the registry's own fallback for a dotless name (the name
    /// becomes its own session), so this stays consistent with whatever
    /// `Registry::add_job`/`remove_job` actually filed it under.
    pub fn holds_job(&self, job_name: &str) -> bool {
        let session = session_of(job_name).unwrap_or(job_name);
        self.sessions.get(session).is_some_and(|jobs| jobs.contains(job_name))
    }

    /// All `(session, job_name)` pairs held by this node, in the order they
    /// were registered. Used by [`crate::registry::Registry::remove_node`]
    /// to drive the cascading `remove_job` sequence.
    pub fn job_pairs(&self) -> Vec<(String, String)> {
        self.sessions
            .iter()
            .flat_map(|(session, jobs)| jobs.iter().map(move |job| (session.clone(), job.clone())))
            .collect()
    }
}

/// Splits a canonical `"<session>.<name>"` job name on its first dot,
/// returning the session component. Returns `None` for a name with no dot.
pub fn session_of(job_name: &str) -> Option<&str> {
    job_name.split_once('.').map(|(session, _)| session)
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
