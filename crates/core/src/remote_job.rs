// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RemoteJob`: one row per `(node, job-name)` pair held by the registry.

use crate::conn::ConnId;
use crate::node::Pid;
use serde::{Deserialize, Serialize};

/// A single `(node, job-name)` row.
///
/// Uniquely keyed by `(node, name)`. `node` is a non-owning back-reference:
/// the registry owns the lifetime of both the [`crate::node::Node`] and this
/// row, so a bare [`ConnId`] handle is enough to look the node back up
/// without creating a reference cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteJob {
    /// Canonical `"<session-id>.<short-name>"` form.
    pub name: String,
    pub node: ConnId,
    /// Process identifiers believed live on `node` for this job, in the
    /// order `add_process` observed them. May contain duplicates: the
    /// registry does not deduplicate on append.
    pub pids: Vec<Pid>,
}
