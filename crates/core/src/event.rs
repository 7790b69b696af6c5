// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry change events, published on the event bus at the point of mutation.

use crate::node::{Node, Pid};
use serde::{Deserialize, Serialize};

/// A change published by the registry. Payloads are snapshots: mutating
/// registry state after delivery must never affect an already-delivered
/// payload, so every variant owns its data rather than borrowing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Event {
    #[serde(rename = "add_node")]
    AddNode { node: Node },

    #[serde(rename = "remove_node")]
    RemoveNode { node: Node },

    #[serde(rename = "identify")]
    Identify { node: Node },

    #[serde(rename = "update")]
    Update { node: Node },

    #[serde(rename = "add_job")]
    AddJob { job_name: String, node: Node },

    #[serde(rename = "remove_job")]
    RemoveJob { job_name: String },

    #[serde(rename = "add_process")]
    AddProcess { job_name: String, pid: Pid },

    #[serde(rename = "remove_process")]
    RemoveProcess { job_name: String, pid: Pid },
}

impl Event {
    /// The event's wire name, exactly as used in `bind(name, ...)` and in
    /// the subscription stream's `{"event": name, ...}` frames.
    pub const fn name(&self) -> &'static str {
        match self {
            Event::AddNode { .. } => "add_node",
            Event::RemoveNode { .. } => "remove_node",
            Event::Identify { .. } => "identify",
            Event::Update { .. } => "update",
            Event::AddJob { .. } => "add_job",
            Event::RemoveJob { .. } => "remove_job",
            Event::AddProcess { .. } => "add_process",
            Event::RemoveProcess { .. } => "remove_process",
        }
    }

    /// The node this event pertains to, when the event carries one.
    pub fn node(&self) -> Option<&Node> {
        match self {
            Event::AddNode { node }
            | Event::RemoveNode { node }
            | Event::Identify { node }
            | Event::Update { node }
            | Event::AddJob { node, .. } => Some(node),
            Event::RemoveJob { .. } | Event::AddProcess { .. } | Event::RemoveProcess { .. } => {
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
