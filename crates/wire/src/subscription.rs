// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound subscription-stream frames: `{ "event": <name>, "payload": ... }`.
//!
//! Node events carry a full `Node` snapshot; job/process events carry
//! `{ job_name, pid? }`. Built from a [`gaffer_core::Event`] rather than
//! reusing its wire shape directly, since the streaming payload elides the
//! `event` tag duplication `Event`'s own `#[serde(tag = "event")]` would
//! otherwise produce inside a nested `payload` object.

use gaffer_core::{Event, Node, Pid};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionFrame {
    pub event: String,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Node(Node),
    Job {
        job_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pid: Option<Pid>,
    },
}

impl From<&Event> for SubscriptionFrame {
    fn from(event: &Event) -> Self {
        let payload = match event {
            Event::AddNode { node }
            | Event::RemoveNode { node }
            | Event::Identify { node }
            | Event::Update { node } => Payload::Node(node.clone()),
            Event::AddJob { job_name, .. } => {
                Payload::Job { job_name: job_name.clone(), pid: None }
            }
            Event::RemoveJob { job_name } => {
                Payload::Job { job_name: job_name.clone(), pid: None }
            }
            Event::AddProcess { job_name, pid } | Event::RemoveProcess { job_name, pid } => {
                Payload::Job { job_name: job_name.clone(), pid: Some(*pid) }
            }
        };
        SubscriptionFrame { event: event.name().to_string(), payload }
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
