// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound request frames: `{ "msgid": ..., "msg": <verb>, ...params }`.

use gaffer_core::Pid;
use serde::{Deserialize, Serialize};

/// A decoded request frame, still carrying its `msgid` for response correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub msgid: String,
    #[serde(flatten)]
    pub verb: Verb,
}

/// The recognized request verbs and their parameters.
///
/// `#[serde(tag = "msg")]` dispatches on the `msg` field; unrecognized verbs
/// fail deserialization, which the endpoint turns into a `bad_request` error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg")]
pub enum Verb {
    #[serde(rename = "identify")]
    Identify { name: String, port: u16, broadcast_address: String, version: f64 },

    #[serde(rename = "ping")]
    Ping,

    #[serde(rename = "add_job")]
    AddJob { name: String },

    #[serde(rename = "remove_job")]
    RemoveJob { name: String },

    #[serde(rename = "add_process")]
    AddProcess { name: String, pid: Pid },

    #[serde(rename = "remove_process")]
    RemoveProcess { name: String, pid: Pid },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
