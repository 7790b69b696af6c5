// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound response frames: `{ "msgid": ..., "result": "ok" }` or
//! `{ "msgid": ..., "error": { "code", "reason" } }`.

use gaffer_core::RegistryError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub reason: String,
}

impl ErrorBody {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self { code: "bad_request".to_string(), reason: reason.into() }
    }

    /// The `connection_lost` error synthesized for a registration client's
    /// pending requests when their connection drops before a response arrives.
    pub fn connection_lost() -> Self {
        Self { code: "connection_lost".to_string(), reason: "connection lost".to_string() }
    }
}

impl From<RegistryError> for ErrorBody {
    fn from(err: RegistryError) -> Self {
        Self { code: err.code().to_string(), reason: err.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub msgid: String,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Ok { result: String },
    Err { error: ErrorBody },
}

impl Response {
    pub fn ok(msgid: impl Into<String>) -> Self {
        Self { msgid: msgid.into(), body: ResponseBody::Ok { result: "ok".to_string() } }
    }

    pub fn err(msgid: impl Into<String>, error: ErrorBody) -> Self {
        Self { msgid: msgid.into(), body: ResponseBody::Err { error } }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
