// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the registration client's connection handling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed protocol frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request timed out waiting for a response")]
    Timeout,

    #[error("connection lost before a response arrived")]
    ConnectionLost,

    #[error("lookup service rejected the request: {code}: {reason}")]
    Rejected { code: String, reason: String },
}
