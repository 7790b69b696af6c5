// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lookup endpoint: accepts duplex websocket connections, decodes
//! protocol frames, dispatches into the [`Registry`], and writes responses.
//!
//! Two paths are served: `/ws` (the registration channel: request/response)
//! and `/ws/events` (the subscription channel: server push only).

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gaffer_core::{ConnId, ConnIdGen, Registry, RegistryError};
use gaffer_wire::{ErrorBody, Request, Response, SubscriptionFrame, Verb};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::WebSocketStream;

/// Shared state for every connection accepted by a [`Listener`].
pub struct ListenCtx {
    pub registry: Mutex<Registry>,
    pub conn_ids: ConnIdGen,
    pub idle_cutoff: Duration,
}

impl ListenCtx {
    pub fn new(idle_cutoff: Duration) -> Self {
        Self { registry: Mutex::new(Registry::new()), conn_ids: ConnIdGen::new(), idle_cutoff }
    }
}

/// Accepts TCP connections and spawns a handler task for each.
pub struct Listener {
    tcp: TcpListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(tcp: TcpListener, ctx: Arc<ListenCtx>) -> Self {
        Self { tcp, ctx }
    }

    /// Accept connections until the process is terminated.
    pub async fn run(self) {
        loop {
            match self.tcp.accept().await {
                Ok((stream, addr)) => {
                    tracing::debug!(%addr, "accepted connection");
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        handle_connection(stream, ctx).await;
                    });
                }
                Err(e) => tracing::error!(error = %e, "accept error"),
            }
        }
    }
}

async fn handle_connection(stream: tokio::net::TcpStream, ctx: Arc<ListenCtx>) {
    let path = Arc::new(Mutex::new(String::new()));
    let path2 = Arc::clone(&path);
    let callback = move |req: &tokio_tungstenite::tungstenite::handshake::server::Request,
                          resp: tokio_tungstenite::tungstenite::handshake::server::Response| {
        *path2.lock() = req.uri().path().to_string();
        Ok(resp)
    };

    let ws = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(error = %e, "websocket handshake failed");
            return;
        }
    };

    match path.lock().as_str() {
        "/ws" => run_registration_session(ws, ctx).await,
        "/ws/events" => run_subscription_session(ws, ctx).await,
        other => tracing::warn!(path = other, "unrecognized endpoint path, closing"),
    }
}

/// Drives one `/ws` registration connection: accept → add_node, dispatch
/// frames in receive order, remove_node on disconnect or idle cutoff.
pub(crate) async fn run_registration_session<S>(mut ws: WebSocketStream<S>, ctx: Arc<ListenCtx>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let conn_id = ctx.conn_ids.next();
    // A freshly generated conn_id can never collide with one already in the
    // registry, so DuplicateNode is unreachable here.
    let _ = ctx.registry.lock().add_node(conn_id);

    loop {
        let frame = tokio::time::timeout(ctx.idle_cutoff, ws.next()).await;
        let message = match frame {
            Ok(Some(Ok(message))) => message,
            Ok(Some(Err(e))) => {
                tracing::debug!(%conn_id, error = %e, "connection error");
                break;
            }
            Ok(None) => {
                tracing::debug!(%conn_id, "client disconnected");
                break;
            }
            Err(_elapsed) => {
                tracing::debug!(%conn_id, "idle cutoff elapsed, closing");
                break;
            }
        };

        match message {
            Message::Text(text) => {
                let response = dispatch_request(&ctx.registry, conn_id, &text);
                let Ok(json) = serde_json::to_string(&response) else { continue };
                if ws.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {} // ping/pong/binary — ignored
        }
    }

    ctx.registry.lock().remove_node(conn_id);
}

/// Decode one inbound frame and apply it to the registry, producing the
/// response frame to send back. Never fails: undecodable frames become a
/// `bad_request` error response.
fn dispatch_request(registry: &Mutex<Registry>, conn_id: ConnId, text: &str) -> Response {
    let msgid = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("msgid").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_default();

    let request: Request = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(e) => return Response::err(msgid, ErrorBody::bad_request(e.to_string())),
    };

    match apply_verb(&mut registry.lock(), conn_id, request.verb) {
        Ok(()) => Response::ok(request.msgid),
        Err(e) => Response::err(request.msgid, e.into()),
    }
}

fn apply_verb(registry: &mut Registry, conn_id: ConnId, verb: Verb) -> Result<(), RegistryError> {
    match verb {
        Verb::Identify { name, port, broadcast_address, version } => {
            registry.identify(conn_id, name, port, broadcast_address, version)
        }
        Verb::Ping => registry.update(conn_id),
        Verb::AddJob { name } => registry.add_job(conn_id, name),
        Verb::RemoveJob { name } => registry.remove_job(conn_id, name),
        Verb::AddProcess { name, pid } => registry.add_process(conn_id, name, pid),
        Verb::RemoveProcess { name, pid } => registry.remove_process(conn_id, name, pid),
    }
}

/// Drives one `/ws/events` subscription connection: forwards every registry
/// event as a `SubscriptionFrame` until the client disconnects.
pub(crate) async fn run_subscription_session<S>(ws: WebSocketStream<S>, ctx: Arc<ListenCtx>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<SubscriptionFrame>();
    let sub_id = ctx.registry.lock().bind_all(move |event| {
        // Subscribers must not block; an unbounded enqueue and an immediate
        // return is the whole job.
        let _ = tx.send(SubscriptionFrame::from(event));
    });

    let (mut write, mut read) = ws.split();
    loop {
        tokio::select! {
            frame = rx.recv() => {
                let Some(frame) = frame else { break };
                let Ok(json) = serde_json::to_string(&frame) else { continue };
                if write.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            message = read.next() => {
                match message {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {} // inbound frames on the subscription channel are ignored
                }
            }
        }
    }

    ctx.registry.lock().unbind(sub_id);
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
