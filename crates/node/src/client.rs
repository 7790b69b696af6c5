// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The node-side registration client: owns one persistent connection to a
//! lookup service, identifies, resyncs local supervisor state, and mirrors
//! subsequent supervisor events onto the wire.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use gaffer_wire::{Request, Response, ResponseBody, Verb};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, WebSocketStream};

use crate::adapter;
use crate::error::ClientError;
use crate::supervisor::Supervisor;

/// Static identity a node presents on every `identify` call.
#[derive(Debug, Clone)]
pub struct Identity {
    pub hostname: String,
    pub port: u16,
    pub broadcast_address: String,
    pub version: f64,
}

/// Tunables for one registration connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub ping_interval: Duration,
    pub request_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

/// Outcome of a request the client sent, as seen by whoever is awaiting it.
type Outcome = Result<(), ClientError>;

/// Monotonically-increasing per-connection request id, rendered as decimal text.
#[derive(Default)]
struct MsgId(AtomicU64);

impl MsgId {
    fn next(&self) -> String {
        self.0.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

/// Owns a connection per configured lookup URL for one [`Supervisor`].
pub struct RegistrationClient<S: Supervisor> {
    config: ClientConfig,
    identity: Identity,
    supervisor: Arc<S>,
}

impl<S: Supervisor + 'static> RegistrationClient<S> {
    pub fn new(config: ClientConfig, identity: Identity, supervisor: Arc<S>) -> Self {
        Self { config, identity, supervisor }
    }

    /// Runs forever: connect, identify, resync, forward events; on any
    /// connection fault, back off and reconnect.
    pub async fn run(self) {
        let mut backoff = self.config.backoff_base;
        loop {
            match connect_async(self.config.url.as_str()).await {
                Ok((ws, _response)) => {
                    tracing::info!(url = %self.config.url, "registration client connected");
                    backoff = self.config.backoff_base;
                    if let Err(e) = self.run_connection(ws).await {
                        tracing::warn!(url = %self.config.url, error = %e, "registration connection ended");
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %self.config.url, error = %e, "registration connect failed");
                }
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(self.config.backoff_cap);
        }
    }

    async fn run_connection<T>(&self, ws: WebSocketStream<T>) -> Result<(), ClientError>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut write, mut read) = ws.split();
        let msgid = MsgId::default();

        self.send_request(
            &mut write,
            &mut read,
            &msgid,
            Verb::Identify {
                name: self.identity.hostname.clone(),
                port: self.identity.port,
                broadcast_address: self.identity.broadcast_address.clone(),
                version: self.identity.version,
            },
        )
        .await?;

        // Single critical section on the supervisor: snapshot + subscribe.
        // Events the sink receives from this point on are forwarded after
        // resync, keeping the two streams deduplicated.
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let sink = Box::new(move |event| {
            let _ = event_tx.send(event);
        });
        let snapshot = self.supervisor.snapshot_and_subscribe(sink);

        for job in snapshot {
            self.send_request(&mut write, &mut read, &msgid, Verb::AddJob { name: job.name.clone() })
                .await?;
            for pid in job.pids {
                self.send_request(
                    &mut write,
                    &mut read,
                    &msgid,
                    Verb::AddProcess { name: job.name.clone(), pid },
                )
                .await?;
            }
        }

        self.forward_loop(write, read, &msgid, &mut event_rx).await
    }

    /// Post-resync steady state: forwards supervisor events, answers
    /// responses out of a pending map, pings on idle, times out stale
    /// requests without tearing down the connection.
    async fn forward_loop<T>(
        &self,
        mut write: SplitSink<WebSocketStream<T>, Message>,
        mut read: SplitStream<WebSocketStream<T>>,
        msgid: &MsgId,
        event_rx: &mut mpsc::UnboundedReceiver<crate::supervisor::SupervisorEvent>,
    ) -> Result<(), ClientError>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let mut pending: HashMap<String, oneshot::Sender<Outcome>> = HashMap::new();
        let (timeout_tx, mut timeout_rx) = mpsc::unbounded_channel::<String>();

        let mut ping_timer = tokio::time::interval(self.config.ping_interval);
        ping_timer.tick().await; // first tick fires immediately; skip it

        loop {
            tokio::select! {
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            let response: Response = serde_json::from_str(&text)?;
                            if let Some(reply) = pending.remove(&response.msgid) {
                                let _ = reply.send(outcome_of(response.body));
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                    }
                }
                event = event_rx.recv() => {
                    let Some(event) = event else { break };
                    let verb = adapter::translate(event);
                    self.enqueue(&mut write, msgid, verb, &mut pending, &timeout_tx).await?;
                }
                _ = ping_timer.tick() => {
                    self.enqueue(&mut write, msgid, Verb::Ping, &mut pending, &timeout_tx).await?;
                }
                expired = timeout_rx.recv() => {
                    let Some(expired) = expired else { continue };
                    if let Some(reply) = pending.remove(&expired) {
                        let _ = reply.send(Err(ClientError::Timeout));
                    }
                }
            }
        }

        for (_, reply) in pending.drain() {
            let _ = reply.send(Err(ClientError::ConnectionLost));
        }
        Ok(())
    }

    /// Sends a frame without waiting for its reply inline; the reply (or a
    /// timeout) resolves later in the steady-state select loop.
    async fn enqueue<T>(
        &self,
        write: &mut SplitSink<WebSocketStream<T>, Message>,
        msgid: &MsgId,
        verb: Verb,
        pending: &mut HashMap<String, oneshot::Sender<Outcome>>,
        timeout_tx: &mpsc::UnboundedSender<String>,
    ) -> Result<(), ClientError>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let id = msgid.next();
        let request = Request { msgid: id.clone(), verb };
        write.send(Message::Text(serde_json::to_string(&request)?)).await?;

        let (tx, rx) = oneshot::channel();
        pending.insert(id.clone(), tx);
        tokio::spawn(async move {
            if let Ok(Err(e)) = rx.await {
                tracing::warn!(error = %e, "forwarded registration request failed");
            }
        });

        let timeout = self.config.request_timeout;
        let timeout_tx = timeout_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = timeout_tx.send(id);
        });
        Ok(())
    }

    /// Sends a frame and awaits its correlated reply inline, used only
    /// during the sequential identify+resync phase where no other request
    /// is in flight.
    async fn send_request<T>(
        &self,
        write: &mut SplitSink<WebSocketStream<T>, Message>,
        read: &mut SplitStream<WebSocketStream<T>>,
        msgid: &MsgId,
        verb: Verb,
    ) -> Result<(), ClientError>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let id = msgid.next();
        let request = Request { msgid: id.clone(), verb };
        write.send(Message::Text(serde_json::to_string(&request)?)).await?;

        let deadline = tokio::time::sleep(self.config.request_timeout);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            let response: Response = serde_json::from_str(&text)?;
                            if response.msgid == id {
                                return outcome_of(response.body);
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => return Err(ClientError::ConnectionLost),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                    }
                }
                _ = &mut deadline => return Err(ClientError::Timeout),
            }
        }
    }
}

fn outcome_of(body: ResponseBody) -> Outcome {
    match body {
        ResponseBody::Ok { .. } => Ok(()),
        ResponseBody::Err { error } => Err(ClientError::Rejected { code: error.code, reason: error.reason }),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
