// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::supervisor::{LoadedJob, SupervisorEvent, SupervisorSink};
use std::sync::Mutex as StdMutex;
use tokio_tungstenite::tungstenite::Message;

/// A test double driving the adapter and registration client: exposes an
/// `emit` hook that fires whatever callback `snapshot_and_subscribe`
/// registered, mirroring how a real supervisor would push live events.
struct TestSupervisor {
    snapshot: Vec<LoadedJob>,
    sink: StdMutex<Option<SupervisorSink>>,
}

impl TestSupervisor {
    fn new(snapshot: Vec<LoadedJob>) -> Self {
        Self { snapshot, sink: StdMutex::new(None) }
    }

    fn emit(&self, event: SupervisorEvent) {
        if let Some(sink) = self.sink.lock().unwrap().as_mut() {
            sink(event);
        }
    }
}

impl Supervisor for TestSupervisor {
    fn snapshot_and_subscribe(&self, sink: SupervisorSink) -> Vec<LoadedJob> {
        *self.sink.lock().unwrap() = Some(sink);
        self.snapshot.clone()
    }
}

fn config() -> ClientConfig {
    ClientConfig {
        url: "ws://localhost/ws".to_string(),
        ping_interval: Duration::from_secs(3600),
        request_timeout: Duration::from_secs(5),
        backoff_base: Duration::from_millis(10),
        backoff_cap: Duration::from_millis(100),
    }
}

fn identity() -> Identity {
    Identity {
        hostname: "node1".to_string(),
        port: 6000,
        broadcast_address: "node1:6000".to_string(),
        version: 1.0,
    }
}

/// A minimal fake lookup endpoint: decodes every request, records its verb,
/// and replies `ok` immediately.
async fn fake_lookup(
    ws: WebSocketStream<tokio::io::DuplexStream>,
    verbs: Arc<StdMutex<Vec<Verb>>>,
) {
    let (mut write, mut read) = ws.split();
    while let Some(Ok(Message::Text(text))) = read.next().await {
        let request: Request = serde_json::from_str(&text).unwrap();
        verbs.lock().unwrap().push(request.verb.clone());
        let response = Response::ok(request.msgid);
        write.send(Message::Text(serde_json::to_string(&response).unwrap())).await.unwrap();
    }
}

async fn connect() -> (
    WebSocketStream<tokio::io::DuplexStream>,
    WebSocketStream<tokio::io::DuplexStream>,
) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let server = tokio::spawn(async move { tokio_tungstenite::accept_async(server_io).await });
    let (client_ws, _resp) =
        tokio_tungstenite::client_async("ws://localhost/ws", client_io).await.unwrap();
    let server_ws = server.await.unwrap().unwrap();
    (client_ws, server_ws)
}

#[tokio::test]
async fn resyncs_then_forwards_supervisor_events_in_order() {
    let (client_ws, server_ws) = connect().await;
    let verbs = Arc::new(StdMutex::new(Vec::new()));
    tokio::spawn(fake_lookup(server_ws, Arc::clone(&verbs)));

    let supervisor = Arc::new(TestSupervisor::new(vec![LoadedJob {
        name: "a.job1".to_string(),
        pids: vec![1, 2],
    }]));
    let client = RegistrationClient::new(config(), identity(), Arc::clone(&supervisor));
    let run = tokio::spawn(async move { client.run_connection(client_ws).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    supervisor.emit(SupervisorEvent::ProcessExited { name: "a.job1".to_string(), pid: 1 });
    supervisor.emit(SupervisorEvent::JobUnloaded { name: "a.job1".to_string() });
    tokio::time::sleep(Duration::from_millis(50)).await;
    run.abort();

    let seen = verbs.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            Verb::Identify {
                name: "node1".to_string(),
                port: 6000,
                broadcast_address: "node1:6000".to_string(),
                version: 1.0
            },
            Verb::AddJob { name: "a.job1".to_string() },
            Verb::AddProcess { name: "a.job1".to_string(), pid: 1 },
            Verb::AddProcess { name: "a.job1".to_string(), pid: 2 },
            Verb::RemoveProcess { name: "a.job1".to_string(), pid: 1 },
            Verb::RemoveJob { name: "a.job1".to_string() },
        ]
    );
}

#[tokio::test]
async fn empty_snapshot_sends_only_identify() {
    let (client_ws, server_ws) = connect().await;
    let verbs = Arc::new(StdMutex::new(Vec::new()));
    tokio::spawn(fake_lookup(server_ws, Arc::clone(&verbs)));

    let supervisor = Arc::new(TestSupervisor::new(Vec::new()));
    let client = RegistrationClient::new(config(), identity(), supervisor);
    let run = tokio::spawn(async move { client.run_connection(client_ws).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    run.abort();

    assert_eq!(verbs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_identify_surfaces_as_an_error() {
    let (client_ws, server_ws) = connect().await;
    tokio::spawn(async move {
        let (mut write, mut read) = server_ws.split();
        if let Some(Ok(Message::Text(text))) = read.next().await {
            let request: Request = serde_json::from_str(&text).unwrap();
            let response = Response::err(
                request.msgid,
                gaffer_wire::ErrorBody { code: "ident_exists".to_string(), reason: "taken".to_string() },
            );
            write.send(Message::Text(serde_json::to_string(&response).unwrap())).await.unwrap();
        }
    });

    let supervisor = Arc::new(TestSupervisor::new(Vec::new()));
    let client = RegistrationClient::new(config(), identity(), supervisor);
    let result = client.run_connection(client_ws).await;

    assert!(matches!(result, Err(ClientError::Rejected { ref code, .. }) if code == "ident_exists"));
}
