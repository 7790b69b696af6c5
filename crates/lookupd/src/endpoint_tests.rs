// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

fn ctx() -> Arc<ListenCtx> {
    Arc::new(ListenCtx::new(Duration::from_secs(30)))
}

async fn connect() -> (
    tokio_tungstenite::WebSocketStream<tokio::io::DuplexStream>,
    tokio_tungstenite::WebSocketStream<tokio::io::DuplexStream>,
) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let server = tokio::spawn(async move { tokio_tungstenite::accept_async(server_io).await });
    let (client, _resp) = tokio_tungstenite::client_async("ws://localhost/ws", client_io)
        .await
        .expect("client handshake");
    let server = server.await.expect("join").expect("server handshake");
    (client, server)
}

// A full protocol round trip over the registration channel.
#[tokio::test]
async fn protocol_round_trip() {
    let (mut client, server) = connect().await;
    let ctx = ctx();
    tokio::spawn(run_registration_session(server, Arc::clone(&ctx)));

    let requests = [
        r#"{"msgid":"1","msg":"identify","name":"host1","port":5000,"broadcast_address":"host1:5000","version":1.0}"#,
        r#"{"msgid":"2","msg":"ping"}"#,
        r#"{"msgid":"3","msg":"add_job","name":"a.job1"}"#,
        r#"{"msgid":"4","msg":"add_process","name":"a.job1","pid":1}"#,
        r#"{"msgid":"5","msg":"remove_process","name":"a.job1","pid":1}"#,
        r#"{"msgid":"6","msg":"remove_job","name":"a.job1"}"#,
    ];

    for (i, req) in requests.iter().enumerate() {
        client.send(Message::Text(req.to_string())).await.unwrap();
        let Some(Ok(Message::Text(reply))) = client.next().await else {
            panic!("expected a text reply for request {i}");
        };
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["msgid"], (i + 1).to_string());
        assert_eq!(value["result"], "ok", "request {i} failed: {value}");
    }
}

#[tokio::test]
async fn malformed_frame_yields_bad_request() {
    let (mut client, server) = connect().await;
    let ctx = ctx();
    tokio::spawn(run_registration_session(server, ctx));

    client.send(Message::Text(r#"{"msgid":"1","msg":"not_a_verb"}"#.to_string())).await.unwrap();
    let Some(Ok(Message::Text(reply))) = client.next().await else {
        panic!("expected a text reply");
    };
    let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["error"]["code"], "bad_request");
}

#[tokio::test]
async fn identify_conflict_surfaces_registry_error() {
    let (mut client, server) = connect().await;
    let ctx = ctx();
    tokio::spawn(run_registration_session(server, ctx));

    let add_job = r#"{"msgid":"1","msg":"add_job","name":"a.job1"}"#;
    client.send(Message::Text(add_job.to_string())).await.unwrap();
    let Some(Ok(Message::Text(reply))) = client.next().await else {
        panic!("expected a reply");
    };
    let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["error"]["code"], "no_ident");
}

#[tokio::test]
async fn disconnect_removes_the_node() {
    let (client, server) = connect().await;
    let ctx = ctx();
    let registry_handle = tokio::spawn(run_registration_session(server, Arc::clone(&ctx)));

    drop(client);
    registry_handle.await.expect("session task");

    assert!(ctx.registry.lock().jobs().is_empty());
}

#[tokio::test]
async fn subscription_channel_streams_events() {
    let (sub_client_io, sub_server_io) = tokio::io::duplex(64 * 1024);
    let ctx = ctx();

    let sub_server = tokio::spawn(async move { tokio_tungstenite::accept_async(sub_server_io).await });
    let (mut sub_client, _resp) =
        tokio_tungstenite::client_async("ws://localhost/ws/events", sub_client_io)
            .await
            .expect("client handshake");
    let sub_server = sub_server.await.expect("join").expect("server handshake");
    tokio::spawn(run_subscription_session(sub_server, Arc::clone(&ctx)));

    // give the subscription task a moment to bind before mutating
    tokio::task::yield_now().await;

    let conn_id = ctx.conn_ids.next();
    ctx.registry.lock().add_node(conn_id).unwrap();

    let Some(Ok(Message::Text(frame))) = sub_client.next().await else {
        panic!("expected an event frame");
    };
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["event"], "add_node");
}
