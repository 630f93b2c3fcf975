/*
 * websocket.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Integration tests for the WebSocket upgrade and frame exchange over
 * loopback: handshake verification, masked client echo, ping/pong, close,
 * and fragmentation of large messages.
 */

use std::net::SocketAddr;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use centralino::net::ServeOptions;
use centralino::ws::{self, DataKind, WsConnection, WsEvent};
use centralino::ClientTlsConfig;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Echo server: every data frame is sent back as text, close ends the task.
async fn echo_handler(mut ws: WsConnection) -> centralino::Result<()> {
    while let Some(event) = ws.receive().await? {
        match event {
            WsEvent::Data { data, .. } => ws.send_text(&data).await?,
            WsEvent::Close { .. } => break,
            WsEvent::Ping(_) | WsEvent::Pong(_) => {}
        }
    }
    Ok(())
}

async fn spawn_ws_server() -> (SocketAddr, CancellationToken, tokio::task::JoinHandle<()>) {
    let token = CancellationToken::new();
    let (bound_tx, bound_rx) = oneshot::channel();
    let options = ServeOptions::new()
        .with_token(token.clone())
        .notify_bound(bound_tx);
    let endpoint: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = tokio::spawn(async move {
        ws::serve(endpoint, options, echo_handler)
            .await
            .expect("serve failed");
    });
    let bound = bound_rx.await.expect("server did not bind");
    (bound, token, server)
}

#[tokio::test]
async fn handshake_and_masked_echo() {
    init_logging();
    let (bound, token, server) = spawn_ws_server().await;

    // connect() generates the key, verifies the 101 and the accept hash
    let mut client = ws::Client::connect(
        &format!("ws://127.0.0.1:{}/echo", bound.port()),
        &ClientTlsConfig::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    client.send_text(b"Hello world !").await.unwrap();
    match client.receive().await.unwrap() {
        Some(WsEvent::Data { kind, data, fin }) => {
            assert_eq!(kind, DataKind::Text);
            assert!(fin);
            assert_eq!(&data[..], b"Hello world !");
        }
        other => panic!("expected echoed text, got {:?}", other),
    }

    client.send_close(Some(1000), "done").await.unwrap();
    match client.receive().await.unwrap() {
        Some(WsEvent::Close { code, .. }) => assert_eq!(code, Some(1000)),
        other => panic!("expected close, got {:?}", other),
    }
    assert!(client.receive().await.unwrap().is_none());

    token.cancel();
    server.await.unwrap();
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    init_logging();
    let (bound, token, server) = spawn_ws_server().await;

    let mut client = ws::Client::connect(
        &format!("ws://127.0.0.1:{}/", bound.port()),
        &ClientTlsConfig::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    // the server connection answers pings internally; the echo handler
    // never sees them
    client.send_ping(b"tick").await.unwrap();
    match client.receive().await.unwrap() {
        Some(WsEvent::Pong(data)) => assert_eq!(&data[..], b"tick"),
        other => panic!("expected pong, got {:?}", other),
    }

    client.send_close(Some(1000), "").await.unwrap();
    while client.receive().await.unwrap().is_some() {}

    token.cancel();
    server.await.unwrap();
}

#[tokio::test]
async fn large_message_fragments_and_reassembles() {
    init_logging();
    let (bound, token, server) = spawn_ws_server().await;

    let mut client = ws::Client::connect(
        &format!("ws://127.0.0.1:{}/", bound.port()),
        &ClientTlsConfig::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    // over the 64 KiB frame cap, so the client must fragment
    let message: Vec<u8> = (0..100_000usize).map(|i| (i % 251) as u8).collect();
    client.send_binary(&message).await.unwrap();

    // the server surfaces the fragments as they arrive and echoes each as
    // its own message; reassemble everything we get back
    let mut received = Vec::new();
    while received.len() < message.len() {
        match client.receive().await.unwrap() {
            Some(WsEvent::Data { data, .. }) => received.extend_from_slice(&data),
            other => panic!("expected data, got {:?}", other),
        }
    }
    assert_eq!(received, message);

    client.send_close(Some(1000), "").await.unwrap();
    while client.receive().await.unwrap().is_some() {}

    token.cancel();
    server.await.unwrap();
}

#[tokio::test]
async fn non_upgrade_request_is_refused() {
    init_logging();
    let (bound, token, server) = spawn_ws_server().await;

    use centralino::http::{MessageHeader, Method, RxMessage, TxMessage};
    use centralino::net::Connection;

    let mut conn = Connection::connect("127.0.0.1", bound.port(), CancellationToken::new())
        .await
        .unwrap();
    let mut tx = TxMessage::new(&mut conn);
    tx.send_header(&MessageHeader::request(Method::Get, "/").content_length(0))
        .await
        .unwrap();
    tx.finish().await.unwrap();
    let mut rx = RxMessage::response(&mut conn);
    let response = rx.receive_header().await.unwrap();
    assert_eq!(response.status(), Some(400));

    token.cancel();
    server.await.unwrap();
}
