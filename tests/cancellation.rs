/*
 * cancellation.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Integration test for cancellation propagation and scope drain: stopping
 * the server completes a handler's in-flight receive with Cancelled, and
 * serve() returns only after every spawned task has finished.
 */

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use centralino::http::{MessageHeader, Method, RxMessage, TxMessage};
use centralino::net::{self, Connection, ServeOptions};
use centralino::Error;

#[tokio::test]
async fn stop_cancels_inflight_receive_and_drains_scope() {
    let _ = env_logger::builder().is_test(true).try_init();

    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let cancelled_seen = Arc::new(AtomicUsize::new(0));

    let token = CancellationToken::new();
    let (bound_tx, bound_rx) = oneshot::channel();
    let options = ServeOptions::new()
        .with_token(token.clone())
        .notify_bound(bound_tx);
    let endpoint: SocketAddr = "127.0.0.1:0".parse().unwrap();

    let server = {
        let started = started.clone();
        let finished = finished.clone();
        let cancelled_seen = cancelled_seen.clone();
        tokio::spawn(async move {
            net::serve(endpoint, options, move |mut conn: Connection| {
                let started = started.clone();
                let finished = finished.clone();
                let cancelled_seen = cancelled_seen.clone();
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    let result = async {
                        let mut rx = RxMessage::request(&mut conn);
                        rx.receive_header().await?;
                        // drain a chunked body the client never finishes
                        loop {
                            let chunk = rx.receive().await?;
                            if chunk.is_empty() {
                                break;
                            }
                        }
                        Ok::<_, Error>(())
                    }
                    .await;
                    if matches!(result, Err(Error::Cancelled)) {
                        cancelled_seen.fetch_add(1, Ordering::SeqCst);
                    }
                    finished.fetch_add(1, Ordering::SeqCst);
                    result
                }
            })
            .await
            .expect("serve failed");
        })
    };
    let bound = bound_rx.await.expect("server did not bind");

    // hold a long-lived chunked receive open on the server
    let mut conn = Connection::connect("127.0.0.1", bound.port(), CancellationToken::new())
        .await
        .unwrap();
    let mut tx = TxMessage::new(&mut conn);
    tx.send_header(&MessageHeader::request(Method::Post, "/stream").chunked())
        .await
        .unwrap();
    tx.send(b"first chunk").await.unwrap();

    // wait for the handler to be parked in receive()
    while started.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    token.cancel();
    timeout(Duration::from_secs(1), server)
        .await
        .expect("serve did not return after cancel")
        .unwrap();

    // scope drained: every spawned handler ran to completion
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(cancelled_seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn operations_on_a_cancelled_token_fail_immediately() {
    let token = CancellationToken::new();
    token.cancel();

    // connect with a fired token never succeeds
    let result = Connection::connect("127.0.0.1", 1, token.clone()).await;
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn cancelling_mid_connection_fails_the_next_op() {
    let _ = env_logger::builder().is_test(true).try_init();

    let server_token = CancellationToken::new();
    let (bound_tx, bound_rx) = oneshot::channel();
    let options = ServeOptions::new()
        .with_token(server_token.clone())
        .notify_bound(bound_tx);
    let endpoint: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = tokio::spawn(async move {
        net::serve(endpoint, options, |mut conn: Connection| async move {
            // sit in a receive the client never satisfies
            let mut buf = [0u8; 64];
            let _ = conn.recv(&mut buf).await?;
            Ok(())
        })
        .await
        .unwrap();
    });
    let bound = bound_rx.await.unwrap();

    let client_token = CancellationToken::new();
    let mut conn = Connection::connect("127.0.0.1", bound.port(), client_token.clone())
        .await
        .unwrap();

    let cancel = {
        let client_token = client_token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            client_token.cancel();
        })
    };

    // in-flight recv completes with Cancelled once the source fires
    let mut buf = [0u8; 64];
    let result = timeout(Duration::from_secs(1), conn.recv(&mut buf))
        .await
        .expect("recv did not observe cancellation");
    assert!(matches!(result, Err(Error::Cancelled)));

    // monotonicity: later operations with the same token also fail
    let result = conn.send_all(b"late").await;
    assert!(matches!(result, Err(Error::Cancelled)));

    cancel.await.unwrap();
    server_token.cancel();
    server.await.unwrap();
}
