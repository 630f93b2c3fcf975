/*
 * tls_echo.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Integration test for TLS interposition: a self-signed server, an
 * allow-untrusted client, and a kilobyte echoed both ways in 100-byte
 * chunks through the chunked message path.
 */

use std::net::SocketAddr;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use centralino::http::{MessageHeader, Method, RxMessage, TxMessage};
use centralino::net::{self, Connection, ServeOptions};
use centralino::{ClientTlsConfig, ServerTlsConfig};

const CERT_PEM: &[u8] = include_bytes!("certs/cert.pem");
const KEY_PEM: &[u8] = include_bytes!("certs/key.pem");

const TOTAL: usize = 1000;
const CHUNK: usize = 100;

fn pattern() -> Vec<u8> {
    (0..TOTAL).map(|i| b'a' + (i % 26) as u8).collect()
}

#[tokio::test]
async fn tls_echo_both_ways() {
    let _ = env_logger::builder().is_test(true).try_init();

    let token = CancellationToken::new();
    let (bound_tx, bound_rx) = oneshot::channel();
    let tls = ServerTlsConfig::from_pem(CERT_PEM, KEY_PEM).expect("bad fixture");
    let options = ServeOptions::new()
        .with_tls(tls)
        .with_token(token.clone())
        .notify_bound(bound_tx);
    let endpoint: SocketAddr = "127.0.0.1:0".parse().unwrap();

    let server = tokio::spawn(async move {
        net::serve(endpoint, options, |mut conn: Connection| async move {
            let mut rx = RxMessage::request(&mut conn);
            rx.receive_header().await?;
            let body = rx.receive_all().await?;
            drop(rx);
            let mut tx = TxMessage::new(&mut conn);
            tx.send_header(&MessageHeader::response(200).chunked()).await?;
            for chunk in body.chunks(CHUNK) {
                tx.send(chunk).await?;
            }
            tx.finish().await
        })
        .await
        .expect("serve failed");
    });
    let bound = bound_rx.await.expect("server did not bind");

    let tls = ClientTlsConfig::new().allow_untrusted();
    let mut conn = Connection::connect_tls(
        "127.0.0.1",
        bound.port(),
        &tls,
        CancellationToken::new(),
    )
    .await
    .expect("tls connect failed");

    let data = pattern();
    let mut tx = TxMessage::new(&mut conn);
    tx.send_header(&MessageHeader::request(Method::Post, "/echo").chunked())
        .await
        .unwrap();
    for chunk in data.chunks(CHUNK) {
        tx.send(chunk).await.unwrap();
    }
    tx.finish().await.unwrap();

    let mut rx = RxMessage::response(&mut conn);
    let response = rx.receive_header().await.unwrap();
    assert_eq!(response.status(), Some(200));
    let echoed = rx.receive_all().await.unwrap();
    assert_eq!(echoed.len(), TOTAL);
    assert_eq!(&echoed[..], &data[..]);

    token.cancel();
    server.await.unwrap();
}

#[tokio::test]
async fn untrusted_chain_rejected_by_default() {
    let _ = env_logger::builder().is_test(true).try_init();

    let token = CancellationToken::new();
    let (bound_tx, bound_rx) = oneshot::channel();
    let tls = ServerTlsConfig::from_pem(CERT_PEM, KEY_PEM).unwrap();
    let options = ServeOptions::new()
        .with_tls(tls)
        .with_token(token.clone())
        .notify_bound(bound_tx);
    let endpoint: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = tokio::spawn(async move {
        net::serve(endpoint, options, |_conn: Connection| async move { Ok(()) })
            .await
            .expect("serve failed");
    });
    let bound = bound_rx.await.unwrap();

    // default verify mode must refuse the self-signed chain
    let tls = ClientTlsConfig::new();
    let result = Connection::connect_tls(
        "127.0.0.1",
        bound.port(),
        &tls,
        CancellationToken::new(),
    )
    .await;
    assert!(matches!(result, Err(centralino::Error::Tls(_))));

    token.cancel();
    server.await.unwrap();
}

#[test]
fn pem_fixture_decodes() {
    assert!(ServerTlsConfig::from_pem(CERT_PEM, KEY_PEM).is_ok());
    assert!(ServerTlsConfig::from_pem(b"garbage", KEY_PEM).is_err());
}
