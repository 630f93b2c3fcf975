/*
 * router_serve.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Integration test for router dispatch behind the HTTP server: typed
 * parameters, first-match ordering, and the catch-all.
 */

use std::net::SocketAddr;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use centralino::http::{self, MessageHeader, Method, Response, RxMessage, TxMessage};
use centralino::net::ServeOptions;
use centralino::router::Router;
use centralino::uri::Uri;
use centralino::ClientTlsConfig;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

async fn get(port: u16, path: &str) -> (u16, Vec<u8>) {
    let uri = Uri::parse(&format!("http://127.0.0.1:{}{}", port, path)).unwrap();
    let mut conn = http::Client::connect(&uri, &ClientTlsConfig::new(), CancellationToken::new())
        .await
        .unwrap();
    let mut tx = TxMessage::new(&mut conn);
    tx.send_header(&MessageHeader::request(Method::Get, path).content_length(0))
        .await
        .unwrap();
    tx.finish().await.unwrap();
    let mut rx = RxMessage::response(&mut conn);
    let response = rx.receive_header().await.unwrap();
    let body = rx.receive_all().await.unwrap();
    (response.status().unwrap(), body.to_vec())
}

#[tokio::test]
async fn router_dispatch_over_http() {
    init_logging();
    let router: Router<(), Response> = Router::new()
        .route_method(Method::Get, r"/hello/(\w+)", |_, (name,): (String,)| {
            Response::new(200).with_body(format!("Hello {} !", name).into_bytes())
        })
        .route_method(Method::Get, r"/add/(\d+)/(\d+)", |_, (a, b): (i64, i64)| {
            Response::new(200).with_body(format!("{}", a + b).into_bytes())
        })
        .route(r".*", |_, (): ()| Response::new(404));

    let token = CancellationToken::new();
    let (bound_tx, bound_rx) = oneshot::channel();
    let options = ServeOptions::new()
        .with_token(token.clone())
        .notify_bound(bound_tx);
    let endpoint: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = tokio::spawn(async move {
        http::serve_router(endpoint, options, router, || ())
            .await
            .expect("serve failed");
    });
    let bound = bound_rx.await.unwrap();

    let (status, body) = get(bound.port(), "/hello/world").await;
    assert_eq!(status, 200);
    assert_eq!(body, b"Hello world !");

    let (status, body) = get(bound.port(), "/add/40/2").await;
    assert_eq!(status, 200);
    assert_eq!(body, b"42");

    let (status, _) = get(bound.port(), "/missing").await;
    assert_eq!(status, 404);

    token.cancel();
    server.await.unwrap();
}

#[tokio::test]
async fn router_without_catch_all_maps_miss_outcomes() {
    init_logging();
    let router: Router<(), Response> = Router::new()
        .route_method(Method::Post, r"/submit", |_, (): ()| Response::new(201))
        .route_method(Method::Get, r"/n/(\d{1,18})", |_, (n,): (i64,)| {
            Response::new(200).with_body(n.to_string().into_bytes())
        });

    let token = CancellationToken::new();
    let (bound_tx, bound_rx) = oneshot::channel();
    let options = ServeOptions::new()
        .with_token(token.clone())
        .notify_bound(bound_tx);
    let endpoint: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = tokio::spawn(async move {
        http::serve_router(endpoint, options, router, || ())
            .await
            .expect("serve failed");
    });
    let bound = bound_rx.await.unwrap();

    // URL matches but the method filter does not
    let (status, _) = get(bound.port(), "/submit").await;
    assert_eq!(status, 405);

    // nothing matches
    let (status, _) = get(bound.port(), "/unknown").await;
    assert_eq!(status, 404);

    let (status, body) = get(bound.port(), "/n/7").await;
    assert_eq!(status, 200);
    assert_eq!(body, b"7");

    token.cancel();
    server.await.unwrap();
}
