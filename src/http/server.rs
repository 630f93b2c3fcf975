/*
 * server.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Centralino, an asynchronous HTTP and WebSocket
 * toolkit.
 *
 * Centralino is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Centralino is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Centralino.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Request/response convenience layer over the accept loop: one rx/tx cycle
//! per connection, buffered bodies, malformed requests answered with 400.
//! Streaming handlers use `net::serve` with `RxMessage`/`TxMessage`
//! directly.

use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use log::debug;

use crate::error::{Error, Result};
use crate::http::message::{Headers, MessageHeader, Method};
use crate::http::rx::RxMessage;
use crate::http::tx::TxMessage;
use crate::net::{self, Connection, ServeOptions};
use crate::router::{RouteError, Router};

/// A fully received request: start line, headers, buffered body.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub headers: Headers,
    pub body: Bytes,
    pub peer: SocketAddr,
}

/// A response to serialize: status, headers, buffered body.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }
}

impl From<RouteError> for Response {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::NotFound => Response::new(404),
            RouteError::MethodNotAllowed => Response::new(405),
            RouteError::BadRequest(msg) => Response::new(400).with_body(msg),
        }
    }
}

/// Serve `handler` over HTTP: for each connection, receive one request,
/// invoke the handler, send its response. Parse failures on the incoming
/// bytes produce a 400 when the response has not started.
pub async fn serve<H, F>(endpoint: SocketAddr, options: ServeOptions, handler: H) -> Result<()>
where
    H: Fn(Request) -> F + Clone + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    net::serve(endpoint, options, move |conn| {
        let handler = handler.clone();
        async move { handle_connection(conn, handler).await }
    })
    .await
}

/// Serve a router: dispatch each request's method and path, map router
/// outcomes to 404/405/400.
pub async fn serve_router<C, F>(
    endpoint: SocketAddr,
    options: ServeOptions,
    router: Router<C, Response>,
    context: F,
) -> Result<()>
where
    C: Send + 'static,
    F: Fn() -> C + Clone + Send + Sync + 'static,
{
    let router = std::sync::Arc::new(router);
    serve(endpoint, options, move |request: Request| {
        let router = router.clone();
        let mut ctx = context();
        async move {
            // dispatch on the path without any query or fragment
            let path = request
                .target
                .split(['?', '#'])
                .next()
                .unwrap_or(&request.target)
                .to_string();
            match router.dispatch(request.method, &path, &mut ctx) {
                Ok(response) => response,
                Err(e) => {
                    debug!("{} {}: {:?}", request.method, path, e);
                    Response::from(e)
                }
            }
        }
    })
    .await
}

async fn handle_connection<H, F>(mut conn: Connection, handler: H) -> Result<()>
where
    H: Fn(Request) -> F + Send + Sync,
    F: Future<Output = Response> + Send,
{
    let peer = conn.peer_addr();
    let mut rx = RxMessage::request(&mut conn);
    let received = async {
        let header = rx.receive_header().await?;
        let body = rx.receive_all().await?;
        Ok::<_, Error>((header, body))
    }
    .await;
    drop(rx);

    let (header, body) = match received {
        Ok(ok) => ok,
        Err(e @ Error::Protocol(_)) => {
            debug!("bad request from {}: {}", peer, e);
            // response not started yet, so answer 400 before dropping
            let mut tx = TxMessage::new(&mut conn);
            let reply = MessageHeader::response(400).content_length(0);
            tx.send_header(&reply).await?;
            tx.finish().await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let method = header.method().ok_or_else(|| Error::protocol("no method"))?;
    let target = header.target().unwrap_or("/").to_string();
    let request = Request {
        method,
        target,
        headers: header.headers,
        body,
        peer,
    };
    let response = handler(request).await;

    let mut reply = MessageHeader::response(response.status)
        .content_length(response.body.len() as u64);
    reply.headers = response.headers;
    let mut tx = TxMessage::new(&mut conn);
    tx.send_header(&reply).await?;
    tx.send(&response.body).await?;
    tx.finish().await
}
