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

//! Accept loop: listen, accept until the cancellation token fires, spawn one
//! task per connection into a tracked scope, drain the scope before
//! returning.

use std::future::Future;
use std::net::SocketAddr;

use log::{debug, info, warn};
use tokio::net::TcpListener;
use tokio_rustls::TlsStream;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::Result;
use crate::net::tls::ServerTlsConfig;
use crate::net::{Connection, NetStream, Role};

/// Options for [`serve`]: optional TLS and the cancellation source that stops
/// the loop. Connection tasks observe child tokens of the same source.
#[derive(Default)]
pub struct ServeOptions {
    pub tls: Option<ServerTlsConfig>,
    pub token: CancellationToken,
    /// Receives the bound address once listening (an endpoint with port 0
    /// gets an ephemeral port).
    pub notify_bound: Option<tokio::sync::oneshot::Sender<SocketAddr>>,
}

impl ServeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tls(mut self, tls: ServerTlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn notify_bound(mut self, tx: tokio::sync::oneshot::Sender<SocketAddr>) -> Self {
        self.notify_bound = Some(tx);
        self
    }
}

/// Listen on `endpoint` and run `handler` in its own task for every accepted
/// connection, until the token is cancelled. When configured, the TLS
/// handshake is driven before the handler sees the connection. Returns after
/// all in-flight handler tasks have drained.
///
/// Handler outcomes terminate their connection only: cancellation exits
/// cleanly, peer disconnects are logged at debug, other errors at warn.
pub async fn serve<H, F>(endpoint: SocketAddr, options: ServeOptions, handler: H) -> Result<()>
where
    H: Fn(Connection) -> F + Clone + Send + 'static,
    F: Future<Output = Result<()>> + Send + 'static,
{
    let ServeOptions {
        tls,
        token,
        notify_bound,
    } = options;
    let listener = TcpListener::bind(endpoint).await?;
    let local = listener.local_addr()?;
    let acceptor = match &tls {
        Some(tls) => Some(tls.acceptor()?),
        None => None,
    };
    if let Some(tx) = notify_bound {
        let _ = tx.send(local);
    }
    let tracker = TaskTracker::new();
    info!(
        "listening on {}{}",
        local,
        if acceptor.is_some() { " (tls)" } else { "" }
    );

    loop {
        let (tcp, peer) = tokio::select! {
            _ = token.cancelled() => break,
            r = listener.accept() => match r {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    continue;
                }
            },
        };
        debug!("accepted {}", peer);

        let token = token.child_token();
        let acceptor = acceptor.clone();
        let handler = handler.clone();
        tracker.spawn(async move {
            let stream = match acceptor {
                Some(acceptor) => {
                    let handshake = tokio::select! {
                        _ = token.cancelled() => return,
                        r = acceptor.accept(tcp) => r,
                    };
                    match handshake {
                        Ok(tls) => NetStream::Tls(TlsStream::from(tls)),
                        Err(e) => {
                            debug!("tls handshake with {} failed: {}", peer, e);
                            return;
                        }
                    }
                }
                None => NetStream::Plain(tcp),
            };
            let connection = Connection::new(stream, peer, token, Role::Server);
            match handler(connection).await {
                Ok(()) => debug!("{} done", peer),
                Err(e) if e.is_cancelled() => debug!("{} cancelled", peer),
                Err(e) if e.is_disconnect() => debug!("{} disconnected: {}", peer, e),
                Err(e) => warn!("handler for {} failed: {}", peer, e),
            }
        });
    }

    info!("stopping, draining {} connection task(s)", tracker.len());
    tracker.close();
    tracker.wait().await;
    Ok(())
}
