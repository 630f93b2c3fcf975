/*
 * connection.rs
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

//! A connection owns a stream plus a cancellation token. Every awaitable
//! operation races against the token: a fired token completes the operation
//! with `Error::Cancelled`, and operations started after the token fired fail
//! immediately. Dropping the connection closes the stream.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsStream;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::net::tls::ClientTlsConfig;
use crate::net::NetStream;

/// Which side of the conversation this connection is. Decides WebSocket mask
/// enforcement after an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// One TCP or TLS stream plus the cancellation token observed by all its
/// operations.
pub struct Connection {
    stream: NetStream,
    token: CancellationToken,
    peer: SocketAddr,
    role: Role,
}

impl Connection {
    pub fn new(stream: NetStream, peer: SocketAddr, token: CancellationToken, role: Role) -> Self {
        Self {
            stream,
            token,
            peer,
            role,
        }
    }

    /// Connect a plain TCP client connection. `host` may be a name (resolved
    /// by tokio) or an address literal.
    pub async fn connect(host: &str, port: u16, token: CancellationToken) -> Result<Self> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let tcp = tokio::select! {
            _ = token.cancelled() => return Err(Error::Cancelled),
            r = TcpStream::connect((host, port)) => r?,
        };
        let peer = tcp.peer_addr()?;
        Ok(Self::new(NetStream::Plain(tcp), peer, token, Role::Client))
    }

    /// Connect and perform a client TLS handshake. A cancelled handshake
    /// leaves no usable connection behind.
    pub async fn connect_tls(
        host: &str,
        port: u16,
        config: &ClientTlsConfig,
        token: CancellationToken,
    ) -> Result<Self> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let tcp = tokio::select! {
            _ = token.cancelled() => return Err(Error::Cancelled),
            r = TcpStream::connect((host, port)) => r?,
        };
        let peer = tcp.peer_addr()?;
        let connector = config.connector();
        let server_name = config.server_name(host)?;
        let tls = tokio::select! {
            _ = token.cancelled() => return Err(Error::Cancelled),
            r = connector.connect(server_name, tcp) => {
                r.map_err(|e| Error::Tls(e.to_string()))?
            }
        };
        Ok(Self::new(
            NetStream::Tls(TlsStream::from(tls)),
            peer,
            token,
            Role::Client,
        ))
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Receive up to `buf.len()` bytes. Returns 0 on orderly peer close.
    /// May return fewer bytes than requested; callers loop.
    pub async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            _ = self.token.cancelled() => Err(Error::Cancelled),
            r = self.stream.read(buf) => Ok(r?),
        }
    }

    /// Send all of `bytes`, looping over short kernel writes, then flush.
    pub async fn send_all(&mut self, bytes: &[u8]) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let mut sent = 0;
        while sent < bytes.len() {
            let n = tokio::select! {
                _ = self.token.cancelled() => return Err(Error::Cancelled),
                r = self.stream.write(&bytes[sent..]) => r?,
            };
            if n == 0 {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "stream refused further bytes",
                )));
            }
            sent += n;
        }
        tokio::select! {
            _ = self.token.cancelled() => Err(Error::Cancelled),
            r = self.stream.flush() => Ok(r?),
        }
    }

    /// Shut down the send half (TCP FIN, TLS close-notify). The receive half
    /// stays usable.
    pub async fn close_send(&mut self) -> Result<()> {
        tokio::select! {
            _ = self.token.cancelled() => Err(Error::Cancelled),
            r = self.stream.shutdown() => Ok(r?),
        }
    }

    /// Release the receive half. Best-effort: tokio exposes no read-side
    /// shutdown, so this records intent only; the half is reclaimed when the
    /// connection drops.
    pub fn close_recv(&mut self) {}
}
