/*
 * server.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Centralino, an asynchronous HTTP and WebSocket
 * toolkit.
 *
 * This file is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Server side of the upgrade: answer an upgrade request with a 101 and
//! switch the connection to frame mode, or refuse with a 400.

use std::future::Future;
use std::net::SocketAddr;

use bytes::BytesMut;
use log::debug;

use crate::error::Result;
use crate::http::message::MessageHeader;
use crate::http::rx::RxMessage;
use crate::http::tx::TxMessage;
use crate::net::{self, Connection, ServeOptions};
use crate::ws::connection::WsConnection;
use crate::ws::handshake::{upgrade_response, validate_upgrade};

/// Accept an upgrade request already parsed from `conn`. `remainder` is
/// whatever the request read past the headers (frames an eager client sent
/// with the handshake). On a refused upgrade a 400 is sent and the
/// validation error returned.
pub async fn accept(
    mut conn: Connection,
    request: &MessageHeader,
    remainder: BytesMut,
) -> Result<WsConnection> {
    match validate_upgrade(request) {
        Ok(key) => {
            let response = upgrade_response(key);
            let mut tx = TxMessage::new(&mut conn);
            tx.send_header(&response).await?;
            tx.finish_keep_open().await?;
            Ok(WsConnection::new(conn, remainder))
        }
        Err(e) => {
            debug!("refusing upgrade from {}: {}", conn.peer_addr(), e);
            let mut tx = TxMessage::new(&mut conn);
            tx.send_header(&MessageHeader::response(400).content_length(0))
                .await?;
            tx.finish().await?;
            Err(e)
        }
    }
}

/// Serve WebSocket connections: for each accepted connection, read the
/// upgrade request, complete the handshake, and hand the frame-mode
/// connection to `handler`.
pub async fn serve<H, F>(endpoint: SocketAddr, options: ServeOptions, handler: H) -> Result<()>
where
    H: Fn(WsConnection) -> F + Clone + Send + Sync + 'static,
    F: Future<Output = Result<()>> + Send + 'static,
{
    net::serve(endpoint, options, move |mut conn| {
        let handler = handler.clone();
        async move {
            let mut rx = RxMessage::request(&mut conn);
            let header = rx.receive_header().await?;
            let remainder = rx.into_remainder();
            let ws = accept(conn, &header, remainder).await?;
            handler(ws).await
        }
    })
    .await
}
