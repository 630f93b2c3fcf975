/*
 * client.rs
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

//! WebSocket client: connect to a ws:// or wss:// URL, perform the opening
//! handshake, return the frame-mode connection.

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::http::rx::RxMessage;
use crate::http::tx::TxMessage;
use crate::net::{ClientTlsConfig, Connection};
use crate::uri::Uri;
use crate::ws::connection::WsConnection;
use crate::ws::handshake::{generate_key, upgrade_request, verify_accept};

/// WebSocket client entry point.
pub struct Client;

impl Client {
    /// Connect to `url` (`ws://` or `wss://`), send the upgrade with a fresh
    /// random key, verify the 101 and its accept hash, and return the
    /// connection in frame mode.
    pub async fn connect(
        url: &str,
        tls: &ClientTlsConfig,
        token: CancellationToken,
    ) -> Result<WsConnection> {
        let uri = Uri::parse(url)?;
        if !matches!(uri.scheme.as_str(), "ws" | "wss") {
            return Err(Error::protocol("URL scheme must be ws or wss"));
        }
        let mut conn = if uri.is_tls() {
            Connection::connect_tls(&uri.host, uri.port, tls, token).await?
        } else {
            Connection::connect(&uri.host, uri.port, token).await?
        };

        let key = generate_key()?;
        let request = upgrade_request(&uri.host, uri.port, &uri.path, &key);
        let mut tx = TxMessage::new(&mut conn);
        tx.send_header(&request).await?;
        tx.finish_keep_open().await?;

        let mut rx = RxMessage::response(&mut conn);
        let header = rx.receive_header().await?;
        let remainder = rx.into_remainder();
        if header.status() != Some(101) {
            return Err(Error::protocol(format!(
                "expected 101 Switching Protocols, got {:?}",
                header.status()
            )));
        }
        verify_accept(header.headers.get("sec-websocket-accept"), &key)?;

        Ok(WsConnection::new(conn, remainder))
    }
}
