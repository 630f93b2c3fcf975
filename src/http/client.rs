/*
 * client.rs
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

//! HTTP client: connect to a URI (TLS decided by the scheme), then run
//! request/response cycles with `TxMessage`/`RxMessage`.

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::net::{ClientTlsConfig, Connection};
use crate::uri::Uri;

/// HTTP client entry point.
pub struct Client;

impl Client {
    /// Connect to the URI's host and port; `https`/`wss` imply a TLS
    /// handshake with `tls`.
    pub async fn connect(
        uri: &Uri,
        tls: &ClientTlsConfig,
        token: CancellationToken,
    ) -> Result<Connection> {
        if uri.is_tls() {
            Connection::connect_tls(&uri.host, uri.port, tls, token).await
        } else {
            Connection::connect(&uri.host, uri.port, token).await
        }
    }
}
