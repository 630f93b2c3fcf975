/*
 * handshake.rs
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

//! WebSocket opening handshake (RFC 6455 §4): the client GET with Upgrade,
//! the server 101 with Sec-WebSocket-Accept, and the accept hash both sides
//! agree on.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};
use crate::http::message::{MessageHeader, Method};

/// Magic GUID for Sec-WebSocket-Accept (RFC 6455 §4.2.2).
const WS_ACCEPT_GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Compute Sec-WebSocket-Accept from the base64 key sent in
/// Sec-WebSocket-Key: base64(SHA-1(key ++ GUID)).
pub fn accept_key(key_base64: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key_base64.as_bytes());
    hasher.update(WS_ACCEPT_GUID);
    BASE64.encode(hasher.finalize())
}

/// Generate a Sec-WebSocket-Key: 16 random bytes, base64-encoded.
pub fn generate_key() -> Result<String> {
    let mut raw = [0u8; 16];
    getrandom::getrandom(&mut raw)
        .map_err(|e| Error::protocol(format!("no entropy for key: {}", e)))?;
    Ok(BASE64.encode(raw))
}

/// Build the client's upgrade request for `path` on `host:port`.
pub fn upgrade_request(host: &str, port: u16, path: &str, key_base64: &str) -> MessageHeader {
    let host_header = if port == 80 || port == 443 {
        host.to_string()
    } else {
        format!("{}:{}", host, port)
    };
    MessageHeader::request(Method::Get, path)
        .with_header("Host", host_header)
        .with_header("Upgrade", "websocket")
        .with_header("Connection", "Upgrade")
        .with_header("Sec-WebSocket-Key", key_base64)
        .with_header("Sec-WebSocket-Version", "13")
}

/// Validate a received upgrade request; returns the client's key. A refused
/// upgrade is a protocol error (the caller answers 400).
pub fn validate_upgrade(request: &MessageHeader) -> Result<&str> {
    if request.method() != Some(Method::Get) {
        return Err(Error::protocol("upgrade must be a GET"));
    }
    let upgrade = request.headers.get("upgrade").unwrap_or("");
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return Err(Error::protocol("missing Upgrade: websocket"));
    }
    let connection = request.headers.get("connection").unwrap_or("");
    if !connection
        .split(',')
        .any(|t| t.trim().eq_ignore_ascii_case("upgrade"))
    {
        return Err(Error::protocol("missing Connection: Upgrade"));
    }
    match request.headers.get("sec-websocket-version") {
        Some("13") => {}
        _ => return Err(Error::protocol("unsupported Sec-WebSocket-Version")),
    }
    request
        .headers
        .get("sec-websocket-key")
        .ok_or_else(|| Error::protocol("missing Sec-WebSocket-Key"))
}

/// Build the server's 101 response for the given client key.
pub fn upgrade_response(key_base64: &str) -> MessageHeader {
    MessageHeader::response(101)
        .with_header("Upgrade", "websocket")
        .with_header("Connection", "Upgrade")
        .with_header("Sec-WebSocket-Accept", accept_key(key_base64))
}

/// Verify the server's Sec-WebSocket-Accept against the key we sent.
pub fn verify_accept(accept: Option<&str>, key_base64: &str) -> Result<()> {
    let expected = accept_key(key_base64);
    match accept {
        Some(h) if h.trim() == expected => Ok(()),
        Some(_) => Err(Error::protocol("Sec-WebSocket-Accept mismatch")),
        None => Err(Error::protocol("missing Sec-WebSocket-Accept")),
    }
}
