/*
 * uri.rs
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

//! URI parsing and percent-coding. Recognizes `scheme://host[:port]/path[#fragment]`;
//! `https` and `wss` imply TLS. Escaping encodes every non-alphanumeric byte as
//! `%XX`; the decoder accepts both hex cases and passes malformed sequences
//! through unchanged.

use percent_encoding::{percent_decode_str, percent_encode, NON_ALPHANUMERIC};

use crate::error::{Error, Result};

/// Percent-encode: every byte outside `[a-zA-Z0-9]` becomes `%XX` (uppercase hex).
pub fn escape(input: &[u8]) -> String {
    percent_encode(input, NON_ALPHANUMERIC).to_string()
}

/// Percent-decode: `%xx`/`%XX` becomes the byte with that hex value; malformed
/// `%` sequences are copied through unchanged.
pub fn unescape(input: &str) -> Vec<u8> {
    percent_decode_str(input).collect()
}

/// Percent-decode into a string, replacing invalid UTF-8 with U+FFFD.
pub fn unescape_lossy(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}

/// Parsed URI components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub fragment: Option<String>,
}

impl Uri {
    /// Parse `scheme://host[:port]/path[#fragment]`. IPv6 hosts are bracketed
    /// (`[::1]`). The port defaults to 443 for `https`/`wss`, 80 otherwise.
    pub fn parse(input: &str) -> Result<Uri> {
        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| Error::protocol("URI has no scheme"))?;
        if scheme.is_empty() {
            return Err(Error::protocol("URI has no scheme"));
        }

        let (rest, fragment) = match rest.find('#') {
            Some(i) => (&rest[..i], Some(rest[i + 1..].to_string())),
            None => (rest, None),
        };

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };

        let default_port: u16 = match scheme {
            "https" | "wss" => 443,
            _ => 80,
        };

        // IPv6 literals are bracketed; the closing bracket ends the host.
        let (host, port) = if let Some(inner) = authority.strip_prefix('[') {
            let end = inner
                .find(']')
                .ok_or_else(|| Error::protocol("unterminated IPv6 bracket"))?;
            let host = &inner[..end];
            let port = match inner[end + 1..].strip_prefix(':') {
                Some(p) => p
                    .parse::<u16>()
                    .map_err(|_| Error::protocol("invalid port"))?,
                None => default_port,
            };
            (host, port)
        } else {
            match authority.rfind(':') {
                Some(i) => {
                    let port = authority[i + 1..]
                        .parse::<u16>()
                        .map_err(|_| Error::protocol("invalid port"))?;
                    (&authority[..i], port)
                }
                None => (authority, default_port),
            }
        };

        if host.is_empty() {
            return Err(Error::protocol("URI has no host"));
        }

        Ok(Uri {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port,
            path: path.to_string(),
            fragment,
        })
    }

    /// True when the scheme implies TLS (`https`, `wss`).
    pub fn is_tls(&self) -> bool {
        matches!(self.scheme.as_str(), "https" | "wss")
    }
}
