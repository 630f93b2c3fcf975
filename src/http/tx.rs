/*
 * tx.rs
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

//! Sending side of one HTTP message cycle. `send_header()` once, then
//! `send()` body bytes, then `finish()`, which writes the terminating chunk
//! in chunked mode, verifies the declared length in content-length mode, and
//! shuts down the send half. The `&mut Connection` borrow serializes sends
//! on a connection.

use crate::error::{Error, Result};
use crate::http::message::{Framing, MessageHeader};
use crate::net::Connection;

/// Scoped send handle for one message on a connection.
pub struct TxMessage<'c> {
    conn: &'c mut Connection,
    framing: Framing,
    sent: u64,
    header_sent: bool,
}

impl<'c> TxMessage<'c> {
    pub fn new(conn: &'c mut Connection) -> Self {
        Self {
            conn,
            framing: Framing::None,
            sent: 0,
            header_sent: false,
        }
    }

    /// Serialize and send the start line, headers, framing header, and the
    /// CRLF sentinel. Call exactly once, before any body bytes.
    pub async fn send_header(&mut self, header: &MessageHeader) -> Result<()> {
        if self.header_sent {
            return Err(Error::protocol("header already sent"));
        }
        let bytes = header.encode()?;
        self.conn.send_all(&bytes).await?;
        self.framing = header.framing;
        self.header_sent = true;
        Ok(())
    }

    /// Send body bytes. In content-length mode, bytes beyond the declared
    /// length fail with `Overflow`. In chunked mode each call becomes one
    /// chunk; empty calls are ignored (an empty chunk would terminate the
    /// body).
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.header_sent {
            return Err(Error::protocol("send() before send_header()"));
        }
        if bytes.is_empty() {
            return Ok(());
        }
        match self.framing {
            Framing::Length(declared) => {
                if self.sent + bytes.len() as u64 > declared {
                    return Err(Error::Overflow);
                }
                self.conn.send_all(bytes).await?;
                self.sent += bytes.len() as u64;
                Ok(())
            }
            Framing::Chunked => {
                let mut framed = Vec::with_capacity(bytes.len() + 16);
                framed.extend_from_slice(format!("{:x}\r\n", bytes.len()).as_bytes());
                framed.extend_from_slice(bytes);
                framed.extend_from_slice(b"\r\n");
                self.conn.send_all(&framed).await?;
                self.sent += bytes.len() as u64;
                Ok(())
            }
            Framing::None => Err(Error::Overflow),
        }
    }

    /// End the message: terminating `0 CRLF CRLF` for chunked bodies, an
    /// `Underflow` check for content-length bodies, then shutdown of the
    /// send half.
    pub async fn finish(mut self) -> Result<()> {
        if !self.header_sent {
            return Err(Error::protocol("finish() before send_header()"));
        }
        match self.framing {
            Framing::Chunked => {
                self.conn.send_all(b"0\r\n\r\n").await?;
            }
            Framing::Length(declared) => {
                if self.sent < declared {
                    return Err(Error::Underflow {
                        sent: self.sent,
                        declared,
                    });
                }
            }
            Framing::None => {}
        }
        self.conn.close_send().await
    }

    /// Like [`finish`](Self::finish) but leaves the send half open. Used
    /// when the connection continues under different framing (the 101
    /// upgrade response).
    pub async fn finish_keep_open(mut self) -> Result<()> {
        if !self.header_sent {
            return Err(Error::protocol("finish() before send_header()"));
        }
        match self.framing {
            Framing::Chunked => self.conn.send_all(b"0\r\n\r\n").await,
            Framing::Length(declared) => {
                if self.sent < declared {
                    return Err(Error::Underflow {
                        sent: self.sent,
                        declared,
                    });
                }
                Ok(())
            }
            Framing::None => Ok(()),
        }
    }
}
