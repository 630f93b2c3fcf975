/*
 * connection.rs
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

//! WebSocket connection: owns the connection after a successful upgrade.
//! `receive()` surfaces data frame-by-frame as it arrives (continuations
//! are not buffered into whole messages); `send_*` frames outbound data,
//! fragmenting over the frame cap. The role decides masking: a client masks
//! every outbound frame with a fresh random key, a server never masks.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use log::debug;

use crate::error::{Error, Result};
use crate::net::{Connection, Role};
use crate::ws::frame::{
    encode_frame, Frame, FrameHandler, FrameParser, MAX_FRAME_PAYLOAD, OP_BINARY, OP_CLOSE,
    OP_CONTINUATION, OP_PING, OP_PONG, OP_TEXT,
};

const READ_CHUNK: usize = 8192;

/// Payload kind of a data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Text,
    Binary,
}

/// One event surfaced by `receive()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsEvent {
    /// A piece of a data message. `fin` marks the final piece.
    Data {
        kind: DataKind,
        data: Bytes,
        fin: bool,
    },
    /// Ping received; the connection has already answered with a pong.
    Ping(Bytes),
    Pong(Bytes),
    /// Close received; the close reply has been sent and the send half
    /// released. Subsequent `receive()` calls yield `None`.
    Close { code: Option<u16>, reason: String },
}

struct Enqueue<'a>(&'a mut VecDeque<Frame>);

impl FrameHandler for Enqueue<'_> {
    fn frame(&mut self, frame: Frame) {
        self.0.push_back(frame);
    }
}

/// A connection speaking WebSocket framing.
pub struct WsConnection {
    conn: Connection,
    read_buf: BytesMut,
    parser: FrameParser,
    frames: VecDeque<Frame>,
    /// Data kind carried across continuation frames.
    continued: Option<DataKind>,
    close_sent: bool,
    closed: bool,
}

impl WsConnection {
    /// Wrap an upgraded connection. `remainder` is whatever the handshake
    /// read past the end of the HTTP message.
    pub(crate) fn new(conn: Connection, remainder: BytesMut) -> Self {
        let role = conn.role();
        Self {
            conn,
            read_buf: remainder,
            parser: FrameParser::new(role),
            frames: VecDeque::new(),
            continued: None,
            close_sent: false,
            closed: false,
        }
    }

    pub fn role(&self) -> Role {
        self.conn.role()
    }

    /// Next event, or `None` once the conversation is over (close completed
    /// or peer gone).
    pub async fn receive(&mut self) -> Result<Option<WsEvent>> {
        loop {
            if let Some(frame) = self.frames.pop_front() {
                if let Some(event) = self.handle_frame(frame).await? {
                    return Ok(Some(event));
                }
                continue;
            }
            if self.closed {
                return Ok(None);
            }
            {
                let mut sink = Enqueue(&mut self.frames);
                self.parser.receive(&mut self.read_buf, &mut sink)?;
            }
            if !self.frames.is_empty() {
                continue;
            }
            let mut tmp = [0u8; READ_CHUNK];
            let n = self.conn.recv(&mut tmp).await?;
            if n == 0 {
                // peer went away without a close frame
                self.closed = true;
                return Ok(None);
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
    }

    async fn handle_frame(&mut self, frame: Frame) -> Result<Option<WsEvent>> {
        match frame.opcode {
            OP_TEXT | OP_BINARY => {
                if self.continued.is_some() {
                    return Err(Error::protocol("data frame inside fragmented message"));
                }
                let kind = if frame.opcode == OP_TEXT {
                    DataKind::Text
                } else {
                    DataKind::Binary
                };
                if !frame.fin {
                    self.continued = Some(kind);
                }
                Ok(Some(WsEvent::Data {
                    kind,
                    data: frame.payload,
                    fin: frame.fin,
                }))
            }
            OP_CONTINUATION => {
                let kind = self
                    .continued
                    .ok_or_else(|| Error::protocol("continuation without initial frame"))?;
                if frame.fin {
                    self.continued = None;
                }
                Ok(Some(WsEvent::Data {
                    kind,
                    data: frame.payload,
                    fin: frame.fin,
                }))
            }
            OP_PING => {
                self.send_pong(&frame.payload).await?;
                Ok(Some(WsEvent::Ping(frame.payload)))
            }
            OP_PONG => Ok(Some(WsEvent::Pong(frame.payload))),
            OP_CLOSE => {
                let (code, reason) = if frame.payload.len() >= 2 {
                    let code = u16::from_be_bytes([frame.payload[0], frame.payload[1]]);
                    let reason = String::from_utf8_lossy(&frame.payload[2..]).into_owned();
                    (Some(code), reason)
                } else {
                    (None, String::new())
                };
                debug!("close received: {:?} {:?}", code, reason);
                if !self.close_sent {
                    self.send_close(code, "").await?;
                }
                self.conn.close_send().await?;
                self.closed = true;
                Ok(Some(WsEvent::Close { code, reason }))
            }
            other => Err(Error::protocol(format!("unknown opcode {}", other))),
        }
    }

    /// Send a text message, fragmenting over the frame cap.
    pub async fn send_text(&mut self, data: &[u8]) -> Result<()> {
        self.send_data(OP_TEXT, data).await
    }

    /// Send a binary message, fragmenting over the frame cap.
    pub async fn send_binary(&mut self, data: &[u8]) -> Result<()> {
        self.send_data(OP_BINARY, data).await
    }

    async fn send_data(&mut self, opcode: u8, data: &[u8]) -> Result<()> {
        if self.close_sent {
            return Err(Error::protocol("send after close"));
        }
        let mut chunks = data.chunks(MAX_FRAME_PAYLOAD);
        let mut current = chunks.next().unwrap_or(&[]);
        let mut opcode = opcode;
        loop {
            let next = chunks.next();
            let fin = next.is_none();
            self.send_frame(opcode, fin, current).await?;
            match next {
                Some(chunk) => {
                    // first frame carries the data opcode, the rest continue
                    opcode = OP_CONTINUATION;
                    current = chunk;
                }
                None => return Ok(()),
            }
        }
    }

    pub async fn send_ping(&mut self, data: &[u8]) -> Result<()> {
        self.send_frame(OP_PING, true, data).await
    }

    pub async fn send_pong(&mut self, data: &[u8]) -> Result<()> {
        self.send_frame(OP_PONG, true, data).await
    }

    /// Send a close frame: optional 2-byte status code followed by a UTF-8
    /// reason, 125 bytes total at most.
    pub async fn send_close(&mut self, code: Option<u16>, reason: &str) -> Result<()> {
        let mut payload = Vec::new();
        if let Some(c) = code {
            payload.extend_from_slice(&c.to_be_bytes());
        }
        payload.extend_from_slice(reason.as_bytes());
        self.send_frame(OP_CLOSE, true, &payload).await?;
        self.close_sent = true;
        Ok(())
    }

    async fn send_frame(&mut self, opcode: u8, fin: bool, payload: &[u8]) -> Result<()> {
        let mask = match self.conn.role() {
            Role::Client => {
                let mut key = [0u8; 4];
                getrandom::getrandom(&mut key)
                    .map_err(|e| Error::protocol(format!("no entropy for mask: {}", e)))?;
                Some(key)
            }
            Role::Server => None,
        };
        let mut out = BytesMut::with_capacity(14 + payload.len());
        encode_frame(opcode, fin, payload, mask, &mut out)?;
        self.conn.send_all(&out).await
    }
}
