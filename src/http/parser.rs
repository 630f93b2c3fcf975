/*
 * parser.rs
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

//! HTTP/1.1 push parser: request or status line, headers, body
//! (Content-Length or chunked). Feed bytes via `receive`; the handler is
//! invoked as complete tokens are parsed. Body bytes are handed out as
//! slices of the feed buffer without copying.

use bytes::{Buf, BytesMut};

use crate::error::{Error, Result};
use crate::http::message::Method;

/// Callback for HTTP/1.1 message events. The driver (rx side or a handshake
/// reader) implements this and captures what it needs.
pub trait MessageHandler {
    fn request_line(&mut self, method: Method, target: &str);
    fn status_line(&mut self, code: u16, reason: Option<&str>);
    fn header(&mut self, name: &str, value: &str);
    fn start_body(&mut self);
    fn body_chunk(&mut self, data: &[u8]);
    fn end_body(&mut self);
    fn trailer(&mut self, name: &str, value: &str);
    fn complete(&mut self);
}

/// Whether the parser expects a request line or a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Request,
    Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Idle,
    StartLine,
    Headers,
    /// Headers done; the driver must call set_body_mode() and optionally
    /// handler.start_body() before feeding more bytes.
    HeadersComplete,
    Body,
    ChunkSize,
    ChunkData,
    ChunkTrailer,
}

/// Push parser for one HTTP/1.1 message.
pub struct MessageParser {
    kind: Kind,
    state: ParseState,
    /// Content-Length when known (-1 for chunked or read-until-close).
    content_length: i64,
    bytes_received: i64,
    /// Current chunk size (for chunked encoding).
    chunk_remaining: i64,
    body_expected: bool,
    completed: bool,
}

impl MessageParser {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            state: ParseState::StartLine,
            content_length: -1,
            bytes_received: 0,
            chunk_remaining: 0,
            body_expected: false,
            completed: false,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// True once the message-complete event has fired.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// True once headers are done and the declared framing says body bytes
    /// follow.
    pub fn has_body(&self) -> bool {
        self.body_expected
    }

    pub fn reset(&mut self) {
        self.state = ParseState::StartLine;
        self.content_length = -1;
        self.bytes_received = 0;
        self.chunk_remaining = 0;
        self.body_expected = false;
        self.completed = false;
    }

    /// Find CRLF in the readable part of buf; return number of bytes to the
    /// start of CRLF, or None if not found.
    fn find_crlf(buf: &[u8]) -> Option<usize> {
        let mut i = 0;
        while i + 1 < buf.len() {
            if buf[i] == b'\r' && buf[i + 1] == b'\n' {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    /// Consume and parse as much as possible from buf. The handler is called
    /// for each complete token. Partial data remains in buf for the next
    /// call.
    pub fn receive<H: MessageHandler>(&mut self, buf: &mut BytesMut, handler: &mut H) -> Result<()> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StartLine => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    let line = buf.split_to(line_end + 2); // include CRLF
                    let line_str = std::str::from_utf8(&line[..line_end])
                        .map_err(|_| Error::protocol("start line is not UTF-8"))?;
                    match self.kind {
                        Kind::Request => self.parse_request_line(line_str, handler)?,
                        Kind::Response => self.parse_status_line(line_str, handler)?,
                    }
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    if line_end == 0 {
                        buf.advance(2);
                        self.state = ParseState::HeadersComplete;
                        // driver will set_body_mode and call receive again
                        return Ok(());
                    }
                    let line = buf.split_to(line_end + 2);
                    let line_str = std::str::from_utf8(&line[..line_end])
                        .map_err(|_| Error::protocol("header line is not UTF-8"))?;
                    if let Some(colon) = line_str.find(':') {
                        let name = line_str[..colon].trim();
                        let value = line_str[colon + 1..].trim();
                        handler.header(name, value);
                    }
                }
                ParseState::Body => {
                    if self.content_length >= 0 {
                        let remaining = (self.content_length - self.bytes_received) as usize;
                        let to_read = remaining.min(buf.len());
                        if to_read > 0 {
                            let chunk = buf.split_to(to_read);
                            handler.body_chunk(&chunk);
                            self.bytes_received += to_read as i64;
                        }
                        if self.bytes_received >= self.content_length {
                            handler.end_body();
                            handler.complete();
                            self.completed = true;
                            self.state = ParseState::Idle;
                        }
                    } else {
                        // read until close: deliver all available; connection
                        // close signals the end
                        if !buf.is_empty() {
                            let chunk = buf.split_to(buf.len());
                            handler.body_chunk(&chunk);
                        }
                        return Ok(());
                    }
                }
                ParseState::ChunkSize => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    let line = buf.split_to(line_end + 2);
                    let line_str = std::str::from_utf8(&line[..line_end])
                        .map_err(|_| Error::protocol("chunk size is not UTF-8"))?;
                    // chunk extensions after ';' are ignored
                    let hex_part = line_str.split(';').next().unwrap_or(line_str).trim();
                    self.chunk_remaining = i64::from_str_radix(hex_part, 16)
                        .map_err(|_| Error::protocol(format!("invalid chunk size {:?}", hex_part)))?;
                    if self.chunk_remaining == 0 {
                        self.state = ParseState::ChunkTrailer;
                    } else {
                        self.state = ParseState::ChunkData;
                    }
                }
                ParseState::ChunkData => {
                    let to_read = (self.chunk_remaining as usize).min(buf.len());
                    if to_read > 0 {
                        let chunk = buf.split_to(to_read);
                        handler.body_chunk(&chunk);
                        self.chunk_remaining -= to_read as i64;
                    }
                    if self.chunk_remaining == 0 {
                        // consume the CRLF closing the chunk
                        if buf.len() >= 2 {
                            if buf[0] != b'\r' || buf[1] != b'\n' {
                                return Err(Error::protocol("chunk data not followed by CRLF"));
                            }
                            buf.advance(2);
                            self.state = ParseState::ChunkSize;
                        } else {
                            return Ok(());
                        }
                    } else {
                        return Ok(());
                    }
                }
                ParseState::HeadersComplete => {
                    // waiting for the driver to call set_body_mode()
                    return Ok(());
                }
                ParseState::ChunkTrailer => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    if line_end == 0 {
                        buf.advance(2);
                        handler.end_body();
                        handler.complete();
                        self.completed = true;
                        self.state = ParseState::Idle;
                    } else {
                        let line = buf.split_to(line_end + 2);
                        let line_str = std::str::from_utf8(&line[..line_end])
                            .map_err(|_| Error::protocol("trailer line is not UTF-8"))?;
                        if let Some(colon) = line_str.find(':') {
                            let name = line_str[..colon].trim();
                            let value = line_str[colon + 1..].trim();
                            handler.trailer(name, value);
                        }
                    }
                }
                ParseState::Idle => return Ok(()),
            }
        }
        Ok(())
    }

    fn parse_request_line<H: MessageHandler>(&mut self, line: &str, handler: &mut H) -> Result<()> {
        // METHOD SP target SP HTTP/1.1
        let mut parts = line.splitn(3, ' ');
        let method_str = parts.next().unwrap_or("");
        let target = parts
            .next()
            .ok_or_else(|| Error::protocol("request line has no target"))?;
        let version = parts
            .next()
            .ok_or_else(|| Error::protocol("request line has no version"))?;
        let method = Method::parse(method_str)
            .ok_or_else(|| Error::protocol(format!("unrecognized method {:?}", method_str)))?;
        if !version.starts_with("HTTP/1.") {
            return Err(Error::protocol(format!("unsupported version {:?}", version)));
        }
        if target.is_empty() {
            return Err(Error::protocol("empty request target"));
        }
        handler.request_line(method, target);
        Ok(())
    }

    fn parse_status_line<H: MessageHandler>(&mut self, line: &str, handler: &mut H) -> Result<()> {
        // HTTP/1.1 200 OK or HTTP/1.1 200
        let mut parts = line.splitn(3, ' ');
        let version = parts.next().unwrap_or("");
        if !version.starts_with("HTTP/1.") {
            return Err(Error::protocol(format!("unsupported version {:?}", version)));
        }
        let code = parts
            .next()
            .and_then(|s| s.parse::<u16>().ok())
            .ok_or_else(|| Error::protocol("status line has no code"))?;
        let reason = parts.next();
        handler.status_line(code, reason);
        Ok(())
    }

    /// Called by the driver after headers are received (state
    /// HeadersComplete). `chunked` wins over `content_length` when both were
    /// declared. The driver should call handler.start_body() first when a
    /// body is expected.
    pub fn set_body_mode<H: MessageHandler>(
        &mut self,
        content_length: Option<u64>,
        chunked: bool,
        handler: &mut H,
    ) {
        if self.state != ParseState::HeadersComplete {
            return;
        }
        if chunked {
            self.content_length = -1;
            self.body_expected = true;
            self.state = ParseState::ChunkSize;
        } else if let Some(cl) = content_length {
            self.content_length = cl as i64;
            self.bytes_received = 0;
            if cl == 0 {
                handler.complete();
                self.completed = true;
                self.state = ParseState::Idle;
            } else {
                self.body_expected = true;
                self.state = ParseState::Body;
            }
        } else if self.kind == Kind::Request {
            // requests have a body only when declared
            handler.complete();
            self.completed = true;
            self.state = ParseState::Idle;
        } else {
            // response without declared framing: read until close
            self.content_length = -1;
            self.body_expected = true;
            self.state = ParseState::Body;
        }
    }

    /// For read-until-close responses: the peer closed, so the body is done.
    pub fn finish_on_eof<H: MessageHandler>(&mut self, handler: &mut H) -> Result<()> {
        if self.state == ParseState::Body && self.content_length < 0 {
            handler.end_body();
            handler.complete();
            self.completed = true;
            self.state = ParseState::Idle;
            return Ok(());
        }
        Err(Error::protocol("connection closed mid-message"))
    }
}
