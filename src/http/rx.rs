/*
 * rx.rs
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

//! Receiving side of one HTTP message cycle. `receive_header()` drives the
//! parser to the end of the headers, then `receive()` yields body chunks
//! until the empty chunk marks the end. The `&mut Connection` borrow keeps
//! any second message off this connection for the handle's lifetime.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::http::message::{Framing, Headers, MessageHeader, Method, StartLine};
use crate::http::parser::{Kind, MessageHandler, MessageParser, ParseState};
use crate::net::Connection;
use crate::uri;

const READ_CHUNK: usize = 8192;

/// Captures start line and headers up to HeadersComplete.
#[derive(Default)]
struct HeaderCollector {
    method: Option<Method>,
    target: Option<String>,
    status: Option<u16>,
    headers: Headers,
}

impl MessageHandler for HeaderCollector {
    fn request_line(&mut self, method: Method, target: &str) {
        self.method = Some(method);
        // the target is copied owned and unescaped exactly once
        self.target = Some(uri::unescape_lossy(target));
    }

    fn status_line(&mut self, code: u16, _reason: Option<&str>) {
        self.status = Some(code);
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.append(name, value);
    }

    fn start_body(&mut self) {}
    fn body_chunk(&mut self, _data: &[u8]) {}
    fn end_body(&mut self) {}
    fn trailer(&mut self, _name: &str, _value: &str) {}
    fn complete(&mut self) {}
}

/// Collects body slices into owned chunks; trailers extend the header map.
struct BodyCollector<'a> {
    chunks: &'a mut VecDeque<Bytes>,
    trailers: &'a mut Headers,
}

impl MessageHandler for BodyCollector<'_> {
    fn request_line(&mut self, _method: Method, _target: &str) {}
    fn status_line(&mut self, _code: u16, _reason: Option<&str>) {}
    fn header(&mut self, _name: &str, _value: &str) {}
    fn start_body(&mut self) {}

    fn body_chunk(&mut self, data: &[u8]) {
        if !data.is_empty() {
            self.chunks.push_back(Bytes::copy_from_slice(data));
        }
    }

    fn end_body(&mut self) {}

    fn trailer(&mut self, name: &str, value: &str) {
        self.trailers.append(name, value);
    }

    fn complete(&mut self) {}
}

/// Scoped receive handle for one message on a connection.
pub struct RxMessage<'c> {
    conn: &'c mut Connection,
    parser: MessageParser,
    kind: Kind,
    buf: BytesMut,
    chunks: VecDeque<Bytes>,
    trailers: Headers,
    header_done: bool,
    eof: bool,
}

impl<'c> RxMessage<'c> {
    /// Receive a request (server side).
    pub fn request(conn: &'c mut Connection) -> Self {
        Self::new(conn, Kind::Request)
    }

    /// Receive a response (client side).
    pub fn response(conn: &'c mut Connection) -> Self {
        Self::new(conn, Kind::Response)
    }

    fn new(conn: &'c mut Connection, kind: Kind) -> Self {
        Self {
            conn,
            parser: MessageParser::new(kind),
            kind,
            buf: BytesMut::with_capacity(READ_CHUNK),
            chunks: VecDeque::new(),
            trailers: Headers::new(),
            header_done: false,
            eof: false,
        }
    }

    async fn fill(&mut self) -> Result<usize> {
        let mut tmp = [0u8; READ_CHUNK];
        let n = self.conn.recv(&mut tmp).await?;
        if n > 0 {
            self.buf.extend_from_slice(&tmp[..n]);
        }
        Ok(n)
    }

    /// Read and parse the start line and headers. Call exactly once, before
    /// `receive`. Fails with a protocol error if the stream ends first.
    pub async fn receive_header(&mut self) -> Result<MessageHeader> {
        if self.header_done {
            return Err(Error::protocol("header already received"));
        }
        let mut collector = HeaderCollector::default();
        loop {
            self.parser.receive(&mut self.buf, &mut collector)?;
            if self.parser.state() == ParseState::HeadersComplete {
                break;
            }
            if self.fill().await? == 0 {
                return Err(Error::protocol("connection closed before end of headers"));
            }
        }

        let content_length = collector
            .headers
            .get("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok());
        let chunked = collector
            .headers
            .get("transfer-encoding")
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false);
        // chunked wins; a Content-Length alongside it is discarded
        let content_length = if chunked { None } else { content_length };

        let mut body = BodyCollector {
            chunks: &mut self.chunks,
            trailers: &mut self.trailers,
        };
        // body bytes already buffered stay in buf; receive() parses them on
        // demand, and a framing switch can still reclaim them untouched
        self.parser.set_body_mode(content_length, chunked, &mut body);
        self.header_done = true;

        let framing = if chunked {
            Framing::Chunked
        } else {
            match content_length {
                Some(n) => Framing::Length(n),
                None => Framing::None,
            }
        };
        let start = match self.kind {
            Kind::Request => StartLine::Request {
                method: collector
                    .method
                    .ok_or_else(|| Error::protocol("request line missing"))?,
                target: collector
                    .target
                    .ok_or_else(|| Error::protocol("request target missing"))?,
            },
            Kind::Response => StartLine::Response {
                status: collector
                    .status
                    .ok_or_else(|| Error::protocol("status line missing"))?,
            },
        };
        Ok(MessageHeader {
            start,
            headers: collector.headers,
            framing,
        })
    }

    /// Next non-empty body chunk, or an empty `Bytes` once the body is done.
    /// For chunked bodies the terminating zero chunk (and trailers) are
    /// consumed here.
    pub async fn receive(&mut self) -> Result<Bytes> {
        if !self.header_done {
            return Err(Error::protocol("receive() before receive_header()"));
        }
        loop {
            if let Some(chunk) = self.chunks.pop_front() {
                return Ok(chunk);
            }
            if self.parser.is_complete() || self.eof {
                return Ok(Bytes::new());
            }
            let mut body = BodyCollector {
                chunks: &mut self.chunks,
                trailers: &mut self.trailers,
            };
            self.parser.receive(&mut self.buf, &mut body)?;
            if !self.chunks.is_empty() || self.parser.is_complete() {
                continue;
            }
            if self.fill().await? == 0 {
                self.eof = true;
                let mut body = BodyCollector {
                    chunks: &mut self.chunks,
                    trailers: &mut self.trailers,
                };
                // read-until-close bodies end here; anything else is truncation
                self.parser.finish_on_eof(&mut body)?;
            }
        }
    }

    /// Collect the whole body into one buffer.
    pub async fn receive_all(&mut self) -> Result<Bytes> {
        let mut out = BytesMut::new();
        loop {
            let chunk = self.receive().await?;
            if chunk.is_empty() {
                return Ok(out.freeze());
            }
            out.extend_from_slice(&chunk);
        }
    }

    /// Trailer headers seen after a chunked body. Populated once `receive`
    /// has returned the empty chunk.
    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    /// Tear down the handle and return bytes that were read past the end of
    /// this message (used by the WebSocket upgrade, which switches framing
    /// mid-stream).
    pub fn into_remainder(mut self) -> BytesMut {
        std::mem::take(&mut self.buf)
    }
}

impl Drop for RxMessage<'_> {
    fn drop(&mut self) {
        // release of the read half is best-effort
        self.conn.close_recv();
    }
}
