/*
 * message.rs
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

//! HTTP message model: methods, status reasons, the ordered header multimap,
//! and the message header with its wire serialization.

use crate::error::{Error, Result};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }

    pub fn parse(input: &str) -> Option<Method> {
        match input {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            "PATCH" => Some(Method::Patch),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IANA reason phrase for a status code; "Unknown" for unregistered codes.
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        417 => "Expectation Failed",
        426 => "Upgrade Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => "Unknown",
    }
}

/// Insertion-ordered header multimap. Lookup is case-insensitive; the
/// canonical form is preserved as received. Appending a duplicate name
/// concatenates values with `", "`, except `Set-Cookie` which stays split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header under the RFC 7230 duplicate rule.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if !name.eq_ignore_ascii_case("set-cookie") {
            if let Some((_, existing)) = self
                .entries
                .iter_mut()
                .find(|(n, _)| n.eq_ignore_ascii_case(&name))
            {
                existing.push_str(", ");
                existing.push_str(&value);
                return;
            }
        }
        self.entries.push((name, value));
    }

    /// Replace all values of `name` with `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.entries.push((name, value.into()));
    }

    /// First value stored under `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values stored under `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Body framing declared by a message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// No body and no body framing headers (e.g. a GET or a 101).
    #[default]
    None,
    /// Content-Length body of exactly this many bytes.
    Length(u64),
    /// Transfer-Encoding: chunked.
    Chunked,
}

/// First line of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    Request { method: Method, target: String },
    Response { status: u16 },
}

/// A message header: start line, headers, body framing. Built mutable so
/// callers can adjust fields before handing it to a `TxMessage`, or returned
/// populated by `RxMessage::receive_header`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub start: StartLine,
    pub headers: Headers,
    pub framing: Framing,
}

impl MessageHeader {
    pub fn request(method: Method, target: impl Into<String>) -> Self {
        Self {
            start: StartLine::Request {
                method,
                target: target.into(),
            },
            headers: Headers::new(),
            framing: Framing::None,
        }
    }

    pub fn response(status: u16) -> Self {
        Self {
            start: StartLine::Response { status },
            headers: Headers::new(),
            framing: Framing::None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Declare a Content-Length body.
    pub fn content_length(mut self, length: u64) -> Self {
        self.framing = Framing::Length(length);
        self
    }

    /// Declare a chunked body of unknown total length.
    pub fn chunked(mut self) -> Self {
        self.framing = Framing::Chunked;
        self
    }

    pub fn method(&self) -> Option<Method> {
        match &self.start {
            StartLine::Request { method, .. } => Some(*method),
            StartLine::Response { .. } => None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match &self.start {
            StartLine::Request { target, .. } => Some(target),
            StartLine::Response { .. } => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match &self.start {
            StartLine::Response { status } => Some(*status),
            StartLine::Request { .. } => None,
        }
    }

    /// True when the framing declares body bytes may follow.
    pub fn has_body(&self) -> bool {
        match self.framing {
            Framing::None | Framing::Length(0) => false,
            Framing::Length(_) | Framing::Chunked => true,
        }
    }

    /// Serialize first line, headers, body framing header, and the CRLF
    /// sentinel. The framing header is appended only when the caller did not
    /// already set one explicitly.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = String::with_capacity(128);
        match &self.start {
            StartLine::Request { method, target } => {
                if target.is_empty() {
                    return Err(Error::protocol("empty request target"));
                }
                out.push_str(method.as_str());
                out.push(' ');
                out.push_str(target);
                out.push_str(" HTTP/1.1\r\n");
            }
            StartLine::Response { status } => {
                out.push_str("HTTP/1.1 ");
                out.push_str(&status.to_string());
                out.push(' ');
                out.push_str(reason_phrase(*status));
                out.push_str("\r\n");
            }
        }
        for (name, value) in self.headers.iter() {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        match self.framing {
            Framing::Length(n) => {
                if !self.headers.contains("content-length") {
                    out.push_str("Content-Length: ");
                    out.push_str(&n.to_string());
                    out.push_str("\r\n");
                }
            }
            Framing::Chunked => {
                if !self.headers.contains("transfer-encoding") {
                    out.push_str("Transfer-Encoding: chunked\r\n");
                }
            }
            Framing::None => {}
        }
        out.push_str("\r\n");
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_roundtrip() {
        for m in [
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Delete,
            Method::Head,
            Method::Options,
            Method::Patch,
        ] {
            assert_eq!(Method::parse(m.as_str()), Some(m));
        }
        assert_eq!(Method::parse("BREW"), None);
        assert_eq!(Method::parse("get"), None);
    }

    #[test]
    fn reason_phrases() {
        assert_eq!(reason_phrase(200), "OK");
        assert_eq!(reason_phrase(101), "Switching Protocols");
        assert_eq!(reason_phrase(404), "Not Found");
        assert_eq!(reason_phrase(599), "Unknown");
    }

    #[test]
    fn headers_case_insensitive_lookup() {
        let mut h = Headers::new();
        h.append("Content-Type", "text/plain");
        assert_eq!(h.get("content-type"), Some("text/plain"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("text/plain"));
        // canonical form preserved
        assert_eq!(h.iter().next(), Some(("Content-Type", "text/plain")));
    }

    #[test]
    fn headers_duplicates_concatenate() {
        let mut h = Headers::new();
        h.append("Accept", "text/html");
        h.append("accept", "application/json");
        assert_eq!(h.get("Accept"), Some("text/html, application/json"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn set_cookie_stays_split() {
        let mut h = Headers::new();
        h.append("Set-Cookie", "a=1");
        h.append("Set-Cookie", "b=2");
        assert_eq!(h.len(), 2);
        let all: Vec<_> = h.get_all("set-cookie").collect();
        assert_eq!(all, vec!["a=1", "b=2"]);
    }

    #[test]
    fn encode_request_with_content_length() {
        let header = MessageHeader::request(Method::Post, "/")
            .with_header("Host", "example.com")
            .content_length(5);
        let bytes = header.encode().unwrap();
        assert_eq!(
            bytes,
            b"POST / HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\n"
        );
    }

    #[test]
    fn encode_response_chunked() {
        let header = MessageHeader::response(200).chunked();
        let bytes = header.encode().unwrap();
        assert_eq!(
            bytes,
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n"
        );
    }

    #[test]
    fn encode_does_not_duplicate_explicit_framing_header() {
        let header = MessageHeader::response(200)
            .with_header("Content-Length", "5")
            .content_length(5);
        let text = String::from_utf8(header.encode().unwrap()).unwrap();
        assert_eq!(text.matches("Content-Length").count(), 1);
    }

    #[test]
    fn encode_bodyless_has_single_sentinel() {
        let header = MessageHeader::request(Method::Get, "/x");
        let bytes = header.encode().unwrap();
        assert!(bytes.ends_with(b"\r\n\r\n"));
        assert_eq!(bytes, b"GET /x HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn has_body() {
        assert!(!MessageHeader::request(Method::Get, "/").has_body());
        assert!(!MessageHeader::response(200).content_length(0).has_body());
        assert!(MessageHeader::response(200).content_length(1).has_body());
        assert!(MessageHeader::response(200).chunked().has_body());
    }
}
