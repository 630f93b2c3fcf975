/*
 * mod.rs
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

//! HTTP/1.1: message model, push parser, scoped rx/tx message handles, and
//! the request/response server and client conveniences.
//!
//! - Buffers: `bytes` crate (BytesMut for the parse buffer, Bytes for body
//!   chunk handoff).
//! - Parsing: one incremental state machine for requests and responses;
//!   chunked transfer included.
//! - I/O: `RxMessage`/`TxMessage` bound to a connection for exactly one
//!   message cycle each.

pub mod client;
pub mod message;
pub mod parser;
pub mod rx;
pub mod server;
pub mod tx;

pub use client::Client;
pub use message::{reason_phrase, Framing, Headers, MessageHeader, Method, StartLine};
pub use parser::{Kind, MessageHandler, MessageParser, ParseState};
pub use rx::RxMessage;
pub use server::{serve, serve_router, Request, Response};
pub use tx::TxMessage;
