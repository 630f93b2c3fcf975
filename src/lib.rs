/*
 * lib.rs
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

//! Centralino: an asynchronous HTTP/1.1 and WebSocket toolkit over tokio.
//!
//! The pieces, bottom up:
//!
//! - [`net`]: plain/TLS streams, cancellable connections, and the
//!   accept/spawn-per-connection [`net::serve`] loop with scope drain.
//! - [`http`]: the incremental message parser, the message model, and the
//!   scoped [`http::RxMessage`]/[`http::TxMessage`] handles for one message
//!   cycle each (Content-Length and chunked bodies).
//! - [`ws`]: RFC 6455 framing, the opening handshake, and frame-mode
//!   connections for both roles.
//! - [`router`]: ordered regex routes with typed capture extraction.
//! - [`uri`]: URI parsing and percent-coding.
//!
//! Cancellation uses `tokio_util::sync::CancellationToken` throughout: every
//! awaitable operation races its connection's token, and `serve` propagates
//! its token to per-connection children and drains them before returning.

pub mod error;
pub mod http;
pub mod net;
pub mod router;
pub mod uri;
pub mod ws;

pub use error::{Error, Result};
pub use net::{ClientTlsConfig, Connection, Role, ServeOptions, ServerTlsConfig, VerifyMode};
