/*
 * error.rs
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

//! Crate error taxonomy.

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors from connection, HTTP, WebSocket, and TLS operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The operation's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// OS-level I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// TLS library failure; fatal for the connection.
    #[error("tls error: {0}")]
    Tls(String),

    /// Malformed HTTP or WebSocket traffic, incomplete message on EOF,
    /// refused upgrade, invalid accept hash.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// More body bytes written than the declared Content-Length.
    #[error("message body exceeds declared content length")]
    Overflow,

    /// Message finished with fewer body bytes than declared.
    #[error("message body shorter than declared content length ({sent} of {declared} bytes)")]
    Underflow { sent: u64, declared: u64 },
}

impl Error {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// True for errors that mean the peer went away: treated as normal
    /// termination of a connection, not reported to the user.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_kinds() {
        let e = Error::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(e.is_disconnect());
        let e = Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
        assert!(e.is_disconnect());
        let e = Error::Io(io::Error::new(io::ErrorKind::TimedOut, "timeout"));
        assert!(!e.is_disconnect());
        assert!(!Error::Cancelled.is_disconnect());
    }

    #[test]
    fn cancelled_is_not_a_protocol_error() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::protocol("bad").is_cancelled());
    }
}
