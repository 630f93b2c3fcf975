/*
 * mod.rs
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

//! WebSocket (RFC 6455): frame pack/unpack with masking, the opening
//! handshake, and the frame-mode connection for both roles.

pub mod client;
pub mod connection;
pub mod frame;
pub mod handshake;
pub mod server;

pub use client::Client;
pub use connection::{DataKind, WsConnection, WsEvent};
pub use frame::{apply_mask, Frame, FrameHandler, FrameHeader, FrameParser, MAX_FRAME_PAYLOAD};
pub use handshake::{accept_key, generate_key, verify_accept};
pub use server::{accept, serve};
