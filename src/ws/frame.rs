/*
 * frame.rs
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

//! WebSocket frame format (RFC 6455 §5): header pack/unpack, masking, and a
//! push parser for the receive path. The serialized header is 2, 4, 6, 8,
//! 10, or 14 bytes depending on payload size and mask presence; encoding
//! always picks the minimal length form that fits.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::net::Role;

// Opcodes
pub const OP_CONTINUATION: u8 = 0;
pub const OP_TEXT: u8 = 1;
pub const OP_BINARY: u8 = 2;
pub const OP_CLOSE: u8 = 8;
pub const OP_PING: u8 = 9;
pub const OP_PONG: u8 = 10;

/// Max payload length per data frame (64 KiB). Larger messages are
/// fragmented on send and rejected on receive. Control frames are ≤125.
pub const MAX_FRAME_PAYLOAD: usize = 65536;

pub fn is_control(opcode: u8) -> bool {
    opcode & 0x08 != 0
}

/// One frame header, every field explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub fin: bool,
    pub rsv1: bool,
    pub rsv2: bool,
    pub rsv3: bool,
    pub opcode: u8,
    pub mask: Option<[u8; 4]>,
    pub payload_len: u64,
}

impl FrameHeader {
    pub fn new(opcode: u8, fin: bool, payload_len: u64) -> Self {
        Self {
            fin,
            rsv1: false,
            rsv2: false,
            rsv3: false,
            opcode,
            mask: None,
            payload_len,
        }
    }

    /// Serialized size: 2 base bytes, plus 2 or 8 extended-length bytes,
    /// plus 4 mask bytes.
    pub fn encoded_len(&self) -> usize {
        let len_bytes = if self.payload_len < 126 {
            0
        } else if self.payload_len < 65536 {
            2
        } else {
            8
        };
        2 + len_bytes + if self.mask.is_some() { 4 } else { 0 }
    }

    /// Pack into `out`. Byte 0: FIN | RSV1..3 | opcode. Byte 1: MASK |
    /// 7-bit length where 126/127 escape to 16/64-bit big-endian forms.
    pub fn encode(&self, out: &mut BytesMut) {
        let mut b0 = self.opcode & 0x0f;
        if self.fin {
            b0 |= 0x80;
        }
        if self.rsv1 {
            b0 |= 0x40;
        }
        if self.rsv2 {
            b0 |= 0x20;
        }
        if self.rsv3 {
            b0 |= 0x10;
        }
        out.put_u8(b0);
        let mask_bit = if self.mask.is_some() { 0x80 } else { 0 };
        if self.payload_len < 126 {
            out.put_u8(mask_bit | self.payload_len as u8);
        } else if self.payload_len < 65536 {
            out.put_u8(mask_bit | 126);
            out.put_u16(self.payload_len as u16);
        } else {
            out.put_u8(mask_bit | 127);
            out.put_u64(self.payload_len);
        }
        if let Some(key) = self.mask {
            out.put_slice(&key);
        }
    }

    /// Unpack a header from the front of `buf`. Returns `None` (consuming
    /// nothing) until the full header is buffered.
    pub fn parse(buf: &mut BytesMut) -> Result<Option<FrameHeader>> {
        if buf.len() < 2 {
            return Ok(None);
        }
        let b0 = buf[0];
        let b1 = buf[1];
        let masked = b1 & 0x80 != 0;
        let len7 = b1 & 0x7f;
        let len_bytes: usize = match len7 {
            126 => 2,
            127 => 8,
            _ => 0,
        };
        let needed = 2 + len_bytes + if masked { 4 } else { 0 };
        if buf.len() < needed {
            return Ok(None);
        }
        buf.advance(2);
        let payload_len = match len7 {
            126 => buf.get_u16() as u64,
            127 => {
                let len = buf.get_u64();
                if len & (1 << 63) != 0 {
                    return Err(Error::protocol("frame length high bit set"));
                }
                len
            }
            n => n as u64,
        };
        let mask = if masked {
            let mut key = [0u8; 4];
            key.copy_from_slice(&buf[..4]);
            buf.advance(4);
            Some(key)
        } else {
            None
        };
        Ok(Some(FrameHeader {
            fin: b0 & 0x80 != 0,
            rsv1: b0 & 0x40 != 0,
            rsv2: b0 & 0x20 != 0,
            rsv3: b0 & 0x10 != 0,
            opcode: b0 & 0x0f,
            mask,
            payload_len,
        }))
    }
}

/// XOR the payload with the 4-byte key: `data[i] ^= key[i mod 4]`. Applying
/// twice with the same key is the identity.
pub fn apply_mask(data: &mut [u8], key: [u8; 4]) {
    for (i, b) in data.iter_mut().enumerate() {
        *b ^= key[i % 4];
    }
}

/// Encode one complete frame (header + payload), masking the payload when
/// `mask` is given.
pub fn encode_frame(
    opcode: u8,
    fin: bool,
    payload: &[u8],
    mask: Option<[u8; 4]>,
    out: &mut BytesMut,
) -> Result<()> {
    if is_control(opcode) {
        if payload.len() > 125 {
            return Err(Error::protocol("control frame payload over 125 bytes"));
        }
        if !fin {
            return Err(Error::protocol("control frames must not be fragmented"));
        }
    } else if payload.len() > MAX_FRAME_PAYLOAD {
        return Err(Error::protocol("data frame payload too long"));
    }
    let mut header = FrameHeader::new(opcode, fin, payload.len() as u64);
    header.mask = mask;
    out.reserve(header.encoded_len() + payload.len());
    header.encode(out);
    match mask {
        Some(key) => {
            let start = out.len();
            out.put_slice(payload);
            apply_mask(&mut out[start..], key);
        }
        None => out.put_slice(payload),
    }
    Ok(())
}

/// One received frame with its payload unmasked.
#[derive(Debug, Clone)]
pub struct Frame {
    pub opcode: u8,
    pub fin: bool,
    pub payload: Bytes,
}

/// Callback for completed frames (receive path).
pub trait FrameHandler {
    fn frame(&mut self, frame: Frame);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Header,
    Payload,
}

/// Push parser for incoming frames. The role decides mask enforcement:
/// a server requires masked frames from its client, a client requires
/// unmasked frames from the server.
pub struct FrameParser {
    role: Role,
    state: FrameState,
    header: FrameHeader,
}

impl FrameParser {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            state: FrameState::Header,
            header: FrameHeader::new(OP_CONTINUATION, false, 0),
        }
    }

    /// Feed buffered bytes; dispatches every complete frame to the handler.
    /// Returns when more data is needed.
    pub fn receive<H: FrameHandler>(&mut self, buf: &mut BytesMut, handler: &mut H) -> Result<()> {
        loop {
            match self.state {
                FrameState::Header => {
                    let header = match FrameHeader::parse(buf)? {
                        Some(h) => h,
                        None => return Ok(()),
                    };
                    match self.role {
                        Role::Server if header.mask.is_none() => {
                            return Err(Error::protocol("client frame must be masked"));
                        }
                        Role::Client if header.mask.is_some() => {
                            return Err(Error::protocol("server frame must not be masked"));
                        }
                        _ => {}
                    }
                    if header.rsv1 || header.rsv2 || header.rsv3 {
                        return Err(Error::protocol("reserved frame bits set"));
                    }
                    if is_control(header.opcode) {
                        if header.payload_len > 125 {
                            return Err(Error::protocol("control frame payload over 125 bytes"));
                        }
                        if !header.fin {
                            return Err(Error::protocol("fragmented control frame"));
                        }
                    } else if header.payload_len > MAX_FRAME_PAYLOAD as u64 {
                        return Err(Error::protocol("data frame payload too long"));
                    }
                    self.header = header;
                    self.state = FrameState::Payload;
                }
                FrameState::Payload => {
                    let need = self.header.payload_len as usize;
                    if buf.len() < need {
                        return Ok(());
                    }
                    let mut payload = buf.split_to(need);
                    if let Some(key) = self.header.mask {
                        apply_mask(&mut payload, key);
                    }
                    handler.frame(Frame {
                        opcode: self.header.opcode,
                        fin: self.header.fin,
                        payload: payload.freeze(),
                    });
                    self.state = FrameState::Header;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(header: FrameHeader) {
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), header.encoded_len());
        let parsed = FrameHeader::parse(&mut buf).unwrap().unwrap();
        assert_eq!(parsed, header);
        assert!(buf.is_empty());
    }

    #[test]
    fn header_roundtrip_all_length_forms() {
        for payload_len in [0u64, 1, 125, 126, 127, 65535, 65536, 1 << 40] {
            for mask in [None, Some([1, 2, 3, 4])] {
                let mut h = FrameHeader::new(OP_BINARY, true, payload_len);
                h.mask = mask;
                roundtrip(h);
            }
        }
    }

    #[test]
    fn header_roundtrip_flags() {
        let mut h = FrameHeader::new(OP_TEXT, false, 7);
        h.rsv1 = true;
        h.rsv3 = true;
        roundtrip(h);
    }

    #[test]
    fn encoded_len_table() {
        let mut h = FrameHeader::new(OP_TEXT, true, 125);
        assert_eq!(h.encoded_len(), 2);
        h.mask = Some([0; 4]);
        assert_eq!(h.encoded_len(), 6);
        h.payload_len = 126;
        assert_eq!(h.encoded_len(), 8);
        h.mask = None;
        assert_eq!(h.encoded_len(), 4);
        h.payload_len = 65536;
        assert_eq!(h.encoded_len(), 10);
        h.mask = Some([0; 4]);
        assert_eq!(h.encoded_len(), 14);
    }

    #[test]
    fn minimal_length_encoding_chosen() {
        // 125 fits the 7-bit form, 126 needs 16-bit, 65536 needs 64-bit
        let mut buf = BytesMut::new();
        FrameHeader::new(OP_TEXT, true, 125).encode(&mut buf);
        assert_eq!(buf[1] & 0x7f, 125);
        buf.clear();
        FrameHeader::new(OP_TEXT, true, 126).encode(&mut buf);
        assert_eq!(buf[1] & 0x7f, 126);
        buf.clear();
        FrameHeader::new(OP_TEXT, true, 65535).encode(&mut buf);
        assert_eq!(buf[1] & 0x7f, 126);
        buf.clear();
        FrameHeader::new(OP_TEXT, true, 65536).encode(&mut buf);
        assert_eq!(buf[1] & 0x7f, 127);
    }

    #[test]
    fn mask_involution() {
        let key = [0xa5, 0x5a, 0x11, 0xfe];
        let original: Vec<u8> = (0..=255u8).collect();
        let mut data = original.clone();
        apply_mask(&mut data, key);
        assert_ne!(data, original);
        apply_mask(&mut data, key);
        assert_eq!(data, original);
    }

    struct Collect(Vec<Frame>);
    impl FrameHandler for Collect {
        fn frame(&mut self, frame: Frame) {
            self.0.push(frame);
        }
    }

    #[test]
    fn parse_masked_frame_as_server() {
        let key = [1, 2, 3, 4];
        let mut wire = BytesMut::new();
        encode_frame(OP_TEXT, true, b"Hello world !", Some(key), &mut wire).unwrap();
        let mut parser = FrameParser::new(Role::Server);
        let mut out = Collect(Vec::new());
        parser.receive(&mut wire, &mut out).unwrap();
        assert_eq!(out.0.len(), 1);
        assert_eq!(&out.0[0].payload[..], b"Hello world !");
        assert!(out.0[0].fin);
        assert_eq!(out.0[0].opcode, OP_TEXT);
    }

    #[test]
    fn server_rejects_unmasked() {
        let mut wire = BytesMut::new();
        encode_frame(OP_TEXT, true, b"hi", None, &mut wire).unwrap();
        let mut parser = FrameParser::new(Role::Server);
        let mut out = Collect(Vec::new());
        assert!(parser.receive(&mut wire, &mut out).is_err());
    }

    #[test]
    fn client_rejects_masked() {
        let mut wire = BytesMut::new();
        encode_frame(OP_TEXT, true, b"hi", Some([9, 9, 9, 9]), &mut wire).unwrap();
        let mut parser = FrameParser::new(Role::Client);
        let mut out = Collect(Vec::new());
        assert!(parser.receive(&mut wire, &mut out).is_err());
    }

    #[test]
    fn frame_spanning_reads() {
        let mut wire = BytesMut::new();
        encode_frame(OP_BINARY, true, &[7u8; 300], None, &mut wire).unwrap();
        let mut parser = FrameParser::new(Role::Client);
        let mut out = Collect(Vec::new());
        let wire = wire.freeze();
        let mut buf = BytesMut::new();
        for chunk in wire.chunks(11) {
            buf.extend_from_slice(chunk);
            parser.receive(&mut buf, &mut out).unwrap();
        }
        assert_eq!(out.0.len(), 1);
        assert_eq!(out.0[0].payload.len(), 300);
    }

    #[test]
    fn oversized_control_frame_rejected() {
        let mut out = BytesMut::new();
        assert!(encode_frame(OP_PING, true, &[0u8; 126], None, &mut out).is_err());
        assert!(encode_frame(OP_CLOSE, false, b"", None, &mut out).is_err());
    }
}
