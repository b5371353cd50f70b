//! WebSocket frame format (RFC 6455 §5).
//!
//! Wire layout of a frame as the relay uses it:
//!
//! ```text
//! [fin+opcode:1][mask bit + length marker:1]
//! [extended length:0|2|8]        marker 126 → u16, marker 127 → u64, big-endian
//! [masking key:0|4]              present when the mask bit is set
//! [payload:N]                    XORed with the key, cycling every 4 bytes
//! ```
//!
//! This module decodes the two-byte header and provides masking and
//! server-frame construction; reading the variable-length tail from the
//! transport is the caller's job, because how many bytes follow the header
//! is only known after decoding it.

use thiserror::Error;

/// Errors raised while reading the frame stream of one connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// A client frame arrived without the mask bit set (RFC 6455 §5.1
    /// requires clients to mask every frame).
    #[error("client frame is not masked")]
    UnmaskedClientFrame,

    /// The declared payload length exceeds the configured bound.
    #[error("declared payload length {declared} exceeds the {limit}-byte limit")]
    PayloadTooLarge { declared: u64, limit: usize },

    /// A text payload did not decode as UTF-8.
    #[error("text payload is not valid UTF-8")]
    InvalidUtf8,

    /// The opcode nibble is not one this relay handles.
    #[error("unhandled opcode: 0x{0:X}")]
    UnhandledOpcode(u8),
}

/// WebSocket opcode, decoded from the low nibble of the first header byte.
///
/// Every nibble value maps to a variant so handling is exhaustive; values
/// the RFC reserves land in [`Opcode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
    Unknown(u8),
}

impl Opcode {
    /// Maps the low nibble of a first header byte to an opcode.
    pub fn from_byte(byte: u8) -> Self {
        match byte & 0x0F {
            0x0 => Opcode::Continuation,
            0x1 => Opcode::Text,
            0x2 => Opcode::Binary,
            0x8 => Opcode::Close,
            0x9 => Opcode::Ping,
            0xA => Opcode::Pong,
            other => Opcode::Unknown(other),
        }
    }
}

/// How the payload length is encoded after the two header bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthField {
    /// The 7-bit marker held the length itself (0..=125).
    Literal(u8),
    /// Marker 126: the next 2 bytes are a big-endian u16 length.
    Extended16,
    /// Marker 127: the next 8 bytes are a big-endian u64 length.
    Extended64,
}

/// The decoded first two bytes of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub fin: bool,
    pub opcode: Opcode,
    pub masked: bool,
    pub length: LengthField,
}

impl FrameHeader {
    /// Decodes the fixed two-byte frame header.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use portal_core::{FrameHeader, LengthField, Opcode};
    ///
    /// // fin=1, Text, masked, 5-byte payload — a typical client chat frame.
    /// let header = FrameHeader::parse([0x81, 0x85]);
    /// assert!(header.fin && header.masked);
    /// assert_eq!(header.opcode, Opcode::Text);
    /// assert_eq!(header.length, LengthField::Literal(5));
    /// ```
    pub fn parse(bytes: [u8; 2]) -> Self {
        let marker = bytes[1] & 0x7F;
        Self {
            fin: bytes[0] & 0x80 != 0,
            opcode: Opcode::from_byte(bytes[0]),
            masked: bytes[1] & 0x80 != 0,
            length: match marker {
                126 => LengthField::Extended16,
                127 => LengthField::Extended64,
                literal => LengthField::Literal(literal),
            },
        }
    }
}

/// XORs `payload` in place with `mask`, cycling by `index mod 4`.
///
/// Masking is an involution: applying the same mask twice restores the
/// original bytes, so this one function both masks and unmasks.
pub fn apply_mask(payload: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

/// Encodes a server-to-client text frame.
///
/// Server frames are never masked (RFC 6455 §5.1).  The first byte is fixed
/// `0x81` (fin=1, opcode Text); the length uses the smallest of the three
/// encodings that fits.
pub fn encode_text_frame(text: &str) -> Vec<u8> {
    let payload = text.as_bytes();
    let mut frame = Vec::with_capacity(payload.len() + 10);
    frame.push(0x81);

    let len = payload.len();
    if len <= 125 {
        frame.push(len as u8);
    } else if len <= u16::MAX as usize {
        frame.push(126);
        frame.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        frame.push(127);
        frame.extend_from_slice(&(len as u64).to_be_bytes());
    }

    frame.extend_from_slice(payload);
    frame
}

// ── Tests ─────────────────────────────────────────────────────────────────────
