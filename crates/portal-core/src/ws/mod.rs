//! WebSocket module: the RFC 6455 subset the chat relay speaks.
//!
//! `handshake` covers the HTTP upgrade (key → accept digest, 101 response);
//! `frame` covers the data phase (header decoding, masking, text frame
//! construction).  Fragmentation, ping/pong keep-alive, and extensions are
//! deliberately not implemented.

pub mod frame;
pub mod handshake;

pub use frame::{apply_mask, encode_text_frame, FrameError, FrameHeader, LengthField, Opcode};
pub use handshake::{accept_key, switching_protocols_response, WS_ACCEPT_GUID};
