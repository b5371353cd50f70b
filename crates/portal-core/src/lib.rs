//! # portal-core
//!
//! Protocol engine for the captive-portal chat gateway.  Contains the two
//! wire formats the gateway speaks byte-for-byte:
//!
//! - **`dns`** – Parsing of standard DNS queries and construction of the
//!   spoofed type-A answer that points every hostname at the gateway's own
//!   address.  This is what makes the captive portal "capture": whatever a
//!   client resolves, it gets the gateway.
//!
//! - **`ws`** – The RFC 6455 subset used by the chat relay: the
//!   `Sec-WebSocket-Accept` handshake digest, frame header decoding
//!   (opcode, mask bit, the three length encodings), payload masking, and
//!   server-to-client text frame construction.
//!
//! This crate is pure computation over byte slices.  It has no dependency
//! on sockets, the async runtime, or the OS, which keeps every code path
//! testable with plain byte vectors.

pub mod dns;
pub mod ws;

// Re-export the most-used items at the crate root so callers can write
// `portal_core::DnsQuery` instead of the full module path.
pub use dns::answer::build_answer;
pub use dns::query::{DnsParseError, DnsQuery};
pub use ws::frame::{apply_mask, encode_text_frame, FrameError, FrameHeader, LengthField, Opcode};
pub use ws::handshake::{accept_key, switching_protocols_response, WS_ACCEPT_GUID};
