//! Parsing of incoming DNS queries.
//!
//! Only standard queries (opcode 0) are accepted; anything else is reported
//! as an error so the caller can drop the packet without replying.  The
//! question name is decoded from offset 12 as a sequence of length-prefixed
//! labels terminated by a zero-length label.  Every label length is checked
//! against the remaining buffer before it is read — a truncated or lying
//! packet produces a [`DnsParseError`], never an out-of-bounds read.

use thiserror::Error;

use crate::dns::HEADER_LEN;

/// Errors produced while parsing a DNS query datagram.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DnsParseError {
    /// The datagram is shorter than the DNS header plus the first length byte.
    #[error("packet too short: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The opcode field is not 0 (standard query).
    #[error("unsupported opcode: {0}")]
    UnsupportedOpcode(u8),

    /// A label length claims more bytes than the packet contains.
    #[error("label at offset {offset} overruns the packet")]
    LabelOverrun { offset: usize },

    /// The labels ran to the end of the packet without a zero terminator.
    #[error("question name missing its zero-length terminator")]
    UnterminatedName,

    /// A label is not valid UTF-8.
    #[error("question name label is not valid UTF-8")]
    InvalidLabel,
}

/// A parsed standard DNS query.
///
/// Holds the raw datagram (the answer builder copies the transaction id and
/// question section straight out of it) plus the decoded question name.
/// Immutable once parsed.
///
/// # Examples
///
/// ```rust
/// use portal_core::DnsQuery;
///
/// // Header (id 0xAB 0xCD, standard query, QDCOUNT 1) + "example.com" A/IN.
/// let mut packet = vec![
///     0xAB, 0xCD, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
/// ];
/// packet.push(7);
/// packet.extend_from_slice(b"example");
/// packet.push(3);
/// packet.extend_from_slice(b"com");
/// packet.extend_from_slice(&[0x00, 0x00, 0x01, 0x00, 0x01]);
///
/// let query = DnsQuery::parse(&packet).unwrap();
/// assert_eq!(query.domain(), "example.com.");
/// assert_eq!(query.transaction_id(), [0xAB, 0xCD]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery {
    /// The complete raw datagram as received.
    data: Vec<u8>,
    /// The question name as dotted labels with a trailing dot, or the empty
    /// string when the name consists of only the zero terminator.
    domain: String,
}

impl DnsQuery {
    /// Parses a raw DNS datagram into a [`DnsQuery`].
    ///
    /// # Errors
    ///
    /// Returns [`DnsParseError`] if the packet is truncated, carries a
    /// non-standard opcode, or contains a malformed question name.
    pub fn parse(data: &[u8]) -> Result<Self, DnsParseError> {
        // Header plus at least the first length byte of the question name.
        if data.len() < HEADER_LEN + 1 {
            return Err(DnsParseError::InsufficientData {
                needed: HEADER_LEN + 1,
                available: data.len(),
            });
        }

        // Opcode lives in bits 3..=6 of byte 2.
        let opcode = (data[2] >> 3) & 0x0F;
        if opcode != 0 {
            return Err(DnsParseError::UnsupportedOpcode(opcode));
        }

        let mut domain = String::new();
        let mut pos = HEADER_LEN;
        loop {
            let len = data[pos] as usize;
            if len == 0 {
                break;
            }

            let label_end = pos + 1 + len;
            if label_end > data.len() {
                return Err(DnsParseError::LabelOverrun { offset: pos });
            }

            let label = std::str::from_utf8(&data[pos + 1..label_end])
                .map_err(|_| DnsParseError::InvalidLabel)?;
            domain.push_str(label);
            domain.push('.');

            pos = label_end;
            // The next length byte (possibly the terminator) must exist.
            if pos >= data.len() {
                return Err(DnsParseError::UnterminatedName);
            }
        }

        Ok(Self {
            data: data.to_vec(),
            domain,
        })
    }

    /// The transaction id from bytes 0–1, echoed verbatim in the answer.
    pub fn transaction_id(&self) -> [u8; 2] {
        [self.data[0], self.data[1]]
    }

    /// The decoded question name (`"example.com."`), empty if the query
    /// carried only the zero-length terminator.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The raw datagram as received.
    pub fn raw(&self) -> &[u8] {
        &self.data
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
