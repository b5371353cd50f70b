//! Construction of the spoofed DNS answer.
//!
//! The gateway answers every resolvable standard query with its own address,
//! so any hostname a client types reaches the captive page.  The answer
//! echoes the query's transaction id and question section untouched and
//! appends a single type-A, class-IN record whose RDATA is the gateway IP.
//!
//! Wire layout of the response:
//!
//! ```text
//! [id:2][flags 0x8180][QDCOUNT:2][ANCOUNT = QDCOUNT][NSCOUNT 0][ARCOUNT 0]
//! [question section, verbatim from offset 12]
//! [0xC00C name pointer][TYPE 0x0001][CLASS 0x0001][TTL 60][RDLENGTH 4][ip:4]
//! ```

use std::net::Ipv4Addr;

use crate::dns::query::DnsQuery;
use crate::dns::HEADER_LEN;

/// Answer record TTL in seconds.
const ANSWER_TTL: u32 = 60;

/// Builds the spoofed answer for `query`, pointing at `ip`.
///
/// Returns `None` when the query's domain is empty — there is no name to
/// answer for, and the caller must not send a reply.
///
/// # Examples
///
/// ```rust
/// use portal_core::{build_answer, DnsQuery};
///
/// let mut packet = vec![
///     0x1A, 0x2B, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
/// ];
/// packet.push(4);
/// packet.extend_from_slice(b"chat");
/// packet.extend_from_slice(&[0x00, 0x00, 0x01, 0x00, 0x01]);
///
/// let query = DnsQuery::parse(&packet).unwrap();
/// let answer = build_answer(&query, "10.0.0.1".parse().unwrap()).unwrap();
/// assert_eq!(&answer[..2], &[0x1A, 0x2B]);
/// assert_eq!(&answer[answer.len() - 4..], &[10, 0, 0, 1]);
/// ```
pub fn build_answer(query: &DnsQuery, ip: Ipv4Addr) -> Option<Vec<u8>> {
    if query.domain().is_empty() {
        return None;
    }

    let data = query.raw();
    let mut packet = Vec::with_capacity(data.len() + 16);

    packet.extend_from_slice(&data[..2]); // transaction id, echoed
    packet.extend_from_slice(&[0x81, 0x80]); // standard response, no error
    packet.extend_from_slice(&data[4..6]); // QDCOUNT, copied
    packet.extend_from_slice(&data[4..6]); // ANCOUNT mirrors QDCOUNT
    packet.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // NSCOUNT + ARCOUNT
    packet.extend_from_slice(&data[HEADER_LEN..]); // question section, verbatim
    packet.extend_from_slice(&[0xC0, 0x0C]); // compression pointer to offset 12
    packet.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]); // TYPE A, CLASS IN
    packet.extend_from_slice(&ANSWER_TTL.to_be_bytes());
    packet.extend_from_slice(&4u16.to_be_bytes()); // RDLENGTH
    packet.extend_from_slice(&ip.octets());

    Some(packet)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
