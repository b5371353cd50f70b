//! WebSocket opening handshake (RFC 6455 §4).
//!
//! The client sends an HTTP request carrying a random `Sec-WebSocket-Key`
//! header.  The server proves it understood the upgrade by echoing
//! `base64(SHA1(key + GUID))` in `Sec-WebSocket-Accept`, where the GUID is a
//! fixed constant from the RFC.  No subprotocol or extension negotiation is
//! performed.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha1::{Digest, Sha1};

/// The magic GUID appended to the client key before hashing (RFC 6455 §1.3).
pub const WS_ACCEPT_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Computes the `Sec-WebSocket-Accept` value for a client key.
///
/// # Examples
///
/// ```rust
/// use portal_core::accept_key;
///
/// // The canonical example from RFC 6455 §1.3.
/// assert_eq!(
///     accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
///     "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
/// );
/// ```
pub fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WS_ACCEPT_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Builds the complete `101 Switching Protocols` response for a client key.
pub fn switching_protocols_response(client_key: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        accept_key(client_key)
    )
}

/// Extracts the `Sec-WebSocket-Key` value from one raw header line.
///
/// Returns `None` when the line is not that header.  Matching is
/// case-insensitive on the header name and trims surrounding whitespace from
/// the value, so `sec-websocket-key:  abc ` yields `"abc"`.
pub fn parse_key_header(line: &str) -> Option<String> {
    let (name, value) = line.split_once(':')?;
    if name.trim().eq_ignore_ascii_case("sec-websocket-key") {
        Some(value.trim().to_string())
    } else {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_key_matches_rfc6455_vector() {
        // The worked example from RFC 6455 §1.3.
        assert_eq!(
            accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn test_response_contains_upgrade_headers() {
        let response = switching_protocols_response("dGhlIHNhbXBsZSBub25jZQ==");

        assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(response.contains("Upgrade: websocket\r\n"));
        assert!(response.contains("Connection: Upgrade\r\n"));
        assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
        assert!(response.ends_with("\r\n\r\n"), "headers end with a blank line");
    }

    #[test]
    fn test_parse_key_header_extracts_value() {
        let key = parse_key_header("Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n");
        assert_eq!(key.as_deref(), Some("dGhlIHNhbXBsZSBub25jZQ=="));
    }

    #[test]
    fn test_parse_key_header_is_case_insensitive() {
        let key = parse_key_header("SEC-WEBSOCKET-KEY: abc123");
        assert_eq!(key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_parse_key_header_ignores_other_headers() {
        assert!(parse_key_header("Host: 10.0.0.1:8765").is_none());
        assert!(parse_key_header("Upgrade: websocket").is_none());
    }

    #[test]
    fn test_parse_key_header_ignores_lines_without_colon() {
        assert!(parse_key_header("GET /chat HTTP/1.1").is_none());
        assert!(parse_key_header("").is_none());
    }
}
