//! Gateway configuration types.
//!
//! [`GatewayConfig`] is the single source of truth for all runtime settings.
//! It is populated from CLI arguments (see `main.rs`) or from defaults that
//! match the captive-portal deployment: DNS on 53, HTTP on 80, WebSocket on
//! 8765, gateway address `10.0.0.1`.  Keeping it a plain struct with no
//! environment reads makes every server function testable with a literal.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// All runtime configuration for the gateway.
///
/// Build once at startup, then wrap in an `Arc` and share across the
/// listener and per-connection tasks.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bind address of the DNS responder (UDP).
    pub dns_bind: SocketAddr,

    /// Bind address of the captive-page HTTP listener (TCP).
    pub http_bind: SocketAddr,

    /// Bind address of the WebSocket chat relay (TCP).
    pub ws_bind: SocketAddr,

    /// The gateway's own IPv4 address: every DNS answer points here, and
    /// the access point hands it out as gateway and resolver.
    pub gateway_ip: Ipv4Addr,

    /// SSID of the open wireless network (at most 32 characters).
    pub ssid: String,

    /// Subnet mask for the access-point network.
    pub subnet: Ipv4Addr,

    /// Optional path to the captive page; the built-in page is used when
    /// absent or unreadable at startup.
    pub page_path: Option<PathBuf>,

    /// Per-connection read timeout for WebSocket clients.  `None` means a
    /// stalled client may hold its task indefinitely, as the baseline
    /// design allowed.
    pub read_timeout: Option<Duration>,

    /// Upper bound on the declared payload length of one incoming frame.
    /// Frames declaring more are rejected before any allocation.
    pub max_frame_len: usize,

    /// How long the DNS loop backs off after a transient socket error.
    pub dns_retry_delay: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            // Compile-time-known valid socket address literals.
            dns_bind: "0.0.0.0:53".parse().unwrap(),
            http_bind: "0.0.0.0:80".parse().unwrap(),
            ws_bind: "0.0.0.0:8765".parse().unwrap(),
            gateway_ip: Ipv4Addr::new(10, 0, 0, 1),
            ssid: "Chat local captive portal".to_string(),
            subnet: Ipv4Addr::new(255, 255, 255, 0),
            page_path: None,
            read_timeout: Some(Duration::from_secs(300)),
            max_frame_len: 1024 * 1024,
            dns_retry_delay: Duration::from_secs(3),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports_match_the_captive_portal_layout() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.dns_bind.port(), 53);
        assert_eq!(cfg.http_bind.port(), 80);
        assert_eq!(cfg.ws_bind.port(), 8765);
    }

    #[test]
    fn test_default_gateway_ip_is_10_0_0_1() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.gateway_ip, Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_default_ssid_fits_the_32_character_limit() {
        let cfg = GatewayConfig::default();
        assert!(cfg.ssid.len() <= 32, "SSIDs longer than 32 chars are invalid");
    }

    #[test]
    fn test_default_read_timeout_is_bounded() {
        // The strengthened design bounds client reads by default.
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.read_timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_default_dns_retry_delay_is_three_seconds() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.dns_retry_delay, Duration::from_secs(3));
    }

    #[test]
    fn test_config_can_be_cloned_for_sharing() {
        let cfg = GatewayConfig::default();
        let cloned = cfg.clone();
        assert_eq!(cfg.ws_bind, cloned.ws_bind);
        assert_eq!(cfg.max_frame_len, cloned.max_frame_len);
    }
}
