//! Captive-portal chat gateway — entry point.
//!
//! This binary turns the host into the entire network it serves: every DNS
//! query resolves to the gateway, every HTTP request gets the captive chat
//! page, and a WebSocket relay broadcasts chat lines between everyone on
//! the network.  Nothing is routed upstream; the portal is the destination.
//!
//! # Usage
//!
//! ```text
//! portal-gateway [OPTIONS]
//!
//! Options:
//!   --bind <ADDR>           Interface address for all listeners [default: 0.0.0.0]
//!   --dns-port <PORT>       DNS responder UDP port [default: 53]
//!   --http-port <PORT>      Captive-page HTTP port [default: 80]
//!   --ws-port <PORT>        WebSocket chat port [default: 8765]
//!   --gateway-ip <IP>       Address every DNS answer points at [default: 10.0.0.1]
//!   --ssid <NAME>           SSID of the open network
//!   --subnet <MASK>         Access-point subnet mask [default: 255.255.255.0]
//!   --page <PATH>           Custom captive page (built-in page when absent)
//!   --read-timeout <SECS>   Per-client WebSocket read timeout, 0 = none [default: 300]
//!   --max-frame-len <BYTES> Largest accepted frame payload [default: 1048576]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                | Default         | Description                      |
//! |-------------------------|-----------------|----------------------------------|
//! | `PORTAL_BIND`           | `0.0.0.0`       | Listener interface address       |
//! | `PORTAL_DNS_PORT`       | `53`            | DNS responder UDP port           |
//! | `PORTAL_HTTP_PORT`      | `80`            | Captive-page HTTP port           |
//! | `PORTAL_WS_PORT`        | `8765`          | WebSocket chat port              |
//! | `PORTAL_GATEWAY_IP`     | `10.0.0.1`      | Spoofed DNS answer address       |
//! | `PORTAL_SSID`           | (built-in)      | SSID of the open network         |
//! | `PORTAL_SUBNET`         | `255.255.255.0` | Access-point subnet mask         |
//! | `PORTAL_PAGE`           | (built-in page) | Custom captive page path         |
//! | `PORTAL_READ_TIMEOUT`   | `300`           | WebSocket read timeout (secs)    |
//! | `PORTAL_MAX_FRAME_LEN`  | `1048576`       | Frame payload limit (bytes)      |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use portal_gateway::domain::GatewayConfig;
use portal_gateway::infrastructure::run_gateway;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Captive-portal chat gateway.
///
/// Runs a DNS responder, a captive-page HTTP server, and a WebSocket chat
/// relay on one host, so every device joining the open network lands on the
/// same local chat room.
#[derive(Debug, Parser)]
#[command(
    name = "portal-gateway",
    about = "DNS + HTTP + WebSocket gateway for a local captive-portal chat room",
    version
)]
struct Cli {
    /// Interface address all three listeners bind to.
    ///
    /// Use `0.0.0.0` to serve every interface on the access-point network,
    /// or `127.0.0.1` for local testing.
    #[arg(long, default_value = "0.0.0.0", env = "PORTAL_BIND")]
    bind: String,

    /// UDP port of the DNS responder.  Port 53 usually needs privileges.
    #[arg(long, default_value_t = 53, env = "PORTAL_DNS_PORT")]
    dns_port: u16,

    /// TCP port of the captive-page HTTP server.
    #[arg(long, default_value_t = 80, env = "PORTAL_HTTP_PORT")]
    http_port: u16,

    /// TCP port of the WebSocket chat relay.
    #[arg(long, default_value_t = 8765, env = "PORTAL_WS_PORT")]
    ws_port: u16,

    /// The gateway's own IPv4 address — every DNS answer points here.
    #[arg(long, default_value = "10.0.0.1", env = "PORTAL_GATEWAY_IP")]
    gateway_ip: Ipv4Addr,

    /// SSID of the open wireless network (at most 32 bytes).
    #[arg(
        long,
        default_value = "Chat local captive portal",
        env = "PORTAL_SSID"
    )]
    ssid: String,

    /// Subnet mask of the access-point network.
    #[arg(long, default_value = "255.255.255.0", env = "PORTAL_SUBNET")]
    subnet: Ipv4Addr,

    /// Path to a custom captive page.  The built-in chat page is used when
    /// absent or unreadable.
    #[arg(long, env = "PORTAL_PAGE")]
    page: Option<PathBuf>,

    /// Per-client WebSocket read timeout in seconds.  `0` disables the
    /// timeout, letting idle clients hold their connection indefinitely.
    #[arg(long, default_value_t = 300, env = "PORTAL_READ_TIMEOUT")]
    read_timeout: u64,

    /// Largest frame payload (in bytes) a client may declare.
    #[arg(long, default_value_t = 1024 * 1024, env = "PORTAL_MAX_FRAME_LEN")]
    max_frame_len: usize,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`GatewayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address.
    fn into_gateway_config(self) -> anyhow::Result<GatewayConfig> {
        let bind: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;

        Ok(GatewayConfig {
            dns_bind: SocketAddr::new(bind, self.dns_port),
            http_bind: SocketAddr::new(bind, self.http_port),
            ws_bind: SocketAddr::new(bind, self.ws_port),
            gateway_ip: self.gateway_ip,
            ssid: self.ssid,
            subnet: self.subnet,
            page_path: self.page,
            read_timeout: match self.read_timeout {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            max_frame_len: self.max_frame_len,
            ..GatewayConfig::default()
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_gateway_config()?;

    info!(
        "portal-gateway starting — dns={}, http={}, ws={}, gateway={}",
        config.dns_bind, config.http_bind, config.ws_bind, config.gateway_ip
    );

    // Shutdown flag shared across all listener tasks.  The accept/receive
    // loops re-check it every 200 ms, so Ctrl+C drains within one interval.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_gateway(config, running).await?;

    info!("portal-gateway stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
