//! Service supervisor: bootstrap and the lifetime of the three listeners.
//!
//! Bootstrap is strictly ordered — access point, captive page, then the
//! three socket binds — and every step in it is fatal on failure: a gateway
//! that cannot capture DNS or serve the page is not degraded, it is
//! useless.  After bootstrap the error taxonomy inverts: per-packet and
//! per-connection failures are contained inside the listeners, and only the
//! death of a listener task itself brings the gateway down.
//!
//! Shutdown is cooperative.  Clearing the shared `running` flag makes each
//! listener fall out of its accept/receive loop within one poll interval.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::application::ConnectionRegistry;
use crate::domain::GatewayConfig;
use crate::infrastructure::access_point::{AccessPointProvisioner, ExternalProvisioner};
use crate::infrastructure::asset_store::{load_captive_page, FileAssetStore};
use crate::infrastructure::{dns_server, http_server, ws_server};

/// Runs the whole gateway until `running` is cleared or a listener dies.
///
/// # Errors
///
/// Returns an error when bootstrap fails (access point, socket binds) or
/// when any listener task terminates while the gateway should still be
/// running.
pub async fn run_gateway(config: GatewayConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    // ── Bootstrap: every failure here is fatal ────────────────────────────────
    ExternalProvisioner
        .start(&config.ssid, config.gateway_ip, config.subnet)
        .context("failed to bring up the access point")?;

    let page = Arc::new(load_captive_page(&FileAssetStore, config.page_path.as_ref()));

    let dns_socket = dns_server::bind(config.dns_bind)
        .await
        .with_context(|| format!("failed to bind DNS responder on {}", config.dns_bind))?;
    let http_listener = TcpListener::bind(config.http_bind)
        .await
        .with_context(|| format!("failed to bind HTTP greeter on {}", config.http_bind))?;
    info!("HTTP greeter listening on {}", config.http_bind);
    let ws_listener = TcpListener::bind(config.ws_bind)
        .await
        .with_context(|| format!("failed to bind WebSocket relay on {}", config.ws_bind))?;
    info!("WebSocket relay listening on {}", config.ws_bind);

    // ── Steady state: three independent listener tasks ────────────────────────
    let registry = Arc::new(ConnectionRegistry::new());
    let config = Arc::new(config);

    let dns_task = tokio::spawn(dns_server::serve(
        dns_socket,
        config.gateway_ip,
        config.dns_retry_delay,
        Arc::clone(&running),
    ));
    let http_task = tokio::spawn(http_server::serve(
        http_listener,
        page,
        Arc::clone(&running),
    ));
    let ws_task = tokio::spawn(ws_server::serve(
        ws_listener,
        registry,
        Arc::clone(&config),
        Arc::clone(&running),
    ));

    info!("captive portal up: every name resolves to {}", config.gateway_ip);

    // The first listener to return decides what happens: during shutdown
    // that is expected; while running it means the gateway lost a service.
    let fallen = tokio::select! {
        _ = dns_task => "DNS responder",
        _ = http_task => "HTTP greeter",
        _ = ws_task => "WebSocket relay",
    };

    if running.load(Ordering::Relaxed) {
        running.store(false, Ordering::Relaxed); // take the others down too
        error!("{fallen} terminated unexpectedly; stopping the gateway");
        anyhow::bail!("{fallen} terminated unexpectedly");
    }

    info!("gateway stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Config bound to ephemeral loopback ports so tests need no privileges.
    fn loopback_config() -> GatewayConfig {
        GatewayConfig {
            dns_bind: "127.0.0.1:0".parse().unwrap(),
            http_bind: "127.0.0.1:0".parse().unwrap(),
            ws_bind: "127.0.0.1:0".parse().unwrap(),
            ..GatewayConfig::default()
        }
    }

    #[tokio::test]
    async fn test_gateway_runs_until_the_flag_is_cleared() {
        let running = Arc::new(AtomicBool::new(true));
        let handle = tokio::spawn(run_gateway(loopback_config(), Arc::clone(&running)));

        // Give bootstrap a moment, then request shutdown.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!handle.is_finished(), "gateway must stay up while running");
        running.store(false, Ordering::Relaxed);

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("gateway must stop within one poll interval")
            .expect("task must not panic");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_ssid_fails_bootstrap() {
        let config = GatewayConfig {
            ssid: "x".repeat(33),
            ..loopback_config()
        };

        let result = run_gateway(config, Arc::new(AtomicBool::new(true))).await;

        let err = result.expect_err("oversized SSID must be fatal");
        assert!(err.to_string().contains("access point"));
    }

    #[tokio::test]
    async fn test_unbindable_port_fails_bootstrap() {
        // Occupy a TCP port, then ask the gateway to bind HTTP to it.
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = GatewayConfig {
            http_bind: taken.local_addr().unwrap(),
            ..loopback_config()
        };

        let result = run_gateway(config, Arc::new(AtomicBool::new(true))).await;

        let err = result.expect_err("occupied port must be fatal");
        assert!(err.to_string().contains("HTTP greeter"));
    }
}
