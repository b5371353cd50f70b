//! DNS responder: the UDP poll loop that answers every query with the
//! gateway's own address.
//!
//! One task owns the socket.  Each received datagram is parsed and, when it
//! is a resolvable standard query, answered immediately from the same
//! socket — there is no recursion, no cache, and no zone data.  Malformed
//! packets, unsupported opcodes, and empty question names produce no reply
//! at all.
//!
//! Error handling follows the listener taxonomy: a failed parse affects
//! only that packet; a socket-level receive error is logged and the loop
//! backs off (`dns_retry_delay`, ~3 s) before retrying rather than
//! terminating.  The loop re-checks the shared `running` flag on a short
//! receive timeout so shutdown is never blocked on a quiet network.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use portal_core::{build_answer, DnsQuery};

/// Receive timeout used to periodically re-check the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Maximum DNS datagram the responder accepts.
const MAX_DATAGRAM: usize = 4096;

/// Binds the responder's UDP socket.
///
/// # Errors
///
/// Returns the bind error (port in use, missing privilege for :53) so the
/// supervisor can treat it as a bootstrap failure.
pub async fn bind(addr: SocketAddr) -> std::io::Result<UdpSocket> {
    let socket = UdpSocket::bind(addr).await?;
    info!("DNS responder listening on UDP {addr}");
    Ok(socket)
}

/// Runs the DNS poll loop until `running` is cleared.
pub async fn serve(
    socket: UdpSocket,
    gateway_ip: Ipv4Addr,
    retry_delay: Duration,
    running: Arc<AtomicBool>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];

    while running.load(Ordering::Relaxed) {
        let (len, src) = match timeout(POLL_INTERVAL, socket.recv_from(&mut buf)).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                // Transient socket failure: log, back off, keep serving.
                error!("DNS socket error: {e}; retrying in {retry_delay:?}");
                tokio::time::sleep(retry_delay).await;
                continue;
            }
            Err(_) => continue, // timeout — re-check the running flag
        };

        if let Some(answer) = answer_for(&buf[..len], gateway_ip) {
            if let Err(e) = socket.send_to(&answer, src).await {
                warn!("failed to send DNS answer to {src}: {e}");
            }
        }
    }

    info!("DNS responder stopped");
}

/// Produces the spoofed answer for one datagram, or `None` when no reply
/// must be sent (malformed packet, non-standard opcode, empty name).
pub fn answer_for(datagram: &[u8], gateway_ip: Ipv4Addr) -> Option<Vec<u8>> {
    let query = match DnsQuery::parse(datagram) {
        Ok(query) => query,
        Err(e) => {
            debug!("ignoring DNS packet: {e}");
            return None;
        }
    };

    match build_answer(&query, gateway_ip) {
        Some(answer) => {
            debug!("DNS: {} -> {gateway_ip}", query.domain());
            Some(answer)
        }
        None => {
            debug!("DNS: empty question name, no answer");
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
