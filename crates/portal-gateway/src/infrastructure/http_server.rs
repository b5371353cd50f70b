//! HTTP greeter: the listener that triggers captive-portal detection and
//! delivers the entry page.
//!
//! There is no routing.  Whatever the request line says, the response is
//! `HTTP/1.0 200 OK`, a blank line, and the captive page body, after which
//! the connection is closed (no keep-alive).  Headers are read and
//! discarded until the blank line so clients like curl see their request
//! fully consumed.  An empty request line (client connected and went away)
//! skips the body; it never fails the listener.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Fixed status line and header terminator of every response.
const RESPONSE_HEAD: &str = "HTTP/1.0 200 OK\r\n\r\n";

/// Runs the HTTP accept loop until `running` is cleared.
///
/// Each accepted connection is handled in its own task so one slow client
/// never delays captive-portal probes from other devices.
pub async fn serve(listener: TcpListener, page: Arc<String>, running: Arc<AtomicBool>) {
    loop {
        if !running.load(Ordering::Relaxed) {
            break;
        }

        // Short accept timeout so the loop can re-check the shutdown flag.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                let page = Arc::clone(&page);
                tokio::spawn(async move {
                    if let Err(e) = handle_request(stream, peer, page).await {
                        debug!("http {peer}: {e}");
                    }
                });
            }
            Ok(Err(e)) => {
                // Transient accept error (e.g. fd exhaustion): keep serving.
                error!("http accept error: {e}");
            }
            Err(_) => {} // timeout — loop back to the flag check
        }
    }

    info!("HTTP greeter stopped");
}

/// Serves one request: request line, drained headers, fixed response.
async fn handle_request(
    stream: TcpStream,
    peer: SocketAddr,
    page: Arc<String>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    debug!("http {peer}: {}", request_line.trim_end());

    // Drain headers until the blank line; their content is irrelevant.
    let mut header = String::new();
    loop {
        header.clear();
        let n = reader.read_line(&mut header).await?;
        if n == 0 || header == "\r\n" || header == "\n" {
            break;
        }
    }

    // An empty request line means the client gave up: close without a body.
    if !request_line.trim().is_empty() {
        write_half.write_all(RESPONSE_HEAD.as_bytes()).await?;
        write_half.write_all(page.as_bytes()).await?;
        write_half.flush().await?;
    }

    // Dropping the halves closes the socket — single response, no keep-alive.
    if let Err(e) = write_half.shutdown().await {
        warn!("http {peer}: shutdown failed: {e}");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
