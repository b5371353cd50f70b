//! WebSocket chat relay: accept loop, per-connection handshake and frame
//! loop, and the broadcast hand-off to the registry.
//!
//! Each accepted connection runs in its own task through the state machine
//! of one chat session:
//!
//! 1. **Handshaking** – read the upgrade request; without a
//!    `Sec-WebSocket-Key` the connection is closed before it ever becomes
//!    visible to the registry.
//! 2. **Open** – the `101` response is sent, the write half is registered,
//!    and the task loops decoding frames.  Text payloads are re-framed and
//!    broadcast to every open connection.
//! 3. **Closing/Closed** – reached on a Close frame, peer disconnect,
//!    protocol violation, read timeout, or I/O error.  Every one of those
//!    paths removes the connection from the registry (idempotently — the
//!    broadcast may have pruned it first) and releases the transport.
//!
//! Frame policy: the client mask bit is required, declared lengths are
//! bounded by `max_frame_len`, Ping/Pong/Binary frames are consumed and
//! ignored, and reserved opcodes fail the connection.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use portal_core::ws::handshake::parse_key_header;
use portal_core::{
    encode_text_frame, switching_protocols_response, FrameError, FrameHeader, LengthField, Opcode,
};

use crate::application::ConnectionRegistry;
use crate::domain::{Connection, GatewayConfig};

/// Why one chat session ended.
///
/// Every variant is scoped to its own connection; none of them ever reaches
/// the listener or the supervisor.
#[derive(Debug, Error)]
pub enum WsSessionError {
    /// The upgrade request carried no `Sec-WebSocket-Key` header.
    #[error("handshake has no Sec-WebSocket-Key header")]
    MissingKey,

    /// The client broke the frame protocol (unmasked frame, oversized
    /// declared length, invalid UTF-8 text, reserved opcode).
    #[error("protocol violation: {0}")]
    Protocol(#[from] FrameError),

    /// The configured per-connection read timeout expired.
    #[error("client read timed out")]
    ReadTimeout,

    /// The transport failed mid-session.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ── Accept loop ───────────────────────────────────────────────────────────────

/// Runs the WebSocket accept loop until `running` is cleared.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    config: Arc<GatewayConfig>,
    running: Arc<AtomicBool>,
) {
    loop {
        if !running.load(Ordering::Relaxed) {
            break;
        }

        // Short accept timeout so the loop can re-check the shutdown flag.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                let registry = Arc::clone(&registry);
                let config = Arc::clone(&config);
                tokio::spawn(async move {
                    handle_client(stream, peer, registry, config).await;
                });
            }
            Ok(Err(e)) => {
                error!("ws accept error: {e}");
            }
            Err(_) => {} // timeout — loop back to the flag check
        }
    }

    info!("WebSocket relay stopped");
}

/// Outer wrapper for one session: runs it and logs the outcome, so the
/// inner function can use `?` freely.
async fn handle_client(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    config: Arc<GatewayConfig>,
) {
    match run_connection(stream, peer, registry, config).await {
        Ok(()) => info!("ws {peer}: session closed"),
        Err(e) => warn!("ws {peer}: session closed: {e}"),
    }
}

// ── Per-connection state machine ──────────────────────────────────────────────

/// Runs the complete lifecycle of one chat connection.
async fn run_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    config: Arc<GatewayConfig>,
) -> Result<(), WsSessionError> {
    let mut conn = Connection::new(peer);
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // ── Handshaking ───────────────────────────────────────────────────────────
    let key = match read_handshake_key(&mut reader, config.read_timeout).await? {
        Some(key) => key,
        None => {
            // Never reaches Open; dropping the halves closes the transport.
            conn.close();
            return Err(WsSessionError::MissingKey);
        }
    };

    write_half
        .write_all(switching_protocols_response(&key).as_bytes())
        .await?;
    write_half.flush().await?;

    // ── Open: membership begins only now ──────────────────────────────────────
    conn.open();
    registry
        .add(conn.id, ConnectionRegistry::sink(write_half))
        .await;
    debug!("ws {peer}: open as {}", conn.id);

    let result = relay_frames(&mut reader, &registry, &config).await;

    // ── Closing/Closed: identical teardown on every path ──────────────────────
    conn.close();
    registry.remove(conn.id).await;
    conn.close();
    result
}

/// Reads the upgrade request line and headers, returning the client key if
/// one was sent.  `Ok(None)` means the request finished without a key.
async fn read_handshake_key<R>(
    reader: &mut R,
    limit: Option<Duration>,
) -> Result<Option<String>, WsSessionError>
where
    R: AsyncBufReadExt + Unpin,
{
    let mut line = String::new();
    maybe_timed(limit, reader.read_line(&mut line)).await?;
    debug!("ws handshake: {}", line.trim_end());

    let mut key = None;
    loop {
        line.clear();
        let n = maybe_timed(limit, reader.read_line(&mut line)).await?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
        if key.is_none() {
            key = parse_key_header(&line);
        }
    }
    Ok(key)
}

/// The Open-state frame loop: decode, unmask, dispatch per opcode.
async fn relay_frames<R>(
    reader: &mut R,
    registry: &ConnectionRegistry,
    config: &GatewayConfig,
) -> Result<(), WsSessionError>
where
    R: AsyncRead + Unpin,
{
    let limit = config.read_timeout;

    loop {
        // Frame header: 2 bytes.  A clean EOF here is the peer leaving.
        let mut head = [0u8; 2];
        match maybe_timed(limit, reader.read_exact(&mut head)).await {
            Ok(_) => {}
            Err(WsSessionError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!("ws: peer disconnected");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        let header = FrameHeader::parse(head);

        // RFC 6455 §5.1: client frames must be masked; fail the connection
        // rather than guessing at the payload.
        if !header.masked {
            return Err(FrameError::UnmaskedClientFrame.into());
        }

        let declared = match header.length {
            LengthField::Literal(n) => u64::from(n),
            LengthField::Extended16 => {
                let mut ext = [0u8; 2];
                maybe_timed(limit, reader.read_exact(&mut ext)).await?;
                u64::from(u16::from_be_bytes(ext))
            }
            LengthField::Extended64 => {
                let mut ext = [0u8; 8];
                maybe_timed(limit, reader.read_exact(&mut ext)).await?;
                u64::from_be_bytes(ext)
            }
        };

        // Bound the declared length before allocating anything for it.
        if declared > config.max_frame_len as u64 {
            return Err(FrameError::PayloadTooLarge {
                declared,
                limit: config.max_frame_len,
            }
            .into());
        }

        let mut mask = [0u8; 4];
        maybe_timed(limit, reader.read_exact(&mut mask)).await?;

        let mut payload = vec![0u8; declared as usize];
        maybe_timed(limit, reader.read_exact(&mut payload)).await?;
        portal_core::apply_mask(&mut payload, mask);

        match header.opcode {
            Opcode::Close => {
                debug!("ws: close frame received");
                return Ok(());
            }
            Opcode::Text | Opcode::Continuation => {
                let text = String::from_utf8(payload).map_err(|_| FrameError::InvalidUtf8)?;
                debug!("ws: relaying {} bytes of text", text.len());
                let delivered = registry.broadcast(&encode_text_frame(&text)).await;
                debug!("ws: delivered to {delivered} client(s)");
            }
            Opcode::Ping | Opcode::Pong | Opcode::Binary => {
                // Keep-alive and binary transport are out of scope; the
                // payload is already consumed, so just keep reading.
                debug!("ws: ignoring {:?} frame", header.opcode);
            }
            Opcode::Unknown(op) => {
                return Err(FrameError::UnhandledOpcode(op).into());
            }
        }
    }
}

/// Applies the configured read timeout to one I/O future, if any.
async fn maybe_timed<T>(
    limit: Option<Duration>,
    fut: impl std::future::Future<Output = std::io::Result<T>>,
) -> Result<T, WsSessionError> {
    match limit {
        Some(t) => timeout(t, fut)
            .await
            .map_err(|_| WsSessionError::ReadTimeout)?
            .map_err(WsSessionError::from),
        None => fut.await.map_err(WsSessionError::from),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
