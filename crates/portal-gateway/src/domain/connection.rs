//! Connection identity and lifecycle state.
//!
//! A chat connection moves through a small state machine:
//!
//! ```text
//! Handshaking ──open()──▶ Open ──close()──▶ Closing ──close()──▶ Closed
//!      │                                                           ▲
//!      └────────────────────────close()──────────────────────────(via Closing)
//! ```
//!
//! Only an `Open` connection is broadcast-reachable; the registry admits a
//! connection after the handshake succeeds and drops it on any terminal
//! transition.  `Closing` and `Closed` are terminal: no frame is processed
//! once either is reached, whichever path led there (normal close, protocol
//! violation, I/O error, or peer disconnect).

use std::net::SocketAddr;

use uuid::Uuid;

/// Unique identity of one chat connection.  Registry membership is keyed
/// by this id, never by address (two tabs on one device are two clients).
pub type ConnId = Uuid;

/// Lifecycle state of a chat connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// The HTTP upgrade is still in flight; not yet registered.
    Handshaking,
    /// Handshake complete; registered and broadcast-reachable.
    Open,
    /// A close was initiated; no further frames are processed.
    Closing,
    /// The transport is released.
    Closed,
}

impl ConnState {
    /// Whether this state is terminal (no way back to `Open`).
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnState::Closing | ConnState::Closed)
    }
}

/// One client connection as the WebSocket handler tracks it.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnId,
    pub peer: SocketAddr,
    state: ConnState,
}

impl Connection {
    /// Creates a connection in `Handshaking` with a fresh id.
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            state: ConnState::Handshaking,
        }
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnState::Open
    }

    /// Marks the handshake as complete.  Has no effect once terminal.
    pub fn open(&mut self) {
        if self.state == ConnState::Handshaking {
            self.state = ConnState::Open;
        }
    }

    /// Advances toward `Closed`: `Handshaking`/`Open` become `Closing`,
    /// `Closing` becomes `Closed`.  Safe to call repeatedly.
    pub fn close(&mut self) {
        self.state = match self.state {
            ConnState::Closed => ConnState::Closed,
            ConnState::Closing => ConnState::Closed,
            _ => ConnState::Closing,
        };
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
