//! ConnectionRegistry: the set of open chat connections and the broadcast
//! fan-out.
//!
//! This is the only shared mutable state in the gateway.  All mutation goes
//! through the async `Mutex` held here, so listener and per-connection
//! tasks can interleave freely at their await points without corrupting
//! membership.
//!
//! # Broadcast semantics
//!
//! `broadcast` takes a snapshot of the current membership under the lock,
//! releases it, and then writes to each client's sink independently.  A
//! write failure on one client is isolated: it neither aborts delivery to
//! the rest nor propagates to the broadcasting task.  Failed clients are
//! pruned *after* the iteration (lazy pruning), never mid-snapshot.  The
//! sender's own sink is part of the membership, so a chatting client sees
//! its message echoed back — the captive page relies on that echo.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::ConnId;

/// Shared handle to one client's transmit half.
///
/// The write half lives behind its own async `Mutex` so the broadcast task
/// and any future per-connection writer can share it without tearing
/// frames apart.
pub type ClientSink = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

/// Registry of open chat connections, keyed by [`ConnId`].
#[derive(Default)]
pub struct ConnectionRegistry {
    clients: Mutex<HashMap<ConnId, ClientSink>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a concrete write half into the boxed sink the registry stores.
    pub fn sink<W>(writer: W) -> ClientSink
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Arc::new(Mutex::new(Box::new(writer)))
    }

    /// Inserts a connection.  Call only after a successful handshake — the
    /// registry is the definition of "Open".
    pub async fn add(&self, id: ConnId, sink: ClientSink) {
        let mut clients = self.clients.lock().await;
        clients.insert(id, sink);
        debug!("registry: added {id} ({} connected)", clients.len());
    }

    /// Removes a connection.  Idempotent: removing an absent id is a no-op,
    /// so every teardown path (normal close, protocol violation, I/O error,
    /// broadcast pruning) may call it unconditionally.
    ///
    /// Returns whether the connection was still present.
    pub async fn remove(&self, id: ConnId) -> bool {
        let mut clients = self.clients.lock().await;
        let was_present = clients.remove(&id).is_some();
        if was_present {
            debug!("registry: removed {id} ({} connected)", clients.len());
        }
        was_present
    }

    /// Number of currently open connections.
    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Writes `frame` to every open connection, returning how many clients
    /// it was delivered to.
    ///
    /// Connections whose write fails are logged and scheduled for removal
    /// after the iteration completes.
    pub async fn broadcast(&self, frame: &[u8]) -> usize {
        // Snapshot membership, then release the lock before any I/O so a
        // slow client write never blocks add/remove on other tasks.
        let snapshot: Vec<(ConnId, ClientSink)> = {
            let clients = self.clients.lock().await;
            clients
                .iter()
                .map(|(id, sink)| (*id, Arc::clone(sink)))
                .collect()
        };

        let mut delivered = 0;
        let mut failed: Vec<ConnId> = Vec::new();

        for (id, sink) in snapshot {
            let mut writer = sink.lock().await;
            let result = async {
                writer.write_all(frame).await?;
                writer.flush().await
            }
            .await;

            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("broadcast write to {id} failed: {e}");
                    failed.push(id);
                }
            }
        }

        // Lazy pruning: dead connections leave the registry only after the
        // snapshot iteration is complete.
        for id in failed {
            self.remove(id).await;
        }

        delivered
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
