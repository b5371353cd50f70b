//! portal-gateway library crate.
//!
//! A self-contained local network gateway for a captive-portal chat
//! application: the device runs its own access point and, with no external
//! infrastructure, answers every DNS query with its own address, serves the
//! captive chat page over HTTP, and relays chat messages between clients
//! over WebSocket.
//!
//! # Architecture
//!
//! ```text
//! associated client
//!   │ DNS query (UDP :53)        → infrastructure::dns_server
//!   │ HTTP GET (TCP :80)         → infrastructure::http_server
//!   │ WebSocket (TCP :8765)      → infrastructure::ws_server
//!                                       │
//!                                 application::registry (broadcast)
//! ```
//!
//! # Layer rules
//!
//! - `domain` holds pure types: [`domain::GatewayConfig`], connection
//!   identity and state.  No I/O, no async.
//! - `application` holds the shared chat state: the
//!   [`application::ConnectionRegistry`] and its broadcast semantics.
//! - `infrastructure` owns sockets and tasks: the three listeners, the
//!   supervisor that wires them together, and the access-point /
//!   static-asset collaborators.
//!
//! The byte-level protocol work (DNS answers, RFC 6455 framing) lives in
//! the separate `portal-core` crate so it stays testable without sockets.

/// Domain layer: configuration and connection identity types (no I/O).
pub mod domain;

/// Application layer: the connection registry and broadcast logic.
pub mod application;

/// Infrastructure layer: listeners, supervisor, and host collaborators.
pub mod infrastructure;
