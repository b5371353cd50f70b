//! Domain layer for portal-gateway.
//!
//! Pure business-logic types with no dependency on I/O, networking, or the
//! async runtime: the gateway configuration and the identity/state model of
//! a chat connection.

pub mod config;
pub mod connection;

pub use config::GatewayConfig;
pub use connection::{ConnId, ConnState, Connection};
