//! Infrastructure layer for portal-gateway.
//!
//! Everything that touches a socket or the host lives here:
//!
//! - the three listeners (`dns_server`, `http_server`, `ws_server`)
//! - the supervisor that brings the access point up and runs the listeners
//!   as independent tasks
//! - the host collaborators (`access_point`, `asset_store`)
//!
//! Protocol byte work belongs to `portal-core`; membership and broadcast
//! belong to the application layer.  Each listener isolates per-connection
//! and per-request failures — only the supervisor ever treats an error as
//! fatal.

pub mod access_point;
pub mod asset_store;
pub mod dns_server;
pub mod http_server;
pub mod supervisor;
pub mod ws_server;

pub use supervisor::run_gateway;
