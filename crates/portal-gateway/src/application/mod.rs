//! Application layer for portal-gateway.
//!
//! Holds the one piece of shared mutable state in the gateway: the
//! [`ConnectionRegistry`] that tracks open chat connections and fans
//! messages out to them.

pub mod registry;

pub use registry::{ClientSink, ConnectionRegistry};
