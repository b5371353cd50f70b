//! Access-point provisioning.
//!
//! The gateway expects to be the only infrastructure on an open wireless
//! network: it is the DHCP gateway, the resolver, and every server.  How
//! that network comes to exist is host-specific (hostapd + dnsmasq on
//! Linux, a managed radio elsewhere), so the supervisor talks to a trait
//! and the binary picks the implementation.
//!
//! Provisioning failure is the one fatal bootstrap error outside socket
//! binds: without the network there are no clients, so the supervisor
//! propagates it instead of retrying.

use std::net::Ipv4Addr;

use thiserror::Error;
use tracing::{info, warn};

/// Why the wireless network could not be brought up.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The SSID exceeds the 32-octet limit of the 802.11 standard.
    #[error("SSID is {0} bytes; 802.11 allows at most 32")]
    SsidTooLong(usize),
}

/// Brings up the open wireless network the gateway serves.
pub trait AccessPointProvisioner: Send + Sync {
    /// Starts an open (unauthenticated) access point whose DHCP offers
    /// advertise `ip` as gateway, resolver, and served address, with the
    /// given `subnet` mask.
    fn start(&self, ssid: &str, ip: Ipv4Addr, subnet: Ipv4Addr) -> Result<(), ProvisionError>;
}

/// Provisioner for hosts where the network is configured out of band.
///
/// Validates the SSID and records the expected network layout, trusting the
/// operator (or an init script) to have the radio and DHCP server in place.
/// This keeps the gateway runnable on any machine with three open ports.
pub struct ExternalProvisioner;

impl AccessPointProvisioner for ExternalProvisioner {
    fn start(&self, ssid: &str, ip: Ipv4Addr, subnet: Ipv4Addr) -> Result<(), ProvisionError> {
        if ssid.len() > 32 {
            return Err(ProvisionError::SsidTooLong(ssid.len()));
        }

        info!("expecting open network \"{ssid}\" with gateway {ip}/{subnet}");
        warn!("access point is externally managed; ensure DHCP advertises {ip} as gateway and DNS");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
