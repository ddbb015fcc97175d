//! Outbound address discovery for rewriting relative file URLs.
//!
//! When the host hands the tool a relative file URL, the file is served by
//! the plugin's own debug host. Without an explicit override the tool has to
//! guess which local address the host can reach it on; the address of the
//! interface used for outbound traffic is the usual answer.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use tracing::debug;

/// Returned whenever discovery fails.
pub const FALLBACK_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Public address used only to pick a route; nothing is sent to it.
pub const DEFAULT_PROBE_TARGET: &str = "8.8.8.8:80";

/// Source of the local address used in rewritten URLs.
pub trait AddressDiscovery: Send + Sync {
    /// Never fails; degrades to [`FALLBACK_ADDRESS`].
    fn discover_outbound_address(&self) -> IpAddr;
}

/// Discovers the outbound interface by connecting a UDP socket to `target`.
///
/// `connect` on a datagram socket only selects a route, so no packet leaves
/// the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpProbe {
    target: String,
}

impl Default for UdpProbe {
    fn default() -> Self {
        Self::with_target(DEFAULT_PROBE_TARGET)
    }
}

impl UdpProbe {
    /// Look up the route to `target` (`host:port`) instead of the default.
    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    fn local_route(&self) -> std::io::Result<SocketAddr> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect(self.target.as_str())?;
        socket.local_addr()
    }
}

impl AddressDiscovery for UdpProbe {
    fn discover_outbound_address(&self) -> IpAddr {
        match self.local_route() {
            Ok(addr) if !addr.ip().is_unspecified() => addr.ip(),
            Ok(addr) => {
                debug!("UDP route lookup returned unspecified address {}; using fallback", addr);
                FALLBACK_ADDRESS
            }
            Err(e) => {
                debug!("UDP route lookup to {} failed ({}); using fallback", self.target, e);
                FALLBACK_ADDRESS
            }
        }
    }
}

/// Always returns the same address. Useful for tests and fixed deployments.
#[derive(Debug, Clone, Copy)]
pub struct FixedAddress(pub IpAddr);

impl AddressDiscovery for FixedAddress {
    fn discover_outbound_address(&self) -> IpAddr {
        self.0
    }
}
