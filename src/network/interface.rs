//! Local primary address lookup

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;
use std::net::Ipv4Addr;

/// First non-loopback IPv4 address of an interface
fn primary_ipv4(interface: &NetworkInterface) -> Option<Ipv4Addr> {
    interface.ips.iter().find_map(|net| match net {
        IpNetwork::V4(v4) if !v4.ip().is_loopback() && !v4.ip().is_unspecified() => Some(v4.ip()),
        _ => None,
    })
}

/// Pick the primary address out of a list of interfaces.
///
/// Interfaces that are down or loopback are skipped; the first remaining
/// IPv4 address wins, in the order the OS reports interfaces.
pub fn select_primary_ipv4(interfaces: &[NetworkInterface]) -> Option<Ipv4Addr> {
    interfaces
        .iter()
        .filter(|iface| iface.is_up() && !iface.is_loopback())
        .find_map(primary_ipv4)
}

/// Resolve the machine's primary non-loopback IPv4 address.
///
/// Falls back to `127.0.0.1` when no interface carries one.
pub fn local_primary_ipv4() -> Ipv4Addr {
    let interfaces = datalink::interfaces();

    match select_primary_ipv4(&interfaces) {
        Some(ip) => {
            log::debug!("Using {} as local primary address", ip);
            ip
        }
        None => {
            log::warn!(
                "No non-loopback IPv4 address among {} interface(s), falling back to {}",
                interfaces.len(),
                Ipv4Addr::LOCALHOST
            );
            Ipv4Addr::LOCALHOST
        }
    }
}
