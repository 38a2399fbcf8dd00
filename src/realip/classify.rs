//! Public / local address classification.
//!
//! Local ranges:
//! - IPv4: 127.0.0.0/8, 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
//! - IPv6: ::1, fc00::/7
//!
//! IPv4-mapped IPv6 addresses are classified by the embedded IPv4 address.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Classification of a parsed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddrClass {
    /// Routable on the public internet.
    Public,
    /// Loopback, private or unique-local.
    Local,
}

/// Classify an address as public or local.
pub fn classify(ip: IpAddr) -> AddrClass {
    if is_local(ip) {
        AddrClass::Local
    } else {
        AddrClass::Public
    }
}

/// Returns true for loopback, private and unique-local addresses.
pub fn is_local(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_local_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_local_v4(v4),
            None => is_local_v6(v6),
        },
    }
}

fn is_local_v4(ip: Ipv4Addr) -> bool {
    // is_private covers 10/8, 172.16/12 and 192.168/16
    ip.is_loopback() || ip.is_private()
}

fn is_local_v6(ip: Ipv6Addr) -> bool {
    ip.is_loopback() || (ip.segments()[0] & 0xfe00) == 0xfc00
}
