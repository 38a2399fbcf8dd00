//! Address literal parsing and port stripping.

use std::net::IpAddr;

/// Parse a trimmed token as an IP literal.
///
/// Hostnames, empty strings and malformed literals yield `None`.
pub fn parse_candidate(token: &str) -> Option<IpAddr> {
    token.parse().ok()
}

/// Strip a trailing `:port` from a transport peer address.
///
/// - `1.1.1.1:42` → `1.1.1.1`
/// - `[::1]:42` and `[::1]` → `::1`
/// - bare literals (`1.1.1.1`, `4006:beef::0`) are returned unchanged
/// - anything else is returned as-is
pub fn strip_port(addr: &str) -> &str {
    let addr = addr.trim();

    if parse_candidate(addr).is_some() {
        return addr;
    }

    if let Some(rest) = addr.strip_prefix('[') {
        if let Some((host, _)) = rest.split_once(']') {
            return host;
        }
        return addr;
    }

    match addr.rsplit_once(':') {
        Some((host, _)) if !host.contains(':') => host,
        _ => addr,
    }
}
