//! Forwarding-chain (`X-Forwarded-For`) scanning.
//!
//! Each proxy appends the peer it saw, so the left end is whatever the client
//! sent and the right end was written by the proxies closest to us. The scan
//! walks right to left and stops at the first public entry, skipping
//! unparsable tokens and local hops such as the edge proxy's own loopback.

use super::addr::parse_candidate;
use super::classify::is_local;

/// Return the right-most public address in a comma-separated chain.
pub fn scan_chain(chain: &str) -> Option<&str> {
    scan_chain_values(std::iter::once(chain.as_bytes()))
}

/// Scan a chain split over several header lines, in header order.
///
/// Lines are raw header bytes: a token that is not UTF-8 is skipped on its
/// own without hiding the rest of its line. Later lines are treated as
/// further right in the chain.
pub fn scan_chain_values<'a, I>(values: I) -> Option<&'a str>
where
    I: DoubleEndedIterator<Item = &'a [u8]>,
{
    values
        .rev()
        .flat_map(|value| value.rsplit(|b| *b == b','))
        .filter_map(|token| std::str::from_utf8(token).ok())
        .map(str::trim)
        .find(|token| parse_candidate(token).is_some_and(|ip| !is_local(ip)))
}
