//! Precedence dispatch.

use std::fmt;

use axum::http::HeaderMap;

use super::addr::{parse_candidate, strip_port};
use super::chain::scan_chain_values;
use super::classify::is_local;
use super::precedence::{HeaderSource, TrustPolicy, PRECEDENCE};

/// Where the resolved address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// A row of the precedence table.
    Header(&'static HeaderSource),
    /// The transport peer address.
    Peer,
}

impl Source {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Source::Header(source) => source.name.as_str(),
            Source::Peer => "peer",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of resolving one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Bare address, no port, no brackets.
    pub ip: &'a str,

    /// Which source produced `ip`.
    pub source: Source,
}

/// Resolve the client address for a request.
///
/// Never fails: when no header yields an accepted address the peer address
/// is returned with its port stripped.
pub fn resolve<'a>(peer: &'a str, headers: &'a HeaderMap) -> Resolution<'a> {
    PRECEDENCE
        .iter()
        .find_map(|source| {
            try_source(source, headers).map(|ip| Resolution {
                ip,
                source: Source::Header(source),
            })
        })
        .unwrap_or_else(|| Resolution {
            ip: strip_port(peer),
            source: Source::Peer,
        })
}

fn try_source<'a>(source: &HeaderSource, headers: &'a HeaderMap) -> Option<&'a str> {
    match source.policy {
        TrustPolicy::Verbatim => single_value(headers, source),
        TrustPolicy::PublicOnly => single_value(headers, source)
            .filter(|value| parse_candidate(value).is_some_and(|ip| !is_local(ip))),
        TrustPolicy::Chain => scan_chain_values(
            headers
                .get_all(&source.name)
                .iter()
                .map(|value| value.as_bytes()),
        ),
    }
}

fn single_value<'a>(headers: &'a HeaderMap, source: &HeaderSource) -> Option<&'a str> {
    headers
        .get(&source.name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
