//! Header precedence table.
//!
//! The order is fixed and not configurable. The first source that yields an
//! accepted address wins; the transport peer address is the implicit last
//! entry.

use axum::http::HeaderName;

/// Cloudflare's connecting-IP header.
pub const CF_CONNECTING_IP: HeaderName = HeaderName::from_static("cf-connecting-ip");
/// Set by nginx-style reverse proxies.
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
/// Set by the Fly.io edge.
pub const FLY_CLIENT_IP: HeaderName = HeaderName::from_static("fly-client-ip");
/// Standard forwarding chain.
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// How much a header's value is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustPolicy {
    /// Accept the value as-is, without parsing or classification.
    Verbatim,
    /// Accept only a single IP literal that classifies as public.
    PublicOnly,
    /// Comma-separated chain; take the right-most public entry.
    Chain,
}

/// One row of the precedence table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSource {
    /// Header to read (matched case-insensitively).
    pub name: HeaderName,

    /// How the header's value is accepted or rejected.
    pub policy: TrustPolicy,
}

/// Header sources, highest priority first.
pub static PRECEDENCE: [HeaderSource; 4] = [
    HeaderSource {
        name: CF_CONNECTING_IP,
        policy: TrustPolicy::Verbatim,
    },
    HeaderSource {
        name: X_REAL_IP,
        policy: TrustPolicy::PublicOnly,
    },
    HeaderSource {
        name: FLY_CLIENT_IP,
        policy: TrustPolicy::PublicOnly,
    },
    HeaderSource {
        name: X_FORWARDED_FOR,
        policy: TrustPolicy::Chain,
    },
];
