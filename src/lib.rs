//! Client IP resolution for services behind proxies, CDNs and load balancers.
//!
//! The [`realip`] module holds the resolver itself: a fixed header precedence
//! table, the `X-Forwarded-For` chain scanner and the public/local address
//! classifier. [`http`] wraps it as tower/axum middleware alongside panic
//! recovery, and the remaining modules carry the service around it.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod realip;

pub use config::ServiceConfig;
pub use http::{HttpServer, RealIpLayer, RemoteAddr};
pub use lifecycle::Shutdown;
pub use realip::{resolve, Resolution, Source};
