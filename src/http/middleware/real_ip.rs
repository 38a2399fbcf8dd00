//! Client IP middleware.
//!
//! Rewrites the request's [`RemoteAddr`] with the resolved client address
//! before any handler runs. Handlers read `RemoteAddr` exactly as they would
//! the transport peer address.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::task::{Context, Poll};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, Extensions, Request, StatusCode},
};
use tower::{Layer, Service};

use crate::observability::metrics;
use crate::realip::resolve;

/// The peer address the rest of the pipeline observes.
///
/// Seeded from `ConnectInfo<SocketAddr>` and overwritten by [`RealIpLayer`]
/// with a bare address (no port, no brackets).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddr(pub String);

impl RemoteAddr {
    /// The address as text, exactly as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse as an IP address. `None` if the transport address was not an IP.
    pub fn ip(&self) -> Option<IpAddr> {
        self.0.parse().ok()
    }

    /// Current peer address of a request, before or after resolution.
    pub fn from_extensions(extensions: &Extensions) -> Option<Self> {
        extensions.get::<RemoteAddr>().cloned().or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| RemoteAddr(addr.to_string()))
        })
    }
}

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for RemoteAddr
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_extensions(&parts.extensions).ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Remote address unavailable",
        ))
    }
}

/// Replace the request's peer address with the resolved client address.
///
/// Requests without any peer address are left untouched.
pub fn apply_real_ip<B>(request: &mut Request<B>) {
    let Some(peer) = RemoteAddr::from_extensions(request.extensions()) else {
        tracing::warn!("No peer address on request, skipping client IP resolution");
        return;
    };

    let resolution = resolve(peer.as_str(), request.headers());
    let resolved = RemoteAddr(resolution.ip.to_owned());
    let source = resolution.source;

    tracing::debug!(
        peer = %peer,
        remote_addr = %resolved,
        source = %source,
        "Resolved client address"
    );
    metrics::record_resolution(source.label());

    request.extensions_mut().insert(resolved);
}

/// Layer that applies [`apply_real_ip`] to every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealIpLayer;

impl<S> Layer<S> for RealIpLayer {
    type Service = RealIp<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RealIp { inner }
    }
}

/// Service produced by [`RealIpLayer`].
#[derive(Debug, Clone)]
pub struct RealIp<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for RealIp<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        apply_real_ip(&mut request);
        self.inner.call(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    async fn echo(remote: RemoteAddr) -> String {
        remote.0
    }

    fn app() -> Router {
        Router::new().route("/", get(echo)).layer(RealIpLayer)
    }

    fn request(peer: &str, headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    }

    async fn remote_addr_for(req: Request<Body>) -> String {
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_peer_port_stripped() {
        assert_eq!(remote_addr_for(request("1.1.1.1:42", &[])).await, "1.1.1.1");
        assert_eq!(remote_addr_for(request("[::1]:42", &[])).await, "::1");
    }

    #[tokio::test]
    async fn test_headers_case_insensitive() {
        let req = request("1.1.1.1:42", &[("Cf-Connecting-Ip", "4.4.4.4")]);
        assert_eq!(remote_addr_for(req).await, "4.4.4.4");

        let req = request("1.1.1.1:42", &[("X-FORWARDED-FOR", "2.2.2.2, 127.0.0.1")]);
        assert_eq!(remote_addr_for(req).await, "2.2.2.2");
    }

    #[tokio::test]
    async fn test_local_real_ip_ignored() {
        let req = request("1.1.1.1:42", &[("X-Real-Ip", "192.168.5.5")]);
        assert_eq!(remote_addr_for(req).await, "1.1.1.1");
    }

    #[tokio::test]
    async fn test_existing_remote_addr_is_overwritten() {
        let mut req = request("9.9.9.9:1", &[("Fly-Client-Ip", "101.100.100.100")]);
        req.extensions_mut().insert(RemoteAddr("1.1.1.1".into()));
        assert_eq!(remote_addr_for(req).await, "101.100.100.100");

        // Existing RemoteAddr takes priority over ConnectInfo as the peer.
        let mut req = request("9.9.9.9:1", &[]);
        req.extensions_mut().insert(RemoteAddr("1.1.1.1".into()));
        assert_eq!(remote_addr_for(req).await, "1.1.1.1");
    }

    #[tokio::test]
    async fn test_applying_twice_is_stable() {
        let mut req = request("1.1.1.1:42", &[("X-Forwarded-For", "2.2.2.2, 10.0.0.1")]);
        apply_real_ip(&mut req);
        let first = req.extensions().get::<RemoteAddr>().cloned().unwrap();
        apply_real_ip(&mut req);
        assert_eq!(req.extensions().get::<RemoteAddr>(), Some(&first));
        assert_eq!(first.ip(), Some("2.2.2.2".parse().unwrap()));
    }

    #[test]
    fn test_no_peer_is_left_alone() {
        let mut req = Request::builder()
            .header("X-Real-Ip", "8.8.8.8")
            .body(Body::empty())
            .unwrap();
        apply_real_ip(&mut req);
        assert!(req.extensions().get::<RemoteAddr>().is_none());
    }
}
