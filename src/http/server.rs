//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the echo and health handlers
//! - Wire up middleware (request ID, timeout, client IP, tracing, recovery)
//! - Serve on a listener until the shutdown signal fires

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware::from_fn_with_state,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Span;

use crate::config::ServiceConfig;
use crate::http::middleware::real_ip::{RealIpLayer, RemoteAddr};
use crate::http::middleware::unpanic::{unpanic, Recovery};
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};

/// Body returned by the echo handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoAmI {
    /// Resolved client address.
    pub remote_addr: String,
}

/// HTTP server hosting the client IP middleware chain.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Self {
        let router = Self::build_router(&config);
        Self { router, config }
    }

    fn build_router(config: &ServiceConfig) -> Router {
        let routes = Router::new()
            .route("/healthz", get(healthz))
            .route("/", any(whoami))
            .route("/{*path}", any(whoami));
        apply_layers(routes, config)
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Wrap `router` in the service middleware chain.
///
/// Outermost first: request ID, timeout, client IP resolution, trace span,
/// panic recovery. Handlers and the trace span both see the resolved
/// [`RemoteAddr`].
#[allow(deprecated)]
pub fn apply_layers(router: Router, config: &ServiceConfig) -> Router {
    router
        .layer(from_fn_with_state(Recovery::new(&config.recovery), unpanic))
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(RealIpLayer)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.timeouts.request_secs,
        )))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}

fn make_span(request: &Request<Body>) -> Span {
    let remote_addr = request
        .extensions()
        .get::<RemoteAddr>()
        .map(|addr| addr.0.clone())
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id(request),
        remote_addr = %remote_addr,
    )
}

async fn whoami(remote: RemoteAddr) -> Json<WhoAmI> {
    Json(WhoAmI {
        remote_addr: remote.0,
    })
}

async fn healthz() -> &'static str {
    "ok"
}
