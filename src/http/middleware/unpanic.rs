//! Panic recovery.
//!
//! Converts a handler panic into a [`PanicError`] annotated with the request
//! line and a filtered backtrace, then renders it through
//! [`error_page`](crate::http::response::error_page).
//!
//! The backtrace is captured by a process-wide panic hook at the panic site
//! and picked up on the same thread once the unwind reaches
//! `catch_unwind`.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Once};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;
use thiserror::Error;

use crate::config::RecoveryConfig;
use crate::http::response::error_page;
use crate::observability::metrics;

/// Frame prefixes always dropped from recovered backtraces.
const FRAMEWORK_FRAMES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "tokio::",
    "hyper::",
    "hyper_util::",
    "axum::",
    "axum_core::",
    "tower::",
    "tower_http::",
    "tower_service::",
    "futures_util::",
    "futures_core::",
    "realip::http::middleware::unpanic",
    "rust_begin_unwind",
    "__rust",
];

thread_local! {
    static LAST_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// A handler panic, annotated with the request it happened in.
#[derive(Debug, Error)]
#[error("panic at {method} {host}{uri}: {message}\n\nHeaders: {headers:?}\n{trace}")]
pub struct PanicError {
    /// Request method.
    pub method: Method,
    /// `Host` header, or the URI authority when absent.
    pub host: String,
    /// Request URI including the query.
    pub uri: String,
    /// Panic payload as text.
    pub message: String,
    /// Request headers at the time of the panic.
    pub headers: HeaderMap,
    /// Backtrace with framework frames removed.
    pub trace: String,
}

/// State for the [`unpanic`] middleware.
#[derive(Debug, Clone)]
pub struct Recovery {
    filters: Arc<[String]>,
    expose_details: bool,
}

impl Recovery {
    /// Build middleware state from the recovery config.
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            filters: config.filter_stack.iter().cloned().collect(),
            expose_details: config.expose_details,
        }
    }
}

/// Install the backtrace-capturing panic hook. Safe to call repeatedly.
///
/// The previously installed hook still runs after the capture.
pub fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            LAST_TRACE.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

/// Middleware recovering from panics in downstream handlers.
pub async fn unpanic(State(recovery): State<Recovery>, request: Request, next: Next) -> Response {
    install_panic_hook();

    let method = request.method().clone();
    let uri = request.uri().to_string();
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| request.uri().host().map(str::to_owned))
        .unwrap_or_default();
    let headers = request.headers().clone();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let trace = LAST_TRACE
                .with(|slot| slot.borrow_mut().take())
                .map(|bt| filter_trace(&bt.to_string(), &recovery.filters))
                .unwrap_or_default();

            let err = PanicError {
                method,
                host,
                uri,
                message: panic_message(payload.as_ref()),
                headers,
                trace,
            };
            metrics::record_panic();

            error_page(
                &err.headers,
                StatusCode::INTERNAL_SERVER_ERROR,
                &err,
                recovery.expose_details,
            )
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Drop backtrace frames whose symbol starts with a framework prefix or one
/// of `extra`.
///
/// Input is the `Display` form of [`Backtrace`]: a numbered symbol line per
/// frame, followed by indented `at file:line` lines.
pub fn filter_trace(trace: &str, extra: &[String]) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut keep_frame = true;

    for line in trace.lines() {
        if let Some(symbol) = frame_symbol(line) {
            let symbol = symbol.trim_start_matches('<');
            keep_frame = !FRAMEWORK_FRAMES
                .iter()
                .copied()
                .chain(extra.iter().map(String::as_str))
                .any(|prefix| symbol.starts_with(prefix));
        }
        if keep_frame {
            kept.push(line);
        }
    }

    kept.join("\n")
}

// "  12: some::symbol" → "some::symbol"
fn frame_symbol(line: &str) -> Option<&str> {
    let (index, symbol) = line.trim_start().split_once(": ")?;
    if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
        Some(symbol)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    const TRACE: &str = "   0: std::backtrace::Backtrace::force_capture
             at /rustc/library/std/src/backtrace.rs:101:18
   1: myapp::handlers::boom
             at ./src/handlers.rs:10:5
   2: <axum::handler::HandlerService<H,T,S> as tower_service::Service>::call
             at /cargo/axum/src/handler/service.rs:1:1
   3: myapp::vendored::thing
             at ./src/vendored.rs:2:2
   4: tokio::runtime::task::harness::poll";

    async fn boom() -> &'static str {
        panic!("kaboom")
    }

    async fn fine() -> &'static str {
        "fine"
    }

    fn app(expose_details: bool) -> Router {
        let config = RecoveryConfig {
            filter_stack: Vec::new(),
            expose_details,
        };
        Router::new()
            .route("/boom", get(boom))
            .route("/fine", get(fine))
            .layer(from_fn_with_state(Recovery::new(&config), unpanic))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_filter_trace() {
        let filtered = filter_trace(TRACE, &["myapp::vendored".to_string()]);
        assert_eq!(
            filtered,
            "   1: myapp::handlers::boom\n             at ./src/handlers.rs:10:5"
        );
    }

    #[test]
    fn test_filter_trace_without_frames() {
        assert_eq!(filter_trace("disabled backtrace", &[]), "disabled backtrace");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_passthrough() {
        let req = Request::builder().uri("/fine").body(Body::empty()).unwrap();
        let res = app(false).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "fine");
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let req = Request::builder().uri("/boom").body(Body::empty()).unwrap();
        let res = app(false).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(res).await, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_panic_details_exposed() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/boom?x=1")
            .header("host", "example.com")
            .body(Body::empty())
            .unwrap();
        let app = Router::new()
            .route("/boom", axum::routing::post(boom))
            .layer(from_fn_with_state(
                Recovery::new(&RecoveryConfig {
                    filter_stack: Vec::new(),
                    expose_details: true,
                }),
                unpanic,
            ));
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(res).await;
        assert!(
            body.starts_with("panic at POST example.com/boom?x=1: kaboom"),
            "{}",
            body
        );
        assert!(body.contains(r#"Headers: {"host": "example.com"}"#), "{}", body);
    }
}
