//! Error page rendering.
//!
//! # Design Decisions
//! - JSON for clients that ask for it, plain text otherwise
//! - Server error details stay in the logs unless explicitly exposed

use std::error::Error;

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Render `err` as an error response.
///
/// `headers` are the request's headers; `Accept` picks JSON or plain text.
/// Server errors are logged; their text only reaches the client when
/// `expose_details` is set.
pub fn error_page(
    headers: &HeaderMap,
    status: StatusCode,
    err: &(dyn Error + 'static),
    expose_details: bool,
) -> Response {
    let detail = err.to_string();

    if status.is_server_error() {
        tracing::error!(status = %status, error = %detail, "Request failed");
    }

    let message = if status.is_server_error() && !expose_details {
        status.canonical_reason().unwrap_or("Internal Server Error")
    } else {
        detail.as_str()
    };

    if wants_json(headers.get(header::ACCEPT)) {
        (status, Json(ErrorBody { error: message })).into_response()
    } else {
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            message.to_string(),
        )
            .into_response()
    }
}

fn wants_json(accept: Option<&HeaderValue>) -> bool {
    accept
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false)
}
