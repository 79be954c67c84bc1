//! The hello handler: answers every request with a dump of itself.

use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::LimitsConfig;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics;

/// Value of the `method` label and log field for this handler.
pub const HANDLER: &str = "say_hello";

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),
}

#[derive(Debug, Clone)]
struct HelloState {
    max_body_size: usize,
}

/// Application router: every path and method goes to [`say_hello`].
#[allow(deprecated)]
pub fn router(limits: &LimitsConfig) -> Router {
    let state = HelloState {
        max_body_size: limits.max_body_size,
    };

    Router::new()
        .route("/", any(say_hello))
        .route("/{*path}", any(say_hello))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(limits.request_timeout_secs)))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
        .layer(TraceLayer::new_for_http())
}

async fn say_hello(State(state): State<HelloState>, request: Request<Body>) -> Response {
    let begin = Instant::now();
    let request_size = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let result = dump_request(request, state.max_body_size).await;
    let dt = begin.elapsed();

    metrics::record_request(HANDLER, result.is_err(), request_size, dt);
    tracing::info!(
        method = HANDLER,
        request_size,
        dt = ?dt,
        err = ?result.as_ref().err().map(ToString::to_string),
        "Request handled"
    );

    match result {
        Ok(dump) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            dump,
        )
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// Render a request as it would appear on the wire: request line, headers
/// (`Host` first), a blank line, then the body.
pub async fn dump_request(request: Request<Body>, body_limit: usize) -> Result<Bytes, DumpError> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, body_limit)
        .await
        .map_err(DumpError::Body)?;

    let mut dump = Vec::with_capacity(256 + body.len());
    dump.extend_from_slice(
        format!(
            "{} {} {:?}\r\n",
            parts.method,
            request_target(&parts.uri),
            parts.version
        )
        .as_bytes(),
    );

    let host = parts
        .headers
        .get(header::HOST)
        .map(|v| v.as_bytes())
        .or_else(|| parts.uri.authority().map(|a| a.as_str().as_bytes()));
    if let Some(host) = host {
        push_header(&mut dump, "Host", host);
    }

    for (name, value) in parts.headers.iter().filter(|(name, _)| **name != header::HOST) {
        push_header(&mut dump, &canonical_name(name.as_str()), value.as_bytes());
    }

    dump.extend_from_slice(b"\r\n");
    dump.extend_from_slice(&body);

    Ok(Bytes::from(dump))
}

fn request_target(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

fn push_header(dump: &mut Vec<u8>, name: &str, value: &[u8]) {
    dump.extend_from_slice(name.as_bytes());
    dump.extend_from_slice(b": ");
    dump.extend_from_slice(value);
    dump.extend_from_slice(b"\r\n");
}

/// `content-length` → `Content-Length`
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
