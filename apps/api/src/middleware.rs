//! Request middleware stack.
//!
//! ```text
//!   request
//!     │
//!     ▼
//!  ┌──────────────────────────┐
//!  │ SetRequestId (uuid v4)   │  keeps an incoming x-request-id
//!  │ PropagateRequestId       │  echoes it on the response
//!  ├──────────────────────────┤
//!  │ resolve_client_ip        │  proxy headers, then peer address
//!  ├──────────────────────────┤
//!  │ TraceLayer               │  one span per request, access log
//!  ├──────────────────────────┤
//!  │ CatchPanic               │  500 {"error": ...}
//!  ├──────────────────────────┤
//!  │ Timeout                  │  408 after HTTP_TIMEOUT
//!  └──────────────────────────┘
//!     │
//!     ▼
//!   routes
//! ```

use std::any::Any;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use axum::middleware::{self as axum_middleware, Next};
use axum::response::IntoResponse;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{error, info_span, Level, Span};
use uuid::Uuid;

use crate::error::{ApiError, MSG_INTERNAL};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const TRUE_CLIENT_IP: HeaderName = HeaderName::from_static("true-client-ip");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

// =============================================================================
// Request ID
// =============================================================================

/// Generates a UUID v4 for requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

// =============================================================================
// Client IP
// =============================================================================

/// Best-known client address, stored as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

/// Client address from proxy headers, in order of trust:
/// `True-Client-IP`, `X-Real-IP`, then the first `X-Forwarded-For` hop.
pub fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header_ip = |name: &HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip(&TRUE_CLIENT_IP)
        .or_else(|| header_ip(&X_REAL_IP))
        .or_else(|| {
            headers
                .get(&X_FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|first| first.trim().parse::<IpAddr>().ok())
        })
}

pub async fn resolve_client_ip(mut request: Request, next: Next) -> impl IntoResponse {
    let ip = forwarded_ip(request.headers()).or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    });
    request.extensions_mut().insert(ClientIp(ip));
    next.run(request).await
}

// =============================================================================
// Tracing and panics
// =============================================================================

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let client_ip = request
        .extensions()
        .get::<ClientIp>()
        .and_then(|ClientIp(ip)| *ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "-".to_string());

    info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
        client_ip = %client_ip,
    )
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    error!(panic = %detail, "Handler panicked");

    ApiError::internal(MSG_INTERNAL).into_response()
}

/// Wraps `router` in the full middleware stack.
pub fn apply(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(axum_middleware::from_fn(resolve_client_ip))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(make_span)
                    .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                request_timeout,
            )),
    )
}
