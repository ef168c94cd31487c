use crate::core::context::{scope_trace_id, RequestContext};
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Duration;
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// HTTP header name for trace ID
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

/// Middleware that opens the scope of one request.
///
/// Each request gets:
/// - a UUID v4 trace id, stored in the request extensions, echoed in the
///   `X-Trace-Id` response header and attached to error bodies
/// - an `http_request` span that every log line of the request is recorded under
/// - a [`RequestContext`] with a deadline `timeout` from now, cancelled as soon
///   as this middleware's future completes or is dropped
pub async fn request_scope(
    State(timeout): State<Duration>,
    mut request: Request,
    next: Next,
) -> Response {
    let trace_id = Uuid::new_v4().to_string();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    tracing::info!(parent: &span, "Request started");

    let ctx = RequestContext::with_timeout(timeout);
    let _cancel_on_exit = ctx.cancel_on_drop();
    request.extensions_mut().insert(ctx);
    request.extensions_mut().insert(TraceId(trace_id.clone()));

    let response = scope_trace_id(trace_id.clone(), async move {
        let response = next.run(request).await;
        tracing::info!(status = %response.status(), "Request completed");
        response
    })
    .instrument(span)
    .await;

    let (mut parts, body) = response.into_parts();
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        parts.headers.insert(TRACE_ID_HEADER, value);
    }
    Response::from_parts(parts, body)
}

/// Extension type for storing trace ID in request extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceId(pub String);
