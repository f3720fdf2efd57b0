use crate::core::error::REQUEST_TRACE_ID;
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// HTTP header name for trace ID
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

/// Tag each request with a trace ID
///
/// A well-formed UUID supplied by the client in `X-Trace-Id` is kept,
/// anything else is replaced by a fresh v4. The ID scopes a tracing span
/// and `REQUEST_TRACE_ID` around the request, so error bodies carry the
/// same ID that is echoed back in the response header.
pub async fn trace_id_middleware(request: Request, next: Next) -> Response {
    let trace_id = incoming_trace_id(request.headers())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %request.method(),
        uri = %request.uri(),
    );

    let response = REQUEST_TRACE_ID
        .scope(
            trace_id.clone(),
            async move {
                tracing::debug!("Request started");
                let response = next.run(request).await;
                tracing::info!(status = %response.status(), "Request completed");
                response
            }
            .instrument(span),
        )
        .await;

    let (mut parts, body) = response.into_parts();
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        parts.headers.insert(TRACE_ID_HEADER, value);
    }

    Response::from_parts(parts, body)
}

fn incoming_trace_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(TRACE_ID_HEADER)?.to_str().ok()?;
    Uuid::parse_str(value).ok().map(|id| id.to_string())
}
