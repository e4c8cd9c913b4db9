//! Per-request logging context.
//!
//! Every inbound request gets a [`RequestContext`] carrying a freshly
//! generated correlation ID. Handlers log through it so each event names the
//! request it belongs to, and the ID is echoed back in the `x-request-id`
//! response header.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

/// Response header carrying the request's correlation ID.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Request-scoped logger.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
}

impl RequestContext {
    /// Creates a context with a new random correlation ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().simple().to_string(),
        }
    }

    /// Returns the correlation ID.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Logs an informational event for this request.
    pub fn info(&self, message: &str) {
        tracing::info!(request_id = %self.request_id, "{message}");
    }

    /// Logs a warning for this request.
    pub fn warn(&self, message: &str) {
        tracing::warn!(request_id = %self.request_id, "{message}");
    }

    /// Logs an error for this request, with the underlying cause.
    pub fn error(&self, message: &str, cause: &dyn std::fmt::Display) {
        tracing::error!(request_id = %self.request_id, error = %cause, "{message}");
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware attaching a [`RequestContext`] to every request.
///
/// The rest of the request runs inside a `request` span tagged with the ID.
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let ctx = RequestContext::new();
    let span = tracing::info_span!("request", request_id = %ctx.request_id());
    let header = HeaderValue::from_str(ctx.request_id()).ok();

    request.extensions_mut().insert(ctx);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}
