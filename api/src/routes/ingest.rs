//! Error report ingestion endpoint.
//!
//! `POST /` accepts one JSON error report, validates it, and writes it as a
//! single `error_logs` point to the configured store.
//!
//! Validation runs in a fixed order and stops at the first failure:
//! Content-Type, body read, JSON decode, required fields.

use crate::context::RequestContext;
use crate::state::AppState;
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use shared::models::{ErrorReport, ReportValidationError};
use shared::storage::PointStoreError;
use thiserror::Error;

/// Media type the endpoint accepts.
const CONTENT_TYPE_JSON: &str = "application/json";

/// Body returned on a successful write.
pub const INGEST_OK_MESSAGE: &str = "Error logged";

/// Errors that end an ingestion request.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The request did not declare a JSON body.
    #[error("Invalid Content-Type. Expected application/json, got {0:?}")]
    UnsupportedMediaType(Option<String>),

    /// The body could not be read.
    #[error("Error reading request body: {0}")]
    UnreadableBody(#[source] axum::Error),

    /// The body is not a JSON error report.
    #[error("Error unmarshalling JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A required report field is missing or empty.
    #[error("Missing required fields in the JSON payload: {0}")]
    MissingRequiredFields(#[from] ReportValidationError),

    /// The store did not accept the point.
    #[error("Error writing point to store: {0}")]
    Store(#[from] PointStoreError),
}

impl IngestError {
    /// Returns the HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::UnreadableBody(_) | Self::InvalidJson(_) | Self::MissingRequiredFields(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message sent to the caller. Never includes error details.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::UnsupportedMediaType(_) => "Content-Type must be application/json",
            Self::UnreadableBody(_) => "Error reading request body",
            Self::InvalidJson(_) => "Error unmarshalling JSON",
            Self::MissingRequiredFields(_) => "Missing required fields in the JSON payload",
            Self::Store(_) => "Error writing point to store",
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.public_message())).into_response()
    }
}

/// Creates the ingestion routes with application state.
pub fn ingest_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(ingest_report))
        .with_state(state)
}

/// Checks that the Content-Type media type is `application/json`.
///
/// Parameters such as `charset` are allowed; the comparison ignores case.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(CONTENT_TYPE_JSON))
}

/// Handler for error report ingestion.
///
/// Returns 200 once the point is written, 415 for a non-JSON Content-Type,
/// 400 for an unreadable, malformed or incomplete report, and 500 when the
/// store write fails.
async fn ingest_report(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<&'static str>), IngestError> {
    ingest(&state, &ctx, &headers, body).await.map_err(|e| {
        match &e {
            IngestError::Store(_) => ctx.error("Error writing point to store", &e),
            IngestError::MissingRequiredFields(err) => tracing::warn!(
                request_id = %ctx.request_id(),
                field = err.field(),
                "{e}"
            ),
            _ => ctx.warn(&e.to_string()),
        }
        e
    })?;

    Ok((StatusCode::OK, Json(INGEST_OK_MESSAGE)))
}

async fn ingest(
    state: &AppState,
    ctx: &RequestContext,
    headers: &HeaderMap,
    body: Body,
) -> Result<(), IngestError> {
    if !is_json(headers) {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        return Err(IngestError::UnsupportedMediaType(content_type));
    }

    let bytes = to_bytes(body, state.max_body_bytes())
        .await
        .map_err(IngestError::UnreadableBody)?;
    let report: ErrorReport = serde_json::from_slice(&bytes)?;
    report.validate_report()?;

    let point = report.into_point(chrono::Utc::now());
    ctx.info("Attempting ingestion to store");
    state.store().write(point).await?;
    ctx.info("Error report stored");

    Ok(())
}
