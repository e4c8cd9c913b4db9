//! Error report data model.
//!
//! Defines the `ErrorReport` wire entity posted by reporting services, and its
//! conversion into a timeseries [`Point`].

use crate::models::point::{FieldValue, Point};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Measurement name every error report is stored under.
pub const ERROR_LOGS_MEASUREMENT: &str = "error_logs";

/// An error report sent by a service when one of its operations fails.
///
/// Required fields that are absent from the JSON payload decode as empty
/// strings and are rejected by [`ErrorReport::validate_report`].
///
/// # Example
///
/// ```
/// use shared::models::ErrorReport;
///
/// let report: ErrorReport = serde_json::from_str(
///     r#"{"service": "api", "endpoint": "/v1/x", "error": "timeout"}"#,
/// )
/// .unwrap();
///
/// assert!(report.validate_report().is_ok());
/// assert!(report.traceback.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ErrorReport {
    /// Name of the reporting system.
    #[serde(default)]
    #[validate(length(min = 1, message = "Service cannot be empty"))]
    pub service: String,

    /// The failing operation, usually a route or RPC name.
    #[serde(default)]
    #[validate(length(min = 1, message = "Endpoint cannot be empty"))]
    pub endpoint: String,

    /// The error message.
    #[serde(default)]
    #[validate(length(min = 1, message = "Error cannot be empty"))]
    pub error: String,

    /// Optional stack trace or diagnostic detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

/// Errors that can occur during error report validation.
#[derive(Debug, Error)]
pub enum ReportValidationError {
    /// The service name is empty.
    #[error("Service cannot be empty")]
    EmptyService,

    /// The endpoint is empty.
    #[error("Endpoint cannot be empty")]
    EmptyEndpoint,

    /// The error message is empty.
    #[error("Error message cannot be empty")]
    EmptyError,

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl ReportValidationError {
    /// Returns the name of the field that failed validation.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyService => "service",
            Self::EmptyEndpoint => "endpoint",
            Self::EmptyError => "error",
            Self::ValidationError(_) => "unknown",
        }
    }
}

impl ErrorReport {
    /// Creates a new error report without a traceback.
    #[must_use]
    pub fn new(
        service: impl Into<String>,
        endpoint: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            endpoint: endpoint.into(),
            error: error.into(),
            traceback: None,
        }
    }

    /// Sets the traceback.
    #[must_use]
    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }

    /// Validates the report.
    ///
    /// # Errors
    ///
    /// Returns an error if the service, endpoint or error message is empty.
    pub fn validate_report(&self) -> Result<(), ReportValidationError> {
        if self.service.is_empty() {
            return Err(ReportValidationError::EmptyService);
        }
        if self.endpoint.is_empty() {
            return Err(ReportValidationError::EmptyEndpoint);
        }
        if self.error.is_empty() {
            return Err(ReportValidationError::EmptyError);
        }
        self.validate()?;
        Ok(())
    }

    /// Builds the timeseries point for this report.
    ///
    /// `service` and `endpoint` become tags, `error` is always a field, and
    /// `traceback` is a field only when it is present and non-empty.
    #[must_use]
    pub fn into_point(self, timestamp: DateTime<Utc>) -> Point {
        let mut point = Point::new(ERROR_LOGS_MEASUREMENT, timestamp)
            .with_tag("service", self.service)
            .with_tag("endpoint", self.endpoint)
            .with_field("error", FieldValue::String(self.error));

        if let Some(traceback) = self.traceback.filter(|t| !t.is_empty()) {
            point = point.with_field("traceback", FieldValue::String(traceback));
        }

        point
    }
}
