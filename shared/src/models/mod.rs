//! Data models for the Faultline ingestion service.
//!
//! This module contains the error report wire entity and the timeseries
//! point it is stored as.

pub mod point;
pub mod report;

pub use point::{FieldValue, Point, PointError};
pub use report::{ErrorReport, ReportValidationError, ERROR_LOGS_MEASUREMENT};
