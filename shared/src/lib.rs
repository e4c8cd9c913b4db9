//! Faultline Shared Library
//!
//! This crate contains the types and store clients shared by the Faultline
//! ingestion server and CLI.
//!
//! # Modules
//!
//! - [`models`] - Error reports and timeseries points
//! - [`storage`] - Point store trait, in-memory store and InfluxDB client
//!
//! # Example
//!
//! ```
//! use shared::models::ErrorReport;
//! use chrono::Utc;
//!
//! let report = ErrorReport::new("checkout", "/v1/pay", "card declined")
//!     .with_traceback("at pay.rs:10");
//!
//! assert!(report.validate_report().is_ok());
//!
//! let point = report.into_point(Utc::now());
//! assert_eq!(point.measurement, "error_logs");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod models;
pub mod storage;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
