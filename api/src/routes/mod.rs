//! API route definitions.
//!
//! This module organizes all HTTP routes for the Faultline API server.

mod ingest;

pub use ingest::{ingest_routes, IngestError, INGEST_OK_MESSAGE};
