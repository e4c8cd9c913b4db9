//! Storage traits and implementations.
//!
//! This module provides the abstraction for writing timeseries points.
//! The `PointStore` trait defines the write capability, allowing different
//! implementations (in-memory, InfluxDB-backed).

pub mod influx;
pub mod point_store;

pub use influx::{InfluxClient, InfluxPointStore, Organization};
pub use point_store::{InMemoryPointStore, PointStore, PointStoreError};
