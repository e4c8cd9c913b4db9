//! Point storage trait and in-memory implementation.
//!
//! Provides the `PointStore` trait for abstracting timeseries writes
//! and an `InMemoryPointStore` implementation for development and testing.

use crate::models::{Point, PointError};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Errors that can occur during point store operations.
#[derive(Debug, Error)]
pub enum PointStoreError {
    /// The request to the store could not be completed.
    #[error("Store request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Store rejected request with status {status}: {message}")]
    Rejected {
        /// HTTP status returned by the store.
        status: u16,
        /// Message returned by the store, if any.
        message: String,
    },

    /// The point could not be encoded.
    #[error("Invalid point: {0}")]
    InvalidPoint(#[from] PointError),

    /// The named organization does not exist.
    #[error("Organization '{0}' not found")]
    OrganizationNotFound(String),

    /// Failed to acquire lock on the store.
    #[error("Failed to acquire lock on point store")]
    LockError,

    /// Generic storage error.
    #[error("Storage error: {0}")]
    StorageError(String),
}

/// Trait for point storage implementations.
///
/// Implementations must be thread-safe (Send + Sync). A write is complete
/// once the returned future resolves; dropping the future abandons it.
#[async_trait]
pub trait PointStore: Send + Sync {
    /// Writes a single point to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn write(&self, point: Point) -> Result<(), PointStoreError>;
}

/// In-memory point store implementation.
///
/// This implementation keeps points in a `Vec` protected by a `RwLock`.
/// It is suitable for development and testing.
///
/// **Note:** Data is not persisted across restarts.
///
/// # Example
///
/// ```
/// use shared::models::Point;
/// use shared::storage::{InMemoryPointStore, PointStore};
/// use chrono::Utc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = InMemoryPointStore::new();
/// let point = Point::new("error_logs", Utc::now()).with_field("error", "boom");
///
/// store.write(point).await.unwrap();
/// assert_eq!(store.count().unwrap(), 1);
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryPointStore {
    points: Arc<RwLock<Vec<Point>>>,
}

impl InMemoryPointStore {
    /// Creates a new empty in-memory point store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            points: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Returns a copy of every point written so far, in write order.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn points(&self) -> Result<Vec<Point>, PointStoreError> {
        let points = self.points.read().map_err(|_| PointStoreError::LockError)?;
        Ok(points.clone())
    }

    /// Returns the number of points in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn count(&self) -> Result<usize, PointStoreError> {
        let points = self.points.read().map_err(|_| PointStoreError::LockError)?;
        Ok(points.len())
    }

    /// Removes every point from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn clear(&self) -> Result<(), PointStoreError> {
        let mut points = self.points.write().map_err(|_| PointStoreError::LockError)?;
        points.clear();
        Ok(())
    }
}

#[async_trait]
impl PointStore for InMemoryPointStore {
    async fn write(&self, point: Point) -> Result<(), PointStoreError> {
        // Reject points the line protocol encoder would reject.
        point.to_line_protocol()?;
        let mut points = self.points.write().map_err(|_| PointStoreError::LockError)?;
        points.push(point);
        Ok(())
    }
}
