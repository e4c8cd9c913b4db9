//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers.
//! Everything in here is built once during startup and read-only afterwards.

use shared::storage::{InMemoryPointStore, Organization, PointStore};
use std::sync::Arc;

const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The timeseries store error reports are written to.
    store: Arc<dyn PointStore>,
    /// Organization resolved at startup.
    organization: Organization,
    /// Largest request body the ingestion endpoint reads.
    max_body_bytes: usize,
}

impl AppState {
    /// Creates a new application state writing to `store`.
    pub fn new(store: Arc<dyn PointStore>, organization: Organization) -> Self {
        Self {
            store,
            organization,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Creates a new application state with an in-memory store.
    ///
    /// This is useful for development and testing. The returned store handle
    /// shares its points with the one inside the state.
    #[must_use]
    pub fn with_in_memory_store() -> (Self, InMemoryPointStore) {
        let store = InMemoryPointStore::new();
        let organization = Organization {
            id: "local".to_string(),
            name: "local".to_string(),
        };
        (Self::new(Arc::new(store.clone()), organization), store)
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Returns a reference to the point store.
    #[must_use]
    pub fn store(&self) -> &dyn PointStore {
        self.store.as_ref()
    }

    /// Returns the organization resolved at startup.
    #[must_use]
    pub fn organization(&self) -> &Organization {
        &self.organization
    }

    /// Returns the request body limit.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}
