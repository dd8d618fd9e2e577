//! Key-addressable document store port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

/// Minimal persistence contract: opaque documents addressed by key.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the document stored under `key`, or `None`.
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<Vec<u8>>>;

    /// Stores `document` under `key`, replacing any previous value.
    async fn put(&self, key: &str, document: &[u8]) -> DocumentStoreResult<()>;

    /// Removes the document under `key`.
    ///
    /// Returns `false` when nothing was stored under the key.
    async fn delete(&self, key: &str) -> DocumentStoreResult<bool>;
}

/// Errors returned by document store implementations.
#[derive(Debug, Clone, Error)]
pub enum DocumentStoreError {
    /// The key cannot be used by this store.
    #[error("invalid document key: {0}")]
    InvalidKey(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DocumentStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
