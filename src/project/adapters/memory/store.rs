//! In-memory document store for scheduler tests and ephemeral runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::project::ports::{DocumentStore, DocumentStoreError, DocumentStoreResult};

/// Thread-safe in-memory document store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.state.read().map_or_else(
            |_| Vec::new(),
            |state| {
                let mut keys: Vec<String> = state.keys().cloned().collect();
                keys.sort();
                keys
            },
        )
    }
}

fn poisoned(err: impl std::fmt::Display) -> DocumentStoreError {
    DocumentStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<Vec<u8>>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.get(key).cloned())
    }

    async fn put(&self, key: &str, document: &[u8]) -> DocumentStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.insert(key.to_owned(), document.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> DocumentStoreResult<bool> {
        let mut state = self.state.write().map_err(poisoned)?;
        Ok(state.remove(key).is_some())
    }
}
