//! Project snapshots persisted through a [`DocumentStore`].

use crate::project::{
    domain::{ProjectId, ProjectState},
    ports::{DocumentStore, DocumentStoreError},
};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while saving or loading project snapshots.
#[derive(Debug, Clone, Error)]
pub enum ProjectStoreError {
    /// The document store failed.
    #[error(transparent)]
    Store(#[from] DocumentStoreError),

    /// The snapshot could not be encoded or decoded.
    #[error("snapshot serialisation failed: {0}")]
    Serialization(Arc<serde_json::Error>),
}

impl From<serde_json::Error> for ProjectStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(Arc::new(err))
    }
}

/// Result type for project snapshot operations.
pub type ProjectStoreResult<T> = Result<T, ProjectStoreError>;

/// Saves and loads whole-project snapshots, one document per project.
#[derive(Debug)]
pub struct ProjectRepository<S>
where
    S: DocumentStore,
{
    store: Arc<S>,
}

impl<S> Clone for ProjectRepository<S>
where
    S: DocumentStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ProjectRepository<S>
where
    S: DocumentStore,
{
    /// Creates a repository over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn key(id: ProjectId) -> String {
        id.to_string()
    }

    /// Writes the snapshot of `project`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectStoreError`] when encoding or the store fails.
    pub async fn save(&self, project: &ProjectState) -> ProjectStoreResult<()> {
        let document = serde_json::to_vec_pretty(project)?;
        self.store.put(&Self::key(project.id()), &document).await?;
        Ok(())
    }

    /// Reads the snapshot of a project.
    ///
    /// Returns `Ok(None)` when no snapshot exists. Decoding validates the
    /// task graph, so a snapshot containing a dependency cycle is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectStoreError`] when the store fails or the snapshot is
    /// malformed.
    pub async fn load(&self, id: ProjectId) -> ProjectStoreResult<Option<ProjectState>> {
        let Some(document) = self.store.get(&Self::key(id)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&document)?))
    }

    /// Deletes the snapshot of a project.
    ///
    /// Returns `false` when no snapshot existed.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectStoreError::Store`] when the store fails.
    pub async fn delete(&self, id: ProjectId) -> ProjectStoreResult<bool> {
        Ok(self.store.delete(&Self::key(id)).await?)
    }
}
