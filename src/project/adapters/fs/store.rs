//! Document store keeping one JSON file per key in a state directory.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io;
use std::sync::Arc;

use crate::project::ports::{DocumentStore, DocumentStoreError, DocumentStoreResult};

const DOCUMENT_EXTENSION: &str = "json";

/// Stores documents as `<key>.json` files under a capability-scoped root.
///
/// Keys are restricted to ASCII alphanumerics, `-` and `_` so every key
/// maps to exactly one file directly under the root.
#[derive(Debug, Clone)]
pub struct DirectoryDocumentStore {
    root: Arc<Dir>,
}

impl DirectoryDocumentStore {
    /// Opens (creating if needed) the state directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while creating or opening the directory.
    pub fn open(path: &Utf8Path) -> io::Result<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let root = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    fn file_for(key: &str) -> DocumentStoreResult<Utf8PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(DocumentStoreError::InvalidKey(key.to_owned()));
        }
        Ok(Utf8PathBuf::from(key).with_extension(DOCUMENT_EXTENSION))
    }

    /// Runs a filesystem operation on the blocking thread pool.
    async fn run_blocking<F, T>(&self, f: F) -> DocumentStoreResult<T>
    where
        F: FnOnce(&Dir) -> DocumentStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || f(&root))
            .await
            .map_err(DocumentStoreError::persistence)?
    }
}

#[async_trait]
impl DocumentStore for DirectoryDocumentStore {
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<Vec<u8>>> {
        let file = Self::file_for(key)?;
        self.run_blocking(move |root| match root.read(&file) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(DocumentStoreError::persistence(err)),
        })
        .await
    }

    async fn put(&self, key: &str, document: &[u8]) -> DocumentStoreResult<()> {
        let file = Self::file_for(key)?;
        let staging = file.with_extension("json.tmp");
        let contents = document.to_vec();
        self.run_blocking(move |root| {
            root.write(&staging, contents)
                .map_err(DocumentStoreError::persistence)?;
            root.rename(&staging, root, &file)
                .map_err(DocumentStoreError::persistence)
        })
        .await
    }

    async fn delete(&self, key: &str) -> DocumentStoreResult<bool> {
        let file = Self::file_for(key)?;
        self.run_blocking(move |root| match root.remove_file(&file) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(DocumentStoreError::persistence(err)),
        })
        .await
    }
}
