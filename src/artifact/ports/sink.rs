//! Port for writing materialised files to durable storage.

use crate::artifact::domain::ArtifactPath;
use std::sync::Arc;
use thiserror::Error;

/// Result type for file sink operations.
pub type FileSinkResult<T> = Result<T, FileSinkError>;

/// Destination for materialised project files.
///
/// `project_dir` is a single sanitised directory name; implementations
/// resolve it against their own root and must not let `path` escape it.
pub trait FileSink: Send + Sync {
    /// Writes `content` verbatim to `path` inside `project_dir`, creating
    /// intermediate directories and replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`FileSinkError`] when the file cannot be written.
    fn write(&self, project_dir: &str, path: &ArtifactPath, content: &str) -> FileSinkResult<()>;

    /// Removes `project_dir` and everything below it.
    ///
    /// Returns `false` when the directory did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`FileSinkError`] when the directory cannot be removed.
    fn remove_dir(&self, project_dir: &str) -> FileSinkResult<bool>;
}

/// Errors returned by file sink implementations.
#[derive(Debug, Clone, Error)]
pub enum FileSinkError {
    /// Writing one file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Path relative to the sink root.
        path: String,
        /// Underlying I/O failure.
        source: Arc<std::io::Error>,
    },

    /// Removing a project directory failed.
    #[error("failed to remove {path}: {source}")]
    Remove {
        /// Directory relative to the sink root.
        path: String,
        /// Underlying I/O failure.
        source: Arc<std::io::Error>,
    },

    /// The sink cannot be used at all.
    #[error("file sink unavailable: {0}")]
    Unavailable(String),
}

impl FileSinkError {
    /// Wraps a write failure.
    pub fn write(path: impl Into<String>, err: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source: Arc::new(err),
        }
    }

    /// Wraps a removal failure.
    pub fn remove(path: impl Into<String>, err: std::io::Error) -> Self {
        Self::Remove {
            path: path.into(),
            source: Arc::new(err),
        }
    }
}
