//! Error types for artifact domain validation.

use thiserror::Error;

/// Errors returned while validating artifact values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArtifactDomainError {
    /// The path is empty after normalisation.
    #[error("artifact path must not be empty")]
    EmptyPath,

    /// The path is absolute or carries a drive prefix.
    #[error("artifact path '{0}' must be relative")]
    AbsolutePath(String),

    /// The path walks out of the project directory.
    #[error("artifact path '{0}' must not contain '..' segments")]
    ParentTraversal(String),
}
