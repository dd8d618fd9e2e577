//! Validated relative artifact paths.

use super::ArtifactDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative, `/`-separated path of an artifact inside its project
/// directory.
///
/// Backslashes are read as separators, and empty and `.` segments are
/// dropped, so `./src//app.py` and `src\app.py` both normalise to
/// `src/app.py`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactPath(String);

impl ArtifactPath {
    /// Creates a validated artifact path.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactDomainError`] when the path is empty, absolute, or
    /// contains a `..` segment.
    pub fn new(value: impl Into<String>) -> Result<Self, ArtifactDomainError> {
        let raw = value.into();
        let unified = raw.trim().replace('\\', "/");

        if unified.starts_with('/') || has_drive_prefix(&unified) {
            return Err(ArtifactDomainError::AbsolutePath(raw));
        }

        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(ArtifactDomainError::ParentTraversal(raw)),
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(ArtifactDomainError::EmptyPath);
        }
        Ok(Self(segments.join("/")))
    }

    /// Returns the path as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the final path segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the lower-cased extension of the final segment, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, extension) = name.rsplit_once('.')?;
        if stem.is_empty() || extension.is_empty() {
            return None;
        }
        Some(extension.to_ascii_lowercase())
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}

impl TryFrom<String> for ArtifactPath {
    type Error = ArtifactDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ArtifactPath {
    type Error = ArtifactDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArtifactPath> for String {
    fn from(value: ArtifactPath) -> Self {
        value.0
    }
}

impl AsRef<str> for ArtifactPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
