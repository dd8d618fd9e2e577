//! Domain model for generated artifacts.
//!
//! Artifacts are path-addressed, versioned pieces of generated content owned
//! by a project. Extraction produces an ephemeral [`ExtractedFileSet`];
//! materialisation turns it into files and catalogue entries.

mod artifact;
mod error;
mod file_set;
mod path;

pub use artifact::{Artifact, ArtifactCatalog, ArtifactType};
pub use error::ArtifactDomainError;
pub use file_set::ExtractedFileSet;
pub use path::ArtifactPath;
