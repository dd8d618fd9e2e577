//! Application services for artifact extraction and materialisation.

mod extractor;
mod materializer;

pub use extractor::{ArtifactExtractor, OUTPUT_KEYS};
pub use materializer::{
    MaterializationError, MaterializationFailure, MaterializationReport, Materializer,
    project_dir_name,
};
