//! Writes extracted files to a project directory and versions them.

use crate::artifact::{
    domain::{ArtifactCatalog, ArtifactDomainError, ArtifactPath, ExtractedFileSet},
    ports::{FileSink, FileSinkError, FileSinkResult},
};
use crate::project::domain::{ProjectId, ProjectState};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

const FALLBACK_DIR_NAME: &str = "project";

/// Why a single extracted file was not materialised.
#[derive(Debug, Clone, Error)]
pub enum MaterializationError {
    /// The extracted path is not a safe relative path.
    #[error(transparent)]
    InvalidPath(#[from] ArtifactDomainError),
    /// The sink rejected the write.
    #[error(transparent)]
    Sink(#[from] FileSinkError),
}

/// One extracted file that was skipped.
#[derive(Debug, Clone)]
pub struct MaterializationFailure {
    /// Path as extracted from the worker output.
    pub path: String,
    /// Reason the file was skipped.
    pub error: MaterializationError,
}

/// Outcome of materialising one file set.
#[derive(Debug, Clone, Default)]
pub struct MaterializationReport {
    /// Directory name the files were written under.
    pub project_dir: String,
    /// Paths written, in write order.
    pub written_paths: Vec<ArtifactPath>,
    /// Entries that were skipped.
    pub failures: Vec<MaterializationFailure>,
}

impl MaterializationReport {
    /// Returns `true` when at least one file was written.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.written_paths.is_empty()
    }
}

/// Returns the filesystem-safe directory name for a project.
///
/// The name is lower-cased, characters other than alphanumerics, `_`,
/// whitespace and `-` are dropped, and runs of whitespace and hyphens become
/// a single `_`. Separators at either end are dropped, so `" My App "`
/// yields `my_app`. The first eight hex characters of the project id are
/// appended so same-named projects do not collide.
#[must_use]
pub fn project_dir_name(project_id: ProjectId, project_name: &str) -> String {
    let mut safe = String::with_capacity(project_name.len());
    let mut separator_pending = false;

    for ch in project_name.trim().to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' {
            separator_pending = true;
        } else if ch.is_alphanumeric() || ch == '_' {
            if separator_pending && !safe.is_empty() {
                safe.push('_');
            }
            separator_pending = false;
            safe.push(ch);
        }
    }

    if safe.is_empty() {
        FALLBACK_DIR_NAME.clone_into(&mut safe);
    }
    format!("{safe}_{}", project_id.short())
}

/// Writes extracted files through a [`FileSink`] and upserts their
/// artifact records.
#[derive(Clone)]
pub struct Materializer {
    sink: Arc<dyn FileSink>,
}

impl Materializer {
    /// Creates a materializer writing through `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn FileSink>) -> Self {
        Self { sink }
    }

    /// Writes every file in `files` and records it in `catalog`.
    ///
    /// Writes are not transactional: an entry that fails is logged and
    /// skipped, and entries written before it stay written. The sink is
    /// called on the current thread; async callers should use
    /// [`Materializer::materialize_project`].
    pub fn materialize(
        &self,
        project_id: ProjectId,
        project_name: &str,
        files: &ExtractedFileSet,
        catalog: &mut ArtifactCatalog,
        clock: &impl Clock,
    ) -> MaterializationReport {
        let project_dir = project_dir_name(project_id, project_name);
        let outcomes = self.write_all(&project_dir, files);
        record(project_id, project_dir, files, outcomes, catalog, clock)
    }

    /// Materialises `files` into the directory and catalogue of `project`.
    ///
    /// File writes run on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns [`FileSinkError::Unavailable`] when the write task does not
    /// run to completion.
    pub async fn materialize_project(
        &self,
        project: &mut ProjectState,
        files: ExtractedFileSet,
        clock: &impl Clock,
    ) -> FileSinkResult<MaterializationReport> {
        let project_id = project.id();
        let project_dir = project_dir_name(project_id, project.name());
        let writer = self.clone();
        let target = project_dir.clone();
        let (files, outcomes) = run_blocking(move || {
            let outcomes = writer.write_all(&target, &files);
            (files, outcomes)
        })
        .await?;
        Ok(record(
            project_id,
            project_dir,
            &files,
            outcomes,
            project.artifacts_mut(),
            clock,
        ))
    }

    /// Removes the directory of a project on the blocking thread pool.
    ///
    /// Returns `false` when nothing had been materialised.
    ///
    /// # Errors
    ///
    /// Returns [`FileSinkError`] when the sink cannot remove the directory.
    pub async fn remove_project_dir(
        &self,
        project_id: ProjectId,
        project_name: &str,
    ) -> FileSinkResult<bool> {
        let sink = Arc::clone(&self.sink);
        let project_dir = project_dir_name(project_id, project_name);
        run_blocking(move || sink.remove_dir(&project_dir)).await?
    }

    fn write_all(
        &self,
        project_dir: &str,
        files: &ExtractedFileSet,
    ) -> Vec<Result<ArtifactPath, MaterializationError>> {
        files
            .iter()
            .map(|(raw_path, content)| self.write_one(project_dir, raw_path, content))
            .collect()
    }

    fn write_one(
        &self,
        project_dir: &str,
        raw_path: &str,
        content: &str,
    ) -> Result<ArtifactPath, MaterializationError> {
        let path = ArtifactPath::new(raw_path)?;
        self.sink.write(project_dir, &path, content)?;
        Ok(path)
    }
}

/// Upserts written entries into `catalog` and reports the skipped ones.
///
/// `outcomes` holds one result per entry of `files`, in iteration order.
fn record(
    project_id: ProjectId,
    project_dir: String,
    files: &ExtractedFileSet,
    outcomes: Vec<Result<ArtifactPath, MaterializationError>>,
    catalog: &mut ArtifactCatalog,
    clock: &impl Clock,
) -> MaterializationReport {
    let mut report = MaterializationReport {
        project_dir,
        ..MaterializationReport::default()
    };

    for ((raw_path, content), outcome) in files.iter().zip(outcomes) {
        match outcome {
            Ok(path) => {
                let artifact = catalog.upsert(path.clone(), content, clock);
                tracing::debug!(
                    project_id = %project_id,
                    path = %path,
                    version = artifact.version(),
                    "materialised artifact"
                );
                report.written_paths.push(path);
            }
            Err(error) => {
                tracing::warn!(
                    project_id = %project_id,
                    path = raw_path,
                    error = %error,
                    "skipping artifact"
                );
                report.failures.push(MaterializationFailure {
                    path: raw_path.to_owned(),
                    error,
                });
            }
        }
    }

    tracing::info!(
        project_id = %project_id,
        project_dir = %report.project_dir,
        written = report.written_paths.len(),
        skipped = report.failures.len(),
        "materialisation finished"
    );
    report
}

async fn run_blocking<F, T>(f: F) -> FileSinkResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| FileSinkError::Unavailable(format!("blocking write task failed: {err}")))
}

impl std::fmt::Debug for Materializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Materializer").finish_non_exhaustive()
    }
}
