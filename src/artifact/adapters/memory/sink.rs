//! In-memory file sink for materialisation tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use crate::artifact::{
    domain::ArtifactPath,
    ports::{FileSink, FileSinkError, FileSinkResult},
};

/// Thread-safe in-memory file sink.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileSink {
    state: Arc<RwLock<InMemorySinkState>>,
}

#[derive(Debug, Default)]
struct InMemorySinkState {
    files: BTreeMap<(String, String), String>,
    failing_paths: BTreeSet<String>,
}

impl InMemoryFileSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later write to `path` fail, in any project directory.
    #[must_use]
    pub fn failing_on(self, path: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.failing_paths.insert(path.into());
        }
        self
    }

    /// Returns the content written to `path` inside `project_dir`.
    #[must_use]
    pub fn read(&self, project_dir: &str, path: &str) -> Option<String> {
        let state = self.state.read().ok()?;
        state
            .files
            .get(&(project_dir.to_owned(), path.to_owned()))
            .cloned()
    }

    /// Returns the paths written inside `project_dir`, sorted.
    #[must_use]
    pub fn paths(&self, project_dir: &str) -> Vec<String> {
        self.state.read().map_or_else(
            |_| Vec::new(),
            |state| {
                state
                    .files
                    .keys()
                    .filter(|(dir, _)| dir == project_dir)
                    .map(|(_, path)| path.clone())
                    .collect()
            },
        )
    }
}

impl FileSink for InMemoryFileSink {
    fn write(&self, project_dir: &str, path: &ArtifactPath, content: &str) -> FileSinkResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| FileSinkError::Unavailable(err.to_string()))?;
        if state.failing_paths.contains(path.as_str()) {
            return Err(FileSinkError::write(
                format!("{project_dir}/{path}"),
                std::io::Error::other("injected write failure"),
            ));
        }
        state.files.insert(
            (project_dir.to_owned(), path.as_str().to_owned()),
            content.to_owned(),
        );
        Ok(())
    }

    fn remove_dir(&self, project_dir: &str) -> FileSinkResult<bool> {
        let mut state = self
            .state
            .write()
            .map_err(|err| FileSinkError::Unavailable(err.to_string()))?;
        let before = state.files.len();
        state.files.retain(|(dir, _), _| dir != project_dir);
        Ok(state.files.len() != before)
    }
}
