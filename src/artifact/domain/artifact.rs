//! Versioned artifacts and the per-project artifact catalogue.

use super::ArtifactPath;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Broad category of an artifact, inferred from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    /// Application source code.
    Code,
    /// Test code.
    Test,
    /// Configuration files.
    Config,
    /// Deployment descriptors and pipelines.
    Deployment,
    /// Documentation.
    Docs,
}

const DEPLOYMENT_FILES: [&str; 5] = [
    "dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "procfile",
    "buildspec.yml",
];
const DEPLOYMENT_DIRS: [&str; 4] = [".github", "k8s", "deploy", "terraform"];
const CONFIG_FILES: [&str; 4] = ["requirements.txt", "makefile", "setup.cfg", "pyproject.toml"];
const CONFIG_EXTENSIONS: [&str; 8] = ["yml", "yaml", "toml", "json", "ini", "cfg", "conf", "env"];
const DOC_EXTENSIONS: [&str; 4] = ["md", "rst", "txt", "adoc"];

impl ArtifactType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Test => "test",
            Self::Config => "config",
            Self::Deployment => "deployment",
            Self::Docs => "docs",
        }
    }

    /// Infers the category of the artifact at `path`.
    #[must_use]
    pub fn infer(path: &ArtifactPath) -> Self {
        let lowered = path.as_str().to_ascii_lowercase();
        let file_name = lowered.rsplit('/').next().unwrap_or(&lowered);
        let segments: Vec<&str> = lowered.split('/').collect();
        let directories = segments.split_last().map_or(&[][..], |(_, dirs)| dirs);
        let extension = path.extension().unwrap_or_default();

        if DEPLOYMENT_FILES.contains(&file_name)
            || extension == "tf"
            || directories.iter().any(|dir| DEPLOYMENT_DIRS.contains(dir))
        {
            return Self::Deployment;
        }
        if is_test_path(file_name, directories) {
            return Self::Test;
        }
        if CONFIG_FILES.contains(&file_name)
            || CONFIG_EXTENSIONS.contains(&extension.as_str())
            || (file_name.starts_with('.') && !file_name.trim_start_matches('.').contains('.'))
        {
            return Self::Config;
        }
        if DOC_EXTENSIONS.contains(&extension.as_str()) || directories.contains(&"docs") {
            return Self::Docs;
        }
        Self::Code
    }
}

fn is_test_path(file_name: &str, directories: &[&str]) -> bool {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    directories.iter().any(|dir| matches!(*dir, "test" | "tests" | "spec" | "__tests__"))
        || stem.starts_with("test_")
        || stem.ends_with("_test")
        || file_name.contains(".test.")
        || file_name.contains(".spec.")
        || stem == "conftest"
}

/// Generated content stored for a project at a relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    path: ArtifactPath,
    #[serde(rename = "type")]
    artifact_type: ArtifactType,
    content: String,
    version: u32,
    digest: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Artifact {
    /// Creates version 1 of an artifact.
    #[must_use]
    pub fn new(path: ArtifactPath, content: impl Into<String>, clock: &impl Clock) -> Self {
        let text: String = content.into();
        let timestamp = clock.utc();
        Self {
            artifact_type: ArtifactType::infer(&path),
            digest: content_digest(&text),
            path,
            content: text,
            version: 1,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Replaces the content and bumps the version by one.
    pub fn revise(&mut self, content: impl Into<String>, clock: &impl Clock) {
        self.content = content.into();
        self.digest = content_digest(&self.content);
        self.version = self.version.saturating_add(1);
        self.updated_at = clock.utc();
    }

    /// Returns the artifact path.
    #[must_use]
    pub const fn path(&self) -> &ArtifactPath {
        &self.path
    }

    /// Returns the artifact category.
    #[must_use]
    pub const fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
    }

    /// Returns the latest content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the version, starting at 1.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the hex SHA-256 digest of the latest content.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the timestamp of the latest revision.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn content_digest(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Artifacts of one project keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactCatalog(BTreeMap<ArtifactPath, Artifact>);

impl ArtifactCatalog {
    /// Creates an empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records content at `path`: a new path starts at version 1, an
    /// existing path is revised.
    pub fn upsert(
        &mut self,
        path: ArtifactPath,
        content: impl Into<String>,
        clock: &impl Clock,
    ) -> &Artifact {
        match self.0.entry(path) {
            Entry::Occupied(entry) => {
                let artifact = entry.into_mut();
                artifact.revise(content, clock);
                artifact
            }
            Entry::Vacant(entry) => {
                let artifact = Artifact::new(entry.key().clone(), content, clock);
                entry.insert(artifact)
            }
        }
    }

    /// Returns the artifact at `path`.
    #[must_use]
    pub fn get(&self, path: &ArtifactPath) -> Option<&Artifact> {
        self.0.get(path)
    }

    /// Iterates artifacts ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.0.values()
    }

    /// Returns artifacts of one category ordered by path.
    pub fn of_type(&self, artifact_type: ArtifactType) -> impl Iterator<Item = &Artifact> {
        self.iter()
            .filter(move |artifact| artifact.artifact_type() == artifact_type)
    }

    /// Returns the number of artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no artifact has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
