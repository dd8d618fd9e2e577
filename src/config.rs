//! Runtime configuration.
//!
//! Settings are read from an optional JSON file and then overridden by
//! `ATELIER_*` environment variables:
//!
//! - `ATELIER_OUTPUT_DIR`: root directory for materialised projects
//! - `ATELIER_STATE_DIR`: directory holding project snapshots
//! - `ATELIER_TASK_TIMEOUT_SECS`: per-task worker time limit in seconds
//! - `ATELIER_LOG`: tracing filter directive, e.g. `atelier=debug`

use crate::artifact::{adapters::fs::CapStdFileSink, services::Materializer};
use crate::project::{
    adapters::fs::DirectoryDocumentStore, domain::PipelineTemplate, ports::WorkerRegistry,
    services::Scheduler,
};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::DefaultClock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding [`AtelierConfig::output_dir`].
pub const OUTPUT_DIR_VAR: &str = "ATELIER_OUTPUT_DIR";
/// Environment variable overriding [`AtelierConfig::state_dir`].
pub const STATE_DIR_VAR: &str = "ATELIER_STATE_DIR";
/// Environment variable overriding [`AtelierConfig::task_timeout_secs`].
pub const TASK_TIMEOUT_VAR: &str = "ATELIER_TASK_TIMEOUT_SECS";
/// Environment variable overriding [`AtelierConfig::log_filter`].
pub const LOG_FILTER_VAR: &str = "ATELIER_LOG";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that was being read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: Arc<std::io::Error>,
    },

    /// The configuration file is not valid JSON for [`AtelierConfig`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File that was being parsed.
        path: Utf8PathBuf,
        /// Underlying decoding error.
        source: Arc<serde_json::Error>,
    },

    /// A configured directory could not be created or opened.
    #[error("failed to open directory {path}: {source}")]
    Directory {
        /// Directory that was being opened.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: Arc<std::io::Error>,
    },

    /// An environment override has an unusable value.
    #[error("invalid value {value:?} for {variable}")]
    InvalidOverride {
        /// Variable name.
        variable: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Settings shared by the library services and binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtelierConfig {
    /// Root directory materialised projects are written below.
    pub output_dir: Utf8PathBuf,
    /// Directory holding one JSON snapshot per project.
    pub state_dir: Utf8PathBuf,
    /// Time limit for one worker invocation, in seconds.
    pub task_timeout_secs: u64,
    /// Tracing filter directive.
    pub log_filter: String,
}

impl Default for AtelierConfig {
    fn default() -> Self {
        Self {
            output_dir: Utf8PathBuf::from("projects"),
            state_dir: Utf8PathBuf::from("state"),
            task_timeout_secs: 300,
            log_filter: "info".to_owned(),
        }
    }
}

impl AtelierConfig {
    /// Loads configuration from `path` (when given) and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or an
    /// override is invalid.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Loads configuration, resolving overrides through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or an
    /// override is invalid.
    pub fn load_with(
        path: Option<&Utf8Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let base = match path {
            Some(file) => Self::from_file(file)?,
            None => Self::default(),
        };
        base.with_overrides(lookup)
    }

    /// Reads a JSON configuration file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let read_error = |err: std::io::Error| ConfigError::Read {
            path: path.to_owned(),
            source: Arc::new(err),
        };
        let parent = match path.parent() {
            Some(dir) if !dir.as_str().is_empty() => dir,
            _ => Utf8Path::new("."),
        };
        let file_name = path.file_name().ok_or_else(|| {
            read_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "config path has no file name",
            ))
        })?;

        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
        let contents = dir.read_to_string(file_name).map_err(read_error)?;
        let config = serde_json::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: path.to_owned(),
            source: Arc::new(err),
        })?;
        tracing::debug!(path = %path, "loaded configuration file");
        Ok(config)
    }

    /// Applies `ATELIER_*` overrides resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] for an unparsable timeout.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(dir) = lookup(OUTPUT_DIR_VAR) {
            self.output_dir = Utf8PathBuf::from(dir);
        }
        if let Some(dir) = lookup(STATE_DIR_VAR) {
            self.state_dir = Utf8PathBuf::from(dir);
        }
        if let Some(raw) = lookup(TASK_TIMEOUT_VAR) {
            self.task_timeout_secs =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidOverride {
                        variable: TASK_TIMEOUT_VAR,
                        value: raw.clone(),
                    })?;
        }
        if let Some(filter) = lookup(LOG_FILTER_VAR) {
            self.log_filter = filter;
        }
        Ok(self)
    }

    /// Returns the worker time limit.
    #[must_use]
    pub const fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    /// Opens the snapshot store in [`AtelierConfig::state_dir`], creating
    /// the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Directory`] when the directory is unusable.
    pub fn open_store(&self) -> Result<DirectoryDocumentStore, ConfigError> {
        DirectoryDocumentStore::open(&self.state_dir)
            .map_err(|err| directory_error(&self.state_dir, err))
    }

    /// Opens the file sink rooted at [`AtelierConfig::output_dir`],
    /// creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Directory`] when the directory is unusable.
    pub fn open_sink(&self) -> Result<CapStdFileSink, ConfigError> {
        CapStdFileSink::open(&self.output_dir).map_err(|err| directory_error(&self.output_dir, err))
    }

    /// Builds a scheduler persisting snapshots to the state directory,
    /// materialising files below the output directory and bounding workers
    /// by [`AtelierConfig::task_timeout`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Directory`] when either directory is unusable.
    pub fn scheduler(
        &self,
        workers: Arc<WorkerRegistry>,
        template: PipelineTemplate,
    ) -> Result<Scheduler<DirectoryDocumentStore, DefaultClock>, ConfigError> {
        let store = self.open_store()?;
        let sink = self.open_sink()?;
        tracing::debug!(
            state_dir = %self.state_dir,
            output_dir = %self.output_dir,
            task_timeout_secs = self.task_timeout_secs,
            "building scheduler from configuration"
        );
        Ok(
            Scheduler::new(Arc::new(store), workers, Arc::new(DefaultClock), template)
                .with_task_timeout(self.task_timeout())
                .with_materializer(Arc::new(Materializer::new(Arc::new(sink)))),
        )
    }
}

fn directory_error(path: &Utf8Path, err: std::io::Error) -> ConfigError {
    ConfigError::Directory {
        path: path.to_owned(),
        source: Arc::new(err),
    }
}
