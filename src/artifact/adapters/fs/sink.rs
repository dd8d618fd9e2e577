//! File sink backed by a capability-scoped output directory.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io;

use crate::artifact::{
    domain::ArtifactPath,
    ports::{FileSink, FileSinkError, FileSinkResult},
};

/// Writes project files below a single root directory.
///
/// All access goes through a [`Dir`] handle, so artifact paths cannot reach
/// outside the root even through symlinks.
#[derive(Debug)]
pub struct CapStdFileSink {
    root: Dir,
}

impl CapStdFileSink {
    /// Opens (creating if needed) the output root at `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while creating or opening the directory.
    pub fn open(path: &Utf8Path) -> io::Result<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let root = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self { root })
    }

    /// Wraps an already opened directory.
    #[must_use]
    pub const fn from_dir(root: Dir) -> Self {
        Self { root }
    }

    /// Returns `true` when `path` relative to the root exists.
    #[must_use]
    pub fn exists(&self, path: &Utf8Path) -> bool {
        self.root.exists(path)
    }

    /// Reads a file relative to the root.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while reading.
    pub fn read_to_string(&self, path: &Utf8Path) -> io::Result<String> {
        self.root.read_to_string(path)
    }
}

impl FileSink for CapStdFileSink {
    fn write(&self, project_dir: &str, path: &ArtifactPath, content: &str) -> FileSinkResult<()> {
        let target = Utf8PathBuf::from(project_dir).join(path.as_str());
        if let Some(parent) = target.parent() {
            self.root
                .create_dir_all(parent)
                .map_err(|err| FileSinkError::write(target.as_str(), err))?;
        }
        self.root
            .write(&target, content)
            .map_err(|err| FileSinkError::write(target.as_str(), err))
    }

    fn remove_dir(&self, project_dir: &str) -> FileSinkResult<bool> {
        match self.root.remove_dir_all(project_dir) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(FileSinkError::remove(project_dir, err)),
        }
    }
}
