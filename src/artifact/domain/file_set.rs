//! Files recovered from worker output, prior to materialisation.

use super::ArtifactPath;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Mapping of relative path to file content produced by extraction.
///
/// Valid paths are keyed in their [`ArtifactPath`] form, so `a.py`,
/// `./a.py` and `.\a.py` claim the same entry. Invalid paths are kept as
/// written and rejected when the set is materialised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFileSet(BTreeMap<String, String>);

impl ExtractedFileSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file unless the path is already present.
    ///
    /// Returns `true` when the file was added.
    pub fn insert_if_absent(&mut self, path: impl Into<String>, content: impl Into<String>) -> bool {
        match self.0.entry(normalise(path.into())) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(content.into());
                true
            }
        }
    }

    /// Adds a file, replacing any previous content at the path.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.0.insert(normalise(path.into()), content.into());
    }

    /// Merges `other` into this set; entries already present are kept.
    pub fn absorb(&mut self, other: Self) {
        for (path, content) in other.0 {
            self.insert_if_absent(path, content);
        }
    }

    /// Merges `other` into this set; entries of `other` win on conflict.
    pub fn overlay(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Returns the content recorded for `path` or any alias of it.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(&normalise(path.to_owned())).map(String::as_str)
    }

    /// Iterates `(path, content)` pairs ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(path, content)| (path.as_str(), content.as_str()))
    }

    /// Returns the number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no file was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn normalise(path: String) -> String {
    match ArtifactPath::new(path.as_str()) {
        Ok(valid) => valid.into(),
        Err(_) => path,
    }
}

/// Collects `(path, content)` pairs; the first claim on a path wins.
impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for ExtractedFileSet {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (path, content) in iter {
            set.insert_if_absent(path, content);
        }
        set
    }
}

impl IntoIterator for ExtractedFileSet {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
