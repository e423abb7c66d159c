use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::utils::error::AppError;

/// URLs of listings that have already triggered a notification.
///
/// Only ever grows. Serialized as a JSON array of strings; order carries no meaning
/// but is kept sorted so the file diffs cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotifiedSet(BTreeSet<String>);

impl NotifiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.0.contains(url)
    }

    /// Returns false if the URL was already present.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.0.insert(url.into())
    }

    /// Union `other` into this set.
    pub fn merge(&mut self, other: NotifiedSet) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for NotifiedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// JSON file holding the notified set between runs.
#[derive(Debug, Clone)]
pub struct DedupStore {
    path: PathBuf,
}

impl DedupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted set. Never fails: a missing file is an empty set, and an
    /// unreadable or corrupt one is logged and treated as empty.
    pub async fn load(&self) -> NotifiedSet {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No notified items file yet, starting empty");
                return NotifiedSet::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read notified items file. Starting with an empty set.");
                return NotifiedSet::new();
            }
        };

        match serde_json::from_str::<NotifiedSet>(&contents) {
            Ok(set) => {
                debug!(path = %self.path.display(), count = set.len(), "Loaded notified items");
                set
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not decode JSON from notified items file. Starting with an empty set.");
                NotifiedSet::new()
            }
        }
    }

    /// Overwrite the persisted set with `set`.
    ///
    /// Written to a sibling temp file and renamed into place, so a crash mid-write
    /// leaves the previous file intact.
    pub async fn save(&self, set: &NotifiedSet) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string(set)?;

        // Write atomically via temp file
        let temp_path = self.temp_path();
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(path = %self.path.display(), count = set.len(), "Saved notified items");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
