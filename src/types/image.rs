//! Image identity as handed to the dispatcher.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One image of the corpus.
///
/// `id` is the file basename and is expected to be unique within a batch;
/// `path` points at the raw image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub path: PathBuf,
}

impl ImageRecord {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    /// Build a record whose id is the basename of `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { id, path }
    }

    /// Whether the record carries a usable path.
    pub fn has_path(&self) -> bool {
        self.path != Path::new("")
    }
}
