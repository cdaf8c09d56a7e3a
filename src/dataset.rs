//! Image dataset discovery.
//!
//! Scans a single folder (not its subfolders) for image files and turns each
//! one into an [`ImageRecord`] keyed by its basename.

use std::path::Path;

use tracing::info;
use walkdir::WalkDir;

use crate::types::ImageRecord;
use crate::{LabelScanError, Result};

/// Extensions scanned when no configuration overrides them.
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg"];

/// List the image files directly inside `folder`.
///
/// Files are matched by extension, case-insensitively. The result is sorted
/// by path so that repeated scans of the same folder agree.
pub fn load_dataset<S: AsRef<str>>(folder: &Path, extensions: &[S]) -> Result<Vec<ImageRecord>> {
    if folder.as_os_str().is_empty() {
        return Err(LabelScanError::InvalidInput("invalid folder".to_string()));
    }

    info!(folder = %folder.display(), "reading folder");

    let mut images = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            LabelScanError::io(folder, source)
        })?;

        if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
            continue;
        }
        images.push(ImageRecord::from_path(entry.into_path()));
    }

    info!(folder = %folder.display(), count = images.len(), "found images");
    Ok(images)
}

fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.as_ref().eq_ignore_ascii_case(&ext))
        })
}
