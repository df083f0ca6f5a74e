//! Input enumeration: scanned form images in a source directory.
//!
//! Identifiers are file names, so the same file keeps the same identifier
//! across runs. Listing is sorted byte-wise by file name.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StartupError;

/// Extensions (lowercase) accepted as form images.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// A listed input; content is read by the task that processes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub id: String,
    pub path: PathBuf,
}

/// Document content, alive for one task.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// MIME type for an allowed extension.
pub fn media_type(path: &Path) -> &'static str {
    match extension_of(path).as_deref() {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

impl DocumentRef {
    pub fn load(&self) -> io::Result<Document> {
        Ok(Document {
            id: self.id.clone(),
            media_type: media_type(&self.path),
            bytes: fs::read(&self.path)?,
        })
    }
}

/// List form images in `dir`, filtered by [`ALLOWED_EXTENSIONS`] and sorted by file name.
///
/// Fails if the directory is missing or unreadable. Non-UTF-8 file names are
/// skipped with a warning since they cannot be stored in the progress file.
pub fn list(dir: &Path) -> Result<Vec<DocumentRef>, StartupError> {
    let read_err = |source| StartupError::InputDir {
        path: dir.to_path_buf(),
        source,
    };
    let entries = fs::read_dir(dir).map_err(read_err)?;

    let mut docs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        let allowed = extension_of(&path)
            .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        if !allowed {
            continue;
        }
        // Follows symlinks; skips directories named like images.
        if !fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false) {
            continue;
        }
        let Some(id) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::warn!(path = %path.display(), "skipping input with non-UTF-8 file name");
            continue;
        };
        docs.push(DocumentRef { id, path });
    }

    docs.sort_by(|a, b| a.id.as_bytes().cmp(b.id.as_bytes()));
    tracing::debug!(dir = %dir.display(), count = docs.len(), "listed input documents");
    Ok(docs)
}
