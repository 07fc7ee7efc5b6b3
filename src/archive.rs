//! Output packaging
//!
//! Multi-output operations (split, multi-page image conversion) return one
//! zip archive containing the derived files plus a `manifest.json`
//! describing them.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive packaging errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Manifest serialisation error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Manifest stored alongside the packaged files.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveManifest {
    /// Operation that produced the archive (e.g. "split").
    pub operation: String,
    pub created_at: DateTime<Utc>,
    pub files: Vec<ManifestFile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFile {
    pub name: String,
    pub size_bytes: u64,
    /// Source pages contained in this file, where applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<u32>>,
}

impl ArchiveManifest {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            created_at: Utc::now(),
            files: Vec::new(),
        }
    }

    /// Record a file that will be packaged.
    pub fn add_file(&mut self, path: &Path, pages: Option<Vec<u32>>) -> io::Result<()> {
        let size_bytes = std::fs::metadata(path)?.len();
        self.files.push(ManifestFile {
            name: file_name(path),
            size_bytes,
            pages,
        });
        Ok(())
    }
}

/// Package `files` and the manifest into a zip at `out_path`.
///
/// Entry names are the files' base names; the derived documents are
/// deflate-compressed.
pub fn pack(out_path: &Path, files: &[PathBuf], manifest: &ArchiveManifest) -> Result<(), ArchiveError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(File::create(out_path)?);

    writer.start_file("manifest.json", options)?;
    writer.write_all(&serde_json::to_vec_pretty(manifest)?)?;

    for path in files {
        writer.start_file(file_name(path), options)?;
        let mut input = File::open(path)?;
        io::copy(&mut input, &mut writer)?;
    }

    writer.finish()?;
    tracing::debug!(
        archive = %out_path.display(),
        files = files.len(),
        "Packaged output archive"
    );
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}
