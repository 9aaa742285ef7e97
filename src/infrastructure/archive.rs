use crate::domain::error::{AppError, Result};
use crate::infrastructure::artifact_store::ensure_dir;
use std::fs;
use std::io;
use std::path::Path;
use zip::ZipArchive;

/// Unpacks `archive` into `target_dir` and returns the number of files written.
/// Entries whose names would escape `target_dir` are rejected.
pub fn extract_zip(archive: &Path, target_dir: &Path) -> Result<usize> {
    let file = fs::File::open(archive).map_err(|e| {
        AppError::IoError(format!("Failed to open archive {}: {e}", archive.display()))
    })?;
    let mut zip = ZipArchive::new(file).map_err(|e| {
        AppError::ParseError(format!("Invalid zip archive {}: {e}", archive.display()))
    })?;

    ensure_dir(target_dir)?;
    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| AppError::ParseError(format!("Corrupt zip entry #{index}: {e}")))?;
        let relative = entry.enclosed_name().ok_or_else(|| {
            AppError::ValidationError(format!("Unsafe path in archive: {}", entry.name()))
        })?;
        let out_path = target_dir.join(relative);

        if entry.is_dir() {
            ensure_dir(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            ensure_dir(parent)?;
        }
        let mut out = fs::File::create(&out_path).map_err(|e| {
            AppError::IoError(format!("Failed to create {}: {e}", out_path.display()))
        })?;
        io::copy(&mut entry, &mut out).map_err(|e| {
            AppError::IoError(format!("Failed to extract {}: {e}", out_path.display()))
        })?;
        written += 1;
    }
    Ok(written)
}
