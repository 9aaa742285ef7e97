use crate::domain::error::{AppError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        AppError::IoError(format!("Failed to create dir {}: {e}", path.display()))
    })
}

/// Writes through a sibling temp file so readers never see a partial file.
/// `rename` replaces an existing target on every supported platform.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let staging = path.with_extension(format!("partial-{}", Uuid::new_v4().simple()));
    let written = fs::write(&staging, bytes).and_then(|()| fs::rename(&staging, path));
    written.map_err(|e| {
        let _ = fs::remove_file(&staging);
        AppError::IoError(format!("Failed to write {}: {e}", path.display()))
    })
}

/// A uniquely named working directory under `parent`, removed on drop.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn create_in(parent: &Path) -> Result<Self> {
        let path = parent.join(format!(".scratch-{}", Uuid::new_v4()));
        ensure_dir(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Moves a file, falling back to copy + delete across filesystems.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)
        .and_then(|_| fs::remove_file(from))
        .map_err(|e| {
            AppError::IoError(format!(
                "Failed to move {} to {}: {e}",
                from.display(),
                to.display()
            ))
        })
}
