use crate::domain::error::{AppError, Result};
use crate::domain::settings::SettingsDocument;
use crate::domain::training::TrainRunRecord;
use crate::infrastructure::artifact_store::{ensure_dir, write_atomically};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub fn load_settings(path: &Path) -> Result<SettingsDocument> {
    if !path.is_file() {
        error!(path = %path.display(), "Settings file not found");
        return Err(AppError::NotFound(format!(
            "Settings file not found: {}",
            path.display()
        )));
    }

    info!(path = %path.display(), "Loading settings");
    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| AppError::ParseError(format!("{}: {}", path.display(), e)))?;
    SettingsDocument::from_value(value)
}

/// Writes `document` to a path that must not exist yet.
pub fn write_default_settings(path: &Path, document: &Value) -> Result<()> {
    if path.exists() {
        return Err(AppError::ValidationError(format!(
            "Settings file already exists: {}",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(document)
        .map_err(|e| AppError::Internal(format!("Failed to serialize settings: {e}")))?;
    fs::write(path, bytes)?;
    info!(path = %path.display(), "Wrote default settings");
    Ok(())
}

pub fn write_run_record(path: &Path, record: &TrainRunRecord) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(record)
        .map_err(|e| AppError::Internal(format!("Failed to serialize run record: {e}")))?;
    write_atomically(path, &bytes)
}
