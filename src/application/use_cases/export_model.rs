use crate::domain::error::{AppError, Result};
use crate::domain::settings::{SectionPolicy, EXPORT_SECTION};
use crate::infrastructure::process::ProcessRunner;
use crate::infrastructure::settings_store::load_settings;
use crate::infrastructure::yolo::YoloCli;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_WEIGHTS: &str = "models/best.pt";
pub const DEFAULT_EXPORT_FORMAT: &str = "engine";

pub struct ExportModelUseCase {
    runner: Arc<dyn ProcessRunner + Send + Sync>,
    yolo: YoloCli,
}

impl ExportModelUseCase {
    pub fn new(runner: Arc<dyn ProcessRunner + Send + Sync>, yolo: YoloCli) -> Self {
        Self { runner, yolo }
    }

    /// Format precedence: `format_override`, then the section's `format`,
    /// then `engine`.
    pub async fn execute(
        &self,
        settings_path: &Path,
        weights: &Path,
        format_override: Option<&str>,
    ) -> Result<String> {
        let settings = load_settings(settings_path)?;
        if !weights.is_file() {
            return Err(AppError::NotFound(format!(
                "Weights file not found: {}",
                weights.display()
            )));
        }

        let resolved = settings.section(EXPORT_SECTION, SectionPolicy::FallbackToDocument)?;
        if resolved.is_fallback() {
            info!("No 'export' section, using the whole settings file as export options");
        }
        let export = resolved.into_map();

        if export.contains_key("model") {
            warn!(weights = %weights.display(), "Ignoring 'model' in export settings");
        }
        let format = match format_override {
            Some(format) => format.to_string(),
            None => export
                .get("format")
                .and_then(|v| v.as_str())
                .unwrap_or(DEFAULT_EXPORT_FORMAT)
                .to_string(),
        };

        info!(weights = %weights.display(), format = %format, "Exporting model");
        let invocation = self.yolo.export(weights, &format, &export)?;
        self.runner.run(&invocation).await?;
        info!("Export completed");
        Ok(format)
    }
}
