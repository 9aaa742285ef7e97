use crate::domain::error::{AppError, Result};
use crate::domain::video::{scale_to_height, VideoDimensions, FALLBACK_DIMENSIONS};
use crate::infrastructure::ffmpeg::{parse_probe_output, FfmpegTools};
use crate::infrastructure::process::ProcessRunner;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct DownscaleVideoUseCase {
    runner: Arc<dyn ProcessRunner + Send + Sync>,
    tools: FfmpegTools,
}

impl DownscaleVideoUseCase {
    pub fn new(runner: Arc<dyn ProcessRunner + Send + Sync>, tools: FfmpegTools) -> Self {
        Self { runner, tools }
    }

    pub async fn execute(&self, input: &Path, output: &Path) -> Result<VideoDimensions> {
        if !input.exists() {
            return Err(AppError::NotFound(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }

        let target = match self.probe(input).await {
            Ok(source) => {
                let target = scale_to_height(source).ok_or_else(|| {
                    AppError::ValidationError(format!("Invalid source dimensions {}", source))
                })?;
                info!(source = %source, target = %target, "Scaling video");
                target
            }
            Err(err) => {
                warn!(
                    error = %err,
                    fallback = %FALLBACK_DIMENSIONS,
                    "Could not determine dimensions, using fallback"
                );
                FALLBACK_DIMENSIONS
            }
        };

        let invocation = self.tools.downscale_hevc(input, output, target);
        self.runner.run(&invocation).await?;
        info!(output = %output.display(), "Output written");
        Ok(target)
    }

    async fn probe(&self, input: &Path) -> Result<VideoDimensions> {
        let stdout = self
            .runner
            .capture(&self.tools.probe_dimensions(input))
            .await?;
        parse_probe_output(&stdout)
    }
}
