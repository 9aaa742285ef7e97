//! Entry points shared by the binaries under `src/bin`.
//!
//! Each one loads the tool configuration, initialises logging, runs a single
//! use case and maps the outcome onto the process exit code.

pub mod commands;

use crate::application::{
    DownloadDatasetUseCase, DownscaleVideoUseCase, ExportModelUseCase, ExtractFramesUseCase,
    TrainModelUseCase,
};
use crate::domain::error::Result;
use crate::infrastructure::config::{ConfigService, ToolConfig};
use crate::infrastructure::ffmpeg::FfmpegTools;
use crate::infrastructure::process::SystemProcessRunner;
use crate::infrastructure::roboflow::RoboflowClient;
use crate::infrastructure::yolo::YoloCli;
use crate::init_tracing;
use commands::{DownloadDataArgs, DownscaleArgs, ExportArgs, ExtractFramesArgs, TrainArgs};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

fn bootstrap() -> Option<ToolConfig> {
    match ConfigService::new().load() {
        Ok(config) => {
            init_tracing(&config);
            Some(config)
        }
        Err(err) => {
            init_tracing(&ToolConfig::default());
            error!(error = %err, "Failed to load tool configuration");
            None
        }
    }
}

fn finish<T>(result: Result<T>, failure: &str) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "{}", failure);
            ExitCode::FAILURE
        }
    }
}

pub async fn download_data(args: DownloadDataArgs) -> ExitCode {
    let Some(config) = bootstrap() else { return ExitCode::FAILURE };

    finish(fetch_dataset(&config, &args).await, "Dataset download failed")
}

async fn fetch_dataset(config: &ToolConfig, args: &DownloadDataArgs) -> Result<PathBuf> {
    let client = RoboflowClient::new(&config.roboflow_api_url, config.http_timeout_secs)?;
    DownloadDatasetUseCase::new(Arc::new(client))
        .execute(&args.settings, &args.output_dir)
        .await
}

pub async fn train(args: TrainArgs) -> ExitCode {
    let Some(config) = bootstrap() else { return ExitCode::FAILURE };

    if args.init {
        return finish(TrainModelUseCase::init_settings(&args.settings), "Failed to write settings");
    }

    let use_case = TrainModelUseCase::new(
        Arc::new(SystemProcessRunner::new()),
        YoloCli::new(&config.yolo_bin),
    );
    finish(use_case.execute(&args.settings, args.export).await, "Training failed")
}

pub async fn export(args: ExportArgs) -> ExitCode {
    let Some(config) = bootstrap() else { return ExitCode::FAILURE };

    let use_case = ExportModelUseCase::new(
        Arc::new(SystemProcessRunner::new()),
        YoloCli::new(&config.yolo_bin),
    );
    finish(
        use_case
            .execute(&args.settings, &args.weights, args.format.as_deref())
            .await,
        "Export failed",
    )
}

pub async fn downscale(args: DownscaleArgs) -> ExitCode {
    let Some(config) = bootstrap() else { return ExitCode::FAILURE };

    let use_case = DownscaleVideoUseCase::new(
        Arc::new(SystemProcessRunner::new()),
        FfmpegTools::new(&config.ffmpeg_bin, &config.ffprobe_bin),
    );
    finish(use_case.execute(&args.input, &args.output).await, "FFmpeg execution failed")
}

pub async fn extract_frames(args: ExtractFramesArgs) -> ExitCode {
    let Some(config) = bootstrap() else { return ExitCode::FAILURE };

    let use_case = ExtractFramesUseCase::new(
        Arc::new(SystemProcessRunner::new()),
        FfmpegTools::new(&config.ffmpeg_bin, &config.ffprobe_bin),
    );
    finish(
        use_case.execute(&args.input, &args.output, args.fps).await,
        "Frame extraction failed",
    )
}
