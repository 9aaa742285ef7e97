use crate::application::use_cases::export_model::DEFAULT_WEIGHTS;
use crate::domain::training::ExportFormat;
use clap::Parser;
use std::path::PathBuf;

/// Download a dataset version from Roboflow and extract it
#[derive(Parser, Debug)]
#[command(name = "download_data", version)]
pub struct DownloadDataArgs {
    /// JSON file with api_key, workspace, project, version and format
    pub settings: PathBuf,

    /// Directory the dataset is extracted into
    pub output_dir: PathBuf,
}

/// Train a YOLO model with the "train" section of a settings file
#[derive(Parser, Debug)]
#[command(name = "train", version)]
pub struct TrainArgs {
    /// Path to the settings JSON file
    #[arg(long, default_value = "settings.json")]
    pub settings: PathBuf,

    /// Export the trained model afterwards
    #[arg(long, value_enum)]
    pub export: Option<ExportFormat>,

    /// Write a default settings file to --settings and exit
    #[arg(long, conflicts_with = "export")]
    pub init: bool,
}

/// Export trained weights with the "export" section of a settings file
#[derive(Parser, Debug)]
#[command(name = "export", version)]
pub struct ExportArgs {
    /// Path to the settings JSON file
    #[arg(long)]
    pub settings: PathBuf,

    /// Weights to export
    #[arg(long, default_value = DEFAULT_WEIGHTS)]
    pub weights: PathBuf,

    /// Target format, overriding the settings file (e.g. engine, onnx)
    #[arg(long)]
    pub format: Option<String>,
}

/// Convert a video to 720p HEVC using NVIDIA hardware acceleration
#[derive(Parser, Debug)]
#[command(name = "downscale", version)]
pub struct DownscaleArgs {
    /// Path to input video file
    pub input: PathBuf,

    /// Path to output video file
    pub output: PathBuf,
}

/// Extract frames from every MP4 below a folder using GPU decoding
#[derive(Parser, Debug)]
#[command(name = "extract_frames", version, arg_required_else_help = true)]
pub struct ExtractFramesArgs {
    /// Folder containing video files
    #[arg(long)]
    pub input: PathBuf,

    /// Output folder for extracted frames
    #[arg(long)]
    pub output: PathBuf,

    /// Frames to extract per second
    #[arg(long, default_value_t = 1.0)]
    pub fps: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn clap_definitions_are_consistent() {
        DownloadDataArgs::command().debug_assert();
        TrainArgs::command().debug_assert();
        ExportArgs::command().debug_assert();
        DownscaleArgs::command().debug_assert();
        ExtractFramesArgs::command().debug_assert();
    }

    #[test]
    fn train_defaults() {
        let args = TrainArgs::try_parse_from(["train"]).unwrap();
        assert_eq!(args.settings, PathBuf::from("settings.json"));
        assert!(args.export.is_none());
        assert!(!args.init);

        let args = TrainArgs::try_parse_from(["train", "--export", "engine"]).unwrap();
        assert_eq!(args.export, Some(ExportFormat::Engine));
        assert!(TrainArgs::try_parse_from(["train", "--export", "tflite"]).is_err());
    }

    #[test]
    fn export_requires_settings_and_defaults_weights() {
        assert!(ExportArgs::try_parse_from(["export"]).is_err());
        let args = ExportArgs::try_parse_from(["export", "--settings", "s.json"]).unwrap();
        assert_eq!(args.weights, PathBuf::from("models/best.pt"));
        assert!(args.format.is_none());
    }

    #[test]
    fn positional_commands_need_both_paths() {
        assert!(DownloadDataArgs::try_parse_from(["download_data", "settings.json"]).is_err());
        let args = DownloadDataArgs::try_parse_from([
            "download_data",
            "settings/roboflow.json",
            "dataset/v3test/",
        ])
        .unwrap();
        assert_eq!(args.output_dir, PathBuf::from("dataset/v3test/"));

        let args = DownscaleArgs::try_parse_from(["downscale", "in.mp4", "out.mp4"]).unwrap();
        assert_eq!(args.input, PathBuf::from("in.mp4"));
    }

    #[test]
    fn extract_frames_default_fps() {
        let args = ExtractFramesArgs::try_parse_from([
            "extract_frames",
            "--input",
            "videos",
            "--output",
            "frames",
        ])
        .unwrap();
        assert_eq!(args.fps, 1.0);
    }
}
