use crate::domain::error::{AppError, Result};
use crate::infrastructure::artifact_store::{ensure_dir, move_file, ScratchDir};
use crate::infrastructure::ffmpeg::FfmpegTools;
use crate::infrastructure::process::ProcessRunner;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

const SESSION_FORMAT: &str = "%d-%m-%Y_%H-%M-%S";
const FRAME_PATTERN: &str = "tmp_%06d.jpg";

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub output_dir: PathBuf,
    pub frames: usize,
    pub videos_processed: usize,
    pub videos_failed: usize,
}

pub struct ExtractFramesUseCase {
    runner: Arc<dyn ProcessRunner + Send + Sync>,
    tools: FfmpegTools,
}

impl ExtractFramesUseCase {
    pub fn new(runner: Arc<dyn ProcessRunner + Send + Sync>, tools: FfmpegTools) -> Self {
        Self { runner, tools }
    }

    pub async fn execute(
        &self,
        input_dir: &Path,
        output_root: &Path,
        fps: f64,
    ) -> Result<ExtractionReport> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(AppError::ValidationError(format!(
                "fps must be a positive number, got {}",
                fps
            )));
        }
        if !input_dir.is_dir() {
            return Err(AppError::NotFound(format!(
                "Input directory does not exist: {}",
                input_dir.display()
            )));
        }

        let videos = find_videos(input_dir)?;
        if videos.is_empty() {
            return Err(AppError::NotFound(format!(
                "No MP4 files found in {}",
                input_dir.display()
            )));
        }

        let session = Local::now().format(SESSION_FORMAT).to_string();
        let output_dir = output_root.join(session);
        ensure_dir(&output_dir)?;

        info!(videos = videos.len(), fps, "Starting frame extraction");

        let mut report = ExtractionReport {
            output_dir: output_dir.clone(),
            frames: 0,
            videos_processed: 0,
            videos_failed: 0,
        };

        for video in &videos {
            let name = video
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            info!(video = %name, "Processing");

            match self.extract_one(video, fps, &output_dir, report.frames).await {
                Ok(0) => {
                    warn!(video = %name, "No frames extracted");
                    report.videos_failed += 1;
                }
                Ok(count) => {
                    report.frames += count;
                    report.videos_processed += 1;
                }
                Err(err) => {
                    error!(video = %name, error = %err, "Failed to extract frames");
                    report.videos_failed += 1;
                }
            }
        }

        info!(
            frames = report.frames,
            videos = report.videos_processed,
            output_dir = %report.output_dir.display(),
            "Frame extraction completed"
        );
        Ok(report)
    }

    /// Extracts into a scratch directory, then renames frames to continue the
    /// global numbering after `already_written`.
    async fn extract_one(
        &self,
        video: &Path,
        fps: f64,
        output_dir: &Path,
        already_written: usize,
    ) -> Result<usize> {
        let scratch = ScratchDir::create_in(output_dir)?;
        let pattern = scratch.path().join(FRAME_PATTERN);
        self.runner
            .run(&self.tools.extract_frames(video, fps, &pattern))
            .await?;

        let mut frames: Vec<PathBuf> = fs::read_dir(scratch.path())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("tmp_") && n.ends_with(".jpg"))
                    .unwrap_or(false)
            })
            .collect();
        frames.sort();

        for (offset, frame) in frames.iter().enumerate() {
            let target = output_dir.join(frame_name(already_written + offset + 1));
            move_file(frame, &target)?;
        }
        Ok(frames.len())
    }
}

pub fn frame_name(index: usize) -> String {
    format!("frame_{:06}.jpg", index)
}

/// All `.mp4` files below `dir`, sorted by path.
pub fn find_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    collect_videos(dir, &mut out)?;
    out.sort();
    Ok(out)
}

fn collect_videos(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::IoError(format!("Failed to read dir {}: {e}", dir.display()))
    })?;
    for entry in entries {
        let path = entry
            .map_err(|e| AppError::IoError(format!("Failed to read entry: {e}")))?
            .path();
        if path.is_dir() {
            collect_videos(&path, out)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some("mp4") {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::process::{testing::RecordingRunner, ToolInvocation};
    use async_trait::async_trait;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pipeline-frames-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writes `frames_per_video` fake JPEGs wherever ffmpeg was told to, and
    /// fails for videos whose name contains "broken".
    struct FakeFfmpeg {
        frames_per_video: usize,
        inner: RecordingRunner,
    }

    #[async_trait]
    impl ProcessRunner for FakeFfmpeg {
        async fn run(&self, invocation: &ToolInvocation) -> Result<()> {
            self.inner.run(invocation).await?;
            let video = invocation.value_of("-i").unwrap_or_default();
            if video.contains("broken") {
                return Err(AppError::ExternalToolFailure(
                    "ffmpeg exited with exit status: 1".into(),
                ));
            }
            let pattern = PathBuf::from(invocation.args.last().unwrap());
            let dir = pattern.parent().unwrap();
            for i in 1..=self.frames_per_video {
                fs::write(dir.join(format!("tmp_{:06}.jpg", i)), video.as_bytes()).unwrap();
            }
            Ok(())
        }

        async fn capture(&self, invocation: &ToolInvocation) -> Result<String> {
            self.inner.capture(invocation).await
        }
    }

    fn use_case(runner: Arc<FakeFfmpeg>) -> ExtractFramesUseCase {
        ExtractFramesUseCase::new(runner, FfmpegTools::new("ffmpeg", "ffprobe"))
    }

    #[test]
    fn finds_mp4_files_recursively_in_order() {
        let dir = scratch_dir();
        fs::create_dir_all(dir.join("b")).unwrap();
        fs::write(dir.join("b").join("2.mp4"), b"").unwrap();
        fs::write(dir.join("a.mp4"), b"").unwrap();
        fs::write(dir.join("notes.txt"), b"").unwrap();
        fs::write(dir.join("clip.MOV"), b"").unwrap();

        let videos = find_videos(&dir).unwrap();
        assert_eq!(videos, vec![dir.join("a.mp4"), dir.join("b").join("2.mp4")]);
    }

    #[tokio::test]
    async fn numbers_frames_across_videos_and_skips_failures() {
        let input = scratch_dir();
        fs::write(input.join("a.mp4"), b"").unwrap();
        fs::write(input.join("b_broken.mp4"), b"").unwrap();
        fs::write(input.join("c.mp4"), b"").unwrap();
        let output = scratch_dir();

        let runner = Arc::new(FakeFfmpeg {
            frames_per_video: 3,
            inner: RecordingRunner::default(),
        });
        let report = use_case(runner.clone()).execute(&input, &output, 2.0).await.unwrap();

        assert_eq!(report.frames, 6);
        assert_eq!(report.videos_processed, 2);
        assert_eq!(report.videos_failed, 1);
        assert_eq!(report.output_dir.parent(), Some(output.as_path()));

        let mut names: Vec<String> = fs::read_dir(&report.output_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            (1..=6).map(frame_name).collect::<Vec<_>>(),
            "scratch directories must be cleaned up"
        );
        let fourth = fs::read_to_string(report.output_dir.join(frame_name(4))).unwrap();
        assert!(fourth.ends_with("c.mp4"));

        let calls = runner.inner.recorded();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.value_of("-vf") == Some("fps=2")));
    }

    #[tokio::test]
    async fn empty_input_is_not_found() {
        let input = scratch_dir();
        let runner = Arc::new(FakeFfmpeg {
            frames_per_video: 1,
            inner: RecordingRunner::default(),
        });
        let err = use_case(runner).execute(&input, &scratch_dir(), 1.0).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_positive_fps_is_rejected() {
        let runner = Arc::new(FakeFfmpeg {
            frames_per_video: 1,
            inner: RecordingRunner::default(),
        });
        let err = use_case(runner).execute(&scratch_dir(), &scratch_dir(), 0.0).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
