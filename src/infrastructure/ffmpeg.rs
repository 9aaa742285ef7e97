use crate::domain::error::{AppError, Result};
use crate::domain::video::VideoDimensions;
use crate::infrastructure::process::ToolInvocation;
use serde::Deserialize;
use std::path::Path;

pub const HEVC_ENCODER: &str = "hevc_nvenc";

pub struct FfmpegTools {
    ffmpeg: String,
    ffprobe: String,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

impl FfmpegTools {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn probe_dimensions(&self, input: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "json",
            ])
            .arg(input.to_string_lossy())
    }

    /// CUDA decode, `scale_cuda` resize and HEVC NVENC encode; audio is copied.
    pub fn downscale_hevc(
        &self,
        input: &Path,
        output: &Path,
        target: VideoDimensions,
    ) -> ToolInvocation {
        ToolInvocation::new(&self.ffmpeg)
            .args(["-y", "-hwaccel", "cuda", "-hwaccel_output_format", "cuda", "-i"])
            .arg(input.to_string_lossy())
            .arg("-vf")
            .arg(format!("scale_cuda={}:{}", target.width, target.height))
            .args([
                "-c:v",
                HEVC_ENCODER,
                "-preset",
                "p4",
                "-rc",
                "vbr",
                "-cq",
                "28",
                "-profile:v",
                "main",
                "-c:a",
                "copy",
            ])
            .arg(output.to_string_lossy())
    }

    /// Writes `fps` JPEG frames per second of `video` to `pattern` (printf style).
    pub fn extract_frames(&self, video: &Path, fps: f64, pattern: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.ffmpeg)
            .args(["-y", "-hwaccel", "cuda", "-i"])
            .arg(video.to_string_lossy())
            .arg("-vf")
            .arg(format!("fps={}", fps))
            .args(["-vsync", "0", "-q:v", "2"])
            .arg(pattern.to_string_lossy())
    }
}

pub fn parse_probe_output(stdout: &str) -> Result<VideoDimensions> {
    let probe: ProbeOutput = serde_json::from_str(stdout)
        .map_err(|e| AppError::ParseError(format!("ffprobe output: {e}")))?;
    let stream = probe
        .streams
        .first()
        .ok_or_else(|| AppError::ParseError("ffprobe reported no video stream".to_string()))?;
    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok(VideoDimensions { width, height }),
        _ => Err(AppError::ParseError(
            "ffprobe stream is missing width or height".to_string(),
        )),
    }
}
