use crate::domain::error::Result;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "pipeline.toml";
pub const ENV_PREFIX: &str = "PIPELINE_";

/// Where the external tools live and how to reach the dataset host.
/// Unrelated to the JSON settings documents, which are forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub yolo_bin: String,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    pub roboflow_api_url: String,
    pub http_timeout_secs: u64,
    pub log_filter: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            yolo_bin: "yolo".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            roboflow_api_url: "https://api.roboflow.com".to_string(),
            http_timeout_secs: 600,
            log_filter: "info".to_string(),
        }
    }
}

pub struct ConfigService {
    figment: Figment,
}

impl ConfigService {
    /// Defaults, then `pipeline.toml` in the working directory, then
    /// `PIPELINE_*` variables (a `.env` file is loaded first).
    pub fn new() -> Self {
        let _ = dotenvy::dotenv();
        Self::with_file(Path::new(CONFIG_FILE))
    }

    pub fn with_file(path: &Path) -> Self {
        let figment = Figment::from(Serialized::defaults(ToolConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));
        Self { figment }
    }

    pub fn load(&self) -> Result<ToolConfig> {
        Ok(self.figment.extract()?)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use uuid::Uuid;

    fn scratch_file(contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("pipeline-config-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!("absent-{}.toml", Uuid::new_v4()));
        let config = ConfigService::with_file(&path).load().unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let path =
            scratch_file("ffmpeg_bin = \"/opt/ffmpeg/bin/ffmpeg\"\nhttp_timeout_secs = 30\n");
        let config = ConfigService::with_file(&path).load().unwrap();
        assert_eq!(config.ffmpeg_bin, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.yolo_bin, "yolo");
    }

    #[test]
    fn malformed_value_is_a_config_error() {
        let path = scratch_file("http_timeout_secs = \"soon\"\n");
        let err = ConfigService::with_file(&path).load().unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
