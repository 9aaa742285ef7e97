use crate::domain::settings::SettingsMap;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Layers frozen when the train section does not say otherwise (the backbone
/// of the YOLO11 detectors).
pub const DEFAULT_FREEZE_LAYERS: u64 = 10;

pub const DEFAULT_PROJECT_DIR: &str = "runs/detect";
pub const DEFAULT_RUN_NAME: &str = "train";
pub const RUN_RECORD_FILE: &str = "training_params.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// ONNX graph
    Onnx,
    /// TensorRT engine
    Engine,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Onnx => "onnx",
            ExportFormat::Engine => "engine",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn default_settings_document() -> Value {
    json!({
        "train": {
            "model": "yolo11n.pt",
            "data": "data.yaml",
            "epochs": 100,
            "val": true,
            "plots": true,
            "seed": 42,
            "patience": 10,
            "imgsz": 640,
            "batch": 16,
            "freeze": DEFAULT_FREEZE_LAYERS,
            "save": true,
            "cache": "disk",
            "device": "0",
            "pretrained": true,
            "project": "runs/train",
            "name": "yolo11n_finetune"
        },
        "export": {
            "task": "detect",
            "imgsz": 736,
            "batch": 16,
            "half": false,
            "nms": true,
            "dynamic": true,
            "int8": true,
            "data": "dataset/data.yaml"
        }
    })
}

/// Sets `freeze` when absent or null. Returns true when the default was applied.
pub fn apply_freeze_default(train: &mut SettingsMap) -> bool {
    match train.get("freeze") {
        Some(Value::Null) | None => {
            train.insert("freeze".to_string(), json!(DEFAULT_FREEZE_LAYERS));
            true
        }
        Some(_) => false,
    }
}

pub fn project_dir(train: &SettingsMap) -> &Path {
    Path::new(
        train
            .get("project")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_PROJECT_DIR),
    )
}

pub fn run_name(train: &SettingsMap) -> &str {
    train
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_RUN_NAME)
}

/// Directory the trainer is asked to write into: `{project}/{name}`. When it
/// already exists the trainer picks `{name}2`, `{name}3`, ... instead.
pub fn run_dir(train: &SettingsMap) -> PathBuf {
    project_dir(train).join(run_name(train))
}

/// Whether `dir_name` is `name` or one of its numbered successors.
pub fn is_run_dir_name(dir_name: &str, name: &str) -> bool {
    match dir_name.strip_prefix(name) {
        Some("") => true,
        Some(suffix) => suffix.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

pub fn best_weights_path(run_dir: &Path) -> PathBuf {
    run_dir.join("weights").join("best.pt")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainRunRecord {
    pub timestamp_iso: String,
    pub date: String,
    pub time: String,
    pub settings_used: SettingsMap,
}

impl TrainRunRecord {
    pub fn new(at: DateTime<Local>, settings_used: SettingsMap) -> Self {
        Self {
            timestamp_iso: at.to_rfc3339(),
            date: at.format("%Y-%m-%d").to_string(),
            time: at.format("%H:%M:%S").to_string(),
            settings_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn map(value: Value) -> SettingsMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn freeze_default_applies_when_missing_or_null() {
        let mut missing = map(json!({"epochs": 5}));
        assert!(apply_freeze_default(&mut missing));
        assert_eq!(missing.get("freeze"), Some(&json!(10)));

        let mut null = map(json!({"freeze": null}));
        assert!(apply_freeze_default(&mut null));
        assert_eq!(null.get("freeze"), Some(&json!(10)));
    }

    #[test]
    fn explicit_freeze_is_kept() {
        let mut train = map(json!({"freeze": 0}));
        assert!(!apply_freeze_default(&mut train));
        assert_eq!(train.get("freeze"), Some(&json!(0)));
    }

    #[test]
    fn run_dir_uses_project_and_name() {
        let train = map(json!({"project": "runs/train", "name": "yolo11n_finetune"}));
        assert_eq!(run_dir(&train), Path::new("runs/train").join("yolo11n_finetune"));
        assert_eq!(
            best_weights_path(&run_dir(&train)),
            Path::new("runs/train/yolo11n_finetune/weights/best.pt")
        );
    }

    #[test]
    fn numbered_run_dirs_are_recognised() {
        assert!(is_run_dir_name("exp", "exp"));
        assert!(is_run_dir_name("exp2", "exp"));
        assert!(is_run_dir_name("exp13", "exp"));
        assert!(!is_run_dir_name("exp_old", "exp"));
        assert!(!is_run_dir_name("ex", "exp"));
        assert!(!is_run_dir_name("train", "exp"));
    }

    #[test]
    fn run_dir_falls_back_to_trainer_defaults() {
        assert_eq!(run_dir(&SettingsMap::new()), Path::new("runs/detect/train"));
    }

    #[test]
    fn run_record_splits_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let record = TrainRunRecord::new(at, map(json!({"epochs": 1})));
        assert_eq!(record.date, "2024-03-09");
        assert_eq!(record.time, "14:05:07");
        assert!(record.timestamp_iso.starts_with("2024-03-09T14:05:07"));
    }

    #[test]
    fn default_document_has_both_sections() {
        let doc = default_settings_document();
        assert!(doc["train"].is_object());
        assert!(doc["export"].is_object());
        assert_eq!(doc["train"]["freeze"], json!(10));
    }
}
