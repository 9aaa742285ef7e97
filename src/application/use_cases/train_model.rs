use crate::domain::error::{AppError, Result};
use crate::domain::settings::{SectionPolicy, SettingsMap, EXPORT_SECTION, TRAIN_SECTION};
use crate::domain::training::{
    apply_freeze_default, best_weights_path, default_settings_document, is_run_dir_name,
    project_dir, run_dir, run_name, ExportFormat, TrainRunRecord, DEFAULT_FREEZE_LAYERS,
    RUN_RECORD_FILE,
};
use crate::infrastructure::process::ProcessRunner;
use crate::infrastructure::settings_store::{
    load_settings, write_default_settings, write_run_record,
};
use crate::infrastructure::yolo::YoloCli;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};

/// Slack for filesystems whose timestamps lag the wall clock.
const MTIME_SLACK: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// `None` when no directory was written by this run.
    pub run_dir: Option<PathBuf>,
    pub exported: Option<PathBuf>,
    pub run_record: Option<PathBuf>,
}

pub struct TrainModelUseCase {
    runner: Arc<dyn ProcessRunner + Send + Sync>,
    yolo: YoloCli,
}

impl TrainModelUseCase {
    pub fn new(runner: Arc<dyn ProcessRunner + Send + Sync>, yolo: YoloCli) -> Self {
        Self { runner, yolo }
    }

    pub fn init_settings(settings_path: &Path) -> Result<()> {
        write_default_settings(settings_path, &default_settings_document())
    }

    pub async fn execute(
        &self,
        settings_path: &Path,
        export: Option<ExportFormat>,
    ) -> Result<TrainOutcome> {
        let settings = load_settings(settings_path)?;
        let mut train = settings
            .section(TRAIN_SECTION, SectionPolicy::Required)?
            .into_map();
        let export_section = match export {
            Some(_) => settings.optional_section(EXPORT_SECTION)?,
            None => None,
        };

        if apply_freeze_default(&mut train) {
            warn!(
                freeze = DEFAULT_FREEZE_LAYERS,
                "'freeze' missing from train settings, freezing the backbone by default"
            );
        }

        let model = train
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or("yolo11n.pt");
        info!(model, "Starting training");
        info!(settings = %serde_json::Value::Object(train.clone()), "Training settings");

        let invocation = self.yolo.train(&train)?;
        let requested_dir = run_dir(&train);
        let started = SystemTime::now();
        self.runner.run(&invocation).await?;
        info!("Training completed");

        let written_dir = locate_run_dir(project_dir(&train), run_name(&train), started);
        let run_record = match &written_dir {
            Some(dir) => self.save_run_record(dir, train),
            None => {
                warn!(
                    expected = %requested_dir.display(),
                    "No run directory written by this training run, parameters not saved"
                );
                None
            }
        };

        let exported = match export {
            Some(format) => {
                let weights = written_dir
                    .as_deref()
                    .map(best_weights_path)
                    .filter(|weights| weights.is_file())
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "Trained weights from this run not found (expected near {})",
                            best_weights_path(&requested_dir).display()
                        ))
                    })?;
                Some(
                    self.export_trained(weights, format, export_section.unwrap_or_default())
                        .await?,
                )
            }
            None => None,
        };

        Ok(TrainOutcome {
            run_dir: written_dir,
            exported,
            run_record,
        })
    }

    async fn export_trained(
        &self,
        weights: PathBuf,
        format: ExportFormat,
        export_settings: SettingsMap,
    ) -> Result<PathBuf> {
        info!(format = %format, weights = %weights.display(), "Exporting model");
        let invocation = self.yolo.export(&weights, format.as_str(), &export_settings)?;
        self.runner.run(&invocation).await?;
        info!("Export completed");
        Ok(weights)
    }

    /// Failure here does not fail the run.
    fn save_run_record(&self, run_dir: &Path, train: SettingsMap) -> Option<PathBuf> {
        let path = run_dir.join(RUN_RECORD_FILE);
        let record = TrainRunRecord::new(Local::now(), train);
        match write_run_record(&path, &record) {
            Ok(()) => {
                info!(path = %path.display(), "Training parameters saved");
                Some(path)
            }
            Err(err) => {
                error!(error = %err, "Failed to save training parameters");
                None
            }
        }
    }
}

/// The trainer never reuses an existing run directory, so the one written by
/// this run is the newest `{name}`/`{name}N` under `project` touched after
/// `started`. Freshness is judged by `weights/best.pt` when present.
fn locate_run_dir(project: &Path, name: &str, started: SystemTime) -> Option<PathBuf> {
    let threshold = started.checked_sub(MTIME_SLACK).unwrap_or(started);
    fs::read_dir(project)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|dir_name| is_run_dir_name(dir_name, name))
                .unwrap_or(false)
        })
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let weights = best_weights_path(&path);
            let marker = if weights.is_file() { weights } else { path.clone() };
            let modified = fs::metadata(&marker).and_then(|m| m.modified()).ok()?;
            (modified >= threshold).then_some((modified, path))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}
