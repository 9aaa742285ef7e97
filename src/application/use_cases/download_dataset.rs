use crate::domain::dataset::DatasetRequest;
use crate::domain::error::Result;
use crate::infrastructure::artifact_store::ensure_dir;
use crate::infrastructure::roboflow::DatasetClient;
use crate::infrastructure::settings_store::load_settings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub struct DownloadDatasetUseCase {
    client: Arc<dyn DatasetClient + Send + Sync>,
}

impl DownloadDatasetUseCase {
    pub fn new(client: Arc<dyn DatasetClient + Send + Sync>) -> Self {
        Self { client }
    }

    pub async fn execute(&self, settings_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        let settings = load_settings(settings_path)?;
        let request = DatasetRequest::from_settings(settings.root())?;

        ensure_dir(output_dir)?;
        let absolute =
            std::fs::canonicalize(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());
        info!(output_dir = %absolute.display(), "Dataset output directory");

        info!(
            workspace = %request.workspace,
            project = %request.project,
            version = %request.version,
            format = %request.format,
            "Downloading dataset"
        );
        let location = self.client.download(&request, output_dir).await?;

        info!(location = %location.display(), "Dataset downloaded and extracted successfully");
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingClient {
        requests: Mutex<Vec<(DatasetRequest, PathBuf)>>,
    }

    #[async_trait]
    impl DatasetClient for RecordingClient {
        async fn download(&self, request: &DatasetRequest, output_dir: &Path) -> Result<PathBuf> {
            self.requests
                .lock()
                .unwrap()
                .push((request.clone(), output_dir.to_path_buf()));
            std::fs::write(output_dir.join("data.yaml"), "names: []").unwrap();
            Ok(output_dir.to_path_buf())
        }
    }

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pipeline-download-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn forwards_exactly_the_five_fields() {
        let dir = scratch_dir();
        let settings = dir.join("roboflow.json");
        std::fs::write(
            &settings,
            json!({
                "api_key": "secret",
                "workspace": "acme",
                "project": "pallets",
                "version": 3,
                "format": "yolo11"
            })
            .to_string(),
        )
        .unwrap();
        let output = dir.join("dataset").join("v3test");

        let client = Arc::new(RecordingClient::default());
        let use_case = DownloadDatasetUseCase::new(client.clone());
        let location = use_case.execute(&settings, &output).await.unwrap();

        assert_eq!(location, output);
        assert!(output.join("data.yaml").is_file());
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].0,
            DatasetRequest {
                api_key: "secret".into(),
                workspace: "acme".into(),
                project: "pallets".into(),
                version: "3".into(),
                format: "yolo11".into(),
            }
        );
    }

    #[tokio::test]
    async fn missing_settings_file_stops_before_download() {
        let dir = scratch_dir();
        let client = Arc::new(RecordingClient::default());
        let use_case = DownloadDatasetUseCase::new(client.clone());

        let err = use_case
            .execute(&dir.join("absent.json"), &dir.join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(client.requests.lock().unwrap().is_empty());
        assert!(!dir.join("out").exists());
    }

    #[tokio::test]
    async fn incomplete_settings_stop_before_download() {
        let dir = scratch_dir();
        let settings = dir.join("roboflow.json");
        std::fs::write(&settings, json!({"api_key": "secret"}).to_string()).unwrap();
        let client = Arc::new(RecordingClient::default());
        let use_case = DownloadDatasetUseCase::new(client.clone());

        let err = use_case.execute(&settings, &dir.join("out")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(client.requests.lock().unwrap().is_empty());
    }
}
