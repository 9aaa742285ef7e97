use crate::domain::dataset::DatasetRequest;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::archive::extract_zip;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

const ARCHIVE_NAME: &str = "roboflow.zip";
const EXPORT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[async_trait]
pub trait DatasetClient {
    /// Fetches the dataset version described by `request` and unpacks it
    /// into `output_dir`. Returns the dataset location.
    async fn download(&self, request: &DatasetRequest, output_dir: &Path) -> Result<PathBuf>;
}

/// State of a dataset export as reported by the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportStatus {
    Ready(String),
    /// Still being generated (HTTP 202), with the reported progress if any.
    Pending(Option<f64>),
}

pub struct RoboflowClient {
    client: Client,
    api_url: String,
    poll_interval: Duration,
    export_deadline: Duration,
}

impl RoboflowClient {
    /// `timeout_secs` bounds each request and the wait for a pending export.
    pub fn new(api_url: &str, timeout_secs: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vision-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            poll_interval: EXPORT_POLL_INTERVAL,
            export_deadline: timeout,
        })
    }

    pub fn with_polling(mut self, interval: Duration, deadline: Duration) -> Self {
        self.poll_interval = interval;
        self.export_deadline = deadline;
        self
    }

    pub fn export_url(&self, request: &DatasetRequest) -> Result<Url> {
        let base = if self.api_url.ends_with('/') {
            self.api_url.clone()
        } else {
            format!("{}/", self.api_url)
        };
        let mut url = Url::parse(&base)
            .map_err(|e| AppError::ValidationError(format!("Invalid API url {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::ValidationError(format!("API url cannot be a base: {}", base)))?
            .pop_if_empty()
            .extend([
                request.workspace.as_str(),
                request.project.as_str(),
                request.version.as_str(),
                export_format_id(&request.format),
            ]);
        url.query_pairs_mut().append_pair("api_key", &request.api_key);
        Ok(url)
    }

    /// Asks for the export link, waiting while the API is still generating
    /// the export.
    async fn export_link(&self, request: &DatasetRequest) -> Result<String> {
        let url = self.export_url(request)?;
        let started = Instant::now();

        loop {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| AppError::HttpError(format!("Request failed: {}", e.without_url())))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(AppError::HttpError(format!("API error ({}): {}", status, text)));
            }

            let body = if status == StatusCode::ACCEPTED {
                response.json::<Value>().await.unwrap_or_default()
            } else {
                response
                    .json::<Value>()
                    .await
                    .map_err(|e| AppError::HttpError(format!("Failed to parse JSON: {}", e)))?
            };

            match classify_export_response(status, &body)? {
                ExportStatus::Ready(link) => return Ok(link),
                ExportStatus::Pending(progress) => {
                    if started.elapsed() + self.poll_interval > self.export_deadline {
                        return Err(AppError::HttpError(format!(
                            "Dataset export still being generated after {}s",
                            self.export_deadline.as_secs()
                        )));
                    }
                    info!(progress = ?progress, "Dataset export is being generated, waiting");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn fetch_archive(&self, link: &str, archive_path: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(link)
            .send()
            .await
            .map_err(|e| AppError::HttpError(format!("Download failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(AppError::HttpError(format!(
                "Download error ({})",
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(archive_path).await.map_err(|e| {
            AppError::IoError(format!("Failed to create {}: {e}", archive_path.display()))
        })?;
        let mut total = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::HttpError(format!("Download interrupted: {}", e.without_url())))?
        {
            file.write_all(&chunk).await?;
            total += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(total)
    }
}

#[async_trait]
impl DatasetClient for RoboflowClient {
    async fn download(&self, request: &DatasetRequest, output_dir: &Path) -> Result<PathBuf> {
        let link = self.export_link(request).await?;
        debug!("Export link resolved");

        let archive_path = output_dir.join(ARCHIVE_NAME);
        let fetched = self.fetch_archive(&link, &archive_path).await;
        let extracted = fetched.and_then(|bytes| {
            info!(bytes, archive = %archive_path.display(), "Dataset archive downloaded");
            extract_zip(&archive_path, output_dir)
        });
        // The archive goes whether the transfer, the extraction or neither failed.
        let _ = tokio::fs::remove_file(&archive_path).await;
        let files = extracted?;
        info!(files, "Dataset archive extracted");

        Ok(output_dir.to_path_buf())
    }
}

/// Maps friendly format names to the export identifiers the API expects.
pub fn export_format_id(format: &str) -> &str {
    match format {
        "yolov5" => "yolov5pytorch",
        "yolov7" => "yolov7pytorch",
        other => other,
    }
}

pub fn classify_export_response(status: StatusCode, body: &Value) -> Result<ExportStatus> {
    if status == StatusCode::ACCEPTED {
        return Ok(ExportStatus::Pending(body.get("progress").and_then(Value::as_f64)));
    }
    parse_export_link(body).map(ExportStatus::Ready)
}

pub fn parse_export_link(json: &Value) -> Result<String> {
    json["export"]["link"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| {
            let detail = json
                .get("error")
                .map(|e| e.to_string())
                .unwrap_or_else(|| "response has no export link".to_string());
            AppError::ExternalToolFailure(format!("Dataset export unavailable: {}", detail))
        })
}
