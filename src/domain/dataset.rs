use crate::domain::error::{AppError, Result};
use crate::domain::settings::{json_kind, SettingsMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const REQUIRED_DATASET_KEYS: [&str; 5] =
    ["api_key", "workspace", "project", "version", "format"];

/// The five fields forwarded to the dataset host. Nothing else in the
/// settings document is read.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRequest {
    pub api_key: String,
    pub workspace: String,
    pub project: String,
    pub version: String,
    pub format: String,
}

impl DatasetRequest {
    pub fn from_settings(settings: &SettingsMap) -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_DATASET_KEYS
            .iter()
            .copied()
            .filter(|key| !settings.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Missing required settings keys: {:?}",
                missing
            )));
        }

        Ok(Self {
            api_key: scalar(settings, "api_key")?,
            workspace: scalar(settings, "workspace")?,
            project: scalar(settings, "project")?,
            version: scalar(settings, "version")?,
            format: scalar(settings, "format")?,
        })
    }
}

// Keeps the API key out of logs.
impl fmt::Debug for DatasetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetRequest")
            .field("api_key", &"***")
            .field("workspace", &self.workspace)
            .field("project", &self.project)
            .field("version", &self.version)
            .field("format", &self.format)
            .finish()
    }
}

fn scalar(settings: &SettingsMap, key: &str) -> Result<String> {
    match settings.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(AppError::ValidationError(format!(
            "Setting '{}' must be a string or number, found {}",
            key,
            json_kind(other)
        ))),
        None => Err(AppError::ValidationError(format!(
            "Missing required settings keys: [\"{}\"]",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> SettingsMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn reads_exactly_the_five_fields() {
        let settings = map(json!({
            "api_key": "secret",
            "workspace": "acme",
            "project": "pallets",
            "version": 3,
            "format": "yolo11",
            "unrelated": true
        }));
        let request = DatasetRequest::from_settings(&settings).unwrap();
        assert_eq!(request.api_key, "secret");
        assert_eq!(request.workspace, "acme");
        assert_eq!(request.project, "pallets");
        assert_eq!(request.version, "3");
        assert_eq!(request.format, "yolo11");
    }

    #[test]
    fn lists_every_missing_key() {
        let settings = map(json!({"api_key": "secret", "project": "pallets"}));
        let err = DatasetRequest::from_settings(&settings).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("workspace"));
        assert!(msg.contains("version"));
        assert!(msg.contains("format"));
        assert!(!msg.contains("api_key"));
    }

    #[test]
    fn rejects_structured_values() {
        let settings = map(json!({
            "api_key": "secret",
            "workspace": "acme",
            "project": "pallets",
            "version": {"id": 3},
            "format": "yolo11"
        }));
        assert!(matches!(
            DatasetRequest::from_settings(&settings),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let request = DatasetRequest {
            api_key: "secret".into(),
            workspace: "acme".into(),
            project: "pallets".into(),
            version: "3".into(),
            format: "yolo11".into(),
        };
        assert!(!format!("{:?}", request).contains("secret"));
    }
}
