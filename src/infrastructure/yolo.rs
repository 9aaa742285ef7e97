//! Keyword-argument forwarding to the Ultralytics `yolo` command line.
//!
//! `yolo <mode> key=value ...` accepts the same keywords as the Python
//! `model.train(**kwargs)` / `model.export(**kwargs)` calls, so a settings
//! section maps onto one argument per key.

use crate::domain::error::{AppError, Result};
use crate::domain::settings::SettingsMap;
use crate::infrastructure::process::ToolInvocation;
use serde_json::Value;
use std::path::Path;

pub struct YoloCli {
    program: String,
}

impl YoloCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn train(&self, settings: &SettingsMap) -> Result<ToolInvocation> {
        Ok(ToolInvocation::new(&self.program)
            .arg("train")
            .args(keyword_args(settings)?))
    }

    /// `weights` and `format` replace any `model`/`format` keys in `settings`.
    pub fn export(
        &self,
        weights: &Path,
        format: &str,
        settings: &SettingsMap,
    ) -> Result<ToolInvocation> {
        let mut rest = settings.clone();
        rest.remove("model");
        rest.remove("format");

        Ok(ToolInvocation::new(&self.program)
            .arg("export")
            .arg(format!("model={}", weights.display()))
            .arg(format!("format={}", format))
            .args(keyword_args(&rest)?))
    }
}

/// One `key=value` argument per entry, sorted by key.
pub fn keyword_args(settings: &SettingsMap) -> Result<Vec<String>> {
    let mut entries: Vec<(&String, &Value)> = settings.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(key, value)| Ok(format!("{}={}", key, render_value(key, value)?)))
        .collect()
}

fn render_value(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(true) => Ok("True".to_string()),
        Value::Bool(false) => Ok("False".to_string()),
        Value::Null => Ok("None".to_string()),
        Value::Array(_) => Ok(value.to_string()),
        Value::Object(_) => Err(AppError::ValidationError(format!(
            "Setting '{}' is an object and cannot be passed as a keyword argument",
            key
        ))),
    }
}
