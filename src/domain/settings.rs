//! Settings documents and section resolution.
//!
//! A settings document is a JSON object whose values are forwarded to an
//! external tool without interpretation. Some entry points read a named
//! sub-object (`train`, `export`); how a missing section is handled is chosen
//! explicitly by the caller through [`SectionPolicy`].

use crate::domain::error::{AppError, Result};
use serde_json::{Map, Value};

pub type SettingsMap = Map<String, Value>;

pub const TRAIN_SECTION: &str = "train";
pub const EXPORT_SECTION: &str = "export";

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDocument {
    root: SettingsMap,
}

/// What to do when the requested section key is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPolicy {
    /// Absence is an error (`MissingSection`).
    Required,
    /// Absence yields the whole document, unchanged.
    FallbackToDocument,
}

/// The outcome of a resolution, so callers can report which branch applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedSection {
    Section(SettingsMap),
    WholeDocument(SettingsMap),
}

impl ResolvedSection {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ResolvedSection::WholeDocument(_))
    }

    pub fn into_map(self) -> SettingsMap {
        match self {
            ResolvedSection::Section(map) | ResolvedSection::WholeDocument(map) => map,
        }
    }
}

impl SettingsDocument {
    pub fn new(root: SettingsMap) -> Self {
        Self { root }
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(AppError::ParseError(format!(
                "Settings document must be a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn root(&self) -> &SettingsMap {
        &self.root
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    pub fn section(&self, key: &str, policy: SectionPolicy) -> Result<ResolvedSection> {
        match self.optional_section(key)? {
            Some(map) => Ok(ResolvedSection::Section(map)),
            None => match policy {
                SectionPolicy::Required => Err(AppError::MissingSection(key.to_string())),
                SectionPolicy::FallbackToDocument => {
                    Ok(ResolvedSection::WholeDocument(self.root.clone()))
                }
            },
        }
    }

    pub fn optional_section(&self, key: &str) -> Result<Option<SettingsMap>> {
        match self.root.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            Some(other) => Err(AppError::ValidationError(format!(
                "Section '{}' must be a JSON object, found {}",
                key,
                json_kind(other)
            ))),
        }
    }
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
