use crate::error::ImportError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Top-level keys that never name a legacy implicit service.
pub const RESERVED_TOP_LEVEL_KEYS: [&str; 7] = [
    "version", "services", "volumes", "networks", "configs", "secrets", "name",
];

/// The closed set of schema versions a manifest is normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComposeVersion {
    #[serde(rename = "1")]
    V1,
    #[serde(rename = "2")]
    V2,
    #[serde(rename = "3")]
    V3,
    #[default]
    #[serde(rename = "latest")]
    Latest,
}

impl ComposeVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComposeVersion::V1 => "1",
            ComposeVersion::V2 => "2",
            ComposeVersion::V3 => "3",
            ComposeVersion::Latest => "latest",
        }
    }

    fn from_major(major: &str) -> Option<Self> {
        match major {
            "1" => Some(ComposeVersion::V1),
            "2" => Some(ComposeVersion::V2),
            "3" => Some(ComposeVersion::V3),
            _ => None,
        }
    }

    /// Normalizes a version marker such as `"3.8"`, `"latest (spec)"` or `2`.
    pub fn parse_marker(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number
                .as_f64()
                .map(|v| v.trunc() as i64)
                .and_then(|major| Self::from_major(&major.to_string())),
            Value::String(text) => Self::parse_str(text),
            _ => None,
        }
    }

    pub fn parse_str(text: &str) -> Option<Self> {
        let normalized = text.trim().to_lowercase();
        match normalized.as_str() {
            "latest" | "latest (spec)" | "spec" | "compose-spec" => Some(ComposeVersion::Latest),
            other => Self::from_major(other.split('.').next().unwrap_or_default()),
        }
    }
}

impl fmt::Display for ComposeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The text format a manifest is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestFormat {
    /// Parse as YAML, which also accepts JSON documents.
    #[default]
    Auto,
    Yaml,
    Json,
}

/// Parses manifest text into its top-level mapping.
///
/// A top-level sequence contributes its first element.
pub fn parse_document(
    text: &str,
    format: ManifestFormat,
) -> Result<Map<String, Value>, ImportError> {
    let value: Value = match format {
        ManifestFormat::Json => {
            serde_json::from_str(text).map_err(|e| ImportError::Parse(e.to_string()))?
        }
        ManifestFormat::Auto | ManifestFormat::Yaml => {
            serde_yaml::from_str(text).map_err(|e| ImportError::Parse(e.to_string()))?
        }
    };
    root_mapping(value)
}

pub fn root_mapping(value: Value) -> Result<Map<String, Value>, ImportError> {
    let value = match value {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ImportError::NotAMapping(kind_of(&other))),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Reads a top-level section. Missing or empty sections are empty mappings.
pub fn section(root: &Map<String, Value>, name: &str) -> Result<Map<String, Value>, ImportError> {
    match root.get(name) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(ImportError::InvalidSection {
            section: name.to_string(),
            found: kind_of(other),
        }),
    }
}

/// Collects the implicit services of a legacy document: every mapping-valued key that is
/// neither reserved nor an `x-` extension.
pub fn legacy_services(root: &Map<String, Value>) -> Map<String, Value> {
    root.iter()
        .filter(|(key, value)| {
            !RESERVED_TOP_LEVEL_KEYS.contains(&key.as_str())
                && !key.starts_with("x-")
                && value.is_object()
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(_) => true,
    }
}

/// Detects the schema version of a document.
///
/// An explicit marker wins. A document with no `version` and no `services` but with
/// implicit services is a legacy version 1 file. Anything else is `latest`.
pub fn detect_version(root: &Map<String, Value>, legacy_service_count: usize) -> ComposeVersion {
    if let Some(version) = root.get("version").and_then(ComposeVersion::parse_marker) {
        return version;
    }
    if !is_truthy(root.get("version"))
        && !is_truthy(root.get("services"))
        && legacy_service_count > 0
    {
        return ComposeVersion::V1;
    }
    ComposeVersion::Latest
}
