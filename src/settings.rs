//! Runtime settings: JSON file first, `STACKGRAPH_*` environment variables on top.

use crate::error::SettingsError;
use crate::manifest::{ComposeVersion, GridLayout};
use crate::project::DEFAULT_AUTOSAVE_DELAY;
use crate::regen::{DEFAULT_DEBOUNCE, ManifestDialect, PipelineOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_PREFIX: &str = "STACKGRAPH_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub debounce_ms: u64,
    pub autosave_ms: u64,
    pub generator_url: String,
    pub request_timeout_secs: u64,
    pub dialect: ManifestDialect,
    pub version: ComposeVersion,
    pub layout: GridLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            autosave_ms: DEFAULT_AUTOSAVE_DELAY.as_millis() as u64,
            generator_url: "http://localhost:9001".to_string(),
            request_timeout_secs: 15,
            dialect: ManifestDialect::DockerCompose,
            version: ComposeVersion::Latest,
            layout: GridLayout::default(),
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Overrides fields from `STACKGRAPH_*` process environment variables.
    pub fn apply_env(self) -> Result<Self, SettingsError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Overrides fields from an arbitrary variable lookup.
    pub fn apply_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let get = |name: &str| {
            let var = format!("{ENV_PREFIX}{name}");
            lookup(&var).map(|value| (var, value))
        };

        if let Some((var, value)) = get("DEBOUNCE_MS") {
            self.debounce_ms = parse_number(&var, &value)?;
        }
        if let Some((var, value)) = get("AUTOSAVE_MS") {
            self.autosave_ms = parse_number(&var, &value)?;
        }
        if let Some((_, value)) = get("GENERATOR_URL") {
            self.generator_url = value;
        }
        if let Some((var, value)) = get("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number(&var, &value)?;
        }
        if let Some((var, value)) = get("DIALECT") {
            self.dialect =
                ManifestDialect::parse_str(&value).ok_or(SettingsError::InvalidEnv { var, value })?;
        }
        if let Some((var, value)) = get("VERSION") {
            self.version =
                ComposeVersion::parse_str(&value).ok_or(SettingsError::InvalidEnv { var, value })?;
        }
        Ok(self)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions::default()
            .with_debounce(self.debounce())
            .with_dialect(self.dialect)
    }
}

fn parse_number<T: FromStr>(var: &str, value: &str) -> Result<T, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}
