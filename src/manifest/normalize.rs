use super::mount::{validate_ports, volume_sources};
use crate::error::ImportError;
use crate::graph::ConfigMap;
use serde_json::Value;

/// One canonical shape for manifest fields that may be written either as a list or as a
/// name-keyed mapping (`depends_on`, `labels`, `environment`).
///
/// Entries keep document order. A list entry without a value maps to `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedEntries(Vec<(String, Option<Value>)>);

impl NamedEntries {
    /// Normalizes a field whose list form holds bare names, such as `depends_on`.
    pub fn names(value: Option<&Value>) -> Self {
        Self::collect(value, |item| (item.trim().to_string(), None))
    }

    /// Normalizes a field whose list form holds `KEY=VALUE` strings, such as `labels`.
    pub fn pairs(value: Option<&Value>) -> Self {
        Self::collect(value, |item| match item.split_once('=') {
            Some((key, value)) => (
                key.trim().to_string(),
                Some(Value::String(value.to_string())),
            ),
            None => (item.trim().to_string(), None),
        })
    }

    fn collect(
        value: Option<&Value>,
        from_item: impl Fn(&str) -> (String, Option<Value>),
    ) -> Self {
        let mut entries: Vec<(String, Option<Value>)> = Vec::new();
        let mut push = |name: String, value: Option<Value>| {
            if !name.is_empty() && !entries.iter().any(|(existing, _)| *existing == name) {
                entries.push((name, value));
            }
        };

        match value {
            Some(Value::Array(items)) => {
                for item in items.iter().filter_map(Value::as_str) {
                    let (name, value) = from_item(item);
                    push(name, value);
                }
            }
            Some(Value::Object(map)) => {
                for (name, value) in map {
                    push(name.clone(), (!value.is_null()).then(|| value.clone()));
                }
            }
            _ => {}
        }
        Self(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    pub fn names_iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(existing, _)| existing == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A service configuration with every loosely shaped field normalized and validated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedService {
    pub depends_on: NamedEntries,
    pub labels: NamedEntries,
    pub environment: NamedEntries,
    /// Named volumes the service mounts, without bind mounts or host paths.
    pub volumes: Vec<String>,
}

impl NormalizedService {
    pub fn from_config(service: &str, config: &ConfigMap) -> Result<Self, ImportError> {
        validate_ports(service, config.get("ports"))?;
        Ok(Self {
            depends_on: NamedEntries::names(config.get("depends_on")),
            labels: NamedEntries::pairs(config.get("labels")),
            environment: NamedEntries::pairs(config.get("environment")),
            volumes: volume_sources(service, config.get("volumes"))?,
        })
    }
}
