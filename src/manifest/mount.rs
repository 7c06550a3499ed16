use crate::error::ImportError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const MOUNT_TYPES: [&str; 5] = ["volume", "bind", "tmpfs", "npipe", "cluster"];
const PORT_PROTOCOLS: [&str; 2] = ["tcp", "udp"];
const ACCESS_MODES: [&str; 14] = [
    "ro", "rw", "z", "Z", "cached", "delegated", "consistent", "nocopy", "shared", "slave",
    "private", "rshared", "rslave", "rprivate",
];
const CONSISTENCIES: [&str; 4] = ["consistent", "cached", "delegated", "default"];

static DRIVE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]:[\\/]").expect("drive letter pattern compiles"));

fn is_host_path(source: &str) -> bool {
    source.starts_with('/')
        || source.starts_with('.')
        || source.starts_with('~')
        || DRIVE_LETTER.is_match(source)
}

fn invalid_access_mode(service: &str, mode: impl Into<String>) -> ImportError {
    ImportError::InvalidAccessMode {
        service: service.to_string(),
        mode: mode.into(),
    }
}

/// Checks the comma-separated mode field of a short-form mount (`ro`, `rw,z`, ...).
fn validate_access_mode(service: &str, mode: &str) -> Result<(), ImportError> {
    if mode.split(',').all(|flag| ACCESS_MODES.contains(&flag.trim())) {
        Ok(())
    } else {
        Err(invalid_access_mode(service, mode))
    }
}

/// Long-form mounts spell the access mode as a boolean `read_only` and an optional
/// `consistency`.
fn validate_long_access(
    service: &str,
    long: &serde_json::Map<String, Value>,
) -> Result<(), ImportError> {
    match long.get("read_only") {
        None | Some(Value::Bool(_)) | Some(Value::Null) => {}
        Some(other) => return Err(invalid_access_mode(service, other.to_string())),
    }
    match long.get("consistency") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(c)) if CONSISTENCIES.contains(&c.as_str()) => Ok(()),
        Some(Value::String(c)) => Err(invalid_access_mode(service, c.clone())),
        Some(other) => Err(invalid_access_mode(service, other.to_string())),
    }
}

/// Extracts the named volume a service mount refers to.
///
/// Short form is `name[:containerPath[:mode]]`; long form is a mapping with `type` and
/// `source`. Bind mounts, host paths and anonymous volumes yield `None`. A long-form
/// `type` outside the known mount types, or an unknown access mode in either form, is
/// an error.
pub fn volume_source(service: &str, mount: &Value) -> Result<Option<String>, ImportError> {
    match mount {
        Value::String(spec) => {
            if DRIVE_LETTER.is_match(spec.trim()) {
                return Ok(None);
            }
            let mut fields = spec.splitn(3, ':');
            let source = fields.next().unwrap_or_default().trim();
            if let Some(mode) = fields.nth(1).map(str::trim).filter(|m| !m.is_empty()) {
                validate_access_mode(service, mode)?;
            }
            if source.is_empty() || is_host_path(source) {
                return Ok(None);
            }
            Ok(Some(source.to_string()))
        }
        Value::Object(long) => {
            let mount_type = match long.get("type") {
                Some(Value::String(t)) => {
                    let lowered = t.to_lowercase();
                    if !MOUNT_TYPES.contains(&lowered.as_str()) {
                        return Err(ImportError::InvalidMountType {
                            service: service.to_string(),
                            mount_type: t.clone(),
                        });
                    }
                    Some(lowered)
                }
                _ => None,
            };
            validate_long_access(service, long)?;
            if mount_type.as_deref().is_some_and(|t| t != "volume") {
                return Ok(None);
            }
            match long.get("source").and_then(Value::as_str).map(str::trim) {
                Some(source) if !source.is_empty() => Ok(Some(source.to_string())),
                _ => Ok(None),
            }
        }
        _ => Ok(None),
    }
}

/// Collects the distinct named volumes a service mounts, in document order.
pub fn volume_sources(
    service: &str,
    volumes: Option<&Value>,
) -> Result<Vec<String>, ImportError> {
    let Some(Value::Array(mounts)) = volumes else {
        return Ok(Vec::new());
    };
    let mut names = Vec::new();
    for mount in mounts {
        if let Some(name) = volume_source(service, mount)? {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

/// Rejects port mappings whose protocol is not one of the recognized transports.
pub fn validate_ports(service: &str, ports: Option<&Value>) -> Result<(), ImportError> {
    let Some(Value::Array(ports)) = ports else {
        return Ok(());
    };
    for port in ports {
        let (text, protocol) = match port {
            Value::String(spec) => match spec.rsplit_once('/') {
                Some((_, protocol)) => (spec.clone(), protocol.to_string()),
                None => continue,
            },
            Value::Object(long) => match long.get("protocol").and_then(Value::as_str) {
                Some(protocol) => (
                    Value::Object(long.clone()).to_string(),
                    protocol.to_string(),
                ),
                None => continue,
            },
            _ => continue,
        };
        if !protocol.is_empty() && !PORT_PROTOCOLS.contains(&protocol.as_str()) {
            return Err(ImportError::InvalidPortProtocol {
                service: service.to_string(),
                port: text,
                protocol,
            });
        }
    }
    Ok(())
}
