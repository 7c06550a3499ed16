//! Keeps service configuration in step with the edges drawn between nodes.
//!
//! An edge always points from provider to consumer: `db -> web` means `web` depends on
//! `db`, and `data -> web` means `web` mounts the volume `data`.

use crate::graph::{Connection, Graph};
use crate::library::NodeType;
use crate::manifest::mount::volume_source;
use crate::manifest::normalize::NamedEntries;
use serde_json::{Value, json};
use tracing::debug;

const DEFAULT_CONDITION: &str = "service_healthy";

/// Which configuration edit a connection implies.
enum Relation {
    DependsOn { provider: String, consumer: String },
    Mount { volume: String, consumer: String },
}

fn relation(graph: &Graph, connection: &Connection) -> Option<Relation> {
    let source = graph.node(connection.source())?;
    let target = graph.node(connection.target())?;
    match (source.node_type(), target.node_type()) {
        (NodeType::Service, NodeType::Service) => Some(Relation::DependsOn {
            provider: source.name().to_string(),
            consumer: target.key.clone(),
        }),
        (NodeType::Volume, NodeType::Service) => Some(Relation::Mount {
            volume: source.name().to_string(),
            consumer: target.key.clone(),
        }),
        _ => None,
    }
}

/// Records a newly attached connection in the consumer's configuration.
pub(crate) fn apply_attached(graph: &mut Graph, connection: &Connection) {
    match relation(graph, connection) {
        Some(Relation::DependsOn { provider, consumer }) => {
            let Some(config) = graph.config_mut(&consumer) else {
                return;
            };
            let slot = config.entry("depends_on").or_insert(Value::Null);
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            match slot {
                Value::Array(names) => {
                    if !names.iter().any(|n| n.as_str() == Some(provider.as_str())) {
                        names.push(Value::String(provider));
                    }
                }
                Value::Object(conditions) => {
                    conditions
                        .entry(provider)
                        .or_insert_with(|| json!({ "condition": DEFAULT_CONDITION }));
                }
                other => debug!(?other, "Leaving unrecognized depends_on untouched"),
            }
        }
        Some(Relation::Mount { volume, consumer }) => {
            let Some(config) = graph.config_mut(&consumer) else {
                return;
            };
            let slot = config.entry("volumes").or_insert(Value::Null);
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            let Value::Array(mounts) = slot else {
                debug!(service = %consumer, "Leaving unrecognized volumes untouched");
                return;
            };
            if !mounts.iter().any(|mount| mounts_volume(&consumer, mount, &volume)) {
                mounts.push(Value::String(volume));
            }
        }
        None => {}
    }
}

fn mounts_volume(service: &str, mount: &Value, volume: &str) -> bool {
    matches!(volume_source(service, mount), Ok(Some(name)) if name == volume)
}

/// Removes a detached connection from the consumer's configuration, deleting the field
/// when nothing is left in it.
pub(crate) fn apply_detached(graph: &mut Graph, connection: &Connection) {
    match relation(graph, connection) {
        Some(Relation::DependsOn { provider, consumer }) => {
            let Some(config) = graph.config_mut(&consumer) else {
                return;
            };
            let now_empty = match config.get_mut("depends_on") {
                Some(Value::Array(names)) => {
                    names.retain(|n| n.as_str() != Some(provider.as_str()));
                    names.is_empty()
                }
                Some(Value::Object(conditions)) => {
                    conditions.shift_remove(&provider);
                    conditions.is_empty()
                }
                _ => false,
            };
            if now_empty {
                config.shift_remove("depends_on");
            }
        }
        Some(Relation::Mount { volume, consumer }) => {
            let Some(config) = graph.config_mut(&consumer) else {
                return;
            };
            let now_empty = match config.get_mut("volumes") {
                Some(Value::Array(mounts)) => {
                    mounts.retain(|mount| !mounts_volume(&consumer, mount, &volume));
                    mounts.is_empty()
                }
                _ => false,
            };
            if now_empty {
                config.shift_remove("volumes");
            }
        }
        None => {}
    }
}

/// The providers a service configuration names, resolved to node keys.
pub(crate) fn derived_incoming(graph: &Graph, consumer_key: &str) -> Vec<Connection> {
    let Some(consumer) = graph.node(consumer_key) else {
        return Vec::new();
    };
    if consumer.node_type() != NodeType::Service {
        return Vec::new();
    }
    let config = consumer.config();
    let dependencies = NamedEntries::names(config.get("depends_on"));
    let mounts = config
        .get("volumes")
        .and_then(Value::as_array)
        .map(|mounts| {
            mounts
                .iter()
                .filter_map(|mount| volume_source(consumer.name(), mount).ok().flatten())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let providers = dependencies
        .names_iter()
        .filter_map(|name| graph.node_by_name(NodeType::Service, name))
        .chain(
            mounts
                .iter()
                .filter_map(|name| graph.node_by_name(NodeType::Volume, name)),
        );

    let mut connections: Vec<Connection> = Vec::new();
    for provider in providers {
        let connection = Connection::new(provider.key.clone(), consumer_key);
        if !connections.contains(&connection) {
            connections.push(connection);
        }
    }
    connections
}
