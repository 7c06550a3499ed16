use super::dialect::{
    ComposeVersion, ManifestFormat, detect_version, legacy_services, parse_document, section,
};
use super::normalize::NormalizedService;
use crate::error::ImportError;
use crate::graph::{CanvasConfig, ConfigMap, Connection, Graph, Node, NodeConfig, Position};
use crate::library::{NodeLibrary, NodeType};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use itertools::Itertools;
use tracing::{debug, info, instrument, warn};

/// Automatic placement of newly created nodes on a fixed-column grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub columns: usize,
    pub origin_left: f64,
    pub origin_top: f64,
    pub column_pitch: f64,
    pub row_pitch: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 3,
            origin_left: 100.0,
            origin_top: 100.0,
            column_pitch: 280.0,
            row_pitch: 180.0,
        }
    }
}

impl GridLayout {
    pub fn position(&self, index: usize) -> Position {
        let columns = self.columns.max(1);
        Position {
            left: self.origin_left + (index % columns) as f64 * self.column_pitch,
            top: self.origin_top + (index / columns) as f64 * self.row_pitch,
        }
    }
}

/// The graph materialized from one manifest document.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedGraph {
    pub version: ComposeVersion,
    pub graph: Graph,
}

/// Converts manifest documents into graphs, reusing the identity of nodes that already
/// exist under the same name.
pub struct Importer<'a> {
    library: &'a NodeLibrary,
    layout: GridLayout,
}

impl<'a> Importer<'a> {
    pub fn new(library: &'a NodeLibrary) -> Self {
        Self {
            library,
            layout: GridLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Parses manifest text and imports it against `existing`.
    pub fn import_str(
        &self,
        text: &str,
        format: ManifestFormat,
        existing: &Graph,
    ) -> Result<ImportedGraph, ImportError> {
        let root = parse_document(text, format)?;
        self.import_document(&root, existing)
    }

    /// Imports a parsed document. Nothing in `existing` is modified; on error no graph is
    /// produced at all.
    #[instrument(level = "debug", skip_all, fields(existing_nodes = existing.nodes().len()))]
    pub fn import_document(
        &self,
        root: &Map<String, Value>,
        existing: &Graph,
    ) -> Result<ImportedGraph, ImportError> {
        let services = if root.contains_key("services") {
            section(root, "services")?
        } else {
            legacy_services(root)
        };
        let volumes = section(root, "volumes")?;
        let networks = section(root, "networks")?;
        let version = detect_version(root, services.len());

        // Validate every service before anything is built.
        let normalized = services
            .iter()
            .map(|(name, raw)| NormalizedService::from_config(name, &as_config(raw)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut graph = Graph::new();
        let mut service_keys: AHashMap<&str, String> = AHashMap::new();
        let mut volume_keys: AHashMap<&str, String> = AHashMap::new();
        let mut next_slot = 0usize;

        for (name, raw) in &services {
            let node = self.materialize(
                existing,
                NodeType::Service,
                name,
                as_config(raw),
                &mut next_slot,
            );
            service_keys.insert(name.as_str(), node.key.clone());
            graph.insert_node(node);
        }

        for (name, raw) in &volumes {
            let config = with_default_name(existing, NodeType::Volume, name, as_config(raw));
            let node = self.materialize(existing, NodeType::Volume, name, config, &mut next_slot);
            volume_keys.insert(name.as_str(), node.key.clone());
            graph.insert_node(node);
        }

        for ((name, _), service) in services.iter().zip(&normalized) {
            let Some(service_key) = service_keys.get(name.as_str()) else {
                continue;
            };
            let unresolved = service
                .depends_on
                .names_iter()
                .filter(|dependency| !service_keys.contains_key(dependency))
                .join(", ");
            if !unresolved.is_empty() {
                debug!(service = %name, %unresolved, "Dependencies without a matching service");
            }
            let dependencies = service
                .depends_on
                .names_iter()
                .filter_map(|dependency| service_keys.get(dependency));
            let mounts = service
                .volumes
                .iter()
                .filter_map(|volume| volume_keys.get(volume.as_str()));

            for source_key in dependencies.chain(mounts) {
                let connection = Connection::new(source_key.clone(), service_key.clone());
                if graph.contains_connection(&connection) {
                    continue;
                }
                if let Err(violation) = graph.connect(connection) {
                    warn!(service = %name, %violation, "Skipping inferred connection");
                }
            }
        }

        for (name, raw) in &networks {
            let config = with_default_name(existing, NodeType::Network, name, as_config(raw));
            let node = match existing.node_by_name(NodeType::Network, name) {
                Some(previous) => self.reuse(previous, NodeType::Network, name, config),
                None => Node::create(
                    self.library,
                    NodeType::Network,
                    name.as_str(),
                    Position::default(),
                    config,
                ),
            };
            graph.insert_node(node);
        }

        info!(
            %version,
            services = services.len(),
            volumes = volumes.len(),
            networks = networks.len(),
            connections = graph.connections().len(),
            "Imported manifest"
        );

        Ok(ImportedGraph { version, graph })
    }

    /// Reuses the existing node of the same name or creates one on the next grid slot.
    fn materialize(
        &self,
        existing: &Graph,
        node_type: NodeType,
        name: &str,
        config: ConfigMap,
        next_slot: &mut usize,
    ) -> Node {
        match existing.node_by_name(node_type, name) {
            Some(previous) => self.reuse(previous, node_type, name, config),
            None => {
                let position = self.layout.position(*next_slot);
                *next_slot += 1;
                Node::create(self.library, node_type, name, position, config)
            }
        }
    }

    /// Keeps key, position and icon of `previous`, replacing only its payload.
    fn reuse(&self, previous: &Node, node_type: NodeType, name: &str, config: ConfigMap) -> Node {
        let mut node = Node {
            key: previous.key.clone(),
            position: previous.position,
            inputs: Vec::new(),
            outputs: Vec::new(),
            canvas_config: CanvasConfig {
                node_name: name.to_string(),
                node_icon: previous.canvas_config.node_icon.clone(),
            },
            config: NodeConfig::new(node_type, config),
        };
        node.refresh_anchors(self.library);
        node
    }
}

fn as_config(raw: &Value) -> ConfigMap {
    match raw {
        Value::Object(map) => map.clone(),
        _ => ConfigMap::new(),
    }
}

/// Volumes and networks always carry a `name`: the document's, else the existing
/// node's, else the entry name.
fn with_default_name(
    existing: &Graph,
    node_type: NodeType,
    name: &str,
    mut config: ConfigMap,
) -> ConfigMap {
    let has_name = config.get("name").is_some_and(|v| !v.is_null());
    if !has_name {
        let fallback = existing
            .node_by_name(node_type, name)
            .and_then(|node| node.config().get("name"))
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::String(name.to_string()));
        config.insert("name".to_string(), fallback);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_positions() {
        let layout = GridLayout::default();
        assert_eq!(layout.position(0), Position::new(100.0, 100.0));
        assert_eq!(layout.position(2), Position::new(660.0, 100.0));
        assert_eq!(layout.position(4), Position::new(380.0, 280.0));
    }
}
