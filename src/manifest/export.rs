use super::dialect::ComposeVersion;
use crate::graph::{ConfigMap, Graph};
use crate::library::NodeType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// The payload the generation service turns into manifest text.
///
/// Entities are keyed by their human-readable names, never by node keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratePayload {
    pub version: ComposeVersion,
    #[serde(default)]
    pub services: IndexMap<String, ConfigMap>,
    #[serde(default)]
    pub volumes: IndexMap<String, ConfigMap>,
    #[serde(default)]
    pub networks: IndexMap<String, ConfigMap>,
}

/// Projects a graph into a [`GeneratePayload`].
#[instrument(level = "debug", skip(graph), fields(nodes = graph.nodes().len()))]
pub fn export(graph: &Graph, version: ComposeVersion) -> GeneratePayload {
    let mut payload = GeneratePayload {
        version,
        ..GeneratePayload::default()
    };
    for node in graph.nodes().values().chain(graph.networks().values()) {
        let target = match node.node_type() {
            NodeType::Service => &mut payload.services,
            NodeType::Volume => &mut payload.volumes,
            NodeType::Network => &mut payload.networks,
        };
        if target
            .insert(node.name().to_string(), node.config().clone())
            .is_some()
        {
            warn!(name = node.name(), node_type = %node.node_type(), key = %node.key,
                "Duplicate name in export; the later node replaces the earlier one");
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Node, Position};
    use crate::library::NodeLibrary;
    use serde_json::json;

    #[test]
    fn test_payload_is_keyed_by_name() {
        let library = NodeLibrary::default();
        let mut graph = Graph::new();
        let config = json!({"image": "nginx"}).as_object().cloned().unwrap();
        let web = Node::create(&library, NodeType::Service, "web", Position::default(), config);
        let key = web.key.clone();
        graph.insert_node(web);

        let payload = export(&graph, ComposeVersion::V3);
        assert_eq!(payload.services.len(), 1);
        assert_eq!(payload.services["web"]["image"], "nginx");
        assert!(!payload.services.contains_key(&key));

        let wire = serde_json::to_value(&payload).unwrap();
        assert_eq!(wire["version"], "3");
        assert_eq!(wire["volumes"], json!({}));
    }
}
