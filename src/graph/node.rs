use super::key::attach_unique_suffix;
use crate::endpoint::Anchors;
use crate::library::{NodeLibrary, NodeType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A type-specific configuration payload. Opaque to the graph, owned by the editing forms.
pub type ConfigMap = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

impl Position {
    pub fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

/// Decorative metadata. `node_name` is the name used for manifest identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub node_icon: String,
}

/// The configuration payload, tagged by node type.
///
/// Flattened into [`Node`] this produces `"type": "SERVICE", "serviceConfig": {...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeConfig {
    Service {
        #[serde(rename = "serviceConfig", default)]
        config: ConfigMap,
    },
    Volume {
        #[serde(rename = "volumeConfig", default)]
        config: ConfigMap,
    },
    Network {
        #[serde(rename = "networkConfig", default)]
        config: ConfigMap,
    },
}

impl NodeConfig {
    pub fn new(node_type: NodeType, config: ConfigMap) -> Self {
        match node_type {
            NodeType::Service => NodeConfig::Service { config },
            NodeType::Volume => NodeConfig::Volume { config },
            NodeType::Network => NodeConfig::Network { config },
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeConfig::Service { .. } => NodeType::Service,
            NodeConfig::Volume { .. } => NodeType::Volume,
            NodeConfig::Network { .. } => NodeType::Network,
        }
    }

    pub fn map(&self) -> &ConfigMap {
        match self {
            NodeConfig::Service { config }
            | NodeConfig::Volume { config }
            | NodeConfig::Network { config } => config,
        }
    }

    pub fn map_mut(&mut self) -> &mut ConfigMap {
        match self {
            NodeConfig::Service { config }
            | NodeConfig::Volume { config }
            | NodeConfig::Network { config } => config,
        }
    }
}

/// A diagram entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub key: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub canvas_config: CanvasConfig,
    #[serde(flatten)]
    pub config: NodeConfig,
}

impl Node {
    /// Creates a node with a freshly generated key and anchors sized from the library.
    pub fn create(
        library: &NodeLibrary,
        node_type: NodeType,
        name: impl Into<String>,
        position: Position,
        config: ConfigMap,
    ) -> Self {
        let key = attach_unique_suffix(node_type.key_stem());
        let mut node = Self {
            key,
            position,
            inputs: Vec::new(),
            outputs: Vec::new(),
            canvas_config: CanvasConfig {
                node_name: name.into(),
                node_icon: node_type.default_icon().to_string(),
            },
            config: NodeConfig::new(node_type, config),
        };
        node.refresh_anchors(library);
        node
    }

    pub fn node_type(&self) -> NodeType {
        self.config.node_type()
    }

    /// The human-readable name: the canvas name, then the payload's `name`, then the key.
    pub fn name(&self) -> &str {
        if !self.canvas_config.node_name.is_empty() {
            return &self.canvas_config.node_name;
        }
        match self.config.map().get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name,
            _ => &self.key,
        }
    }

    pub fn config(&self) -> &ConfigMap {
        self.config.map()
    }

    pub fn config_mut(&mut self) -> &mut ConfigMap {
        self.config.map_mut()
    }

    /// Recomputes `inputs` and `outputs` from the key and the library's arity.
    pub fn refresh_anchors(&mut self, library: &NodeLibrary) {
        let anchors = Anchors::for_node(&self.key, library.ensure(self.node_type()));
        self.inputs = anchors.inputs;
        self.outputs = anchors.outputs;
    }

    pub fn accepts_inputs(&self) -> bool {
        !self.inputs.is_empty()
    }
}
