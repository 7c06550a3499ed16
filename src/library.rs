//! The node-type library: a closed registry of the node types a diagram can hold and the
//! number of input and output anchors each one declares.

use crate::error::LibraryError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of node kinds a diagram can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Service,
    Volume,
    Network,
}

impl NodeType {
    pub const ALL: [NodeType; 3] = [NodeType::Service, NodeType::Volume, NodeType::Network];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Service => "SERVICE",
            NodeType::Volume => "VOLUME",
            NodeType::Network => "NETWORK",
        }
    }

    /// Short lowercase stem used when generating node keys (`service-<uuid>`).
    pub fn key_stem(&self) -> &'static str {
        match self {
            NodeType::Service => "service",
            NodeType::Volume => "volume",
            NodeType::Network => "network",
        }
    }

    /// Icon assigned to freshly created nodes of this type.
    pub fn default_icon(&self) -> &'static str {
        match self {
            NodeType::Service => "",
            NodeType::Volume => "volume",
            NodeType::Network => "network",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_active() -> bool {
    true
}

/// A single library entry describing one node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLibraryItem {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "NoInputs")]
    pub no_inputs: u32,
    #[serde(alias = "NoOutputs")]
    pub no_outputs: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeGroup {
    node_types: Vec<NodeLibraryItem>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LibraryDocument {
    Grouped(Vec<NodeGroup>),
    Flat(Vec<NodeLibraryItem>),
}

/// Registry mapping each [`NodeType`] to its library entry.
#[derive(Debug, Clone)]
pub struct NodeLibrary {
    items: AHashMap<NodeType, NodeLibraryItem>,
}

impl Default for NodeLibrary {
    fn default() -> Self {
        let items = [
            NodeLibraryItem {
                id: 1,
                name: "Service".to_string(),
                node_type: NodeType::Service,
                description: "A container service".to_string(),
                no_inputs: 1,
                no_outputs: 1,
                is_active: true,
            },
            NodeLibraryItem {
                id: 2,
                name: "Volume".to_string(),
                node_type: NodeType::Volume,
                description: "A named volume mounted into services".to_string(),
                no_inputs: 0,
                no_outputs: 1,
                is_active: true,
            },
            NodeLibraryItem {
                id: 3,
                name: "Network".to_string(),
                node_type: NodeType::Network,
                description: "A network shared between services".to_string(),
                no_inputs: 0,
                no_outputs: 0,
                is_active: true,
            },
        ];

        Self {
            items: items
                .into_iter()
                .map(|item| (item.node_type, item))
                .collect(),
        }
    }
}

impl NodeLibrary {
    /// Loads a library from JSON, either a flat list of entries or a list of groups
    /// (`[{ "name": ..., "nodeTypes": [...] }]`).
    ///
    /// Every [`NodeType`] must be present, so [`NodeLibrary::ensure`] never fails on a
    /// library built here.
    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        let document: LibraryDocument =
            serde_json::from_str(json).map_err(|e| LibraryError::Parse(e.to_string()))?;

        let entries = match document {
            LibraryDocument::Grouped(groups) => groups
                .into_iter()
                .flat_map(|group| group.node_types)
                .collect::<Vec<_>>(),
            LibraryDocument::Flat(items) => items,
        };

        let mut items = AHashMap::new();
        for item in entries {
            if item.node_type == NodeType::Volume && item.no_inputs > 0 {
                return Err(LibraryError::InvalidArity {
                    node_type: item.node_type,
                    inputs: item.no_inputs,
                });
            }
            items.entry(item.node_type).or_insert(item);
        }

        if let Some(missing) = NodeType::ALL.iter().find(|t| !items.contains_key(*t)) {
            return Err(LibraryError::MissingType(*missing));
        }

        Ok(Self { items })
    }

    pub fn get(&self, node_type: NodeType) -> Option<&NodeLibraryItem> {
        self.items.get(&node_type)
    }

    /// Returns the entry for a node type that must be registered.
    ///
    /// # Panics
    ///
    /// Panics if the type is missing. Both constructors guarantee all types are present,
    /// so a miss means the registry was corrupted.
    pub fn ensure(&self, node_type: NodeType) -> &NodeLibraryItem {
        self.get(node_type).unwrap_or_else(|| {
            panic!("This value was promised to be there: node type '{node_type}' is not registered")
        })
    }
}
