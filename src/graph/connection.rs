use crate::endpoint::node_key_from_anchor;
use crate::library::NodeType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A directed edge between two nodes, stored as `(source_key, target_key)`.
///
/// Serializes as a two-element array, the shape the persisted canvas uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Connection(pub String, pub String);

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self(source.into(), target.into())
    }

    /// Normalizes a pair of anchor ids to the keys of the nodes that own them.
    pub fn from_anchors(source_anchor: &str, target_anchor: &str) -> Self {
        Self::new(
            node_key_from_anchor(source_anchor),
            node_key_from_anchor(target_anchor),
        )
    }

    pub fn source(&self) -> &str {
        &self.0
    }

    pub fn target(&self) -> &str {
        &self.1
    }

    pub fn reversed(&self) -> Self {
        Self(self.1.clone(), self.0.clone())
    }

    pub fn touches(&self, key: &str) -> bool {
        self.0 == key || self.1 == key
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.0, self.1)
    }
}

/// How a connection is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStyle {
    Default,
    /// A volume mounted into a service.
    VolumeMount,
}

/// The style of a connection is a pure function of its endpoint node types.
pub fn style_for(source: NodeType, target: NodeType) -> ConnectionStyle {
    match (source, target) {
        (NodeType::Volume, NodeType::Service) => ConnectionStyle::VolumeMount,
        _ => ConnectionStyle::Default,
    }
}
