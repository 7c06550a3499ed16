//! The canonical in-memory graph: nodes addressed by key, the de-duplicated list of
//! connections between them, and the networks that sit beside the diagram.
//!
//! Every mutation is validated before it is committed, so the graph never holds a
//! self-loop, a duplicate edge, a two-node cycle or a dangling connection.

mod connection;
mod key;
mod node;

pub use connection::*;
pub use key::*;
pub use node::*;

use crate::error::TopologyViolation;
use crate::library::{NodeLibrary, NodeType};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    nodes: IndexMap<String, Node>,
    connections: Vec<Connection>,
    networks: IndexMap<String, Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from untrusted parts, such as a loaded project.
    ///
    /// Nodes are filed by type (networks go beside the diagram), their anchors are
    /// recomputed, and any connection that would break an invariant is dropped.
    pub fn from_parts(
        library: &NodeLibrary,
        nodes: impl IntoIterator<Item = Node>,
        connections: impl IntoIterator<Item = Connection>,
        networks: impl IntoIterator<Item = Node>,
    ) -> Self {
        let mut graph = Self::new();
        for mut node in nodes.into_iter().chain(networks) {
            node.refresh_anchors(library);
            graph.insert_node(node);
        }
        for connection in connections {
            if let Err(violation) = graph.connect(connection.clone()) {
                warn!(%connection, %violation, "Dropping invalid connection");
            }
        }
        graph
    }

    pub fn nodes(&self) -> &IndexMap<String, Node> {
        &self.nodes
    }

    pub fn networks(&self) -> &IndexMap<String, Node> {
        &self.networks
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key).or_else(|| self.networks.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.networks.is_empty()
    }

    /// Looks up a diagram node or network by its human-readable name.
    pub fn node_by_name(&self, node_type: NodeType, name: &str) -> Option<&Node> {
        let pool = match node_type {
            NodeType::Network => &self.networks,
            NodeType::Service | NodeType::Volume => &self.nodes,
        };
        pool.values()
            .find(|node| node.node_type() == node_type && node.name() == name)
    }

    pub fn contains_connection(&self, connection: &Connection) -> bool {
        self.connections.contains(connection)
    }

    /// Inserts a node, replacing any node with the same key.
    ///
    /// Replacing a node keeps the connections that are still valid for the new node and
    /// returns the previous one.
    pub fn insert_node(&mut self, node: Node) -> Option<Node> {
        let key = node.key.clone();
        let (pool, other) = match node.node_type() {
            NodeType::Network => (&mut self.networks, &mut self.nodes),
            NodeType::Service | NodeType::Volume => (&mut self.nodes, &mut self.networks),
        };
        // A key that changes type moves pools; its old entry must not linger.
        let moved = other.shift_remove(&key);
        let previous = pool.insert(key.clone(), node).or(moved);
        if previous.is_some() {
            match self.nodes.get(&key).map(Node::accepts_inputs) {
                Some(accepts_inputs) => self
                    .connections
                    .retain(|c| c.target() != key || accepts_inputs),
                None => self.connections.retain(|c| !c.touches(&key)),
            }
        }
        previous
    }

    /// Removes a node and every connection incident to it.
    pub fn remove_node(&mut self, key: &str) -> Option<(Node, Vec<Connection>)> {
        let node = self
            .nodes
            .shift_remove(key)
            .or_else(|| self.networks.shift_remove(key))?;
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .connections
            .drain(..)
            .partition(|connection| connection.touches(key));
        self.connections = kept;
        Some((node, removed))
    }

    /// Moves a node. Position is the only field mutated outside the connection rules.
    pub fn move_node(&mut self, key: &str, position: Position) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    pub fn config_mut(&mut self, key: &str) -> Option<&mut ConfigMap> {
        self.nodes
            .get_mut(key)
            .or_else(|| self.networks.get_mut(key))
            .map(Node::config_mut)
    }

    /// Checks whether `connection` may be added without committing anything.
    pub fn check_connection(&self, connection: &Connection) -> Result<(), TopologyViolation> {
        let (source, target) = (connection.source(), connection.target());
        if source == target {
            return Err(TopologyViolation::SelfLoop(source.to_string()));
        }
        if !self.nodes.contains_key(source) {
            return Err(TopologyViolation::UnknownNode(source.to_string()));
        }
        match self.nodes.get(target) {
            None => return Err(TopologyViolation::UnknownNode(target.to_string())),
            Some(node) if !node.accepts_inputs() => {
                return Err(TopologyViolation::TargetHasNoInputs(target.to_string()));
            }
            Some(_) => {}
        }
        if self.contains_connection(connection) {
            return Err(TopologyViolation::Duplicate {
                source_key: source.to_string(),
                target_key: target.to_string(),
            });
        }
        if self.contains_connection(&connection.reversed()) {
            return Err(TopologyViolation::ReverseLoop {
                source_key: source.to_string(),
                target_key: target.to_string(),
            });
        }
        Ok(())
    }

    pub fn connect(&mut self, connection: Connection) -> Result<(), TopologyViolation> {
        self.check_connection(&connection)?;
        self.connections.push(connection);
        Ok(())
    }

    /// Removes a connection. Returns `false` when it was not present.
    pub fn disconnect(&mut self, connection: &Connection) -> bool {
        match self.connections.iter().position(|c| c == connection) {
            Some(index) => {
                self.connections.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn style_of(&self, connection: &Connection) -> Option<ConnectionStyle> {
        let source = self.nodes.get(connection.source())?;
        let target = self.nodes.get(connection.target())?;
        Some(style_for(source.node_type(), target.node_type()))
    }

    /// Recomputes the style of every connection.
    pub fn connection_styles(&self) -> Vec<(Connection, ConnectionStyle)> {
        self.connections
            .iter()
            .filter_map(|c| self.style_of(c).map(|style| (c.clone(), style)))
            .collect()
    }

    pub fn incoming(&self, key: &str) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.target() == key)
    }
}
