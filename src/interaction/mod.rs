//! The connection state machine: the single authority on whether an interactive edge
//! mutation is legal.
//!
//! Drag gestures arrive as typed [`DragMessage`]s. Illegal mutations are refused quietly
//! (a rejected drop is ordinary interaction feedback), so [`ConnectionStateMachine::handle`]
//! never fails. Its current [`DragState`] is published on a `watch` channel for any
//! component that needs to follow the gesture.

mod canvas;
pub(crate) mod config_sync;

pub use canvas::{Canvas, Snapshot};

use crate::endpoint::{AnchorDirection, node_key_from_anchor};
use crate::graph::{Connection, ConnectionStyle, Graph};
use tokio::sync::watch;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    DraggingNewEdge {
        source_anchor: String,
    },
    DraggingExistingEdge {
        connection: Connection,
        original_target: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragMessage {
    /// A drag starts from an output anchor.
    BeginNewEdge { source_anchor: String },
    /// The target end of an existing connection is picked up.
    BeginMoveEdge { connection: Connection },
    /// The dragged end is released over an anchor.
    Drop { target_anchor: String },
    /// The drag ends without a target.
    Cancel,
}

/// A committed change to the set of connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Attached {
        connection: Connection,
        style: ConnectionStyle,
    },
    Detached {
        connection: Connection,
    },
}

#[derive(Debug)]
pub struct ConnectionStateMachine {
    state: watch::Sender<DragState>,
}

impl Default for ConnectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStateMachine {
    pub fn new() -> Self {
        let (state, _) = watch::channel(DragState::Idle);
        Self { state }
    }

    pub fn state(&self) -> DragState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DragState> {
        self.state.subscribe()
    }

    /// Applies one message and returns the connection changes it committed.
    pub fn handle(&mut self, graph: &mut Graph, message: DragMessage) -> Vec<ConnectionEvent> {
        let (next, events) = match (self.state(), message) {
            (DragState::Idle, DragMessage::BeginNewEdge { source_anchor }) => {
                if is_output_of_node(graph, &source_anchor) {
                    (DragState::DraggingNewEdge { source_anchor }, Vec::new())
                } else {
                    debug!(%source_anchor, "Ignoring drag from a non-output anchor");
                    (DragState::Idle, Vec::new())
                }
            }
            (DragState::Idle, DragMessage::BeginMoveEdge { connection }) => {
                if graph.contains_connection(&connection) {
                    let original_target = connection.target().to_string();
                    let state = DragState::DraggingExistingEdge {
                        connection,
                        original_target,
                    };
                    (state, Vec::new())
                } else {
                    debug!(%connection, "Ignoring move of an unknown connection");
                    (DragState::Idle, Vec::new())
                }
            }
            (DragState::DraggingNewEdge { source_anchor }, DragMessage::Drop { target_anchor }) => {
                let connection = Connection::from_anchors(&source_anchor, &target_anchor);
                let events = attach(graph, connection, &target_anchor)
                    .into_iter()
                    .collect();
                (DragState::Idle, events)
            }
            (
                DragState::DraggingExistingEdge {
                    connection,
                    original_target,
                },
                DragMessage::Drop { target_anchor },
            ) => {
                let events = retarget(graph, &connection, &original_target, &target_anchor);
                (DragState::Idle, events)
            }
            (_, DragMessage::Cancel) => (DragState::Idle, Vec::new()),
            (state, message) => {
                debug!(?state, ?message, "Ignoring drag message");
                (state, Vec::new())
            }
        };
        trace!(?next, events = events.len(), "Drag state updated");
        self.state.send_replace(next);
        events
    }

    /// Removes one connection through its inline control. Removing a connection that is
    /// already gone does nothing.
    pub fn remove_connection(
        &self,
        graph: &mut Graph,
        connection: &Connection,
    ) -> Vec<ConnectionEvent> {
        if graph.disconnect(connection) {
            vec![ConnectionEvent::Detached {
                connection: connection.clone(),
            }]
        } else {
            Vec::new()
        }
    }

    /// Drops any gesture in progress.
    pub fn reset(&mut self) {
        self.state.send_replace(DragState::Idle);
    }
}

fn is_output_of_node(graph: &Graph, anchor: &str) -> bool {
    AnchorDirection::of_anchor(anchor) == Some(AnchorDirection::Output)
        && graph
            .node(node_key_from_anchor(anchor))
            .is_some_and(|node| node.outputs.iter().any(|a| a == anchor))
}

fn is_input_of_node(graph: &Graph, anchor: &str) -> bool {
    AnchorDirection::of_anchor(anchor) == Some(AnchorDirection::Input)
        && graph
            .node(node_key_from_anchor(anchor))
            .is_some_and(|node| node.inputs.iter().any(|a| a == anchor))
}

fn attach(
    graph: &mut Graph,
    connection: Connection,
    target_anchor: &str,
) -> Option<ConnectionEvent> {
    if !is_input_of_node(graph, target_anchor) {
        debug!(%target_anchor, "Rejecting drop on an anchor that is not a node input");
        return None;
    }
    match graph.connect(connection.clone()) {
        Ok(()) => {
            let style = graph.style_of(&connection).unwrap_or(ConnectionStyle::Default);
            Some(ConnectionEvent::Attached { connection, style })
        }
        Err(violation) => {
            debug!(%violation, "Rejecting connection");
            None
        }
    }
}

/// Detaches the moved edge, then attaches it to the new target only if that is legal.
/// An illegal placement leaves the edge detached.
fn retarget(
    graph: &mut Graph,
    connection: &Connection,
    original_target: &str,
    target_anchor: &str,
) -> Vec<ConnectionEvent> {
    if node_key_from_anchor(target_anchor) == original_target {
        return Vec::new();
    }
    let mut events = Vec::new();
    if graph.disconnect(connection) {
        events.push(ConnectionEvent::Detached {
            connection: connection.clone(),
        });
    }
    let moved = Connection::new(connection.source(), node_key_from_anchor(target_anchor));
    events.extend(attach(graph, moved, target_anchor));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConfigMap, Node, Position};
    use crate::library::{NodeLibrary, NodeType};

    fn service(graph: &mut Graph, library: &NodeLibrary, name: &str) -> Node {
        let node = Node::create(
            library,
            NodeType::Service,
            name,
            Position::default(),
            ConfigMap::new(),
        );
        graph.insert_node(node.clone());
        node
    }

    #[test]
    fn test_subscribers_follow_state() {
        let library = NodeLibrary::default();
        let mut graph = Graph::new();
        let web = service(&mut graph, &library, "web");

        let mut machine = ConnectionStateMachine::new();
        let receiver = machine.subscribe();
        machine.handle(
            &mut graph,
            DragMessage::BeginNewEdge {
                source_anchor: web.outputs[0].clone(),
            },
        );
        assert!(matches!(
            *receiver.borrow(),
            DragState::DraggingNewEdge { .. }
        ));
        machine.handle(&mut graph, DragMessage::Cancel);
        assert_eq!(*receiver.borrow(), DragState::Idle);
    }

    #[test]
    fn test_drop_while_idle_is_ignored() {
        let library = NodeLibrary::default();
        let mut graph = Graph::new();
        let web = service(&mut graph, &library, "web");
        let mut machine = ConnectionStateMachine::new();
        let events = machine.handle(
            &mut graph,
            DragMessage::Drop {
                target_anchor: web.inputs[0].clone(),
            },
        );
        assert!(events.is_empty());
        assert_eq!(machine.state(), DragState::Idle);
    }
}
