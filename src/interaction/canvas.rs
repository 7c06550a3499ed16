use super::config_sync::{apply_attached, apply_detached, derived_incoming};
use super::{ConnectionEvent, ConnectionStateMachine, DragMessage, DragState};
use crate::error::ImportError;
use crate::graph::{
    ConfigMap, Connection, ConnectionStyle, Graph, Node, Position, format_name,
};
use crate::library::{NodeLibrary, NodeType};
use crate::manifest::{ComposeVersion, GridLayout, Importer, ManifestFormat, NormalizedService};
use crate::notification::{Notification, NotificationSender};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// A point-in-time copy of the diagram handed to the regeneration pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub graph: Graph,
    pub version: ComposeVersion,
}

/// Owns the graph and routes every mutation through the connection rules.
///
/// Edge changes keep service configuration in sync, every change restyles the
/// connections, and each content change is forwarded to the observer (usually a
/// regeneration pipeline).
pub struct Canvas {
    library: NodeLibrary,
    layout: GridLayout,
    graph: Graph,
    version: ComposeVersion,
    machine: ConnectionStateMachine,
    styles: Vec<(Connection, ConnectionStyle)>,
    observer: Option<mpsc::UnboundedSender<Snapshot>>,
    notifications: Option<NotificationSender>,
}

impl Canvas {
    pub fn new(library: NodeLibrary) -> Self {
        Self {
            library,
            layout: GridLayout::default(),
            graph: Graph::new(),
            version: ComposeVersion::default(),
            machine: ConnectionStateMachine::new(),
            styles: Vec::new(),
            observer: None,
            notifications: None,
        }
    }

    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<Snapshot>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_notifications(mut self, notifications: NotificationSender) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn library(&self) -> &NodeLibrary {
        &self.library
    }

    pub fn version(&self) -> ComposeVersion {
        self.version
    }

    pub fn set_version(&mut self, version: ComposeVersion) {
        if self.version != version {
            self.version = version;
            self.publish();
        }
    }

    pub fn drag_state(&self) -> DragState {
        self.machine.state()
    }

    pub fn subscribe_drag_state(&self) -> watch::Receiver<DragState> {
        self.machine.subscribe()
    }

    pub fn connection_styles(&self) -> &[(Connection, ConnectionStyle)] {
        &self.styles
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            graph: self.graph.clone(),
            version: self.version,
        }
    }

    /// Feeds one drag message through the state machine.
    pub fn dispatch(&mut self, message: DragMessage) -> Vec<ConnectionEvent> {
        let events = self.machine.handle(&mut self.graph, message);
        self.commit(&events);
        events
    }

    /// Removes a connection through its inline control.
    pub fn remove_connection(&mut self, connection: &Connection) -> Vec<ConnectionEvent> {
        // Sync needs both endpoints, so it runs before the edge disappears.
        if self.graph.contains_connection(connection) {
            apply_detached(&mut self.graph, connection);
        }
        let events = self.machine.remove_connection(&mut self.graph, connection);
        self.restyle_all();
        if !events.is_empty() {
            self.publish();
        }
        events
    }

    /// Creates a node and returns its key. The display name becomes a lowercase,
    /// dash-separated manifest name (`"My DB"` is stored as `my-db`). A name already used
    /// by a node of the same type gets a numeric suffix (`my-db-2`).
    pub fn add_node(
        &mut self,
        node_type: NodeType,
        display_name: &str,
        position: Position,
        config: ConfigMap,
    ) -> String {
        let name = self.unused_name(node_type, format_name(display_name));
        let node = Node::create(&self.library, node_type, name, position, config);
        let key = node.key.clone();
        self.graph.insert_node(node);
        self.publish();
        key
    }

    /// Deletes a node together with its connections.
    pub fn remove_node(&mut self, key: &str) -> Option<Node> {
        let incident: Vec<Connection> = self
            .graph
            .connections()
            .iter()
            .filter(|c| c.touches(key))
            .cloned()
            .collect();
        for connection in &incident {
            apply_detached(&mut self.graph, connection);
        }
        let (node, _) = self.graph.remove_node(key)?;
        self.restyle_all();
        self.publish();
        Some(node)
    }

    pub fn move_node(&mut self, key: &str, position: Position) -> bool {
        self.graph.move_node(key, position)
    }

    /// Replaces a node's configuration, as a form submit does.
    ///
    /// For services the incoming dependency and mount edges are re-derived from the new
    /// configuration. An invalid service configuration is rejected without any change.
    pub fn update_node_config(
        &mut self,
        key: &str,
        config: ConfigMap,
    ) -> Result<Vec<ConnectionEvent>, ImportError> {
        let Some(node_type) = self.graph.node(key).map(Node::node_type) else {
            return Ok(Vec::new());
        };
        if node_type == NodeType::Service {
            let name = self.graph.node(key).map(Node::name).unwrap_or(key);
            NormalizedService::from_config(name, &config)?;
        }

        if let Some(slot) = self.graph.config_mut(key) {
            *slot = config;
        }
        let derived = derived_incoming(&self.graph, key);

        let mut events = Vec::new();
        if node_type == NodeType::Service {
            let stale: Vec<Connection> = self
                .graph
                .incoming(key)
                .filter(|c| !derived.contains(c))
                .cloned()
                .collect();
            for connection in stale {
                self.graph.disconnect(&connection);
                events.push(ConnectionEvent::Detached { connection });
            }
        }
        for connection in derived {
            if self.graph.contains_connection(&connection) {
                continue;
            }
            match self.graph.connect(connection.clone()) {
                Ok(()) => {
                    let style = self
                        .graph
                        .style_of(&connection)
                        .unwrap_or(ConnectionStyle::Default);
                    events.push(ConnectionEvent::Attached { connection, style });
                }
                Err(violation) => debug!(%violation, "Skipping derived connection"),
            }
        }

        self.restyle_all();
        self.publish();
        Ok(events)
    }

    /// Imports manifest text, replacing the graph while keeping the identity of nodes
    /// whose names are unchanged. A failed import leaves the canvas untouched.
    pub fn import_manifest(
        &mut self,
        text: &str,
        format: ManifestFormat,
    ) -> Result<ComposeVersion, ImportError> {
        let importer = Importer::new(&self.library).with_layout(self.layout);
        match importer.import_str(text, format, &self.graph) {
            Ok(imported) => {
                info!(version = %imported.version, "Canvas replaced from manifest");
                let count = imported.graph.nodes().len() + imported.graph.networks().len();
                self.load(imported.graph, imported.version);
                self.notify(Notification::info(format!(
                    "Imported {count} nodes (compose version {})",
                    imported.version
                )));
                Ok(imported.version)
            }
            Err(error) => {
                self.notify(Notification::error(&error));
                Err(error)
            }
        }
    }

    /// Replaces the whole graph, as when a project is opened.
    pub fn load(&mut self, graph: Graph, version: ComposeVersion) {
        self.machine.reset();
        self.graph = graph;
        self.version = version;
        self.restyle_all();
        self.publish();
    }

    /// Recomputes the painted style of every connection.
    pub fn restyle_all(&mut self) {
        self.styles = self.graph.connection_styles();
    }

    fn commit(&mut self, events: &[ConnectionEvent]) {
        if events.is_empty() {
            return;
        }
        for event in events {
            match event {
                ConnectionEvent::Attached { connection, .. } => {
                    apply_attached(&mut self.graph, connection)
                }
                ConnectionEvent::Detached { connection } => {
                    // The edge is already gone from the graph; both nodes still exist.
                    apply_detached(&mut self.graph, connection)
                }
            }
        }
        self.restyle_all();
        self.publish();
    }

    fn unused_name(&self, node_type: NodeType, base: String) -> String {
        let mut name = base.clone();
        let mut suffix = 2;
        while self.graph.node_by_name(node_type, &name).is_some() {
            name = format!("{base}-{suffix}");
            suffix += 1;
        }
        name
    }

    fn publish(&self) {
        if let Some(observer) = &self.observer {
            if observer.send(self.snapshot()).is_err() {
                debug!("Snapshot observer has gone away");
            }
        }
    }

    fn notify(&self, notification: Notification) {
        if let Some(notifications) = &self.notifications {
            let _ = notifications.send(notification);
        }
    }
}
