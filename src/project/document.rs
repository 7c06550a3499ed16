use crate::error::ProjectError;
use crate::graph::{Connection, Graph, Node};
use crate::library::NodeLibrary;
use crate::manifest::ComposeVersion;
use crate::regen::ManifestDialect;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Viewport of the diagram surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPosition {
    pub top: f64,
    pub left: f64,
    pub scale: f64,
}

impl Default for ViewPosition {
    fn default() -> Self {
        Self {
            top: 0.0,
            left: 0.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasState {
    #[serde(default)]
    pub position: ViewPosition,
    #[serde(default)]
    pub nodes: IndexMap<String, Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub networks: IndexMap<String, Node>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectData {
    pub canvas: CanvasState,
    #[serde(default)]
    pub version: ComposeVersion,
}

/// The persisted form of a project.
///
/// `visibility` is `1` for public projects and `0` otherwise; `project_type` is `1` for
/// Kubernetes projects and `0` for Compose projects.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub name: String,
    #[serde(default)]
    pub visibility: u8,
    #[serde(default)]
    pub project_type: u8,
    #[serde(default)]
    pub data: ProjectData,
}

impl ProjectDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_dialect(mut self, dialect: ManifestDialect) -> Self {
        self.project_type = match dialect {
            ManifestDialect::DockerCompose => 0,
            ManifestDialect::Kubernetes => 1,
        };
        self
    }

    pub fn is_public(&self) -> bool {
        self.visibility != 0
    }

    pub fn dialect(&self) -> ManifestDialect {
        match self.project_type {
            1 => ManifestDialect::Kubernetes,
            _ => ManifestDialect::DockerCompose,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        serde_json::from_str(json).map_err(|e| ProjectError::Decode(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        serde_json::to_string_pretty(self).map_err(|e| ProjectError::Encode(e.to_string()))
    }

    /// Stores the graph triple, keeping the viewport as it is.
    pub fn set_graph(&mut self, graph: &Graph, version: ComposeVersion) {
        let canvas = &mut self.data.canvas;
        canvas.nodes = graph.nodes().clone();
        canvas.connections = graph.connections().to_vec();
        canvas.networks = graph.networks().clone();
        self.data.version = version;
    }

    pub fn with_graph(mut self, graph: &Graph, version: ComposeVersion) -> Self {
        self.set_graph(graph, version);
        self
    }

    /// Rebuilds the graph. Anchors are recomputed from the library rather than trusted,
    /// and connections that no longer hold are dropped.
    pub fn hydrate(&self, library: &NodeLibrary) -> (Graph, ComposeVersion) {
        let canvas = &self.data.canvas;
        let graph = Graph::from_parts(
            library,
            canvas.nodes.values().cloned(),
            canvas.connections.iter().cloned(),
            canvas.networks.values().cloned(),
        );
        (graph, self.data.version)
    }
}
