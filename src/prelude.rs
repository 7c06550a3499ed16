//! Prelude module for convenient imports
//!
//! Re-exports the types needed to drive a canvas, import manifests and run the
//! regeneration pipeline.
//!
//! # Example
//!
//! ```rust,no_run
//! use stackgraph::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let library = NodeLibrary::from_json(&std::fs::read_to_string("path/to/node-types.json")?)?;
//! let manifest = std::fs::read_to_string("path/to/docker-compose.yml")?;
//!
//! let imported = Importer::new(&library).import_str(&manifest, ManifestFormat::Auto, &Graph::new())?;
//! let payload = export(&imported.graph, imported.version);
//! println!("{}", serde_json::to_string_pretty(&payload)?);
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::graph::{ConfigMap, Connection, ConnectionStyle, Graph, Node, Position};
pub use crate::library::{NodeLibrary, NodeLibraryItem, NodeType};

// Interaction
pub use crate::interaction::{
    Canvas, ConnectionEvent, ConnectionStateMachine, DragMessage, DragState, Snapshot,
};

// Manifests
pub use crate::manifest::{
    ComposeVersion, GeneratePayload, GridLayout, ImportedGraph, Importer, ManifestFormat, export,
};

// Regeneration and persistence
pub use crate::project::{Autosave, ProjectDocument, ProjectStore};
pub use crate::regen::{
    GenerationRequest, GenerationService, HttpGenerationService, ManifestDialect, PipelineOptions,
    RegenerationPipeline, Rendered,
};

// Errors, notifications and settings
pub use crate::error::{
    GenerationError, ImportError, LibraryError, ProjectError, SettingsError, TopologyViolation,
};
pub use crate::notification::{self, Notification, NotificationLevel};
pub use crate::settings::Settings;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
