//! # stackgraph - Diagram and Manifest Synchronization Engine
//!
//! **stackgraph** keeps a node-and-edge infrastructure diagram and a Docker Compose (or
//! Kubernetes) manifest in step. Editing the diagram regenerates the manifest; importing a
//! manifest rebuilds the diagram while keeping the identity and position of every node
//! whose name survived.
//!
//! ## Core Workflow
//!
//! 1.  **Describe the node types**: a [`NodeLibrary`](library::NodeLibrary) says how many
//!     inputs and outputs a SERVICE, VOLUME or NETWORK node exposes.
//! 2.  **Edit through a `Canvas`**: every node and edge mutation goes through
//!     [`Canvas`](interaction::Canvas), whose connection state machine refuses self-loops,
//!     duplicates, reverse loops and drops on nodes without inputs. Drawn edges are written
//!     back into `depends_on` and `volumes`.
//! 3.  **Regenerate**: the canvas publishes snapshots to a
//!     [`RegenerationPipeline`](regen::RegenerationPipeline), which debounces them, exports a
//!     [`GeneratePayload`](manifest::GeneratePayload) and asks a
//!     [`GenerationService`](regen::GenerationService) for manifest text. Responses older than
//!     the newest rendered one are dropped.
//! 4.  **Import**: [`Canvas::import_manifest`](interaction::Canvas::import_manifest) parses
//!     YAML or JSON, normalizes the many accepted shapes and infers edges.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stackgraph::prelude::*;
//! use std::sync::Arc;
//!
//! const COMPOSE: &str = r#"
//! services:
//!   web:
//!     image: nginx
//!   db:
//!     image: postgres
//!     volumes: ["data:/var/lib/postgresql/data"]
//! volumes:
//!   data: {}
//! "#;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let settings = Settings::default().apply_env()?;
//!     let (notifications, mut inbox) = notification::channel();
//!
//!     let service = Arc::new(HttpGenerationService::new(
//!         &settings.generator_url,
//!         settings.request_timeout(),
//!     )?);
//!     let pipeline = RegenerationPipeline::spawn(
//!         service,
//!         settings.pipeline_options(),
//!         Some(notifications.clone()),
//!     );
//!
//!     let mut canvas = Canvas::new(NodeLibrary::default())
//!         .with_layout(settings.layout)
//!         .with_observer(pipeline.sender())
//!         .with_notifications(notifications);
//!
//!     // The volume edge `data -> db` is inferred from the mount.
//!     canvas.import_manifest(COMPOSE, ManifestFormat::Auto)?;
//!
//!     // Draw `db -> web`: web now depends on db.
//!     let graph = canvas.graph();
//!     let db = graph.node_by_name(NodeType::Service, "db").ok_or("db missing")?;
//!     let web = graph.node_by_name(NodeType::Service, "web").ok_or("web missing")?;
//!     let (source_anchor, target_anchor) = (db.outputs[0].clone(), web.inputs[0].clone());
//!     canvas.dispatch(DragMessage::BeginNewEdge { source_anchor });
//!     canvas.dispatch(DragMessage::Drop { target_anchor });
//!
//!     let rendered = pipeline.shutdown().await;
//!     println!("{}", rendered.text);
//!
//!     while let Ok(notification) = inbox.try_recv() {
//!         eprintln!("[{:?}] {}", notification.level, notification.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod endpoint;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod library;
pub mod manifest;
pub mod notification;
pub mod prelude;
pub mod project;
pub mod regen;
pub mod settings;
