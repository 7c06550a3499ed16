//! Common test utilities: manifests, canvas helpers and scripted collaborators.
use async_trait::async_trait;
use stackgraph::prelude::*;
use stackgraph::project::MemoryProjectStore;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Two services, one volume and one network. `web` depends on `db`, `db` mounts `data`.
#[allow(dead_code)]
pub const BASIC_COMPOSE: &str = r#"
version: "3.8"
services:
  web:
    image: nginx
    ports: ["8080:80"]
    depends_on: [db]
    networks: [front]
  db:
    image: postgres
    volumes:
      - data:/var/lib/postgresql/data
      - ./init:/docker-entrypoint-initdb.d
    environment:
      POSTGRES_PASSWORD: secret
volumes:
  data: {}
networks:
  front: {}
"#;

/// A version 1 document: services sit at the top level.
#[allow(dead_code)]
pub const LEGACY_COMPOSE: &str = r#"
web:
  image: nginx
  links: [db]
db:
  image: postgres
x-shared:
  image: ignored
"#;

#[allow(dead_code)]
pub fn config(value: serde_json::Value) -> ConfigMap {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("Expected a JSON object, got {other}"),
    }
}

#[allow(dead_code)]
pub fn canvas() -> Canvas {
    Canvas::new(NodeLibrary::default())
}

#[allow(dead_code)]
pub fn add_service(canvas: &mut Canvas, name: &str) -> String {
    canvas.add_node(
        NodeType::Service,
        name,
        Position::default(),
        config(serde_json::json!({ "image": format!("{name}:latest") })),
    )
}

#[allow(dead_code)]
pub fn add_volume(canvas: &mut Canvas, name: &str) -> String {
    canvas.add_node(
        NodeType::Volume,
        name,
        Position::default(),
        config(serde_json::json!({ "name": name })),
    )
}

#[allow(dead_code)]
pub fn output_anchor(canvas: &Canvas, key: &str) -> String {
    canvas.graph().node(key).expect("node exists").outputs[0].clone()
}

#[allow(dead_code)]
pub fn input_anchor(canvas: &Canvas, key: &str) -> String {
    canvas.graph().node(key).expect("node exists").inputs[0].clone()
}

/// Drags a new edge from the first output of `source` to the first input of `target`.
#[allow(dead_code)]
pub fn draw(canvas: &mut Canvas, source: &str, target: &str) -> Vec<ConnectionEvent> {
    let source_anchor = output_anchor(canvas, source);
    let target_anchor = format!("ip_{target}");
    canvas.dispatch(DragMessage::BeginNewEdge { source_anchor });
    canvas.dispatch(DragMessage::Drop { target_anchor })
}

#[allow(dead_code)]
pub fn key_of(graph: &Graph, node_type: NodeType, name: &str) -> String {
    graph
        .node_by_name(node_type, name)
        .unwrap_or_else(|| panic!("Expected a {node_type} named '{name}'"))
        .key
        .clone()
}

/// One scripted answer of [`ScriptedService`].
#[allow(dead_code)]
pub struct Scripted {
    pub delay: Duration,
    pub result: std::result::Result<String, GenerationError>,
}

#[allow(dead_code)]
impl Scripted {
    pub fn ok(delay_ms: u64, text: &str) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            result: Ok(text.to_string()),
        }
    }

    pub fn err(delay_ms: u64, error: GenerationError) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            result: Err(error),
        }
    }
}

/// A generation service answering from a script, in call order. Once the script runs
/// out it renders the sorted service names.
#[derive(Default)]
pub struct ScriptedService {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
    payloads: Mutex<Vec<GeneratePayload>>,
}

#[allow(dead_code)]
impl ScriptedService {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<GeneratePayload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedService {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(request.payload.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(scripted) => {
                tokio::time::sleep(scripted.delay).await;
                scripted.result
            }
            None => {
                let mut names: Vec<&String> = request.payload.services.keys().collect();
                names.sort();
                Ok(names
                    .iter()
                    .map(|name| name.as_str())
                    .collect::<Vec<_>>()
                    .join(","))
            }
        }
    }
}

/// A store that refuses every save.
#[allow(dead_code)]
pub struct FailingStore;

#[async_trait]
impl ProjectStore for FailingStore {
    async fn load(&self, id: &str) -> std::result::Result<ProjectDocument, ProjectError> {
        Err(ProjectError::Store(format!("no project '{id}'")))
    }

    async fn save(
        &self,
        _id: &str,
        _document: &ProjectDocument,
    ) -> std::result::Result<(), ProjectError> {
        Err(ProjectError::Store("disk full".to_string()))
    }
}

#[allow(dead_code)]
pub fn memory_store() -> std::sync::Arc<MemoryProjectStore> {
    std::sync::Arc::new(MemoryProjectStore::new())
}
