//! Project documents, stores and autosave.
mod common;
use common::*;
use serde_json::json;
use stackgraph::prelude::*;
use stackgraph::project::{DEFAULT_AUTOSAVE_DELAY, MemoryProjectStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[cfg(test)]
mod project_tests {
    use super::*;

    fn imported_canvas() -> Canvas {
        let mut canvas = canvas();
        canvas
            .import_manifest(BASIC_COMPOSE, ManifestFormat::Auto)
            .unwrap();
        canvas
    }

    fn document_of(canvas: &Canvas) -> ProjectDocument {
        ProjectDocument::new("demo").with_graph(canvas.graph(), canvas.version())
    }

    #[test]
    fn test_document_round_trip() {
        let canvas = imported_canvas();
        let json = document_of(&canvas).to_json().unwrap();

        let document = ProjectDocument::from_json(&json).unwrap();
        assert_eq!(document.name, "demo");
        let (graph, version) = document.hydrate(canvas.library());
        assert_eq!(&graph, canvas.graph());
        assert_eq!(version, ComposeVersion::V3);
    }

    #[test]
    fn test_wire_layout_matches_the_canvas_shape() {
        let canvas = imported_canvas();
        let wire = serde_json::to_value(document_of(&canvas)).unwrap();
        let stored = &wire["data"]["canvas"];

        let web = key_of(canvas.graph(), NodeType::Service, "web");
        let node = &stored["nodes"][&web];
        assert_eq!(node["type"], "SERVICE");
        assert_eq!(node["canvasConfig"]["node_name"], "web");
        assert_eq!(node["serviceConfig"]["image"], "nginx");
        assert_eq!(node["inputs"], json!([format!("ip_{web}")]));
        assert_eq!(stored["connections"].as_array().unwrap().len(), 2);
        assert_eq!(stored["networks"].as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_hydrate_recomputes_anchors() {
        let canvas = imported_canvas();
        let web = key_of(canvas.graph(), NodeType::Service, "web");
        let mut wire = serde_json::to_value(document_of(&canvas)).unwrap();
        wire["data"]["canvas"]["nodes"][&web]["inputs"] = json!(["ip_bogus"]);
        wire["data"]["canvas"]["nodes"][&web]["outputs"] = json!([]);

        let document = ProjectDocument::from_json(&wire.to_string()).unwrap();
        let (graph, _) = document.hydrate(canvas.library());
        let node = graph.node(&web).unwrap();
        assert_eq!(node.inputs, vec![format!("ip_{web}")]);
        assert_eq!(node.outputs, vec![format!("op_{web}")]);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryProjectStore::new();
        let document = document_of(&imported_canvas());
        store.save("p1", &document).await.unwrap();

        assert_eq!(store.load("p1").await.unwrap(), document);
        match store.load("p2").await {
            Err(ProjectError::Store(message)) => assert!(message.contains("p2")),
            other => panic!("Expected Store error, got {:?}", other),
        }
        assert_eq!(store.save_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_skips_baseline_and_unchanged_documents() {
        let store = memory_store();
        let autosave = Autosave::spawn(store.clone(), "p1", DEFAULT_AUTOSAVE_DELAY, None);
        let mut canvas = imported_canvas();

        autosave.observe(document_of(&canvas));
        autosave.observe(document_of(&canvas));
        sleep(Duration::from_secs(2)).await;
        assert_eq!(store.save_count().await, 0);

        add_service(&mut canvas, "cache");
        autosave.observe(document_of(&canvas));
        canvas.move_node(
            &key_of(canvas.graph(), NodeType::Service, "cache"),
            Position::new(5.0, 5.0),
        );
        autosave.observe(document_of(&canvas));
        sleep(Duration::from_secs(2)).await;
        assert_eq!(store.save_count().await, 1);

        let saved = store.load("p1").await.unwrap();
        let (graph, _) = saved.hydrate(canvas.library());
        assert_eq!(&graph, canvas.graph());

        autosave.observe(document_of(&canvas));
        autosave.finish().await;
        assert_eq!(store.save_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_failure_is_a_warning() {
        let (notifications, mut inbox) = notification::channel();
        let autosave = Autosave::spawn(
            Arc::new(FailingStore),
            "p1",
            Duration::from_millis(100),
            Some(notifications),
        );
        autosave.observe(ProjectDocument::new("before"));
        autosave.observe(ProjectDocument::new("after"));
        autosave.finish().await;

        let notification = inbox.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Warning);
        assert!(notification.message.contains("disk full"));
    }
}
