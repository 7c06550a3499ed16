//! Connection state machine and canvas behavior.
mod common;
use common::*;
use serde_json::json;
use stackgraph::prelude::*;
use tokio::sync::mpsc;

#[cfg(test)]
mod interaction_tests {
    use super::*;

    fn config_of(canvas: &Canvas, key: &str) -> ConfigMap {
        canvas.graph().node(key).unwrap().config().clone()
    }

    #[test]
    fn test_service_to_service_records_dependency() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let db = add_service(&mut canvas, "db");

        let events = draw(&mut canvas, &db, &web);
        let expected = Connection::new(db.clone(), web.clone());
        assert_eq!(
            events,
            vec![ConnectionEvent::Attached {
                connection: expected.clone(),
                style: ConnectionStyle::Default,
            }]
        );
        assert_eq!(canvas.graph().connections(), &[expected]);
        assert_eq!(config_of(&canvas, &web)["depends_on"], json!(["db"]));
        assert_eq!(canvas.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_volume_to_service_is_a_mount() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let data = add_volume(&mut canvas, "data");

        let events = draw(&mut canvas, &data, &web);
        match events.as_slice() {
            [ConnectionEvent::Attached { style, .. }] => {
                assert_eq!(*style, ConnectionStyle::VolumeMount)
            }
            other => panic!("Expected one Attached event, got {:?}", other),
        }
        assert_eq!(
            canvas.connection_styles(),
            &[(Connection::new(data, web.clone()), ConnectionStyle::VolumeMount)]
        );
        assert_eq!(config_of(&canvas, &web)["volumes"], json!(["data"]));
    }

    #[test]
    fn test_nothing_connects_into_a_volume() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let data = add_volume(&mut canvas, "data");
        let logs = add_volume(&mut canvas, "logs");

        assert!(draw(&mut canvas, &web, &data).is_empty());
        assert!(draw(&mut canvas, &logs, &data).is_empty());
        assert!(canvas.graph().connections().is_empty());
        assert_eq!(canvas.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_reverse_and_duplicate_edges_are_refused() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let db = add_service(&mut canvas, "db");

        assert_eq!(draw(&mut canvas, &db, &web).len(), 1);
        assert!(draw(&mut canvas, &db, &web).is_empty());
        assert!(draw(&mut canvas, &web, &db).is_empty());
        assert_eq!(canvas.graph().connections().len(), 1);
        assert!(!config_of(&canvas, &db).contains_key("depends_on"));
    }

    #[test]
    fn test_drag_must_start_on_an_output_and_end_on_an_input() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let db = add_service(&mut canvas, "db");

        canvas.dispatch(DragMessage::BeginNewEdge {
            source_anchor: input_anchor(&canvas, &db),
        });
        assert_eq!(canvas.drag_state(), DragState::Idle);

        canvas.dispatch(DragMessage::BeginNewEdge {
            source_anchor: output_anchor(&canvas, &db),
        });
        let events = canvas.dispatch(DragMessage::Drop {
            target_anchor: output_anchor(&canvas, &web),
        });
        assert!(events.is_empty());
        assert!(canvas.graph().connections().is_empty());
    }

    #[test]
    fn test_drop_on_an_anchor_the_node_does_not_have() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let db = add_service(&mut canvas, "db");

        canvas.dispatch(DragMessage::BeginNewEdge {
            source_anchor: output_anchor(&canvas, &db),
        });
        let events = canvas.dispatch(DragMessage::Drop {
            target_anchor: format!("ip_true_{web}"),
        });
        assert!(events.is_empty());
        assert!(canvas.graph().connections().is_empty());
        assert_eq!(canvas.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_move_edge_to_a_new_target() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let api = add_service(&mut canvas, "api");
        let db = add_service(&mut canvas, "db");
        draw(&mut canvas, &db, &web);

        let original = Connection::new(db.clone(), web.clone());
        canvas.dispatch(DragMessage::BeginMoveEdge {
            connection: original.clone(),
        });
        let events = canvas.dispatch(DragMessage::Drop {
            target_anchor: input_anchor(&canvas, &api),
        });

        let moved = Connection::new(db.clone(), api.clone());
        assert_eq!(
            events,
            vec![
                ConnectionEvent::Detached {
                    connection: original
                },
                ConnectionEvent::Attached {
                    connection: moved.clone(),
                    style: ConnectionStyle::Default,
                },
            ]
        );
        assert_eq!(canvas.graph().connections(), &[moved]);
        assert!(!config_of(&canvas, &web).contains_key("depends_on"));
        assert_eq!(config_of(&canvas, &api)["depends_on"], json!(["db"]));
    }

    #[test]
    fn test_move_edge_to_an_illegal_target_leaves_it_detached() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let db = add_service(&mut canvas, "db");
        draw(&mut canvas, &db, &web);

        canvas.dispatch(DragMessage::BeginMoveEdge {
            connection: Connection::new(db.clone(), web.clone()),
        });
        // Dropping on the source itself would be a self-loop.
        let events = canvas.dispatch(DragMessage::Drop {
            target_anchor: input_anchor(&canvas, &db),
        });

        assert_eq!(
            events,
            vec![ConnectionEvent::Detached {
                connection: Connection::new(db, web.clone())
            }]
        );
        assert!(canvas.graph().connections().is_empty());
        assert!(!config_of(&canvas, &web).contains_key("depends_on"));
    }

    #[test]
    fn test_move_edge_back_onto_its_target_changes_nothing() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let db = add_service(&mut canvas, "db");
        draw(&mut canvas, &db, &web);

        let connection = Connection::new(db, web.clone());
        canvas.dispatch(DragMessage::BeginMoveEdge {
            connection: connection.clone(),
        });
        let events = canvas.dispatch(DragMessage::Drop {
            target_anchor: input_anchor(&canvas, &web),
        });
        assert!(events.is_empty());
        assert_eq!(canvas.graph().connections(), &[connection]);
        assert_eq!(config_of(&canvas, &web)["depends_on"], json!(["db"]));
    }

    #[test]
    fn test_cancel_during_move_keeps_the_edge() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let db = add_service(&mut canvas, "db");
        draw(&mut canvas, &db, &web);

        let connection = Connection::new(db, web);
        canvas.dispatch(DragMessage::BeginMoveEdge {
            connection: connection.clone(),
        });
        assert!(matches!(
            canvas.drag_state(),
            DragState::DraggingExistingEdge { .. }
        ));
        assert!(canvas.dispatch(DragMessage::Cancel).is_empty());
        assert_eq!(canvas.drag_state(), DragState::Idle);
        assert_eq!(canvas.graph().connections(), &[connection]);
    }

    #[test]
    fn test_remove_connection_is_idempotent() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let db = add_service(&mut canvas, "db");
        draw(&mut canvas, &db, &web);

        let connection = Connection::new(db, web.clone());
        assert_eq!(canvas.remove_connection(&connection).len(), 1);
        assert!(canvas.remove_connection(&connection).is_empty());
        assert!(canvas.graph().connections().is_empty());
        assert!(canvas.connection_styles().is_empty());
        assert!(!config_of(&canvas, &web).contains_key("depends_on"));
    }

    #[test]
    fn test_remove_node_clears_consumer_config() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let db = add_service(&mut canvas, "db");
        let data = add_volume(&mut canvas, "data");
        draw(&mut canvas, &db, &web);
        draw(&mut canvas, &data, &web);

        canvas.remove_node(&db).unwrap();
        assert_eq!(canvas.graph().connections().len(), 1);
        assert!(!config_of(&canvas, &web).contains_key("depends_on"));
        assert_eq!(config_of(&canvas, &web)["volumes"], json!(["data"]));

        canvas.remove_node(&data).unwrap();
        assert!(canvas.graph().connections().is_empty());
        assert!(!config_of(&canvas, &web).contains_key("volumes"));
    }

    #[test]
    fn test_mapping_dependencies_keep_their_shape() {
        let mut canvas = canvas();
        let web = canvas.add_node(
            NodeType::Service,
            "web",
            Position::default(),
            config(json!({ "depends_on": { "cache": { "condition": "service_started" } } })),
        );
        let db = add_service(&mut canvas, "db");

        draw(&mut canvas, &db, &web);
        assert_eq!(
            config_of(&canvas, &web)["depends_on"],
            json!({
                "cache": { "condition": "service_started" },
                "db": { "condition": "service_healthy" }
            })
        );

        canvas.remove_connection(&Connection::new(db, web.clone()));
        assert_eq!(
            config_of(&canvas, &web)["depends_on"],
            json!({ "cache": { "condition": "service_started" } })
        );
    }

    #[test]
    fn test_mount_not_duplicated_when_already_declared() {
        let mut canvas = canvas();
        let web = canvas.add_node(
            NodeType::Service,
            "web",
            Position::default(),
            config(json!({ "volumes": ["data:/srv/data:ro"] })),
        );
        let data = add_volume(&mut canvas, "data");

        draw(&mut canvas, &data, &web);
        assert_eq!(config_of(&canvas, &web)["volumes"], json!(["data:/srv/data:ro"]));
    }

    #[test]
    fn test_config_update_rederives_incoming_edges() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let db = add_service(&mut canvas, "db");
        let cache = add_service(&mut canvas, "cache");
        let data = add_volume(&mut canvas, "data");
        draw(&mut canvas, &db, &web);

        let events = canvas
            .update_node_config(
                &web,
                config(json!({
                    "image": "web",
                    "depends_on": ["cache", "missing"],
                    "volumes": [{ "type": "volume", "source": "data", "target": "/data" }]
                })),
            )
            .unwrap();

        assert_eq!(events.len(), 3);
        let connections = canvas.graph().connections();
        assert!(!connections.contains(&Connection::new(db, web.clone())));
        assert!(connections.contains(&Connection::new(cache, web.clone())));
        assert!(connections.contains(&Connection::new(data, web)));
        assert_eq!(connections.len(), 2);
    }

    #[test]
    fn test_invalid_config_update_is_rejected() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let before = config_of(&canvas, &web);

        let result = canvas.update_node_config(
            &web,
            config(json!({ "ports": [{ "target": 80, "protocol": "sctp" }] })),
        );
        match result {
            Err(ImportError::InvalidPortProtocol { protocol, .. }) => assert_eq!(protocol, "sctp"),
            other => panic!("Expected InvalidPortProtocol, got {:?}", other),
        }
        assert_eq!(config_of(&canvas, &web), before);
    }

    #[test]
    fn test_display_names_are_formatted() {
        let mut canvas = canvas();
        let key = add_service(&mut canvas, "My Web_App");
        assert_eq!(canvas.graph().node(&key).unwrap().name(), "my-web-app");
    }

    #[test]
    fn test_repeated_names_get_a_numeric_suffix() {
        let mut canvas = canvas();
        let first = add_service(&mut canvas, "web");
        let second = add_service(&mut canvas, "Web");
        let third = add_service(&mut canvas, "web");
        let volume = add_volume(&mut canvas, "web");

        let name = |key: &str| canvas.graph().node(key).unwrap().name().to_string();
        assert_eq!(name(&first), "web");
        assert_eq!(name(&second), "web-2");
        assert_eq!(name(&third), "web-3");
        assert_eq!(name(&volume), "web");

        let payload = export(canvas.graph(), canvas.version());
        assert_eq!(payload.services.len(), 3);
        assert_eq!(payload.volumes.len(), 1);
    }

    #[test]
    fn test_observer_sees_content_changes_only() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut canvas = Canvas::new(NodeLibrary::default()).with_observer(tx);
        let web = add_service(&mut canvas, "web");
        let db = add_service(&mut canvas, "db");
        assert_eq!(rx.try_recv().unwrap().graph.nodes().len(), 1);
        assert_eq!(rx.try_recv().unwrap().graph.nodes().len(), 2);

        canvas.move_node(&web, Position::new(10.0, 20.0));
        assert!(rx.try_recv().is_err());

        canvas.dispatch(DragMessage::BeginNewEdge {
            source_anchor: output_anchor(&canvas, &db),
        });
        assert!(rx.try_recv().is_err());
        canvas.dispatch(DragMessage::Drop {
            target_anchor: input_anchor(&canvas, &web),
        });
        let snapshot = rx.try_recv().unwrap();
        assert_eq!(snapshot.graph.connections().len(), 1);

        canvas.set_version(ComposeVersion::V2);
        assert_eq!(rx.try_recv().unwrap().version, ComposeVersion::V2);
    }

    #[test]
    fn test_drag_state_is_observable() {
        let mut canvas = canvas();
        let web = add_service(&mut canvas, "web");
        let receiver = canvas.subscribe_drag_state();

        let source_anchor = output_anchor(&canvas, &web);
        canvas.dispatch(DragMessage::BeginNewEdge {
            source_anchor: source_anchor.clone(),
        });
        assert_eq!(
            *receiver.borrow(),
            DragState::DraggingNewEdge { source_anchor }
        );
    }
}
