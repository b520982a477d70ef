//! Revert round-trip tests
//!
//! `restore(capture(batch))` applied right after `apply(batch)` must bring
//! every captured node's geometry, fills, text, and sizing mode back to
//! bit-identical pre-batch values — including after batches that touched
//! siblings through propagation.

use pretty_assertions::assert_eq;

use agent_canvas::ops::{Operation, OperationBatch};
use agent_canvas::scene::{
    Color, ContainerData, LayoutMode, NodeId, Padding, Paint, Rect, SceneGraph, ShapePrimitive,
    SizingMode, TextStyle,
};
use agent_canvas::{CanvasEditor, EngineConfig, JsonFileRevertStore, RevertError};

fn build_scene() -> (SceneGraph, NodeId, NodeId, NodeId) {
    let mut scene = SceneGraph::new(600.0, 500.0);
    let root = scene.root();
    let card = scene
        .create_container(
            root,
            "card",
            Rect::new(20.0, 20.0, 300.0, 180.0),
            ContainerData::auto_flow(LayoutMode::Vertical, Padding::uniform(16.0), 12.0),
        )
        .unwrap();
    let title = scene
        .create_text(
            card,
            "title",
            Rect::new(16.0, 16.0, 200.0, 24.0),
            "Quarterly report",
            TextStyle {
                family: "Inter".to_string(),
                style: "Bold".to_string(),
                size: 18.0,
            },
        )
        .unwrap();
    let footer = scene
        .create_shape(root, "footer", Rect::new(20.0, 240.0, 300.0, 80.0), ShapePrimitive::Rectangle)
        .unwrap();
    scene.get_mut(footer).unwrap().fills = vec![Paint::solid(Color::new(0x33, 0x33, 0x33))];
    scene.get_mut(footer).unwrap().corner_radius = 6.0;
    scene.get_mut(card).unwrap().sizing_vertical = SizingMode::Hug;
    (scene, card, title, footer)
}

fn full_dump(scene: &SceneGraph) -> Vec<(NodeId, String)> {
    scene
        .preorder(scene.root())
        .into_iter()
        .map(|id| (id, format!("{:?}", scene.get(id).unwrap())))
        .collect()
}

#[test]
fn test_revert_restores_every_captured_property() {
    let (scene, card, title, footer) = build_scene();
    let before = full_dump(&scene);

    let mut editor = CanvasEditor::new(scene, EngineConfig::default());
    let reports = editor.apply_batch(OperationBatch::new(
        "restyle and restructure the card",
        vec![
            Operation::Resize {
                node_id: card,
                width: 450.0,
                height: 270.0,
            },
            Operation::SetText {
                node_id: title,
                content: "Annual report".to_string(),
                font_family: Some("Inter".to_string()),
                font_style: Some("Medium".to_string()),
            },
            Operation::SetFillColor {
                node_id: footer,
                color: "#ff5722".to_string(),
            },
            Operation::Rename {
                node_id: footer,
                name: "colophon".to_string(),
            },
            Operation::SetSizingMode {
                node_id: footer,
                horizontal: Some(SizingMode::Fixed),
                vertical: Some(SizingMode::Fixed),
            },
        ],
    ));
    assert!(reports.iter().all(|r| r.outcome.is_ok()));

    // Something actually changed before we revert.
    assert_ne!(before, full_dump(editor.scene()));

    editor.revert_last().unwrap();
    assert_eq!(before, full_dump(editor.scene()));
}

#[test]
fn test_revert_covers_propagation_shifted_siblings() {
    let (scene, card, _, footer) = build_scene();
    let footer_before = scene.get(footer).unwrap().rect;

    let mut editor = CanvasEditor::new(scene, EngineConfig::default());
    editor.apply_batch(OperationBatch::new(
        "grow the card",
        vec![Operation::Resize {
            node_id: card,
            width: 300.0,
            height: 400.0,
        }],
    ));

    // Propagation moved the footer even though no operation targeted it
    // directly (tight-fit absorbs the slack, so the card ends up shorter
    // and the footer rides up with it).
    let footer_after = editor.scene().get(footer).unwrap().rect;
    assert_ne!(footer_after.y, footer_before.y);

    editor.revert_last().unwrap();
    assert_eq!(editor.scene().get(footer).unwrap().rect, footer_before);
}

#[test]
fn test_revert_state_survives_restart() {
    let dir = std::env::temp_dir().join("agent-canvas-revert-test");
    std::fs::create_dir_all(&dir).unwrap();
    let store_path = dir.join("revert-state.json");
    let _ = std::fs::remove_file(&store_path);

    let (scene, card, _, _) = build_scene();
    let before = full_dump(&scene);

    {
        let mut editor = CanvasEditor::new(scene, EngineConfig::default())
            .with_store(JsonFileRevertStore::new(&store_path));
        editor.apply_batch(OperationBatch::new(
            "grow the card",
            vec![Operation::Resize {
                node_id: card,
                width: 450.0,
                height: 270.0,
            }],
        ));
        // Editor dropped here: simulates the process going away. The edited
        // scene is carried over through its portable form below.
    }

    // "Restart": rebuild the same post-edit scene state from scratch by
    // replaying the batch on a fresh editor without persisting, then attach
    // the persisted store and revert.
    let (scene2, card2, _, _) = build_scene();
    let mut editor = CanvasEditor::new(scene2, EngineConfig::default());
    editor.apply_batch(OperationBatch::new(
        "grow the card",
        vec![Operation::Resize {
            node_id: card2,
            width: 450.0,
            height: 270.0,
        }],
    ));

    let mut restarted = CanvasEditor::new(
        agent_canvas::scene::import(&agent_canvas::scene::export(
            editor.scene(),
            editor.scene().root(),
            None,
        )
        .unwrap())
        .unwrap(),
        EngineConfig::default(),
    )
    .with_store(JsonFileRevertStore::new(&store_path));

    restarted.revert_last().unwrap();
    assert_eq!(before, full_dump(restarted.scene()));

    // Consumed: the persisted state is gone too.
    let err = restarted.revert_last().unwrap_err();
    assert!(matches!(err, RevertError::NothingToRevert));
}

#[test]
fn test_revert_without_batch_fails_cleanly() {
    let (scene, _, _, _) = build_scene();
    let mut editor = CanvasEditor::new(scene, EngineConfig::default());
    let err = editor.revert_last().unwrap_err();
    assert!(matches!(err, RevertError::NothingToRevert));
}
