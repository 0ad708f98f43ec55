//! Replays driven from scene and script files on disk.

use revis_core::{MouseEventKind, MousePayload};
use revis_replay::{ReplayError, Report, replay_files};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const EPS: f64 = 1e-6;

const SCENE: &str = r#"{
    "nodes": [
        { "id": "n1", "x": 400.0, "y": 300.0, "fixed": true },
        { "id": "n2", "x": 600.0, "y": 300.0, "fixed": true },
        { "id": "n3", "x": 400.0, "y": 450.0, "fixed": true }
    ],
    "edges": [
        { "id": "e1", "from": "n1", "to": "n2" },
        { "id": "e2", "from": "n2", "to": "n3" }
    ],
    "options": { "layout_options": { "fit_on_finish": false } },
    "screen": { "width": 800.0, "height": 600.0 }
}"#;

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn run(script: &str) -> Report {
    let dir = tempdir().unwrap();
    let scene = write(dir.path(), "scene.json", SCENE);
    let script = write(dir.path(), "script.json", script);
    replay_files(scene, script).unwrap()
}

#[test]
fn test_drag_after_wheel_zoom() {
    // Zooming around n1 keeps it at (400, 300) on screen.
    let report = run(r#"{ "steps": [
        { "step": "pointer", "event": {
            "type": "wheel",
            "position": { "x": 400.0, "y": 300.0 },
            "delta": { "x": 0.0, "y": -200.0 }
        } },
        { "step": "pointer", "event": { "type": "down", "position": { "x": 400.0, "y": 300.0 } } },
        { "step": "pointer", "event": { "type": "move", "position": { "x": 410.0, "y": 310.0 } } },
        { "step": "pointer", "event": { "type": "up", "position": { "x": 410.0, "y": 310.0 } } }
    ] }"#);

    let scale = report.camera.scale;
    assert!(scale > 1.0);
    let dragged: Vec<_> = report
        .events
        .iter()
        .filter(|event| event.kind == MouseEventKind::NodesDragged)
        .collect();
    assert_eq!(dragged.len(), 1);
    let MousePayload::Nodes { nodes } = &dragged[0].payload else {
        panic!("Unexpected payload {:?}", dragged[0].payload);
    };
    assert_eq!(nodes[0].id, "n1");
    assert!((nodes[0].position.x - (400.0 + 10.0 / scale)).abs() < EPS);
    assert!((nodes[0].position.y - (300.0 + 10.0 / scale)).abs() < EPS);
}

#[test]
fn test_hover_shows_after_delay() {
    let report = run(r#"{ "steps": [
        { "step": "pointer", "event": { "type": "move", "position": { "x": 600.0, "y": 300.0 } } },
        { "step": "tick", "ms": 100, "frames": 8 },
        { "step": "pointer", "event": { "type": "move", "position": { "x": 100.0, "y": 100.0 } } }
    ] }"#);
    let kinds: Vec<_> = report.events.iter().map(|event| event.kind).collect();
    assert_eq!(kinds, vec![MouseEventKind::HoverShow, MouseEventKind::HoverHide]);
    assert!(report.events[0].raw.is_none());
    assert!(report.events[1].raw.is_some());
}

#[test]
fn test_edge_click() {
    let report = run(r#"{ "steps": [
        { "step": "pointer", "event": { "type": "down", "position": { "x": 500.0, "y": 302.0 } } },
        { "step": "pointer", "event": { "type": "up", "position": { "x": 500.0, "y": 302.0 } } }
    ] }"#);
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].kind, MouseEventKind::EdgeClick);
    assert_eq!(report.events[0].payload, MousePayload::Edge { id: "e1".into() });
}

#[test]
fn test_missing_script_file() {
    let dir = tempdir().unwrap();
    let scene = write(dir.path(), "scene.json", SCENE);
    let result = replay_files(scene, dir.path().join("missing.json"));
    assert!(matches!(result, Err(ReplayError::Io(_))));
}

#[test]
fn test_malformed_script() {
    let dir = tempdir().unwrap();
    let scene = write(dir.path(), "scene.json", SCENE);
    let script = write(dir.path(), "script.json", r#"{ "steps": [{ "step": "teleport" }] }"#);
    assert!(matches!(replay_files(scene, script), Err(ReplayError::Parse(_))));
}
