//! Integration tests: document invariants, hydration repair, and the
//! persisted record shape.

use chrono::{DateTime, Utc};
use cn_core::*;
use pretty_assertions::assert_eq;

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn load_fixture() -> (Document, RecordMeta) {
    let record = CanvasRecord::from_json(include_str!("fixtures/corrupted.json")).unwrap();
    Document::from_record(record)
}

fn ids(doc: &Document) -> Vec<&str> {
    doc.elements().iter().map(|e| e.id().as_str()).collect()
}

fn add_box(doc: &mut Document, name: &str, x: f32) -> ElementId {
    let id = ElementId::intern(name);
    doc.apply(DocumentMutation::InsertElement(Box::new(DiagramElement::boxed(
        id,
        ElementKind::Rectangle,
        Rect::new(x, 0.0, 100.0, 50.0),
        name,
    ))));
    id
}

// ─── Cascade delete ─────────────────────────────────────────────────────

#[test]
fn deleting_an_element_removes_every_touching_connection() {
    let mut doc = Document::default();
    let a = add_box(&mut doc, "cd_a", 0.0);
    let b = add_box(&mut doc, "cd_b", 200.0);
    let c = add_box(&mut doc, "cd_c", 400.0);
    doc.apply(DocumentMutation::AddConnections(vec![
        DiagramConnection::new(a, b),
        DiagramConnection::new(c, a),
        DiagramConnection::new(b, c),
    ]));

    assert!(doc.apply(DocumentMutation::RemoveElements(vec![a])));

    assert_eq!(doc.connections().len(), 1);
    for conn in doc.connections() {
        assert!(!conn.touches(a));
        assert!(doc.contains(conn.source.element_id));
        assert!(doc.contains(conn.target.element_id));
    }
}

#[test]
fn removing_unknown_ids_is_a_noop() {
    let mut doc = Document::default();
    add_box(&mut doc, "cd_only", 0.0);
    let before = doc.snapshot();
    assert!(!doc.apply(DocumentMutation::RemoveElements(vec![ElementId::intern("cd_nope")])));
    assert_eq!(doc.snapshot(), before);
}

// ─── Hydration ──────────────────────────────────────────────────────────

#[test]
fn hydration_drops_invalid_elements() {
    let (doc, _) = load_fixture();
    assert_eq!(ids(&doc), vec!["login", "db", "note", "stroke"]);
}

#[test]
fn hydration_drops_dangling_connections() {
    let (doc, _) = load_fixture();
    let conns: Vec<&str> = doc.connections().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(conns, vec!["c1"]);
}

#[test]
fn hydration_clamps_scale_and_keeps_view_state() {
    let (doc, meta) = load_fixture();
    assert_eq!(doc.transform.scale, MAX_SCALE);
    assert_eq!(doc.transform.dx, 10.0);
    assert_eq!(doc.toolbar_position, Point::new(16.0, 150.0));
    assert_eq!(meta.id, "canvas-1");
    assert_eq!(meta.owner_id.as_deref(), Some("user-7"));
    assert_eq!(meta.created_at, ts("2024-05-01T10:00:00Z"));
}

// ─── Serialization ──────────────────────────────────────────────────────

#[test]
fn record_has_stable_camel_case_shape() {
    let (doc, meta) = load_fixture();
    let record = doc.to_record(&meta, ts("2024-06-01T00:00:00Z"));
    let json: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();

    assert_eq!(json["name"], "Architecture");
    assert_eq!(json["ownerId"], "user-7");
    assert_eq!(json["toolbarPosition"]["y"], 150.0);
    assert_eq!(json["transform"]["scale"], 5.0);
    assert_eq!(json["connections"][0]["source"]["elementId"], "login");
    assert_eq!(json["lastModified"], "2024-06-01T00:00:00Z");
    assert_eq!(json["createdAt"], "2024-05-01T10:00:00Z");

    // Only the sticky note carries a background.
    let elements = json["elements"].as_array().unwrap();
    assert!(elements[1].get("backgroundColor").is_none());
    assert_eq!(elements[2]["backgroundColor"], "#FFF9C4");
    assert_eq!(elements[3]["type"], "freehand-drawing");
    assert!(elements[3].get("width").is_none());
}

#[test]
fn single_point_drawing_is_never_persisted() {
    let mut doc = Document::default();
    doc.apply(DocumentMutation::InsertElement(Box::new(DiagramElement::drawing(
        ElementId::intern("ser_dot"),
        vec![Point::new(1.0, 1.0)],
    ))));
    let meta = RecordMeta::new("c", ts("2024-01-01T00:00:00Z"));
    let record = doc.to_record(&meta, ts("2024-01-01T00:00:00Z"));
    assert!(record.elements.is_empty());
    assert!(!record.to_json().unwrap().contains("ownerId"));
}

#[test]
fn record_roundtrips_through_hydration() {
    let (doc, meta) = load_fixture();
    let record = doc.to_record(&meta, ts("2024-06-01T00:00:00Z"));
    let reparsed = CanvasRecord::from_json(&record.to_json().unwrap()).unwrap();
    let (again, _) = Document::from_record(reparsed);
    assert_eq!(again, doc);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(matches!(
        CanvasRecord::from_json("{\"name\": 3}"),
        Err(RecordError::Json(_))
    ));
}
