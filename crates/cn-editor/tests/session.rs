//! Integration tests: assistant results, autosave gating, remote updates
//! and closing.

use chrono::Utc;
use cn_core::*;
use cn_editor::*;
use pretty_assertions::assert_eq;

fn new_canvas() -> CanvasController {
    CanvasController::create("canvas-session", "Session", Utc::now(), CanvasConfig::default())
}

fn labelled(name: &str, x: f32) -> DiagramElement {
    DiagramElement::boxed(
        ElementId::intern(name),
        ElementKind::Rectangle,
        Rect::new(x, 100.0, 150.0, 80.0),
        name,
    )
}

// ─── Assistant ──────────────────────────────────────────────────────────

#[test]
fn generate_needs_non_blank_notes() {
    let mut c = new_canvas();
    assert!(c.generate_request().is_none());

    c.set_notes("<p>   </p>");
    assert!(c.generate_request().is_none());

    c.set_notes("<p>Login flow</p>");
    let req = c.generate_request().unwrap();
    assert_eq!(req.session, c.session());
    assert_eq!(req.notes.trim(), "Login flow");
}

#[test]
fn generated_diagram_replaces_elements_in_one_step() {
    let mut c = new_canvas();
    let session = c.session();
    assert!(c.apply_generated(
        session,
        vec![labelled("Login", 100.0), labelled("Database", 350.0)]
    ));

    assert_eq!(c.document().elements().len(), 2);
    assert!(c.can_undo());
    let notices = c.drain_notices();
    assert_eq!(notices[0].level, NoticeLevel::Info);

    c.undo();
    assert!(c.document().elements().is_empty());
}

#[test]
fn empty_generation_reports_error() {
    let mut c = new_canvas();
    let session = c.session();
    assert!(!c.apply_generated(session, Vec::new()));
    assert_eq!(c.drain_notices()[0].level, NoticeLevel::Error);
    assert!(!c.can_undo());
}

#[test]
fn stale_session_results_are_dropped() {
    let first = new_canvas();
    let mut second = new_canvas();
    assert_ne!(first.session(), second.session());

    assert!(!second.apply_generated(first.session(), vec![labelled("Login", 100.0)]));
    assert!(second.document().elements().is_empty());
    assert!(second.notices().is_empty());
}

#[test]
fn results_after_close_are_dropped() {
    let mut c = new_canvas();
    let session = c.session();
    c.close(Utc::now());
    assert!(!c.apply_generated(session, vec![labelled("Login", 100.0)]));
}

#[test]
fn suggestions_resolve_by_label() {
    let mut c = new_canvas();
    let session = c.session();
    assert!(c.suggest_request().is_none());
    c.apply_generated(
        session,
        vec![labelled("sug_login", 100.0), labelled("sug_db", 350.0)],
    );
    let req = c.suggest_request().unwrap();
    assert_eq!(req.labels, vec!["sug_login".to_string(), "sug_db".to_string()]);

    let added = c.apply_suggestions(
        session,
        &[
            SuggestedConnection {
                source: "sug_login".into(),
                target: "sug_db".into(),
            },
            SuggestedConnection {
                source: "sug_login".into(),
                target: "Nowhere".into(),
            },
        ],
    );
    assert_eq!(added, 1);
    assert_eq!(c.document().connections().len(), 1);
}

// ─── Saving ─────────────────────────────────────────────────────────────

#[test]
fn no_save_request_mid_gesture() {
    let mut c = new_canvas();
    c.key_down("r", Modifiers::NONE);
    c.pointer_down(PointerInput::at(500.0, 400.0));
    c.pointer_move(PointerInput::at(600.0, 500.0));
    c.pan_by(5.0, 5.0);
    assert!(c.is_dirty());
    assert!(c.take_save_request(Utc::now()).is_none());

    c.pointer_up(PointerInput::at(600.0, 500.0));
    let req = c.take_save_request(Utc::now()).unwrap();
    assert_eq!(req.record.elements.len(), 1);
    assert!(c.take_save_request(Utc::now()).is_none());
}

#[test]
fn edit_during_save_keeps_dirty() {
    let mut c = new_canvas();
    c.set_notes("first");
    let req = c.take_save_request(Utc::now()).unwrap();
    c.set_notes("second");
    c.mark_saved(req.revision);
    assert!(c.is_dirty());

    let next = c.take_save_request(Utc::now()).unwrap();
    assert_eq!(next.record.notes, "second");
    c.mark_saved(next.revision);
    assert!(!c.is_dirty());
}

#[test]
fn remote_update_waits_for_local_save() {
    let now = Utc::now();
    let mut c = new_canvas();
    c.set_notes("local");

    let mut remote = c.to_record(now);
    remote.notes = "remote".to_string();
    assert!(!c.apply_remote(remote.clone()));
    assert_eq!(c.document().notes, "local");

    let req = c.take_save_request(now).unwrap();
    c.mark_saved(req.revision);
    assert!(c.apply_remote(remote));
    assert_eq!(c.document().notes, "remote");
    assert!(!c.can_undo());
}

#[test]
fn remote_update_keeps_local_view() {
    let now = Utc::now();
    let mut c = new_canvas();
    c.pan_by(40.0, 0.0);
    let req = c.take_save_request(now).unwrap();
    c.mark_saved(req.revision);

    let mut remote = c.to_record(now);
    remote.transform = ViewTransform {
        scale: 3.0,
        dx: 0.0,
        dy: 0.0,
    };
    remote.name = "Renamed elsewhere".to_string();
    assert!(c.apply_remote(remote));
    assert_eq!(c.document().name, "Renamed elsewhere");
    assert_eq!(c.transform().dx, 40.0);
    assert_eq!(c.transform().scale, 1.0);
}

#[test]
fn close_returns_unsaved_record() {
    let mut c = new_canvas();
    assert!(c.close(Utc::now()).is_none());

    let mut c = new_canvas();
    c.rename("Roadmap");
    let record = c.close(Utc::now()).unwrap();
    assert_eq!(record.name, "Roadmap");
    assert!(c.is_closed());
}

#[test]
fn close_commits_open_text_edit() {
    let mut c = new_canvas();
    c.key_down("t", Modifiers::NONE);
    c.pointer_down(PointerInput::at(500.0, 400.0));
    c.pointer_up(PointerInput::at(500.0, 400.0));
    c.edit_text("Title");
    let record = c.close(Utc::now()).unwrap();
    assert_eq!(record.elements[0].content.as_deref(), Some("Title"));
    assert!(c.interaction().is_idle());
}

// ─── Export ─────────────────────────────────────────────────────────────

#[test]
fn exports_queue_notices() {
    let mut c = new_canvas();
    c.set_notes("# Plan");
    let notes = c.export_notes();
    assert_eq!(notes.file_name, "Session-notes.md");
    let svg = c.export_diagram();
    assert_eq!(svg.file_name, "Session-diagram.svg");
    assert_eq!(c.drain_notices().len(), 2);
}
