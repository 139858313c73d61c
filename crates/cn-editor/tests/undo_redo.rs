//! Integration tests: undo/redo through the canvas controller.

use chrono::Utc;
use cn_core::*;
use cn_editor::*;
use pretty_assertions::assert_eq;

fn new_canvas() -> CanvasController {
    CanvasController::create("canvas-undo", "Undo", Utc::now(), CanvasConfig::default())
}

/// Click-create a rectangle at `(x, y)` and leave text editing.
fn create_rect(c: &mut CanvasController, x: f32, y: f32) {
    c.key_down("r", Modifiers::NONE);
    c.pointer_down(PointerInput::at(x, y));
    c.pointer_up(PointerInput::at(x, y));
    c.key_down("Escape", Modifiers::NONE);
}

fn undo_key(c: &mut CanvasController) {
    c.key_down("z", Modifiers::CTRL);
}

fn redo_key(c: &mut CanvasController) {
    c.key_down("y", Modifiers::CTRL);
}

#[test]
fn undo_and_redo_creation() {
    let mut c = new_canvas();
    create_rect(&mut c, 500.0, 400.0);
    assert_eq!(c.document().elements().len(), 1);

    undo_key(&mut c);
    assert!(c.document().elements().is_empty());
    assert!(c.can_redo());

    redo_key(&mut c);
    assert_eq!(c.document().elements().len(), 1);
    assert!(!c.can_redo());
}

#[test]
fn meta_shift_z_redoes() {
    let mut c = new_canvas();
    create_rect(&mut c, 500.0, 400.0);
    undo_key(&mut c);

    let cmd_shift = Modifiers {
        meta: true,
        shift: true,
        ..Modifiers::NONE
    };
    c.key_down("Z", cmd_shift);
    assert_eq!(c.document().elements().len(), 1);
}

#[test]
fn new_edit_after_undo_clears_redo() {
    let mut c = new_canvas();
    create_rect(&mut c, 500.0, 400.0);
    create_rect(&mut c, 800.0, 400.0);
    undo_key(&mut c);
    assert!(c.can_redo());

    create_rect(&mut c, 500.0, 700.0);
    assert!(!c.can_redo());
    assert_eq!(c.document().elements().len(), 2);
}

#[test]
fn drag_is_one_undo_step() {
    let mut c = new_canvas();
    create_rect(&mut c, 500.0, 400.0);
    let original = c.document().elements()[0].rect();

    c.pointer_down(PointerInput::at(500.0, 400.0));
    for step in 1..=10 {
        c.pointer_move(PointerInput::at(500.0 + step as f32 * 10.0, 400.0));
    }
    c.pointer_up(PointerInput::at(600.0, 400.0));
    assert_ne!(c.document().elements()[0].rect(), original);

    undo_key(&mut c);
    assert_eq!(c.document().elements()[0].rect(), original);
}

#[test]
fn click_without_move_records_nothing() {
    let mut c = new_canvas();
    create_rect(&mut c, 500.0, 400.0);
    c.pointer_down(PointerInput::at(500.0, 400.0));
    c.pointer_up(PointerInput::at(500.0, 400.0));

    undo_key(&mut c);
    assert!(c.document().elements().is_empty());
}

#[test]
fn undo_prunes_selection() {
    let mut c = new_canvas();
    create_rect(&mut c, 500.0, 400.0);
    c.pointer_down(PointerInput::at(500.0, 400.0));
    c.pointer_up(PointerInput::at(500.0, 400.0));
    assert_eq!(c.selection().len(), 1);

    undo_key(&mut c);
    assert!(c.selection().is_empty());
}

#[test]
fn undo_is_ignored_mid_gesture() {
    let mut c = new_canvas();
    create_rect(&mut c, 500.0, 400.0);
    c.pointer_down(PointerInput::at(500.0, 400.0));
    c.pointer_move(PointerInput::at(550.0, 400.0));
    c.undo();
    assert_eq!(c.document().elements().len(), 1);
    assert_eq!(c.interaction().name(), "draggingElements");
}

#[test]
fn undo_marks_document_dirty() {
    let mut c = new_canvas();
    create_rect(&mut c, 500.0, 400.0);
    let rev = c.take_save_request(Utc::now()).unwrap().revision;
    c.mark_saved(rev);
    assert!(!c.is_dirty());

    undo_key(&mut c);
    assert!(c.is_dirty());
}
