//! WASM bridge for CanvasNote: exposes the canvas controller to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Structured results cross the
//! boundary as JSON strings; an empty string means "nothing".

use chrono::{DateTime, Utc};
use cn_core::assist::{SuggestedConnection, parse_layout};
use cn_core::config::CanvasConfig;
use cn_core::record::CanvasRecord;
use cn_editor::{
    CanvasController, InputEvent, Modifiers, PointerButton, PointerInput, SessionToken, ToolKind,
    WheelInput,
};
use cn_render::svg::{ExportFile, render_svg};
use serde::Deserialize;
use serde_json::json;
use wasm_bindgen::prelude::*;

/// One open canvas, driven by the browser host.
#[wasm_bindgen]
pub struct NoteCanvas {
    controller: CanvasController,
}

/// What the host needs to know to decide whether to re-render.
#[derive(PartialEq)]
struct Frame {
    revision: u64,
    selection: Vec<String>,
    interaction: &'static str,
    tool: ToolKind,
    ghost: Option<cn_core::geometry::Rect>,
    marquee: Option<cn_core::geometry::Rect>,
}

#[wasm_bindgen]
impl NoteCanvas {
    /// Create a fresh, empty canvas. `config_json` may be empty or a
    /// partial configuration object.
    #[wasm_bindgen(constructor)]
    pub fn new(id: &str, name: &str, config_json: &str) -> Self {
        console_error_panic_hook_setup();
        let controller = CanvasController::create(id, name, now(), parse_config(config_json));
        Self { controller }
    }

    /// Open a stored canvas record.
    pub fn open(record_json: &str, config_json: &str) -> Result<NoteCanvas, JsValue> {
        console_error_panic_hook_setup();
        let record =
            CanvasRecord::from_json(record_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            controller: CanvasController::open(record, parse_config(config_json)),
        })
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.controller
            .set_viewport(cn_core::viewport::ViewportSize { width, height });
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Returns `true` if the canvas needs a re-render.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let input = pointer(x, y, button, shift, ctrl, alt, meta);
        self.step(|c| c.handle(&InputEvent::PointerDown(input)))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_move(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let input = pointer(x, y, 0, shift, ctrl, alt, meta);
        self.step(|c| c.handle(&InputEvent::PointerMove(input)))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_up(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let input = pointer(x, y, 0, shift, ctrl, alt, meta);
        self.step(|c| c.handle(&InputEvent::PointerUp(input)))
    }

    pub fn handle_pointer_leave(&mut self) -> bool {
        self.step(|c| c.handle(&InputEvent::PointerLeave))
    }

    pub fn handle_double_click(&mut self, x: f32, y: f32) -> bool {
        let input = PointerInput::at(x, y);
        self.step(|c| c.handle(&InputEvent::DoubleClick(input)))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_wheel(
        &mut self,
        x: f32,
        y: f32,
        delta_x: f32,
        delta_y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let wheel = WheelInput {
            screen: cn_core::geometry::Point::new(x, y),
            delta_x,
            delta_y,
            modifiers: Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        };
        self.step(|c| c.handle(&InputEvent::Wheel(wheel)))
    }

    /// `key` is the DOM `KeyboardEvent.key` value.
    pub fn handle_key(
        &mut self,
        key: &str,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.step(|c| {
            c.handle(&InputEvent::Key {
                key: key.to_string(),
                modifiers,
            })
        })
    }

    // ─── Tools and text ──────────────────────────────────────────────────

    /// Switch tool by name (`select`, `pan`, `pen`, or an element kind).
    /// Unknown names are ignored.
    pub fn set_tool(&mut self, name: &str) -> bool {
        match ToolKind::from_name(name) {
            Some(tool) => {
                self.controller.select_tool(tool);
                true
            }
            None => false,
        }
    }

    pub fn get_tool_name(&self) -> String {
        self.controller.tool().name().to_string()
    }

    pub fn edit_text(&mut self, content: &str) {
        self.controller.edit_text(content);
    }

    pub fn commit_text(&mut self) {
        self.controller.commit_text();
    }

    pub fn set_notes(&mut self, html: &str) {
        self.controller.set_notes(html);
    }

    pub fn get_notes(&self) -> String {
        self.controller.document().notes.clone()
    }

    pub fn rename(&mut self, name: &str) {
        self.controller.rename(name);
    }

    pub fn undo(&mut self) -> bool {
        self.step(CanvasController::undo)
    }

    pub fn redo(&mut self) -> bool {
        self.step(CanvasController::redo)
    }

    pub fn delete_selected(&mut self) -> bool {
        self.step(CanvasController::delete_selected)
    }

    // ─── Rendering and state ─────────────────────────────────────────────

    pub fn render_svg(&self) -> String {
        render_svg(self.controller.document())
    }

    /// Everything the host draws around the diagram itself, as JSON.
    pub fn view_state(&self) -> String {
        let c = &self.controller;
        let doc = c.document();
        let selection: Vec<&str> = c.selection().ids().iter().map(|id| id.as_str()).collect();
        let ghost = c.interaction().ghost().map(|(kind, rect)| {
            json!({ "type": kind.name(), "rect": rect })
        });
        json!({
            "tool": c.tool().name(),
            "interaction": c.interaction().name(),
            "editing": c.interaction().editing().map(|id| id.as_str().to_string()),
            "selection": selection,
            "ghost": ghost,
            "marquee": c.interaction().marquee(),
            "transform": doc.transform,
            "toolbarPosition": doc.toolbar_position,
            "canUndo": c.can_undo(),
            "canRedo": c.can_redo(),
            "dirty": c.is_dirty(),
        })
        .to_string()
    }

    /// The persisted record of the current document.
    pub fn document_json(&self) -> String {
        self.controller
            .to_record(now())
            .to_json()
            .unwrap_or_default()
    }

    /// Queued notices as `[{level, title, description}]`.
    pub fn drain_notices(&mut self) -> String {
        let notices: Vec<serde_json::Value> = self
            .controller
            .drain_notices()
            .into_iter()
            .map(|n| {
                json!({
                    "level": n.level.name(),
                    "title": n.title,
                    "description": n.description,
                })
            })
            .collect();
        serde_json::Value::Array(notices).to_string()
    }

    pub fn export_notes(&mut self) -> String {
        export_json(self.controller.export_notes())
    }

    pub fn export_diagram(&mut self) -> String {
        export_json(self.controller.export_diagram())
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// `{"revision": n, "record": {...}}` when there is something new to
    /// save, else an empty string.
    pub fn take_save_request(&mut self) -> String {
        let Some(request) = self.controller.take_save_request(now()) else {
            return String::new();
        };
        match serde_json::to_value(&request.record) {
            Ok(record) => json!({ "revision": request.revision, "record": record }).to_string(),
            Err(e) => {
                log::warn!("could not serialize save request: {e}");
                String::new()
            }
        }
    }

    pub fn mark_saved(&mut self, revision: f64) {
        self.controller.mark_saved(revision as u64);
    }

    pub fn save_failed(&mut self, reason: &str) {
        self.controller.save_failed(reason);
    }

    /// Apply a record pushed by the store. Returns `true` if it was applied.
    pub fn apply_remote(&mut self, record_json: &str) -> bool {
        match CanvasRecord::from_json(record_json) {
            Ok(record) => self.controller.apply_remote(record),
            Err(e) => {
                log::warn!("ignoring unreadable remote record: {e}");
                false
            }
        }
    }

    /// Close the canvas. Returns the final record JSON if it has unsaved
    /// changes, else an empty string.
    pub fn close(&mut self) -> String {
        self.controller
            .close(now())
            .and_then(|record| record.to_json().ok())
            .unwrap_or_default()
    }

    // ─── AI assistance ───────────────────────────────────────────────────

    /// `{"session": n, "notes": "..."}`, or empty if the notes are blank.
    pub fn generate_request(&self) -> String {
        self.controller
            .generate_request()
            .map(|r| json!({ "session": r.session.get(), "notes": r.notes }).to_string())
            .unwrap_or_default()
    }

    /// `{"session": n, "notes": "...", "labels": [...]}`, or empty with
    /// fewer than two elements.
    pub fn suggest_request(&self) -> String {
        self.controller
            .suggest_request()
            .map(|r| {
                json!({ "session": r.session.get(), "notes": r.notes, "labels": r.labels })
                    .to_string()
            })
            .unwrap_or_default()
    }

    /// Parse a generated layout and replace the diagram with it. Returns
    /// `false` for a stale session or a layout with no elements.
    ///
    /// An empty layout on the first attempt is dropped quietly so the host
    /// can ask once more; only on `final_attempt` does it reach the user as
    /// a failure notice.
    pub fn apply_generated_layout(
        &mut self,
        session: f64,
        layout: &str,
        final_attempt: bool,
    ) -> bool {
        let Some(session) = self.session(session) else {
            return false;
        };
        let elements = parse_layout(layout, self.controller.config());
        if elements.is_empty() && !final_attempt {
            log::warn!("generated layout had no recognizable elements, retrying");
            return false;
        }
        self.controller.apply_generated(session, elements)
    }

    /// Apply `{"connections": [{source, target}]}`. Returns how many
    /// connections were added.
    pub fn apply_suggestions(&mut self, session: f64, response_json: &str) -> u32 {
        let Some(session) = self.session(session) else {
            return 0;
        };
        let response: SuggestionsResponse = match serde_json::from_str(response_json) {
            Ok(response) => response,
            Err(e) => {
                self.controller.assist_failed(session, &e.to_string());
                return 0;
            }
        };
        let added = self
            .controller
            .apply_suggestions(session, &response.connections);
        u32::try_from(added).unwrap_or(u32::MAX)
    }

    pub fn assist_failed(&mut self, session: f64, message: &str) {
        if let Some(session) = self.session(session) {
            self.controller.assist_failed(session, message);
        }
    }
}

impl NoteCanvas {
    /// Run `f` and report whether anything visible changed.
    fn step(&mut self, f: impl FnOnce(&mut CanvasController)) -> bool {
        let before = self.frame();
        f(&mut self.controller);
        self.frame() != before
    }

    fn frame(&self) -> Frame {
        let c = &self.controller;
        Frame {
            revision: c.revision(),
            selection: c
                .selection()
                .ids()
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            interaction: c.interaction().name(),
            tool: c.tool(),
            ghost: c.interaction().ghost().map(|(_, rect)| rect),
            marquee: c.interaction().marquee(),
        }
    }

    /// Session numbers come back from JS; anything but the live one is stale.
    fn session(&self, raw: f64) -> Option<SessionToken> {
        let live = self.controller.session();
        if live.get() as f64 == raw {
            Some(live)
        } else {
            log::warn!("dropping assistant result for stale session {raw}");
            None
        }
    }
}

#[derive(Deserialize)]
struct SuggestionsResponse {
    connections: Vec<SuggestedConnection>,
}

#[allow(clippy::too_many_arguments)]
fn pointer(
    x: f32,
    y: f32,
    button: i16,
    shift: bool,
    ctrl: bool,
    alt: bool,
    meta: bool,
) -> PointerInput {
    PointerInput::at(x, y)
        .with_button(PointerButton::from_dom(button))
        .with_modifiers(Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        })
}

fn parse_config(json: &str) -> CanvasConfig {
    if json.trim().is_empty() {
        return CanvasConfig::default();
    }
    CanvasConfig::from_json(json).unwrap_or_else(|e| {
        log::warn!("invalid canvas config, using defaults: {e}");
        CanvasConfig::default()
    })
}

fn export_json(file: ExportFile) -> String {
    json!({
        "fileName": file.file_name,
        "mimeType": file.mime_type,
        "contents": file.contents,
    })
    .to_string()
}

fn now() -> DateTime<Utc> {
    #[cfg(target_arch = "wasm32")]
    {
        DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Utc::now()
    }
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("CanvasNote WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
