//! The canvas controller.
//!
//! Turns the host's pointer, wheel and keyboard events into document
//! mutations and mode transitions. Owns the document, the selection, the
//! current [`Interaction`], undo history and the save gate. Every change to
//! elements or connections goes through one private `mutate` path, which is
//! also where the save revision is bumped.

use crate::history::History;
use crate::input::{InputEvent, Modifiers, PointerButton, PointerInput, WheelInput};
use crate::interaction::{Interaction, resize_rect};
use crate::notice::Notice;
use crate::persist::SaveGate;
use crate::selection::Selection;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::ToolKind;
use chrono::{DateTime, Utc};
use cn_core::assist::{SuggestedConnection, notes_to_plain_text, resolve_suggestions};
use cn_core::config::CanvasConfig;
use cn_core::geometry::{Point, Rect};
use cn_core::id::ElementId;
use cn_core::model::{
    DiagramConnection, DiagramElement, Document, DocumentMutation, ElementKind, Geometry,
};
use cn_core::record::{CanvasRecord, RecordMeta};
use cn_core::viewport::{ViewTransform, ViewportSize, clamp_into_viewport};
use cn_render::hit::{anchor_hit, elements_intersecting, hit_test, resize_handle_at};
use cn_render::svg::{ExportFile, export_diagram, export_notes};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Identifies one open controller. Asynchronous results are tagged with the
/// token of the controller that asked for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

impl SessionToken {
    fn next() -> Self {
        Self(NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Input for an assistant call: the notes as plain text and, for
/// connection suggestions, the element labels.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistRequest {
    pub session: SessionToken,
    pub notes: String,
    pub labels: Vec<String>,
}

/// A serialized document waiting to be handed to the saver.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub revision: u64,
    pub record: CanvasRecord,
}

pub struct CanvasController {
    doc: Document,
    meta: RecordMeta,
    config: CanvasConfig,
    viewport: Option<ViewportSize>,
    /// Whether the toolbar has a real position yet. Fresh documents place
    /// it once the viewport size is known.
    toolbar_placed: bool,
    tool: ToolKind,
    selection: Selection,
    interaction: Interaction,
    history: History,
    save: SaveGate,
    notices: Vec<Notice>,
    session: SessionToken,
    closed: bool,
    last_pointer: Option<PointerInput>,
}

impl CanvasController {
    /// A brand-new, empty canvas.
    pub fn create(
        id: impl Into<String>,
        name: impl Into<String>,
        now: DateTime<Utc>,
        config: CanvasConfig,
    ) -> Self {
        let mut doc = Document::new(name);
        doc.toolbar_position = config.default_toolbar_position;
        Self::with_document(doc, RecordMeta::new(id, now), config, false)
    }

    /// Open a stored canvas. Corrupt parts of the record are repaired.
    pub fn open(record: CanvasRecord, config: CanvasConfig) -> Self {
        let (doc, meta) = Document::from_record(record);
        Self::with_document(doc, meta, config, true)
    }

    fn with_document(
        mut doc: Document,
        meta: RecordMeta,
        config: CanvasConfig,
        toolbar_placed: bool,
    ) -> Self {
        let config = config.or_default();
        doc.transform = doc.transform.clamped(config.min_scale, config.max_scale);
        let history = History::new(doc.snapshot(), config.history_depth);
        let session = SessionToken::next();
        log::info!("opened canvas {} (session {})", meta.id, session.0);
        Self {
            doc,
            meta,
            config,
            viewport: None,
            toolbar_placed,
            tool: ToolKind::Select,
            selection: Selection::new(),
            interaction: Interaction::Idle,
            history,
            save: SaveGate::default(),
            notices: Vec::new(),
            session,
            closed: false,
            last_pointer: None,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn transform(&self) -> ViewTransform {
        self.doc.transform
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn session(&self) -> SessionToken {
        self.session
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_dirty(&self) -> bool {
        self.save.is_dirty()
    }

    pub fn revision(&self) -> u64 {
        self.save.revision()
    }

    pub fn screen_to_document(&self, p: Point) -> Point {
        self.doc.transform.screen_to_document(p)
    }

    // ─── Mutation plumbing ───────────────────────────────────────────────

    fn mutate(&mut self, mutation: DocumentMutation) -> bool {
        let changed = self.doc.apply(mutation);
        if changed {
            self.save.touch();
        }
        changed
    }

    /// Record the current elements/connections as one undo step.
    fn commit(&mut self) {
        self.history.commit(self.doc.snapshot());
    }

    fn begin(&mut self, next: Interaction) {
        log::debug!("{} -> {}", self.interaction.name(), next.name());
        self.interaction = next;
    }

    fn prune_selection(&mut self) {
        let doc = &self.doc;
        self.selection.retain(|id| doc.contains(id));
    }

    fn set_transform(&mut self, t: ViewTransform) {
        let t = t.clamped(self.config.min_scale, self.config.max_scale);
        if t != self.doc.transform {
            self.doc.transform = t;
            self.save.touch();
        }
    }

    fn set_toolbar_position(&mut self, pos: Point) {
        let pos = match self.viewport {
            Some(size) => clamp_into_viewport(
                pos,
                (self.config.toolbar_width, self.config.toolbar_height),
                size,
            ),
            None => pos,
        };
        if pos != self.doc.toolbar_position {
            self.doc.toolbar_position = pos;
            self.save.touch();
        }
    }

    fn toolbar_grip(&self) -> Rect {
        let p = self.doc.toolbar_position;
        Rect::new(p.x, p.y, self.config.toolbar_width, self.config.toolbar_grip_height)
    }

    /// Final box for a create gesture. A ghost smaller than the click
    /// threshold becomes a default-sized box centered on the release point.
    fn created_rect(&self, kind: ElementKind, ghost: Rect, release: Point) -> Rect {
        let threshold = self.config.click_threshold;
        if ghost.width < threshold || ghost.height < threshold {
            let (w, h) = self.config.default_size(kind);
            Rect::centered_at(release, w, h)
        } else {
            ghost
        }
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// The canvas container was (re)sized.
    pub fn set_viewport(&mut self, size: ViewportSize) {
        self.viewport = Some(size);
        let target = if self.toolbar_placed {
            self.doc.toolbar_position
        } else {
            self.toolbar_placed = true;
            // Vertically centered for a fresh canvas.
            Point::new(
                self.config.default_toolbar_position.x,
                size.height / 2.0 - 150.0,
            )
        };
        self.set_toolbar_position(target);
    }

    pub fn zoom_at(&mut self, screen: Point, delta_scale: f32) {
        let t = self.doc.transform.zoom_at(
            screen,
            delta_scale,
            self.config.min_scale,
            self.config.max_scale,
        );
        self.set_transform(t);
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        let t = self.doc.transform.pan_by(dx, dy);
        self.set_transform(t);
    }

    /// Ctrl/Shift + wheel (and trackpad pinch) zooms at the cursor; plain
    /// wheel pans.
    pub fn wheel(&mut self, input: WheelInput) {
        if input.modifiers.ctrl || input.modifiers.shift {
            let factor = 1.0 - input.delta_y * self.config.wheel_zoom_factor;
            self.zoom_at(input.screen, factor);
        } else {
            self.pan_by(-input.delta_x, -input.delta_y);
        }
    }

    // ─── Tools ───────────────────────────────────────────────────────────

    pub fn select_tool(&mut self, tool: ToolKind) {
        if self.interaction.editing().is_some() {
            self.commit_text();
        }
        if self.interaction.is_gesture() {
            return;
        }
        log::debug!("tool {} -> {}", self.tool, tool);
        self.tool = tool;
    }

    // ─── Events ──────────────────────────────────────────────────────────

    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown(p) => self.pointer_down(*p),
            InputEvent::PointerMove(p) => self.pointer_move(*p),
            InputEvent::PointerUp(p) => self.pointer_up(*p),
            InputEvent::PointerLeave => self.pointer_leave(),
            InputEvent::DoubleClick(p) => self.double_click(*p),
            InputEvent::Wheel(w) => self.wheel(*w),
            InputEvent::Key { key, modifiers } => self.key_down(key, *modifiers),
        }
    }

    pub fn pointer_down(&mut self, input: PointerInput) {
        self.last_pointer = Some(input);
        let pt = self.screen_to_document(input.screen);

        if self.interaction.editing().is_some() {
            let on_empty_canvas = !self.toolbar_grip().contains(input.screen)
                && hit_test(self.doc.elements(), pt).is_none();
            if on_empty_canvas {
                self.commit_text();
            }
            return;
        }
        if !self.interaction.is_idle() {
            log::debug!("pointer-down during {}, ignored", self.interaction.name());
            return;
        }
        if input.button == PointerButton::Secondary {
            return;
        }

        if self.toolbar_grip().contains(input.screen) {
            self.begin(Interaction::DraggingToolbar {
                start: input.screen,
                origin: self.doc.toolbar_position,
            });
            return;
        }

        if input.button == PointerButton::Middle
            || input.modifiers.command()
            || self.tool == ToolKind::Pan
        {
            self.begin(Interaction::Panning {
                start: input.screen,
                origin: self.doc.transform,
            });
            return;
        }

        match self.tool {
            ToolKind::Shape(kind) => self.begin(Interaction::CreatingShape {
                kind,
                start: pt,
                ghost: Rect::new(pt.x, pt.y, 0.0, 0.0),
            }),
            ToolKind::Pen => {
                let id = ElementId::generate();
                let revision = self.save.revision();
                self.mutate(DocumentMutation::InsertElement(Box::new(
                    DiagramElement::drawing(id, vec![pt]),
                )));
                self.begin(Interaction::DrawingFreehand { id, revision });
            }
            ToolKind::Select | ToolKind::Pan => self.select_pointer_down(input, pt),
        }
    }

    /// Pointer-down with no creation tool: anchor, then resize handle, then
    /// element body, then empty canvas.
    fn select_pointer_down(&mut self, input: PointerInput, pt: Point) {
        let scale = self.doc.transform.scale;
        let mods = input.modifiers;

        if !mods.alt
            && let Some((source, side)) = anchor_hit(self.doc.elements(), pt, scale, &self.config)
        {
            self.begin(Interaction::CreatingConnection {
                source,
                side,
                start: pt,
                ghost: Rect::new(pt.x, pt.y, 0.0, 0.0),
            });
            return;
        }

        let resize = self.selection.single().and_then(|id| {
            let el = self.doc.element(id)?;
            let handle = resize_handle_at(el, pt, scale, &self.config)?;
            Some((id, handle, el.rect()?))
        });
        if let Some((id, handle, base)) = resize {
            self.begin(Interaction::ResizingElement {
                id,
                handle,
                start: input.screen,
                base,
            });
            return;
        }

        match hit_test(self.doc.elements(), pt) {
            Some(hit) => {
                let mut settle = None;
                if mods.shift {
                    self.selection.toggle(hit);
                } else if !self.selection.contains(hit) {
                    self.selection.set_only(hit);
                } else {
                    settle = Some(hit);
                }
                let base = self
                    .selection
                    .ids()
                    .iter()
                    .filter_map(|id| self.doc.element(*id).map(|el| (*id, el.geometry().clone())))
                    .collect();
                self.begin(Interaction::DraggingElements {
                    start: input.screen,
                    base,
                    settle,
                    moved: false,
                });
            }
            None => {
                if !mods.shift {
                    self.selection.clear();
                }
                self.begin(Interaction::MarqueeSelecting {
                    start: pt,
                    base: self.selection.clone(),
                    marquee: Rect::new(pt.x, pt.y, 0.0, 0.0),
                });
            }
        }
    }

    pub fn pointer_move(&mut self, input: PointerInput) {
        self.last_pointer = Some(input);
        if !self.interaction.is_gesture() {
            return;
        }
        let mut state = std::mem::take(&mut self.interaction);
        self.update_gesture(&mut state, input);
        self.interaction = state;
    }

    fn update_gesture(&mut self, state: &mut Interaction, input: PointerInput) {
        let pt = self.screen_to_document(input.screen);
        let scale = self.doc.transform.scale;
        log::trace!("{} move to {:?}", state.name(), pt);

        match state {
            Interaction::Idle | Interaction::EditingText { .. } => {}
            Interaction::Panning { start, origin } => {
                let t = ViewTransform {
                    scale: origin.scale,
                    dx: origin.dx + (input.screen.x - start.x),
                    dy: origin.dy + (input.screen.y - start.y),
                };
                self.set_transform(t);
            }
            Interaction::DraggingToolbar { start, origin } => {
                let pos = origin.offset(input.screen.x - start.x, input.screen.y - start.y);
                self.set_toolbar_position(pos);
            }
            Interaction::CreatingShape { start, ghost, .. }
            | Interaction::CreatingConnection { start, ghost, .. } => {
                *ghost = Rect::from_corners(*start, pt);
            }
            Interaction::DrawingFreehand { id, .. } => {
                let last = self
                    .doc
                    .element(*id)
                    .and_then(DiagramElement::points)
                    .and_then(|points| points.last().copied());
                if last != Some(pt) {
                    self.mutate(DocumentMutation::PushPoint { id: *id, point: pt });
                }
            }
            Interaction::DraggingElements {
                start, base, moved, ..
            } => {
                let dx = (input.screen.x - start.x) / scale;
                let dy = (input.screen.y - start.y) / scale;
                if dx != 0.0 || dy != 0.0 {
                    *moved = true;
                }
                for (id, geometry) in base.iter() {
                    self.mutate(DocumentMutation::SetGeometry {
                        id: *id,
                        geometry: geometry.translate(dx, dy),
                    });
                }
            }
            Interaction::ResizingElement {
                id,
                handle,
                start,
                base,
            } => {
                let dx = (input.screen.x - start.x) / scale;
                let dy = (input.screen.y - start.y) / scale;
                let rect = resize_rect(
                    base,
                    *handle,
                    dx,
                    dy,
                    self.config.min_element_size,
                    input.modifiers.shift,
                );
                self.mutate(DocumentMutation::SetGeometry {
                    id: *id,
                    geometry: Geometry::Box(rect),
                });
            }
            Interaction::MarqueeSelecting {
                start,
                base,
                marquee,
            } => {
                *marquee = Rect::from_corners(*start, pt);
                let mut selection = base.clone();
                selection.extend_unique(elements_intersecting(self.doc.elements(), marquee));
                self.selection = selection;
            }
        }
    }

    pub fn pointer_up(&mut self, input: PointerInput) {
        // The release position is the final move of the gesture.
        self.pointer_move(input);
        let release = self.screen_to_document(input.screen);

        let state = std::mem::take(&mut self.interaction);
        if !state.is_gesture() {
            self.interaction = state;
            return;
        }
        log::debug!("{} -> idle (pointer-up)", state.name());

        match state {
            Interaction::Idle | Interaction::EditingText { .. } => {}
            Interaction::Panning { .. } | Interaction::DraggingToolbar { .. } => {}
            Interaction::CreatingShape { kind, ghost, .. } => {
                self.finish_shape(kind, ghost, release);
            }
            Interaction::CreatingConnection { source, ghost, .. } => {
                self.finish_connection(source, ghost, release);
            }
            Interaction::DrawingFreehand { id, revision } => self.finish_drawing(id, revision),
            Interaction::DraggingElements { settle, moved, .. } => {
                if !moved && let Some(id) = settle {
                    self.selection.set_only(id);
                }
                self.commit();
            }
            Interaction::ResizingElement { .. } | Interaction::MarqueeSelecting { .. } => {
                self.commit();
            }
        }
    }

    /// Leaving the canvas ends the gesture exactly like a release.
    pub fn pointer_leave(&mut self) {
        match self.last_pointer {
            Some(last) => self.pointer_up(last),
            None => {
                if self.interaction.is_gesture() {
                    self.cancel_gesture();
                }
            }
        }
    }

    fn finish_shape(&mut self, kind: ElementKind, ghost: Rect, release: Point) {
        let rect = self.created_rect(kind, ghost, release);
        let id = ElementId::generate();
        let element = DiagramElement::boxed(id, kind, rect, format!("New {}", kind.label()))
            .with_background(self.config.default_background(kind));
        self.mutate(DocumentMutation::InsertElement(Box::new(element)));
        self.commit();
        if self.tool.is_one_shot() {
            self.tool = ToolKind::Select;
        }
        self.selection.set_only(id);
        self.begin(Interaction::EditingText { id });
    }

    fn finish_connection(&mut self, source: ElementId, ghost: Rect, release: Point) {
        if !self.doc.contains(source) {
            return;
        }
        let id = ElementId::generate();
        let element = DiagramElement::boxed(
            id,
            ElementKind::Rectangle,
            self.created_rect(ElementKind::Rectangle, ghost, release),
            format!("New {}", ElementKind::Rectangle.label()),
        );
        self.mutate(DocumentMutation::InsertElement(Box::new(element)));
        self.mutate(DocumentMutation::AddConnections(vec![DiagramConnection::new(
            source, id,
        )]));
        self.commit();
    }

    fn finish_drawing(&mut self, id: ElementId, revision: u64) {
        if self.doc.element(id).is_some_and(DiagramElement::is_valid) {
            self.commit();
        } else {
            log::debug!("discarding single-point stroke {id}");
            self.mutate(DocumentMutation::RemoveElements(vec![id]));
            self.save.rewind(revision);
        }
    }

    /// Abandon the current gesture, restoring the last committed state.
    fn cancel_gesture(&mut self) {
        log::debug!("cancelling {}", self.interaction.name());
        self.interaction = Interaction::Idle;
        let committed = self.history.current().clone();
        self.mutate(DocumentMutation::Restore(committed));
        self.prune_selection();
    }

    pub fn double_click(&mut self, input: PointerInput) {
        if self.interaction.editing().is_some() {
            self.commit_text();
        }
        if !self.interaction.is_idle() {
            return;
        }
        let pt = self.screen_to_document(input.screen);
        let Some(id) = hit_test(self.doc.elements(), pt) else {
            return;
        };
        if self.doc.element(id).is_some_and(DiagramElement::is_drawing) {
            return;
        }
        self.selection.set_only(id);
        self.begin(Interaction::EditingText { id });
    }

    pub fn key_down(&mut self, key: &str, modifiers: Modifiers) {
        if self.interaction.editing().is_some() {
            if key == "Escape" || (key == "Enter" && !modifiers.shift) {
                self.commit_text();
            }
            return;
        }

        let action = ShortcutMap::resolve(
            key,
            modifiers.ctrl,
            modifiers.shift,
            modifiers.alt,
            modifiers.meta,
        );
        match action {
            Some(ShortcutAction::Undo) => self.undo(),
            Some(ShortcutAction::Redo) => self.redo(),
            Some(ShortcutAction::Delete) => self.delete_selected(),
            Some(ShortcutAction::Cancel) => self.cancel(),
            Some(ShortcutAction::Tool(tool)) => self.select_tool(tool),
            None => {}
        }
    }

    // ─── Text editing ────────────────────────────────────────────────────

    /// Live update from the host's text field.
    pub fn edit_text(&mut self, content: &str) {
        if let Some(id) = self.interaction.editing() {
            self.mutate(DocumentMutation::SetContent {
                id,
                content: content.to_string(),
            });
        }
    }

    /// Finish text editing; one undo step if the label changed.
    pub fn commit_text(&mut self) {
        if let Some(id) = self.interaction.editing() {
            log::debug!("commit text for {id}");
            self.interaction = Interaction::Idle;
            self.commit();
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Escape: drop the tool, any gesture in progress, and the selection.
    pub fn cancel(&mut self) {
        if self.interaction.is_gesture() {
            self.cancel_gesture();
        }
        self.tool = ToolKind::Select;
        self.selection.clear();
    }

    pub fn delete_selected(&mut self) {
        if self.selection.is_empty() || !self.interaction.is_idle() {
            return;
        }
        let ids = self.selection.ids().to_vec();
        let count = ids.len();
        if self.mutate(DocumentMutation::RemoveElements(ids)) {
            self.commit();
            self.notices.push(Notice::info(
                "Elements Deleted",
                format!("{count} element(s) removed."),
            ));
        }
        self.selection.clear();
    }

    pub fn undo(&mut self) {
        if !self.interaction.is_idle() {
            return;
        }
        if let Some(snapshot) = self.history.undo() {
            self.doc.apply(DocumentMutation::Restore(snapshot));
            self.save.touch();
            self.prune_selection();
        }
    }

    pub fn redo(&mut self) {
        if !self.interaction.is_idle() {
            return;
        }
        if let Some(snapshot) = self.history.redo() {
            self.doc.apply(DocumentMutation::Restore(snapshot));
            self.save.touch();
            self.prune_selection();
        }
    }

    pub fn set_notes(&mut self, notes: &str) {
        if self.doc.notes != notes {
            self.doc.notes = notes.to_string();
            self.save.touch();
        }
    }

    pub fn rename(&mut self, name: &str) {
        if self.doc.name != name {
            self.doc.name = name.to_string();
            self.save.touch();
        }
    }

    // ─── Export ──────────────────────────────────────────────────────────

    pub fn export_notes(&mut self) -> ExportFile {
        let file = export_notes(&self.doc);
        self.notices.push(Notice::info(
            "Exported!",
            format!("Notes saved as {}.", file.file_name),
        ));
        file
    }

    pub fn export_diagram(&mut self) -> ExportFile {
        let file = export_diagram(&self.doc);
        self.notices.push(Notice::info(
            "Exported!",
            format!("Diagram saved as {}.", file.file_name),
        ));
        file
    }

    // ─── AI assistance ───────────────────────────────────────────────────

    fn is_current(&self, session: SessionToken) -> bool {
        if self.closed || session != self.session {
            log::warn!("discarding assistant result for stale session {}", session.0);
            return false;
        }
        true
    }

    /// Commit text or abandon a gesture before an asynchronous result
    /// replaces part of the document.
    fn settle_interaction(&mut self) {
        if self.interaction.editing().is_some() {
            self.commit_text();
        } else if self.interaction.is_gesture() {
            self.cancel_gesture();
        }
    }

    /// Generation needs non-blank notes.
    pub fn generate_request(&self) -> Option<AssistRequest> {
        let notes = notes_to_plain_text(&self.doc.notes);
        if notes.trim().is_empty() {
            return None;
        }
        Some(AssistRequest {
            session: self.session,
            notes,
            labels: Vec::new(),
        })
    }

    /// Suggestions need at least two elements to connect.
    pub fn suggest_request(&self) -> Option<AssistRequest> {
        if self.doc.elements().len() < 2 {
            return None;
        }
        Some(AssistRequest {
            session: self.session,
            notes: notes_to_plain_text(&self.doc.notes),
            labels: self.doc.elements().iter().map(|e| e.content.clone()).collect(),
        })
    }

    /// Replace every element with a generated diagram as one undo step.
    /// Returns whether anything was applied.
    pub fn apply_generated(
        &mut self,
        session: SessionToken,
        elements: Vec<DiagramElement>,
    ) -> bool {
        if !self.is_current(session) {
            return false;
        }
        if elements.is_empty() {
            self.notices.push(Notice::error(
                "Generation Failed",
                "Could not generate a diagram. Try rephrasing your notes.",
            ));
            return false;
        }
        self.settle_interaction();
        let count = elements.len();
        self.mutate(DocumentMutation::ReplaceElements(elements));
        self.prune_selection();
        self.commit();
        log::info!("applied generated diagram with {count} element(s)");
        self.notices.push(Notice::info(
            "Diagram Generated!",
            "The AI has created a diagram from your notes.",
        ));
        true
    }

    /// Append resolvable suggested connections as one undo step.
    /// Returns how many were added.
    pub fn apply_suggestions(
        &mut self,
        session: SessionToken,
        suggestions: &[SuggestedConnection],
    ) -> usize {
        if !self.is_current(session) {
            return 0;
        }
        let connections = resolve_suggestions(self.doc.elements(), suggestions);
        if connections.is_empty() {
            self.notices.push(Notice::error(
                "No Connections Found",
                "The AI could not find any clear connections to suggest.",
            ));
            return 0;
        }
        self.settle_interaction();
        let count = connections.len();
        self.mutate(DocumentMutation::AddConnections(connections));
        self.commit();
        self.notices.push(Notice::info(
            "Connections Suggested!",
            "AI has added connections between elements.",
        ));
        count
    }

    /// An assistant call failed after its retries.
    pub fn assist_failed(&mut self, session: SessionToken, reason: &str) {
        if !self.is_current(session) {
            return;
        }
        log::warn!("assistant failed: {reason}");
        self.notices.push(Notice::error(
            "Error",
            "An error occurred while talking to the AI assistant.",
        ));
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn to_record(&self, now: DateTime<Utc>) -> CanvasRecord {
        self.doc.to_record(&self.meta, now)
    }

    /// The document, if it changed since the last request. Nothing is
    /// handed out in the middle of a pointer gesture.
    pub fn take_save_request(&mut self, now: DateTime<Utc>) -> Option<SaveRequest> {
        if self.interaction.is_gesture() {
            return None;
        }
        let revision = self.save.take_unsent()?;
        Some(SaveRequest {
            revision,
            record: self.to_record(now),
        })
    }

    pub fn mark_saved(&mut self, revision: u64) {
        self.save.mark_saved(revision);
    }

    pub fn save_failed(&mut self, reason: &str) {
        log::warn!("save failed: {reason}");
        self.notices.push(Notice::error(
            "Save failed",
            "Your changes could not be saved. Retrying shortly.",
        ));
    }

    /// Apply a document pushed by the store. Ignored while local edits are
    /// unsaved or a gesture is in progress. The local view (transform and
    /// toolbar) is kept, and undo history restarts from the remote state.
    pub fn apply_remote(&mut self, record: CanvasRecord) -> bool {
        if self.save.is_dirty() || !self.interaction.is_idle() {
            log::debug!("remote change deferred: local edits pending");
            return false;
        }
        let (mut doc, meta) = Document::from_record(record);
        doc.transform = self.doc.transform;
        doc.toolbar_position = self.doc.toolbar_position;
        if doc == self.doc {
            return false;
        }
        self.doc = doc;
        self.meta = meta;
        self.history.reset(self.doc.snapshot());
        self.prune_selection();
        log::info!("applied remote change to {}", self.meta.id);
        true
    }

    /// Close the canvas. Outstanding assistant results are discarded from
    /// now on. Returns the final record if there are unsaved changes.
    pub fn close(&mut self, now: DateTime<Utc>) -> Option<CanvasRecord> {
        self.settle_interaction();
        self.closed = true;
        log::info!("closed canvas {} (session {})", self.meta.id, self.session.0);
        self.save.is_dirty().then(|| self.to_record(now))
    }

    // ─── Notices ─────────────────────────────────────────────────────────

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
