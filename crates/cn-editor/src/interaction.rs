//! The current pointer interaction, one variant per mode.
//!
//! Each variant carries exactly the data captured when the gesture began.
//! Per-move updates are computed from that captured data plus the current
//! pointer position, never from the previous move's output.

use crate::selection::Selection;
use cn_core::geometry::{Point, Rect};
use cn_core::id::ElementId;
use cn_core::model::{ElementKind, Geometry};
use cn_core::viewport::ViewTransform;
use cn_render::hit::{AnchorSide, ResizeHandle};

#[derive(Debug, Clone, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Panning {
        start: Point,
        origin: ViewTransform,
    },
    DraggingElements {
        /// Screen position at pointer-down.
        start: Point,
        /// Geometry of every selected element at pointer-down.
        base: Vec<(ElementId, Geometry)>,
        /// Already-selected element that was pressed without modifiers; the
        /// selection collapses to it if the pointer is released without moving.
        settle: Option<ElementId>,
        moved: bool,
    },
    ResizingElement {
        id: ElementId,
        handle: ResizeHandle,
        start: Point,
        base: Rect,
    },
    DrawingFreehand {
        id: ElementId,
        /// Save revision before the stroke was inserted.
        revision: u64,
    },
    CreatingShape {
        kind: ElementKind,
        /// Document position at pointer-down.
        start: Point,
        ghost: Rect,
    },
    CreatingConnection {
        source: ElementId,
        side: AnchorSide,
        /// Document position at pointer-down.
        start: Point,
        ghost: Rect,
    },
    MarqueeSelecting {
        start: Point,
        /// Selection kept from before the gesture (shift held).
        base: Selection,
        marquee: Rect,
    },
    DraggingToolbar {
        start: Point,
        origin: Point,
    },
    EditingText {
        id: ElementId,
    },
}

impl Interaction {
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Idle => "idle",
            Interaction::Panning { .. } => "panning",
            Interaction::DraggingElements { .. } => "draggingElements",
            Interaction::ResizingElement { .. } => "resizingElement",
            Interaction::DrawingFreehand { .. } => "drawingFreehand",
            Interaction::CreatingShape { .. } => "creatingShape",
            Interaction::CreatingConnection { .. } => "creatingConnection",
            Interaction::MarqueeSelecting { .. } => "marqueeSelecting",
            Interaction::DraggingToolbar { .. } => "draggingToolbar",
            Interaction::EditingText { .. } => "editingText",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    /// A pointer gesture is in progress (anything but idle or text editing).
    pub fn is_gesture(&self) -> bool {
        !matches!(self, Interaction::Idle | Interaction::EditingText { .. })
    }

    /// Element being text-edited.
    pub fn editing(&self) -> Option<ElementId> {
        match self {
            Interaction::EditingText { id } => Some(*id),
            _ => None,
        }
    }

    /// Preview of the element a create gesture would insert.
    pub fn ghost(&self) -> Option<(ElementKind, Rect)> {
        match self {
            Interaction::CreatingShape { kind, ghost, .. } => Some((*kind, *ghost)),
            Interaction::CreatingConnection { ghost, .. } => Some((ElementKind::Rectangle, *ghost)),
            _ => None,
        }
    }

    pub fn marquee(&self) -> Option<Rect> {
        match self {
            Interaction::MarqueeSelecting { marquee, .. } => Some(*marquee),
            _ => None,
        }
    }
}

/// Resize `base` by a document-space pointer delta on `handle`.
///
/// The minimum size is applied first. Dragging a top/left edge past the
/// floor pins the opposite edge. With `lock_aspect`, the cross dimension is
/// then derived from the clamped primary one (width for corners and
/// left/right edges, height for top/bottom) using `base`'s ratio, and
/// re-floored if that pushes it under the minimum.
pub fn resize_rect(
    base: &Rect,
    handle: ResizeHandle,
    dx: f32,
    dy: f32,
    min_size: f32,
    lock_aspect: bool,
) -> Rect {
    let (mut x, mut y) = (base.x, base.y);
    let (mut w, mut h) = (base.width, base.height);

    if handle.drags_right() {
        w = (base.width + dx).max(min_size);
    }
    if handle.drags_left() {
        let nw = base.width - dx;
        if nw > min_size {
            w = nw;
            x = base.x + dx;
        } else {
            w = min_size;
            x = base.right() - min_size;
        }
    }
    if handle.drags_bottom() {
        h = (base.height + dy).max(min_size);
    }
    if handle.drags_top() {
        let nh = base.height - dy;
        if nh > min_size {
            h = nh;
            y = base.y + dy;
        } else {
            h = min_size;
            y = base.bottom() - min_size;
        }
    }

    if lock_aspect && base.width > 0.0 && base.height > 0.0 {
        let ratio = base.width / base.height;
        let width_primary = handle.drags_left() || handle.drags_right();
        if width_primary {
            h = w / ratio;
            if h < min_size {
                h = min_size;
                w = h * ratio;
            }
        } else {
            w = h * ratio;
            if w < min_size {
                w = min_size;
                h = w / ratio;
            }
        }
        x = if handle.drags_left() { base.right() - w } else { base.x };
        y = if handle.drags_top() { base.bottom() - h } else { base.y };
    }

    Rect::new(x, y, w, h)
}
