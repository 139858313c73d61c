//! Core document model for a CanvasNote canvas.
//!
//! A [`Document`] holds the free-form notes, an ordered list of diagram
//! elements (later elements paint on top), the connections between them, and
//! view state. Elements and connections can only be changed through
//! [`Document::apply`], which is where the "no dangling connection" invariant
//! is enforced.
//!
//! Element and connection lists are held behind `Arc` and mutated with
//! copy-on-write, so taking a [`DiagramSnapshot`] for undo history is O(1)
//! and only the first mutation after a snapshot pays for a copy.

use crate::geometry::{Point, Rect, bounds_of_points};
use crate::id::{ConnectionId, ElementId};
use crate::viewport::ViewTransform;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

// ─── Element kinds ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Rectangle,
    Circle,
    Diamond,
    Triangle,
    Cylinder,
    StickyNote,
    Text,
    FreehandDrawing,
}

impl ElementKind {
    /// Every kind that is represented by a bounding box (all but drawings).
    pub const BOX_KINDS: [ElementKind; 7] = [
        ElementKind::Rectangle,
        ElementKind::Circle,
        ElementKind::Diamond,
        ElementKind::Triangle,
        ElementKind::Cylinder,
        ElementKind::StickyNote,
        ElementKind::Text,
    ];

    pub fn is_box(self) -> bool {
        self != ElementKind::FreehandDrawing
    }

    /// Wire name, as used in the persisted `type` field.
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Rectangle => "rectangle",
            ElementKind::Circle => "circle",
            ElementKind::Diamond => "diamond",
            ElementKind::Triangle => "triangle",
            ElementKind::Cylinder => "cylinder",
            ElementKind::StickyNote => "sticky-note",
            ElementKind::Text => "text",
            ElementKind::FreehandDrawing => "freehand-drawing",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::BOX_KINDS
            .into_iter()
            .chain([ElementKind::FreehandDrawing])
            .find(|k| k.name() == name)
    }

    /// Human label, used for default content such as `New sticky note`.
    pub fn label(self) -> &'static str {
        match self {
            ElementKind::StickyNote => "sticky note",
            ElementKind::FreehandDrawing => "drawing",
            other => other.name(),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

/// Ground-truth geometry of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Axis-aligned box in document coordinates.
    Box(Rect),
    /// Freehand stroke; its bounds are always derived from the points.
    Stroke(Vec<Point>),
}

impl Geometry {
    pub fn bounds(&self) -> Rect {
        match self {
            Geometry::Box(rect) => *rect,
            Geometry::Stroke(points) => bounds_of_points(points).unwrap_or_default(),
        }
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Geometry {
        match self {
            Geometry::Box(rect) => Geometry::Box(rect.translate(dx, dy)),
            Geometry::Stroke(points) => {
                Geometry::Stroke(points.iter().map(|p| p.offset(dx, dy)).collect())
            }
        }
    }
}

/// A single diagram node.
///
/// `id` and `kind` are fixed at construction; the geometry variant always
/// matches the kind (box kinds hold a `Rect`, drawings hold points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "crate::record::ElementRecord", into = "crate::record::ElementRecord")]
pub struct DiagramElement {
    id: ElementId,
    kind: ElementKind,
    geometry: Geometry,
    /// Free text label. Always empty for drawings.
    pub content: String,
    /// Optional fill override; only meaningful for sticky notes.
    pub background_color: Option<String>,
}

impl DiagramElement {
    /// Create a box element. A drawing kind passed here is demoted to a
    /// rectangle, since drawings have no box geometry.
    pub fn boxed(id: ElementId, kind: ElementKind, rect: Rect, content: impl Into<String>) -> Self {
        let kind = if kind.is_box() {
            kind
        } else {
            log::warn!("box geometry requested for {kind}; creating a rectangle instead");
            ElementKind::Rectangle
        };
        Self {
            id,
            kind,
            geometry: Geometry::Box(rect),
            content: content.into(),
            background_color: None,
        }
    }

    /// Create a freehand drawing from its points.
    pub fn drawing(id: ElementId, points: Vec<Point>) -> Self {
        Self {
            id,
            kind: ElementKind::FreehandDrawing,
            geometry: Geometry::Stroke(points),
            content: String::new(),
            background_color: None,
        }
    }

    pub fn with_background(mut self, color: Option<String>) -> Self {
        self.background_color = color;
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Bounding box; derived from the points for drawings.
    pub fn bounds(&self) -> Rect {
        self.geometry.bounds()
    }

    pub fn rect(&self) -> Option<Rect> {
        match &self.geometry {
            Geometry::Box(rect) => Some(*rect),
            Geometry::Stroke(_) => None,
        }
    }

    pub fn points(&self) -> Option<&[Point]> {
        match &self.geometry {
            Geometry::Stroke(points) => Some(points),
            Geometry::Box(_) => None,
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.kind == ElementKind::FreehandDrawing
    }

    /// Boxes need a positive size; drawings need at least two points.
    pub fn is_valid(&self) -> bool {
        match &self.geometry {
            Geometry::Box(r) => r.width > 0.0 && r.height > 0.0,
            Geometry::Stroke(points) => points.len() >= 2,
        }
    }

    fn set_geometry(&mut self, geometry: Geometry) -> bool {
        let compatible = matches!(
            (&self.geometry, &geometry),
            (Geometry::Box(_), Geometry::Box(_)) | (Geometry::Stroke(_), Geometry::Stroke(_))
        );
        if compatible {
            self.geometry = geometry;
        }
        compatible
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub element_id: ElementId,
}

/// Directed edge between two elements, drawn center to center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramConnection {
    pub id: ConnectionId,
    pub source: Endpoint,
    pub target: Endpoint,
}

impl DiagramConnection {
    pub fn new(source: ElementId, target: ElementId) -> Self {
        Self {
            id: ConnectionId::generate(),
            source: Endpoint { element_id: source },
            target: Endpoint { element_id: target },
        }
    }

    pub fn touches(&self, id: ElementId) -> bool {
        self.source.element_id == id || self.target.element_id == id
    }
}

// ─── Snapshots & mutations ───────────────────────────────────────────────

/// The undoable part of a document: elements and connections.
#[derive(Debug, Clone, Default)]
pub struct DiagramSnapshot {
    elements: Arc<Vec<DiagramElement>>,
    connections: Arc<Vec<DiagramConnection>>,
}

impl DiagramSnapshot {
    pub fn elements(&self) -> &[DiagramElement] {
        &self.elements
    }

    pub fn connections(&self) -> &[DiagramConnection] {
        &self.connections
    }
}

impl PartialEq for DiagramSnapshot {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.elements, &other.elements) || self.elements == other.elements)
            && (Arc::ptr_eq(&self.connections, &other.connections)
                || self.connections == other.connections)
    }
}

/// Every change to elements or connections goes through one of these.
#[derive(Debug, Clone)]
pub enum DocumentMutation {
    /// Append an element on top of the stack.
    InsertElement(Box<DiagramElement>),
    /// Replace the geometry of one element (must match its kind).
    SetGeometry { id: ElementId, geometry: Geometry },
    /// Append a point to a drawing.
    PushPoint { id: ElementId, point: Point },
    SetContent { id: ElementId, content: String },
    /// Remove elements and every connection that touches them.
    RemoveElements(Vec<ElementId>),
    /// Append connections; ones referencing unknown elements are dropped.
    AddConnections(Vec<DiagramConnection>),
    /// Replace all elements; connections that no longer resolve are pruned.
    ReplaceElements(Vec<DiagramElement>),
    /// Restore a history snapshot wholesale.
    Restore(DiagramSnapshot),
}

// ─── Document ────────────────────────────────────────────────────────────

/// The aggregate root: one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: String,
    /// Serialized rich-text notes, opaque to the core.
    pub notes: String,
    elements: Arc<Vec<DiagramElement>>,
    connections: Arc<Vec<DiagramConnection>>,
    /// Toolbar top-left in screen coordinates.
    pub toolbar_position: Point,
    pub transform: ViewTransform,
}

impl Default for Document {
    fn default() -> Self {
        Self::new("Untitled Canvas")
    }
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: String::new(),
            elements: Arc::default(),
            connections: Arc::default(),
            toolbar_position: Point::new(16.0, 16.0),
            transform: ViewTransform::default(),
        }
    }

    pub fn elements(&self) -> &[DiagramElement] {
        &self.elements
    }

    pub fn connections(&self) -> &[DiagramConnection] {
        &self.connections
    }

    pub fn element(&self, id: ElementId) -> Option<&DiagramElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.element(id).is_some()
    }

    /// Find the first element whose content matches `label` exactly.
    pub fn element_by_content(&self, label: &str) -> Option<&DiagramElement> {
        self.elements.iter().find(|e| e.content == label)
    }

    pub fn snapshot(&self) -> DiagramSnapshot {
        DiagramSnapshot {
            elements: Arc::clone(&self.elements),
            connections: Arc::clone(&self.connections),
        }
    }

    /// Apply a mutation. Returns `true` if anything changed.
    pub fn apply(&mut self, mutation: DocumentMutation) -> bool {
        match mutation {
            DocumentMutation::InsertElement(element) => {
                if self.contains(element.id) {
                    log::warn!("refusing to insert duplicate element {}", element.id);
                    return false;
                }
                Arc::make_mut(&mut self.elements).push(*element);
                true
            }
            DocumentMutation::SetGeometry { id, geometry } => self
                .element_mut(id)
                .is_some_and(|el| el.geometry != geometry && el.set_geometry(geometry)),
            DocumentMutation::PushPoint { id, point } => match self.element_mut(id) {
                Some(DiagramElement {
                    geometry: Geometry::Stroke(points),
                    ..
                }) => {
                    points.push(point);
                    true
                }
                _ => false,
            },
            DocumentMutation::SetContent { id, content } => match self.element_mut(id) {
                Some(el) if !el.is_drawing() && el.content != content => {
                    el.content = content;
                    true
                }
                _ => false,
            },
            DocumentMutation::RemoveElements(ids) => self.remove_elements(&ids),
            DocumentMutation::AddConnections(connections) => {
                let valid: Vec<DiagramConnection> = connections
                    .into_iter()
                    .filter(|c| {
                        let ok = self.contains(c.source.element_id)
                            && self.contains(c.target.element_id);
                        if !ok {
                            log::warn!("dropping connection {} with unknown endpoint", c.id);
                        }
                        ok
                    })
                    .collect();
                if valid.is_empty() {
                    return false;
                }
                Arc::make_mut(&mut self.connections).extend(valid);
                true
            }
            DocumentMutation::ReplaceElements(elements) => {
                self.elements = Arc::new(elements);
                self.prune_dangling_connections();
                true
            }
            DocumentMutation::Restore(snapshot) => {
                let changed = self.snapshot() != snapshot;
                self.elements = snapshot.elements;
                self.connections = snapshot.connections;
                changed
            }
        }
    }

    /// The one place elements are removed; cascades to connections.
    fn remove_elements(&mut self, ids: &[ElementId]) -> bool {
        let doomed: HashSet<ElementId> = ids.iter().copied().collect();
        let before = self.elements.len();
        if !self.elements.iter().any(|e| doomed.contains(&e.id)) {
            return false;
        }
        Arc::make_mut(&mut self.elements).retain(|e| !doomed.contains(&e.id));
        if self
            .connections
            .iter()
            .any(|c| doomed.contains(&c.source.element_id) || doomed.contains(&c.target.element_id))
        {
            Arc::make_mut(&mut self.connections).retain(|c| {
                !doomed.contains(&c.source.element_id) && !doomed.contains(&c.target.element_id)
            });
        }
        log::debug!("removed {} element(s)", before - self.elements.len());
        true
    }

    fn prune_dangling_connections(&mut self) -> usize {
        let live: HashSet<ElementId> = self.elements.iter().map(|e| e.id).collect();
        let before = self.connections.len();
        if self
            .connections
            .iter()
            .all(|c| live.contains(&c.source.element_id) && live.contains(&c.target.element_id))
        {
            return 0;
        }
        Arc::make_mut(&mut self.connections).retain(|c| {
            live.contains(&c.source.element_id) && live.contains(&c.target.element_id)
        });
        let dropped = before - self.connections.len();
        log::warn!("pruned {dropped} dangling connection(s)");
        dropped
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut DiagramElement> {
        Arc::make_mut(&mut self.elements).iter_mut().find(|e| e.id == id)
    }

    /// Build a document from already-validated parts. Used by hydration.
    pub(crate) fn from_parts(
        name: String,
        notes: String,
        elements: Vec<DiagramElement>,
        connections: Vec<DiagramConnection>,
        toolbar_position: Point,
        transform: ViewTransform,
    ) -> Self {
        let mut doc = Self {
            name,
            notes,
            elements: Arc::new(elements),
            connections: Arc::new(connections),
            toolbar_position,
            transform,
        };
        doc.prune_dangling_connections();
        doc
    }
}
