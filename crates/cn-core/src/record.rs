//! Persisted shape of a canvas and hydration back into a [`Document`].
//!
//! The wire form is camelCase JSON. Serialization strips optional fields
//! that are unset so stored documents have a stable shape; hydration repairs
//! anything a corrupted store could hand back instead of failing.

use crate::geometry::{Point, Rect};
use crate::id::ElementId;
use crate::model::{DiagramConnection, DiagramElement, Document, ElementKind};
use crate::viewport::{MAX_SCALE, MIN_SCALE, ViewTransform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("{kind} element {id} has no {missing}")]
    MissingGeometry {
        id: String,
        kind: ElementKind,
        missing: &'static str,
    },
    #[error("invalid canvas JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ─── Elements ────────────────────────────────────────────────────────────

/// Flat wire form of a [`DiagramElement`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl From<DiagramElement> for ElementRecord {
    fn from(el: DiagramElement) -> Self {
        let kind = el.kind();
        let rect = el.rect();
        let background_color = if kind == ElementKind::StickyNote {
            el.background_color.clone()
        } else {
            None
        };
        Self {
            id: el.id(),
            kind,
            x: rect.map(|r| r.x),
            y: rect.map(|r| r.y),
            width: rect.map(|r| r.width),
            height: rect.map(|r| r.height),
            points: el.points().map(<[Point]>::to_vec),
            content: (!el.is_drawing()).then(|| el.content.clone()),
            background_color,
        }
    }
}

impl TryFrom<ElementRecord> for DiagramElement {
    type Error = RecordError;

    fn try_from(rec: ElementRecord) -> Result<Self, Self::Error> {
        let missing = |what| RecordError::MissingGeometry {
            id: rec.id.to_string(),
            kind: rec.kind,
            missing: what,
        };
        if rec.kind.is_box() {
            let (Some(x), Some(y), Some(w), Some(h)) = (rec.x, rec.y, rec.width, rec.height)
            else {
                return Err(missing("x/y/width/height"));
            };
            let element = DiagramElement::boxed(
                rec.id,
                rec.kind,
                Rect::new(x, y, w, h),
                rec.content.clone().unwrap_or_default(),
            );
            let background = rec
                .background_color
                .clone()
                .filter(|_| rec.kind == ElementKind::StickyNote);
            Ok(element.with_background(background))
        } else {
            let points = rec.points.clone().ok_or_else(|| missing("points"))?;
            Ok(DiagramElement::drawing(rec.id, points))
        }
    }
}

// ─── Canvas ──────────────────────────────────────────────────────────────

/// Everything stored per canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub elements: Vec<ElementRecord>,
    #[serde(default)]
    pub connections: Vec<DiagramConnection>,
    #[serde(default)]
    pub toolbar_position: Point,
    #[serde(default)]
    pub transform: ViewTransform,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl CanvasRecord {
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Identity and ownership of a stored canvas, carried alongside the
/// in-memory [`Document`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMeta {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub owner_id: Option<String>,
}

impl RecordMeta {
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            owner_id: None,
        }
    }
}

impl Document {
    /// Serialize for storage, stamping `last_modified` with `now`.
    ///
    /// Drawings with fewer than two points (an in-progress click) are never
    /// written out.
    pub fn to_record(&self, meta: &RecordMeta, now: DateTime<Utc>) -> CanvasRecord {
        CanvasRecord {
            id: meta.id.clone(),
            name: self.name.clone(),
            notes: self.notes.clone(),
            elements: self
                .elements()
                .iter()
                .filter(|el| el.is_valid())
                .cloned()
                .map(ElementRecord::from)
                .collect(),
            connections: self.connections().to_vec(),
            toolbar_position: self.toolbar_position,
            transform: self.transform,
            created_at: meta.created_at,
            last_modified: now,
            owner_id: meta.owner_id.clone(),
        }
    }

    /// Hydrate a stored canvas, dropping anything that violates the model's
    /// invariants (degenerate geometry, duplicate ids, dangling connections).
    pub fn from_record(record: CanvasRecord) -> (Document, RecordMeta) {
        let mut seen = HashSet::new();
        let mut elements = Vec::with_capacity(record.elements.len());
        for rec in record.elements {
            match DiagramElement::try_from(rec) {
                Ok(el) if !el.is_valid() => {
                    log::warn!("dropping degenerate element {} on load", el.id());
                }
                Ok(el) if !seen.insert(el.id()) => {
                    log::warn!("dropping duplicate element id {} on load", el.id());
                }
                Ok(el) => elements.push(el),
                Err(e) => log::warn!("dropping unreadable element on load: {e}"),
            }
        }

        let doc = Document::from_parts(
            record.name,
            record.notes,
            elements,
            record.connections,
            record.toolbar_position,
            record.transform.clamped(MIN_SCALE, MAX_SCALE),
        );
        let meta = RecordMeta {
            id: record.id,
            created_at: record.created_at,
            owner_id: record.owner_id,
        };
        (doc, meta)
    }
}
