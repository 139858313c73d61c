//! Pan/zoom transform between screen and document coordinates.
//!
//! `doc = (screen - (dx, dy)) / scale`, and the inverse for screen.

use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            dx: 0.0,
            dy: 0.0,
        }
    }
}

/// The canvas area in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl ViewTransform {
    pub fn screen_to_document(&self, p: Point) -> Point {
        Point::new((p.x - self.dx) / self.scale, (p.y - self.dy) / self.scale)
    }

    pub fn document_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.dx, p.y * self.scale + self.dy)
    }

    /// Multiply the scale by `delta_scale` (clamped to `[min, max]`) keeping
    /// the document point under `anchor` fixed on screen.
    pub fn zoom_at(&self, anchor: Point, delta_scale: f32, min: f32, max: f32) -> Self {
        let scale = (self.scale * delta_scale).clamp(min, max);
        let ratio = scale / self.scale;
        Self {
            scale,
            dx: anchor.x - (anchor.x - self.dx) * ratio,
            dy: anchor.y - (anchor.y - self.dy) * ratio,
        }
    }

    pub fn pan_by(&self, dx: f32, dy: f32) -> Self {
        Self {
            scale: self.scale,
            dx: self.dx + dx,
            dy: self.dy + dy,
        }
    }

    /// Bring a possibly corrupt transform back into range.
    pub fn clamped(&self, min: f32, max: f32) -> Self {
        let scale = if self.scale.is_finite() {
            self.scale.clamp(min, max)
        } else {
            1.0
        };
        Self {
            scale,
            dx: if self.dx.is_finite() { self.dx } else { 0.0 },
            dy: if self.dy.is_finite() { self.dy } else { 0.0 },
        }
    }

    /// The document-space rectangle currently visible in a viewport.
    pub fn visible_rect(&self, size: ViewportSize) -> Rect {
        Rect::from_corners(
            self.screen_to_document(Point::new(0.0, 0.0)),
            self.screen_to_document(Point::new(size.width, size.height)),
        )
    }
}

/// Keep a `footprint`-sized box at `pos` fully inside the viewport.
pub fn clamp_into_viewport(pos: Point, footprint: (f32, f32), size: ViewportSize) -> Point {
    let max_x = (size.width - footprint.0).max(0.0);
    let max_y = (size.height - footprint.1).max(0.0);
    Point::new(pos.x.clamp(0.0, max_x), pos.y.clamp(0.0, max_y))
}
