//! Hit testing: point/rect → element, resize handle, connection anchor.
//!
//! Elements are painted in list order, so lookups walk the list in reverse
//! (last painted = topmost). Handle and anchor boxes are sized in screen
//! pixels; their document-space size is divided by the current scale.

use cn_core::config::CanvasConfig;
use cn_core::geometry::{Point, Rect};
use cn_core::id::ElementId;
use cn_core::model::DiagramElement;

/// Find the topmost element whose bounds contain `p` (edges inclusive).
pub fn hit_test(elements: &[DiagramElement], p: Point) -> Option<ElementId> {
    elements
        .iter()
        .rev()
        .find(|el| el.bounds().contains(p))
        .map(DiagramElement::id)
}

/// All elements whose bounds overlap `rect`, in paint order.
/// Used for marquee selection; edge-touching does not count.
pub fn elements_intersecting(elements: &[DiagramElement], rect: &Rect) -> Vec<ElementId> {
    elements
        .iter()
        .filter(|el| el.bounds().intersects(rect))
        .map(DiagramElement::id)
        .collect()
}

// ─── Resize handles ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    Top,
    Right,
    Bottom,
    Left,
}

impl ResizeHandle {
    /// Corners first, so they win where a small element's handles overlap.
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::TopLeft,
        ResizeHandle::TopRight,
        ResizeHandle::BottomRight,
        ResizeHandle::BottomLeft,
        ResizeHandle::Top,
        ResizeHandle::Right,
        ResizeHandle::Bottom,
        ResizeHandle::Left,
    ];

    /// Center of the handle on `rect`.
    pub fn position(self, rect: &Rect) -> Point {
        let c = rect.center();
        match self {
            ResizeHandle::TopLeft => Point::new(rect.x, rect.y),
            ResizeHandle::TopRight => Point::new(rect.right(), rect.y),
            ResizeHandle::BottomRight => Point::new(rect.right(), rect.bottom()),
            ResizeHandle::BottomLeft => Point::new(rect.x, rect.bottom()),
            ResizeHandle::Top => Point::new(c.x, rect.y),
            ResizeHandle::Right => Point::new(rect.right(), c.y),
            ResizeHandle::Bottom => Point::new(c.x, rect.bottom()),
            ResizeHandle::Left => Point::new(rect.x, c.y),
        }
    }

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft
                | ResizeHandle::TopRight
                | ResizeHandle::BottomRight
                | ResizeHandle::BottomLeft
        )
    }

    pub fn drags_left(self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::BottomLeft | ResizeHandle::Left
        )
    }

    pub fn drags_right(self) -> bool {
        matches!(
            self,
            ResizeHandle::TopRight | ResizeHandle::BottomRight | ResizeHandle::Right
        )
    }

    pub fn drags_top(self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::TopRight | ResizeHandle::Top
        )
    }

    pub fn drags_bottom(self) -> bool {
        matches!(
            self,
            ResizeHandle::BottomLeft | ResizeHandle::BottomRight | ResizeHandle::Bottom
        )
    }
}

/// Which resize handle of `el`, if any, is under `p`.
///
/// Freehand drawings have no handles.
pub fn resize_handle_at(
    el: &DiagramElement,
    p: Point,
    scale: f32,
    config: &CanvasConfig,
) -> Option<ResizeHandle> {
    let rect = el.rect()?;
    let size = config.handle_size / scale;
    ResizeHandle::ALL
        .into_iter()
        .find(|h| Rect::square_around(h.position(&rect), size).contains(p))
}

// ─── Connection anchors ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorSide {
    Top,
    Right,
    Bottom,
    Left,
}

impl AnchorSide {
    pub const ALL: [AnchorSide; 4] = [
        AnchorSide::Top,
        AnchorSide::Right,
        AnchorSide::Bottom,
        AnchorSide::Left,
    ];
}

/// Anchor center: the side's midpoint pushed outward so it sits clear of
/// the edge resize handle.
pub fn anchor_point(bounds: &Rect, side: AnchorSide, scale: f32, config: &CanvasConfig) -> Point {
    let off = config.anchor_offset / scale;
    let c = bounds.center();
    match side {
        AnchorSide::Top => Point::new(c.x, bounds.y - off),
        AnchorSide::Right => Point::new(bounds.right() + off, c.y),
        AnchorSide::Bottom => Point::new(c.x, bounds.bottom() + off),
        AnchorSide::Left => Point::new(bounds.x - off, c.y),
    }
}

pub fn connection_anchor_at(
    el: &DiagramElement,
    p: Point,
    scale: f32,
    config: &CanvasConfig,
) -> Option<AnchorSide> {
    let bounds = el.bounds();
    let size = config.anchor_size / scale;
    AnchorSide::ALL.into_iter().find(|&side| {
        Rect::square_around(anchor_point(&bounds, side, scale, config), size).contains(p)
    })
}

/// Topmost element with an anchor under `p`.
///
/// Anchors paint with their element, so the body of any element above the
/// owner covers them: the walk stops at the first body containing `p`.
pub fn anchor_hit(
    elements: &[DiagramElement],
    p: Point,
    scale: f32,
    config: &CanvasConfig,
) -> Option<(ElementId, AnchorSide)> {
    for el in elements.iter().rev() {
        if let Some(side) = connection_anchor_at(el, p, scale, config) {
            return Some((el.id(), side));
        }
        if el.bounds().contains(p) {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use cn_core::model::ElementKind;
    use pretty_assertions::assert_eq;

    fn boxed(name: &str, rect: Rect) -> DiagramElement {
        DiagramElement::boxed(ElementId::intern(name), ElementKind::Rectangle, rect, name)
    }

    #[test]
    fn last_inserted_wins_overlap() {
        let els = vec![
            boxed("h_low", Rect::new(0.0, 0.0, 100.0, 100.0)),
            boxed("h_high", Rect::new(50.0, 50.0, 100.0, 100.0)),
        ];
        assert_eq!(hit_test(&els, Point::new(75.0, 75.0)), Some(ElementId::intern("h_high")));
        assert_eq!(hit_test(&els, Point::new(10.0, 10.0)), Some(ElementId::intern("h_low")));
        assert_eq!(hit_test(&els, Point::new(500.0, 10.0)), None);
    }

    #[test]
    fn drawing_hit_uses_derived_bounds() {
        let els = vec![DiagramElement::drawing(
            ElementId::intern("h_pen"),
            vec![Point::new(10.0, 10.0), Point::new(40.0, 30.0)],
        )];
        assert_eq!(hit_test(&els, Point::new(25.0, 20.0)), Some(ElementId::intern("h_pen")));
        assert_eq!(hit_test(&els, Point::new(41.0, 20.0)), None);
    }

    #[test]
    fn marquee_touching_edge_is_not_selected() {
        let els = vec![boxed("h_m", Rect::new(100.0, 0.0, 50.0, 50.0))];
        assert!(elements_intersecting(&els, &Rect::new(0.0, 0.0, 100.0, 100.0)).is_empty());
        assert_eq!(
            elements_intersecting(&els, &Rect::new(0.0, 0.0, 101.0, 100.0)),
            vec![ElementId::intern("h_m")]
        );
    }

    #[test]
    fn handle_tolerance_scales_with_zoom() {
        let cfg = CanvasConfig::default();
        let el = boxed("h_r", Rect::new(0.0, 0.0, 100.0, 50.0));
        // 3 document units off the corner: inside the 8px box at scale 1...
        let p = Point::new(103.0, 53.0);
        assert_eq!(resize_handle_at(&el, p, 1.0, &cfg), Some(ResizeHandle::BottomRight));
        // ...but outside it at scale 2, where the box is 4 units wide.
        assert_eq!(resize_handle_at(&el, p, 2.0, &cfg), None);
        assert_eq!(
            resize_handle_at(&el, Point::new(50.0, 0.0), 1.0, &cfg),
            Some(ResizeHandle::Top)
        );
        assert_eq!(resize_handle_at(&el, Point::new(50.0, 25.0), 1.0, &cfg), None);
    }

    #[test]
    fn anchors_sit_outside_edge_handles() {
        let cfg = CanvasConfig::default();
        let el = boxed("h_a", Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(
            connection_anchor_at(&el, Point::new(116.0, 25.0), 1.0, &cfg),
            Some(AnchorSide::Right)
        );
        assert_eq!(connection_anchor_at(&el, Point::new(100.0, 25.0), 1.0, &cfg), None);
        assert_eq!(
            resize_handle_at(&el, Point::new(100.0, 25.0), 1.0, &cfg),
            Some(ResizeHandle::Right)
        );
        assert_eq!(
            anchor_hit(std::slice::from_ref(&el), Point::new(50.0, -16.0), 1.0, &cfg),
            Some((ElementId::intern("h_a"), AnchorSide::Top))
        );
    }

    #[test]
    fn anchor_under_a_later_body_is_covered() {
        let cfg = CanvasConfig::default();
        let els = vec![
            boxed("hc_below", Rect::new(200.0, 200.0, 100.0, 50.0)),
            boxed("hc_above", Rect::new(312.0, 200.0, 100.0, 50.0)),
        ];
        assert_eq!(anchor_hit(&els, Point::new(316.0, 225.0), 1.0, &cfg), None);
        // Same press with the order swapped: the anchor is painted on top.
        let swapped = vec![els[1].clone(), els[0].clone()];
        assert_eq!(
            anchor_hit(&swapped, Point::new(316.0, 225.0), 1.0, &cfg),
            Some((ElementId::intern("hc_below"), AnchorSide::Right))
        );
    }
}
